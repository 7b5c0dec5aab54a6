//! Segue, a headless two-deck auto-mix console
//!
//! Thin composition root around `segue-core`: wires the simulated audio
//! engine and a stdin line reader into a control session, then runs the
//! cooperative heartbeat loop until the operator quits.

mod sim;

use std::io::BufRead;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use segue_core::{
    notification_channel, Command, DeckId, Notification, Session, Severity, TrackFile,
};
use sim::SimEngine;

/// Heartbeat period for the control loop; must be at least as fine as
/// the scheduler's fade frames
const TICK: Duration = Duration::from_millis(20);

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segue_core=info,segue_app=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to install tracing subscriber")?;

    let (notify_tx, notify_rx) = notification_channel();
    let mut session = Session::new(SimEngine::new(), notify_tx);

    let (line_tx, line_rx) = bounded::<String>(64);
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || read_lines(line_tx))
        .context("failed to spawn the stdin reader")?;

    println!("segue console - `help` lists commands");
    info!("control loop running");

    loop {
        match line_rx.recv_timeout(TICK) {
            Ok(line) => {
                if !dispatch(&mut session, line.trim()) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        session.tick();

        for note in notify_rx.try_iter() {
            print_notification(&note);
        }
    }

    info!("session closed");
    Ok(())
}

fn read_lines(tx: Sender<String>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if tx.send(line).is_err() {
            break;
        }
    }
}

enum ConsoleInput {
    Command(Command),
    Status,
    Help,
    Quit,
}

/// Map one console line onto the session; false means quit
fn dispatch(session: &mut Session<SimEngine>, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    match parse_line(line) {
        Ok(ConsoleInput::Command(command)) => session.handle_command(command),
        Ok(ConsoleInput::Status) => print_status(session),
        Ok(ConsoleInput::Help) => print_help(),
        Ok(ConsoleInput::Quit) => return false,
        Err(message) => println!("? {message}"),
    }
    true
}

fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();

    let input = match verb.as_str() {
        "load" => {
            let &[deck, path] = rest.as_slice() else {
                return Err("usage: load <a|b> <path>".into());
            };
            ConsoleInput::Command(Command::Load(parse_deck(deck)?, read_track(Path::new(path))?))
        }
        "play" => {
            let deck = parse_deck(one_arg(&rest, "play <a|b>")?)?;
            ConsoleInput::Command(Command::TogglePlay(deck))
        }
        "bpm" => {
            let &[deck, value] = rest.as_slice() else {
                return Err("usage: bpm <a|b> <value>".into());
            };
            ConsoleInput::Command(Command::SetDeckBpm(
                parse_deck(deck)?,
                parse_num(value, "BPM")?,
            ))
        }
        "master" => {
            let value = parse_num(one_arg(&rest, "master <bpm>")?, "BPM")?;
            ConsoleInput::Command(Command::SetMasterBpm(value))
        }
        "target" => {
            let &[deck, value] = rest.as_slice() else {
                return Err("usage: target <a|b> <seconds>".into());
            };
            ConsoleInput::Command(Command::SetTargetDuration(
                parse_deck(deck)?,
                parse_num(value, "duration")?,
            ))
        }
        "sync" => ConsoleInput::Command(Command::Sync),
        "fade" => {
            let value = parse_num(one_arg(&rest, "fade <0..1>")?, "position")?;
            ConsoleInput::Command(Command::SetCrossfade(value))
        }
        "fadetime" => {
            let value = parse_num(one_arg(&rest, "fadetime <seconds>")?, "duration")?;
            ConsoleInput::Command(Command::SetCrossfadeDuration(value))
        }
        "automix" => {
            let enabled = match one_arg(&rest, "automix <on|off>")? {
                "on" => true,
                "off" => false,
                other => return Err(format!("automix takes on or off, not `{other}`")),
            };
            ConsoleInput::Command(Command::SetAutoMix(enabled))
        }
        "status" => ConsoleInput::Status,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        other => return Err(format!("unknown command `{other}` (try `help`)")),
    };
    Ok(input)
}

fn one_arg<'a>(rest: &[&'a str], usage: &str) -> Result<&'a str, String> {
    match rest {
        &[only] => Ok(only),
        _ => Err(format!("usage: {usage}")),
    }
}

fn parse_deck(word: &str) -> Result<DeckId, String> {
    match word.to_ascii_lowercase().as_str() {
        "a" => Ok(DeckId::A),
        "b" => Ok(DeckId::B),
        other => Err(format!("unknown deck `{other}` (use a or b)")),
    }
}

fn parse_num<T: std::str::FromStr>(word: &str, what: &str) -> Result<T, String> {
    word.parse().map_err(|_| format!("invalid {what} `{word}`"))
}

/// The file-supplier role: raw bytes plus a MIME type for the core
fn read_track(path: &Path) -> Result<TrackFile, String> {
    let bytes =
        std::fs::read(path).map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    let mime_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("mp3") => "audio/mpeg",
        Some(ext) if ext.eq_ignore_ascii_case("wav") => "audio/wav",
        _ => "application/octet-stream",
    };
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("track")
        .to_string();
    Ok(TrackFile {
        name,
        mime_type: mime_type.into(),
        bytes,
    })
}

fn print_status(session: &Session<SimEngine>) {
    for deck in DeckId::ALL {
        let state = session.deck(deck);
        let name = state.track_name.as_deref().unwrap_or("-");
        let marker = if state.playing { ">" } else { " " };
        println!(
            "deck {deck} {marker} {name}  bpm {:>5.1}  rate x{:.2}  {:>6.1}s left",
            state.bpm,
            state.playback_rate,
            session.remaining_secs(deck),
        );
    }
    let mixer = session.mixer();
    println!(
        "master {:>5.1} bpm  fade {:.2}  automix {}  {:?}",
        mixer.master_bpm(),
        session.engine().crossfade(),
        if mixer.auto_mix_enabled() { "on" } else { "off" },
        session.automix_status(),
    );
}

fn print_notification(note: &Notification) {
    match note.severity {
        Severity::Info => println!("[i] {}: {}", note.title, note.message),
        Severity::Error => eprintln!("[!] {}: {}", note.title, note.message),
    }
}

fn print_help() {
    println!("  load <a|b> <path>     load an mp3/wav file into a deck");
    println!("  play <a|b>            toggle a deck");
    println!("  bpm <a|b> <value>     set a deck's tempo");
    println!("  master <bpm>          set the master tempo");
    println!("  sync                  match both decks to the master tempo");
    println!("  target <a|b> <secs>   stretch a deck to a target length");
    println!("  fade <0..1>           move the crossfade (0 = A, 1 = B)");
    println!("  fadetime <secs>       auto-mix crossfade length (2-16)");
    println!("  automix <on|off>      arm or disarm the auto-mix scheduler");
    println!("  status                show decks and mixer");
    println!("  quit                  exit");
}
