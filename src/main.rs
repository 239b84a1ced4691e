use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use tracing_subscriber::EnvFilter;

use target_shooter::config::{Args, Settings};
use target_shooter::display::TerminalCanvas;
use target_shooter::input::{HeldKeys, Key};
use target_shooter::level::LevelManager;
use target_shooter::score::JsonScoreStore;
use target_shooter::session::Session;
use target_shooter::states::{StateManager, Transition};

// ── Held-key tracking ─────────────────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames. Covers terminals that don't emit key-release events:
/// OS key repeat refreshes the key well before the window expires.
const HOLD_WINDOW: u64 = 4;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn held_keys(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> HeldKeys {
    let any = |codes: &[KeyCode]| codes.iter().any(|c| is_held(key_frame, c, frame));
    HeldKeys {
        left: any(&[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')]),
        right: any(&[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')]),
    }
}

fn decode(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

fn game_loop<W: Write>(
    out: &mut W,
    manager: &mut StateManager,
    settings: &Settings,
    rx: &mpsc::Receiver<Event>,
) -> Result<()> {
    let frame_budget = settings.frame();
    let (cols, rows) = terminal::size()?;
    let mut canvas = TerminalCanvas::new(cols, rows);

    // Maps each held key → the frame it was last seen (press or repeat).
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last_tick = Instant::now();

    while !manager.should_quit() {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = ev
            else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                        tracing::info!("interrupted");
                        return Ok(());
                    }
                    if let Some(key) = decode(code) {
                        manager.handle_event(key)?;
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
            if manager.should_quit() {
                return Ok(());
            }
        }

        let now = Instant::now();
        manager.update(now - last_tick, held_keys(&key_frame, frame))?;
        last_tick = now;

        let (cols, rows) = terminal::size()?;
        canvas.resize(cols, rows);
        manager.draw(&mut canvas);
        canvas.present(out)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_budget {
            thread::sleep(frame_budget - elapsed);
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(settings: &Settings) -> Result<()> {
    let file = File::create(&settings.log_file)
        .with_context(|| format!("creating log file {}", settings.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_manager(settings: &Settings) -> Result<StateManager> {
    let levels = LevelManager::load_dir(&settings.levels_dir)
        .with_context(|| format!("loading levels from {}", settings.levels_dir.display()))?;
    let scores = JsonScoreStore::new(&settings.scores_file);
    let mut session = Session::new(levels, Box::new(scores));
    session.field = settings.field;

    let first = match settings.start_level {
        Some(level) => Transition::Play { level, hp: None },
        None => Transition::Boot,
    };
    StateManager::new(session, first).context("entering the first state")
}

fn main() -> Result<()> {
    let settings = Settings::from(Args::parse());
    init_logging(&settings)?;

    // Fail on bad level data before the terminal is taken over.
    let mut manager = build_manager(&settings)?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Terminals without the kitty protocol fall back to the hold window.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = game_loop(&mut out, &mut manager, &settings, &rx);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(e) = &result {
        tracing::error!(error = %e, "game aborted");
    }
    result
}
