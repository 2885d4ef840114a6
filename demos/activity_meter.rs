//! Interactive activity meter.
//!
//! Press any key to register activity and watch the meter rise, hold and decay.
//! Press Q or ESC to quit.
//!
//! An optional timing string sets the envelope, e.g.
//! `cargo run --example activity_meter -- 100ms/1s/2s/constant`.
//! Set `RUST_LOG=activity_envelope=debug` and redirect stderr to a file to see phase
//! transitions logged.

use activity_envelope::time::{SystemClock, TimerQueue};
use activity_envelope::{ActivityEnvelope, EnvelopeConfig, Phase};
use anyhow::{Context, Result};
use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use std::cell::{Cell, RefCell};
use std::io::{Write, stdout};
use std::panic;
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const METER_WIDTH: usize = 48;
const HISTORY: usize = 8;

type Envelope = ActivityEnvelope<SystemClock, Rc<TimerQueue<SystemClock>>>;

/// What the observer has seen so far, for display.
#[derive(Default)]
struct PhaseLog {
    transitions: Cell<u32>,
    recent: RefCell<Vec<Phase>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(timing) => timing
            .parse::<EnvelopeConfig>()
            .with_context(|| format!("bad timing argument '{timing}'"))?,
        None => EnvelopeConfig::default(),
    };

    let clock = SystemClock::new();
    let timers = Rc::new(TimerQueue::new(clock));
    let envelope = ActivityEnvelope::new(config, clock, timers.clone())?;

    let log = Rc::new(PhaseLog::default());
    let sink = log.clone();
    envelope.subscribe(move |phase| {
        sink.transitions.set(sink.transitions.get() + 1);
        let mut recent = sink.recent.borrow_mut();
        recent.push(phase);
        if recent.len() > HISTORY {
            recent.remove(0);
        }
    });

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(cursor::Hide)?;

    // Restore the terminal if anything panics while it is in raw mode
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal();
        original_hook(panic_info);
    }));

    let result = run(&envelope, &timers, &log);

    envelope.teardown();
    cleanup_terminal();
    result
}

fn run(envelope: &Envelope, timers: &TimerQueue<SystemClock>, log: &PhaseLog) -> Result<()> {
    stdout().execute(Clear(ClearType::All))?;
    loop {
        // Wake for the next frame, or sooner if a phase advance is due
        let timeout = timers.time_until_next().map_or(FRAME, |due| due.min(FRAME));
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if is_quit_key(key.code) {
                break;
            }
            envelope.activate();
        }

        timers.run_due();
        draw(envelope, log)?;
    }
    Ok(())
}

fn draw(envelope: &Envelope, log: &PhaseLog) -> Result<()> {
    let value = envelope.value().clamp(0.0, 1.0);
    let filled = (value * METER_WIDTH as f64).round() as usize;
    let config = envelope.config();
    let recent: Vec<String> = log.recent.borrow().iter().map(Phase::to_string).collect();

    let mut out = stdout();
    out.queue(cursor::MoveTo(0, 0))?;
    write!(
        out,
        "Activity meter - press any key to trigger, Q/ESC to quit\r\n\r\n"
    )?;
    write!(
        out,
        "attack {:?}  sustain {:?}  release {:?}  ({:?})\r\n\r\n",
        config.attack(),
        config.sustain(),
        config.release(),
        config.retrigger_policy()
    )?;
    write!(
        out,
        "[{}{}] {:>4.2}  {:<8}\r\n\r\n",
        "#".repeat(filled),
        " ".repeat(METER_WIDTH - filled),
        value,
        envelope.phase()
    )?;
    out.queue(Clear(ClearType::CurrentLine))?;
    write!(
        out,
        "transitions: {}  recent: {}\r\n",
        log.transitions.get(),
        recent.join(" > ")
    )?;
    out.flush()?;
    Ok(())
}

/// Cleans up terminal state (cursor, alternate screen, raw mode).
fn cleanup_terminal() {
    let _ = stdout().execute(cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Helper to check if a key code is a quit key (Q, ESC).
fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}
