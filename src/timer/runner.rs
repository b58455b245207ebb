//! Drives the engine with real one-second ticks. The loop is owned by one
//! runner instance and torn down deterministically through its cancellation
//! token, so no orphaned countdown keeps ticking after the surface goes away.

use std::{
    io::Write,
    time::Duration,
};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    timer::engine::{FocusTimer, TickOutcome},
    utils::{clock::Clock, format::format_clock},
};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Audible expiry side effect.
#[cfg_attr(test, mockall::automock)]
pub trait Alarm: Send {
    fn ring(&mut self);
}

/// Rings the terminal bell.
pub struct TerminalBell;

impl Alarm for TerminalBell {
    fn ring(&mut self) {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
}

/// Where the countdown is rendered on every change, standing in for the
/// window title of the original surface.
#[cfg_attr(test, mockall::automock)]
pub trait StatusSurface: Send {
    fn show(&mut self, line: &str);
}

pub struct TerminalSurface;

impl StatusSurface for TerminalSurface {
    fn show(&mut self, line: &str) {
        // Rewrites one status line in place.
        print!("\r\x1b[2K{line}");
        let _ = std::io::stdout().flush();
    }
}

/// The label the host surface shows, `MM:SS – <mode name>`.
pub fn status_line(timer: &FocusTimer) -> String {
    format!(
        "{} – {}",
        format_clock(timer.remaining_seconds()),
        timer.mode().label()
    )
}

pub struct TimerRunner {
    engine: FocusTimer,
    alarm: Box<dyn Alarm>,
    surface: Box<dyn StatusSurface>,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
}

impl TimerRunner {
    pub fn new(
        engine: FocusTimer,
        alarm: Box<dyn Alarm>,
        surface: Box<dyn StatusSurface>,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            alarm,
            surface,
            shutdown,
            clock,
        }
    }

    /// Counts the current period down to expiry. On expiry the alarm rings,
    /// the engine has already advanced to the next mode, and the engine is
    /// handed back for the caller to inspect. Cancellation pauses the engine
    /// and returns early.
    pub async fn run(mut self) -> Result<FocusTimer> {
        self.engine.start();
        self.surface.show(&status_line(&self.engine));

        let mut tick_point = self.clock.instant();
        loop {
            tick_point += TICK_INTERVAL;

            tokio::select! {
                // Cancelation stops the countdown before the next tick; the
                // engine keeps its position so a later start can resume.
                _ = self.shutdown.cancelled() => {
                    self.engine.pause();
                    info!("Timer canceled with {} remaining", self.engine.remaining_seconds());
                    return Ok(self.engine);
                }
                _ = self.clock.sleep_until(tick_point) => ()
            }

            match self.engine.tick() {
                TickOutcome::Ticked => {
                    self.surface.show(&status_line(&self.engine));
                }
                TickOutcome::Expired { finished } => {
                    self.alarm.ring();
                    self.surface.show(&status_line(&self.engine));
                    info!("{} period finished", finished.label());
                    return Ok(self.engine);
                }
                TickOutcome::Idle => return Ok(self.engine),
            }
        }
    }
}
