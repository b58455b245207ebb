//! The focus-timer state machine. All transitions are total: commands carry
//! no payload beyond the closed mode enum, so there is no invalid input to
//! reject. Only the completed-session counter survives a restart; a fresh
//! engine always begins paused at the start of a work period.

use std::sync::Arc;

use clap::ValueEnum;
use tracing::{debug, warn};

use crate::store::{KvStore, POMODOROS_KEY};

pub const WORK_SECONDS: u32 = 25 * 60;
pub const SHORT_BREAK_SECONDS: u32 = 5 * 60;
pub const LONG_BREAK_SECONDS: u32 = 15 * 60;

/// Every fourth finished work session earns the long break.
const SESSIONS_PER_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimerMode {
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn duration_seconds(self) -> u32 {
        match self {
            TimerMode::Work => WORK_SECONDS,
            TimerMode::ShortBreak => SHORT_BREAK_SECONDS,
            TimerMode::LongBreak => LONG_BREAK_SECONDS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Work",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

/// What a single one-second advance did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused or already at zero; nothing moved.
    Idle,
    Ticked,
    /// The countdown crossed zero on this tick. Mode advancement has already
    /// happened; `finished` is the mode that just ended so the caller can
    /// ring the alarm and re-render. Fires exactly once per crossing.
    Expired { finished: TimerMode },
}

pub struct FocusTimer {
    mode: TimerMode,
    remaining_seconds: u32,
    is_running: bool,
    completed_work_sessions: u32,
    store: Arc<dyn KvStore>,
}

impl FocusTimer {
    /// Restores the persisted session counter (0 when absent or unreadable)
    /// and starts everything else from the fixed initial state.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let completed_work_sessions = match store.get(POMODOROS_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<u32>().unwrap_or_else(|e| {
                warn!("Stored session count {raw:?} was unreadable, starting at 0: {e}");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!("Couldn't read stored session count, starting at 0: {e}");
                0
            }
        };

        Self {
            mode: TimerMode::Work,
            remaining_seconds: TimerMode::Work.duration_seconds(),
            is_running: false,
            completed_work_sessions,
            store,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn start(&mut self) {
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Stops the countdown and restores the current mode's full duration.
    pub fn reset(&mut self) {
        self.is_running = false;
        self.remaining_seconds = self.mode.duration_seconds();
    }

    /// Switches to `mode`, stopped, at its full duration. Allowed at any
    /// point, including mid-countdown.
    pub fn select_mode(&mut self, mode: TimerMode) {
        self.is_running = false;
        self.mode = mode;
        self.remaining_seconds = mode.duration_seconds();
    }

    /// One logical second. Advancement happens inside the tick that reaches
    /// zero, so repeated reads of a zeroed countdown can never re-trigger it.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running || self.remaining_seconds == 0 {
            return TickOutcome::Idle;
        }

        self.remaining_seconds -= 1;
        if self.remaining_seconds > 0 {
            return TickOutcome::Ticked;
        }

        let finished = self.mode;
        self.advance_after_expiry();
        TickOutcome::Expired { finished }
    }

    fn advance_after_expiry(&mut self) {
        match self.mode {
            TimerMode::Work => {
                self.completed_work_sessions += 1;
                self.persist_completed();
                self.mode = if self.completed_work_sessions % SESSIONS_PER_LONG_BREAK == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                };
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => {
                self.mode = TimerMode::Work;
            }
        }
        self.remaining_seconds = self.mode.duration_seconds();
        self.is_running = false;
        debug!(
            "Expiry advanced to {} with {} sessions done",
            self.mode.label(),
            self.completed_work_sessions
        );
    }

    fn persist_completed(&self) {
        if let Err(e) = self
            .store
            .set(POMODOROS_KEY, &self.completed_work_sessions.to_string())
        {
            warn!("Couldn't persist session count, keeping in-memory value: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::store::{FileKvStore, KvStore, MockKvStore, POMODOROS_KEY};

    use super::{FocusTimer, TickOutcome, TimerMode, SHORT_BREAK_SECONDS, WORK_SECONDS};

    fn engine() -> FocusTimer {
        let mut store = MockKvStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_set().returning(|_, _| Ok(()));
        FocusTimer::load(Arc::new(store))
    }

    /// Runs the current period to expiry, returning how many ticks moved the
    /// countdown.
    fn run_to_expiry(timer: &mut FocusTimer) -> u32 {
        timer.start();
        let mut ticks = 0;
        loop {
            ticks += 1;
            match timer.tick() {
                TickOutcome::Expired { .. } => return ticks,
                TickOutcome::Ticked => {}
                TickOutcome::Idle => panic!("countdown stalled after {ticks} ticks"),
            }
        }
    }

    #[test]
    fn fresh_engine_starts_paused_at_work() {
        let timer = engine();

        assert_eq!(timer.mode(), TimerMode::Work);
        assert_eq!(timer.remaining_seconds(), WORK_SECONDS);
        assert!(!timer.is_running());
        assert_eq!(timer.completed_work_sessions(), 0);
    }

    #[test]
    fn full_work_period_expires_after_exactly_1500_ticks() {
        let mut timer = engine();

        let ticks = run_to_expiry(&mut timer);

        assert_eq!(ticks, WORK_SECONDS);
        assert_eq!(timer.mode(), TimerMode::ShortBreak);
        assert_eq!(timer.remaining_seconds(), SHORT_BREAK_SECONDS);
        assert!(!timer.is_running());
        assert_eq!(timer.completed_work_sessions(), 1);
    }

    #[test]
    fn tick_does_nothing_while_paused() {
        let mut timer = engine();

        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.remaining_seconds(), WORK_SECONDS);
    }

    #[test]
    fn start_and_pause_leave_the_countdown_in_place() {
        let mut timer = engine();
        timer.start();
        timer.tick();
        timer.tick();
        timer.pause();

        assert_eq!(timer.remaining_seconds(), WORK_SECONDS - 2);
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.remaining_seconds(), WORK_SECONDS - 2);

        timer.start();
        assert_eq!(timer.tick(), TickOutcome::Ticked);
    }

    #[test]
    fn fourth_work_expiry_earns_the_long_break() {
        let mut timer = engine();

        for expected in 1..=3u32 {
            run_to_expiry(&mut timer);
            assert_eq!(timer.completed_work_sessions(), expected);
            assert_eq!(timer.mode(), TimerMode::ShortBreak);
            timer.select_mode(TimerMode::Work);
        }

        run_to_expiry(&mut timer);
        assert_eq!(timer.completed_work_sessions(), 4);
        assert_eq!(timer.mode(), TimerMode::LongBreak);
    }

    #[test]
    fn breaks_always_advance_back_to_work() {
        let mut timer = engine();
        timer.select_mode(TimerMode::LongBreak);

        run_to_expiry(&mut timer);

        assert_eq!(timer.mode(), TimerMode::Work);
        assert_eq!(timer.remaining_seconds(), WORK_SECONDS);
        assert_eq!(timer.completed_work_sessions(), 0);
    }

    #[test]
    fn reset_and_select_mode_never_touch_the_counter() {
        let mut timer = engine();
        run_to_expiry(&mut timer);
        assert_eq!(timer.completed_work_sessions(), 1);

        timer.select_mode(TimerMode::Work);
        timer.start();
        timer.tick();
        timer.reset();

        assert_eq!(timer.completed_work_sessions(), 1);
        assert_eq!(timer.remaining_seconds(), WORK_SECONDS);
        assert!(!timer.is_running());

        timer.select_mode(TimerMode::ShortBreak);
        assert_eq!(timer.completed_work_sessions(), 1);
        assert_eq!(timer.remaining_seconds(), SHORT_BREAK_SECONDS);
    }

    #[test]
    fn mid_countdown_mode_switch_installs_the_new_duration() {
        let mut timer = engine();
        timer.start();
        timer.tick();

        timer.select_mode(TimerMode::ShortBreak);

        assert!(!timer.is_running());
        assert_eq!(timer.remaining_seconds(), SHORT_BREAK_SECONDS);
    }

    #[test]
    fn every_counter_change_is_written_back() {
        let mut store = MockKvStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .withf(|key, value| key == POMODOROS_KEY && value == "1")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut timer = FocusTimer::load(Arc::new(store));
        run_to_expiry(&mut timer);
    }

    #[test]
    fn store_write_failure_keeps_the_in_memory_counter() {
        let mut store = MockKvStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .returning(|_, _| Err(anyhow::anyhow!("quota exceeded")));

        let mut timer = FocusTimer::load(Arc::new(store));
        run_to_expiry(&mut timer);

        assert_eq!(timer.completed_work_sessions(), 1);
    }

    #[test]
    fn counter_round_trips_through_a_real_store() -> Result<()> {
        let dir = tempdir()?;
        let store: Arc<dyn KvStore> = Arc::new(FileKvStore::new(dir.path().to_owned())?);
        store.set(POMODOROS_KEY, "7")?;

        let timer = FocusTimer::load(store);

        assert_eq!(timer.completed_work_sessions(), 7);
        assert_eq!(timer.mode(), TimerMode::Work);
        assert!(!timer.is_running());
        Ok(())
    }

    #[test]
    fn unreadable_counter_defaults_to_zero() {
        let mut store = MockKvStore::new();
        store.expect_get().returning(|_| Ok(Some("banana".into())));

        let timer = FocusTimer::load(Arc::new(store));

        assert_eq!(timer.completed_work_sessions(), 0);
    }
}
