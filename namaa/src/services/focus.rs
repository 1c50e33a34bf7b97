//! Focus timer
//!
//! A two-phase work/break countdown. `FocusTimer` is the plain state
//! machine; `TimerDriver` ticks it once per second on a tokio task and
//! forwards phase completions. `FocusLog` keeps the running history of
//! completed focus phases.

use crate::config::{
    DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES, FOCUS_SESSION_CREDIT_MINUTES, MAX_BREAK_MINUTES,
    MAX_FOCUS_MINUTES, MIN_BREAK_MINUTES, MIN_FOCUS_MINUTES,
};
use crate::database::FocusSession;
use crate::error::{AppError, Result};
use crate::storage::{Collection, RecordStore, StorageKey};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    fn other(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The countdown of `completed` reached zero; the timer now waits in
    /// `next`, stopped.
    PhaseCompleted { completed: Phase, next: Phase },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    phase: Phase,
    remaining_secs: u32,
    running: bool,
    focus_minutes: u32,
    break_minutes: u32,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self {
            phase: Phase::Focus,
            remaining_secs: DEFAULT_FOCUS_MINUTES * 60,
            running: false,
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl FocusTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(focus_minutes: u32, break_minutes: u32) -> Result<Self> {
        let mut timer = Self::default();
        timer.set_focus_minutes(focus_minutes)?;
        timer.set_break_minutes(break_minutes)?;
        Ok(timer)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn focus_minutes(&self) -> u32 {
        self.focus_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    fn phase_secs(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus_minutes * 60,
            Phase::Break => self.break_minutes * 60,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Back to a stopped, full-length focus phase
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Focus;
        self.remaining_secs = self.phase_secs(Phase::Focus);
    }

    pub fn set_focus_minutes(&mut self, minutes: u32) -> Result<()> {
        if !(MIN_FOCUS_MINUTES..=MAX_FOCUS_MINUTES).contains(&minutes) {
            return Err(AppError::Validation(format!(
                "focus duration must be {}-{} minutes",
                MIN_FOCUS_MINUTES, MAX_FOCUS_MINUTES
            )));
        }
        self.focus_minutes = minutes;
        if !self.running && self.phase == Phase::Focus {
            self.remaining_secs = self.phase_secs(Phase::Focus);
        }
        Ok(())
    }

    pub fn set_break_minutes(&mut self, minutes: u32) -> Result<()> {
        if !(MIN_BREAK_MINUTES..=MAX_BREAK_MINUTES).contains(&minutes) {
            return Err(AppError::Validation(format!(
                "break duration must be {}-{} minutes",
                MIN_BREAK_MINUTES, MAX_BREAK_MINUTES
            )));
        }
        self.break_minutes = minutes;
        if !self.running && self.phase == Phase::Break {
            self.remaining_secs = self.phase_secs(Phase::Break);
        }
        Ok(())
    }

    /// Advance one second. Stopped timers do not move.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        let completed = self.phase;
        self.phase = completed.other();
        self.remaining_secs = self.phase_secs(self.phase);
        self.running = false;

        Some(TimerEvent::PhaseCompleted {
            completed,
            next: self.phase,
        })
    }
}

/// Runs a shared `FocusTimer` in the background
pub struct TimerDriver {
    timer: Arc<Mutex<FocusTimer>>,
    log: Option<FocusLog>,
    handle: Option<JoinHandle<()>>,
}

impl TimerDriver {
    pub fn new(timer: FocusTimer) -> Self {
        Self {
            timer: Arc::new(Mutex::new(timer)),
            log: None,
            handle: None,
        }
    }

    /// Record every completed focus phase in `log`
    pub fn with_log(mut self, log: FocusLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn timer(&self) -> Arc<Mutex<FocusTimer>> {
        self.timer.clone()
    }

    /// Start counting down. Events go to `events` until the phase ends or
    /// the driver is paused.
    pub async fn start(&mut self, events: mpsc::Sender<TimerEvent>) {
        self.stop_task();
        self.timer.lock().await.start();

        let timer = self.timer.clone();
        let log = self.log.clone();

        self.handle = Some(tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = interval_at(Instant::now() + period, period);

            loop {
                interval.tick().await;

                let (event, running) = {
                    let mut timer = timer.lock().await;
                    (timer.tick(), timer.is_running())
                };

                if let Some(event) = event {
                    let TimerEvent::PhaseCompleted { completed, .. } = event;
                    tracing::info!("{:?} phase completed", completed);

                    if completed == Phase::Focus {
                        if let Some(log) = &log {
                            if let Err(e) = log.record_session(Local::now().date_naive()).await {
                                tracing::error!("Failed to record focus session: {}", e);
                            }
                        }
                    }

                    if events.send(event).await.is_err() {
                        tracing::debug!("Timer event receiver dropped");
                    }
                }

                if !running {
                    break;
                }
            }
        }));
    }

    pub async fn pause(&mut self) {
        self.stop_task();
        self.timer.lock().await.pause();
    }

    pub async fn reset(&mut self) {
        self.stop_task();
        self.timer.lock().await.reset();
    }

    /// True while the countdown task is alive
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn stop_task(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.stop_task();
    }
}

/// History of completed focus phases, shared by all users of the device
#[derive(Clone)]
pub struct FocusLog {
    store: RecordStore,
}

impl FocusLog {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn sessions_key() -> Result<StorageKey> {
        StorageKey::global(Collection::FocusSessions)
    }

    fn total_key() -> Result<StorageKey> {
        StorageKey::global(Collection::FocusTotal)
    }

    /// Append a session for `date` and credit the running total.
    /// Returns the new total in minutes.
    pub async fn record_session(&self, date: NaiveDate) -> Result<u32> {
        let total = self
            .store
            .modify_pair(
                &Self::sessions_key()?,
                &Self::total_key()?,
                |sessions: &mut Option<Vec<FocusSession>>, total: &mut Option<u32>| {
                    sessions.get_or_insert_with(Vec::new).push(FocusSession { date });
                    let minutes = total.unwrap_or(0) + FOCUS_SESSION_CREDIT_MINUTES;
                    *total = Some(minutes);
                    Ok(minutes)
                },
            )
            .await?;

        tracing::info!("Focus session recorded, {} minutes in total", total);
        Ok(total)
    }

    pub async fn sessions(&self) -> Result<Vec<FocusSession>> {
        self.store.load_list(&Self::sessions_key()?).await
    }

    pub async fn count_on(&self, date: NaiveDate) -> Result<usize> {
        let sessions = self.sessions().await?;
        Ok(sessions.iter().filter(|s| s.date == date).count())
    }

    pub async fn today_count(&self) -> Result<usize> {
        self.count_on(Local::now().date_naive()).await
    }

    pub async fn total_minutes(&self) -> Result<u32> {
        Ok(self.store.load(&Self::total_key()?).await?.unwrap_or(0))
    }
}
