//! Round timing for Scribble rooms.
//!
//! A [`RoundScheduler`] drives two kinds of timer for one room: the
//! once-per-interval countdown of an active round, and the one-shot
//! intermission between rounds. It never runs on its own task; the room
//! actor awaits [`RoundScheduler::wait`] as one branch of its `select!` loop,
//! so every timer firing is serialized with the room's other commands.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = cmd_rx.recv() => { /* handle commands */ }
//!         event = room.scheduler.wait() => {
//!             let outbox = room.on_timer(event);
//!             dispatch(outbox);
//!         }
//!     }
//! }
//! ```
//!
//! # Cancellation
//!
//! `wait` only mutates the scheduler after its sleep completes, so dropping
//! the future mid-sleep (which `select!` does whenever another branch wins)
//! loses nothing. [`RoundScheduler::cancel`] is synchronous: once it returns,
//! the next `wait` pends forever until a new countdown or intermission is
//! started.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What a completed [`RoundScheduler::wait`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One countdown interval elapsed. `time_left` is the remaining time in
    /// seconds after the decrement; `0` means the round has expired and the
    /// scheduler is idle again.
    Tick { time_left: u32 },
    /// The between-round delay is over.
    IntermissionElapsed,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Countdown ticks delivered.
    pub ticks: u64,
    /// Countdowns that ran all the way to zero.
    pub expirations: u64,
    /// Intermissions that elapsed.
    pub intermissions: u64,
    /// Timers cancelled before they finished.
    pub cancellations: u64,
    /// Ticks that woke up more than a full interval late.
    pub overruns: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Countdown { time_left: u32, next_tick: Instant },
    Intermission { until: Instant },
}

/// Countdown and intermission timer owned by a single room.
#[derive(Debug)]
pub struct RoundScheduler {
    tick_interval: Duration,
    phase: Phase,
    generation: u64,
    stats: SchedulerStats,
}

impl RoundScheduler {
    /// Creates an idle scheduler that ticks every `tick_interval` while a
    /// countdown runs.
    ///
    /// A zero interval is replaced by one second.
    pub fn new(tick_interval: Duration) -> Self {
        let tick_interval = if tick_interval.is_zero() {
            warn!("tick interval of zero requested, using 1s");
            Duration::from_secs(1)
        } else {
            tick_interval
        };
        Self {
            tick_interval,
            phase: Phase::Idle,
            generation: 0,
            stats: SchedulerStats::default(),
        }
    }

    /// Starts a countdown of `secs` ticks, replacing whatever was running.
    ///
    /// A countdown of zero is not started; the scheduler stays idle.
    pub fn start_countdown(&mut self, secs: u32) {
        self.supersede();
        if secs == 0 {
            debug!(generation = self.generation, "zero-length countdown ignored");
            return;
        }
        self.phase = Phase::Countdown {
            time_left: secs,
            next_tick: Instant::now() + self.tick_interval,
        };
        debug!(generation = self.generation, secs, "countdown started");
    }

    /// Starts the one-shot between-round delay, replacing whatever was running.
    pub fn start_intermission(&mut self, delay: Duration) {
        self.supersede();
        self.phase = Phase::Intermission {
            until: Instant::now() + delay,
        };
        debug!(
            generation = self.generation,
            delay_ms = delay.as_millis() as u64,
            "intermission started"
        );
    }

    /// Stops any running timer. Returns `true` if something was cancelled.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.phase, Phase::Idle) {
            return false;
        }
        self.phase = Phase::Idle;
        self.stats.cancellations += 1;
        debug!(generation = self.generation, "timer cancelled");
        true
    }

    /// Waits for the next timer event.
    ///
    /// Pends forever while idle, which keeps a `select!` loop parked on its
    /// other branches.
    pub async fn wait(&mut self) -> TimerEvent {
        match self.phase {
            Phase::Idle => std::future::pending::<TimerEvent>().await,
            Phase::Countdown {
                time_left,
                next_tick,
            } => {
                time::sleep_until(next_tick).await;
                self.on_tick(time_left, next_tick)
            }
            Phase::Intermission { until } => {
                time::sleep_until(until).await;
                self.phase = Phase::Idle;
                self.stats.intermissions += 1;
                trace!(generation = self.generation, "intermission elapsed");
                TimerEvent::IntermissionElapsed
            }
        }
    }

    fn on_tick(&mut self, time_left: u32, scheduled: Instant) -> TimerEvent {
        let now = Instant::now();
        let late_by = now.saturating_duration_since(scheduled);
        if late_by > self.tick_interval {
            self.stats.overruns += 1;
            warn!(
                generation = self.generation,
                late_ms = late_by.as_millis() as u64,
                "countdown tick late, rescheduling from now"
            );
        }

        let time_left = time_left.saturating_sub(1);
        self.stats.ticks += 1;
        if time_left == 0 {
            self.phase = Phase::Idle;
            self.stats.expirations += 1;
            debug!(generation = self.generation, "countdown expired");
        } else {
            // Schedule from now rather than from the missed deadline so a
            // stalled actor never bursts ticks.
            let base = if late_by > self.tick_interval {
                now
            } else {
                scheduled
            };
            self.phase = Phase::Countdown {
                time_left,
                next_tick: base + self.tick_interval,
            };
        }
        trace!(generation = self.generation, time_left, "countdown tick");
        TimerEvent::Tick { time_left }
    }

    fn supersede(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            self.stats.cancellations += 1;
        }
        self.generation += 1;
    }

    /// Seconds remaining in the running countdown, `0` when none is running.
    pub fn time_left(&self) -> u32 {
        match self.phase {
            Phase::Countdown { time_left, .. } => time_left,
            _ => 0,
        }
    }

    /// Whether no timer is running.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Whether a round countdown is running.
    pub fn is_counting_down(&self) -> bool {
        matches!(self.phase, Phase::Countdown { .. })
    }

    /// Whether the between-round delay is running.
    pub fn in_intermission(&self) -> bool {
        matches!(self.phase, Phase::Intermission { .. })
    }

    /// Number of timers started so far. Bumped on every start.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The configured countdown interval.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Snapshot of the diagnostic counters.
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }
}

impl Default for RoundScheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
