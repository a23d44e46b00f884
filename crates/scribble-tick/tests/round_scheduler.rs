//! Integration tests for the round scheduler.
//!
//! Every test runs on Tokio's paused clock, so sleeps resolve as soon as the
//! runtime has nothing else to do and elapsed time is exact.

use std::time::Duration;

use scribble_tick::{RoundScheduler, TimerEvent};
use tokio::time::{self, Instant};

// =========================================================================
// Helpers
// =========================================================================

/// Returns `true` if `wait` resolves within `within`.
async fn fires_within(s: &mut RoundScheduler, within: Duration) -> bool {
    time::timeout(within, s.wait()).await.is_ok()
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_once_per_second_down_to_zero() {
    let mut s = RoundScheduler::new(Duration::from_secs(1));
    let start = Instant::now();
    s.start_countdown(3);

    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 2 });
    assert_eq!(start.elapsed(), Duration::from_secs(1));
    assert_eq!(s.time_left(), 2);

    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 1 });
    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 0 });
    assert_eq!(start.elapsed(), Duration::from_secs(3));

    assert!(s.is_idle(), "expired countdown idles itself");
    assert_eq!(s.stats().ticks, 3);
    assert_eq!(s.stats().expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_full_round_takes_sixty_ticks() {
    let mut s = RoundScheduler::default();
    let start = Instant::now();
    s.start_countdown(60);

    let mut ticks = 0;
    loop {
        match s.wait().await {
            TimerEvent::Tick { time_left } => {
                ticks += 1;
                assert_eq!(time_left, 60 - ticks);
                if time_left == 0 {
                    break;
                }
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(ticks, 60);
    assert_eq!(start.elapsed(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_idle_scheduler_never_fires() {
    let mut s = RoundScheduler::default();
    assert!(!fires_within(&mut s, Duration::from_secs(3600)).await);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancelled_countdown_never_fires() {
    let mut s = RoundScheduler::default();
    s.start_countdown(60);
    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 59 });

    assert!(s.cancel());
    assert!(s.is_idle());
    assert_eq!(s.time_left(), 0);
    assert!(!fires_within(&mut s, Duration::from_secs(120)).await);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_loses_no_state() {
    let mut s = RoundScheduler::default();
    s.start_countdown(10);

    // Abandon a wait half-way through the interval, as select! does when
    // another branch wins.
    assert!(!fires_within(&mut s, Duration::from_millis(500)).await);
    assert_eq!(s.time_left(), 10);

    let before = Instant::now();
    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 9 });
    assert_eq!(before.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_intermission_never_fires() {
    let mut s = RoundScheduler::default();
    s.start_intermission(Duration::from_secs(5));
    assert!(s.cancel());
    assert!(!fires_within(&mut s, Duration::from_secs(60)).await);
    assert_eq!(s.stats().intermissions, 0);
}

// =========================================================================
// Intermission
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_intermission_fires_once_after_delay() {
    let mut s = RoundScheduler::default();
    let start = Instant::now();
    s.start_intermission(Duration::from_secs(5));

    assert_eq!(s.wait().await, TimerEvent::IntermissionElapsed);
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert!(s.is_idle());
    assert!(!fires_within(&mut s, Duration::from_secs(60)).await);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_replaces_intermission() {
    let mut s = RoundScheduler::default();
    s.start_intermission(Duration::from_secs(5));
    s.start_countdown(2);

    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 1 });
    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 0 });
    assert!(!fires_within(&mut s, Duration::from_secs(10)).await);
}

// =========================================================================
// Generation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_restart_bumps_generation_and_resets_time() {
    let mut s = RoundScheduler::default();
    s.start_countdown(60);
    s.wait().await;
    s.wait().await;
    assert_eq!(s.time_left(), 58);

    s.start_countdown(60);
    assert_eq!(s.generation(), 2);
    assert_eq!(s.time_left(), 60);
    assert_eq!(s.wait().await, TimerEvent::Tick { time_left: 59 });
}
