//! Liveness keep-alive against the remote dialog process.
//!
//! The worker fires on an adaptive period derived from the remote's own
//! timeout window. A missed beat means the remote is presumed dead and the
//! session is cancelled; dropping the handle stops the worker on every
//! exit path.

use std::{sync::mpsc, thread, time::Duration};

/// Firing period for a remote-reported interval in milliseconds.
///
/// `clamp(interval / 1.5, 1000, interval - 5000)` keeps the beat well
/// inside the remote's window without firing more than once per second.
/// Intervals under 6000 ms would invert the clamp, so they disable the
/// heartbeat entirely; the session stays usable without liveness detection.
pub(crate) fn period(interval_ms: i32) -> Option<Duration> {
    if interval_ms < 6000 {
        return None;
    }
    let interval = u64::try_from(interval_ms).ok()?;
    let target = interval * 2 / 3;
    Some(Duration::from_millis(target.clamp(1000, interval - 5000)))
}

/// Owner of the worker. Dropping it disconnects the channel the worker
/// sleeps on, which ends the loop.
pub(crate) struct HeartbeatHandle {
    _stop: mpsc::Sender<()>,
}

pub(crate) fn spawn<B, L>(period: Duration, mut beat: B, on_lost: L) -> HeartbeatHandle
where
    B: FnMut() -> bool + Send + 'static,
    L: FnOnce() + Send + 'static,
{
    let (stop, ticks) = mpsc::channel::<()>();
    let worker = thread::Builder::new()
        .name("filedialog-heartbeat".into())
        .spawn(move || {
            let mut on_lost = Some(on_lost);
            loop {
                match ticks.recv_timeout(period) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if !beat() {
                            tracing::warn!("remote dialog missed a heartbeat, cancelling session");
                            if let Some(lost) = on_lost.take() {
                                lost();
                            }
                            break;
                        }
                    }
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });
    if let Err(e) = worker {
        tracing::warn!("could not start heartbeat worker: {e}");
    }
    HeartbeatHandle { _stop: stop }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    #[test]
    fn period_tracks_the_reported_interval() {
        assert_eq!(period(12000), Some(Duration::from_millis(7000)));
        assert_eq!(period(30000), Some(Duration::from_millis(20000)));
        assert_eq!(period(120_000), Some(Duration::from_millis(80000)));
    }

    #[test]
    fn period_never_drops_below_one_second() {
        assert_eq!(period(6000), Some(Duration::from_millis(1000)));
        assert_eq!(period(7000), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn small_intervals_disable_the_heartbeat() {
        assert_eq!(period(5999), None);
        assert_eq!(period(0), None);
        assert_eq!(period(-1), None);
    }

    #[test]
    fn failing_beat_fires_lost_once_and_stops() {
        let beats = Arc::new(AtomicUsize::new(0));
        let lost = Arc::new(AtomicUsize::new(0));
        let handle = {
            let beats = Arc::clone(&beats);
            let lost = Arc::clone(&lost);
            spawn(
                Duration::from_millis(10),
                move || beats.fetch_add(1, Ordering::SeqCst) < 2,
                move || {
                    lost.fetch_add(1, Ordering::SeqCst);
                },
            )
        };
        thread::sleep(Duration::from_millis(300));
        assert_eq!(lost.load(Ordering::SeqCst), 1);
        assert_eq!(beats.load(Ordering::SeqCst), 3);
        drop(handle);
    }

    #[test]
    fn dropping_the_handle_stops_the_worker() {
        let beats = Arc::new(AtomicUsize::new(0));
        let handle = {
            let beats = Arc::clone(&beats);
            spawn(
                Duration::from_millis(10),
                move || {
                    beats.fetch_add(1, Ordering::SeqCst);
                    true
                },
                || {},
            )
        };
        thread::sleep(Duration::from_millis(100));
        drop(handle);
        thread::sleep(Duration::from_millis(50));
        let settled = beats.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(beats.load(Ordering::SeqCst), settled);
    }
}
