use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::Operation;

/// A progress update handed to the caller's callback.
#[derive(Debug, Clone)]
pub struct Progress {
    pub operation: Operation,
    pub completed: u64,
    pub total: u64,
    pub percent: f64,
    /// `None` until the first file has completed.
    pub eta: Option<Duration>,
}

/// Type alias for progress callback. The callback may borrow from the caller.
pub type ProgressCallback<'a> = dyn Fn(&Progress) + Send + Sync + 'a;

/// Per-run counters shared by the workers. Advisory only.
#[derive(Debug)]
pub struct ProgressState {
    total: u64,
    completed: AtomicU64,
    started: Instant,
}

impl ProgressState {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            completed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record one finished unit and return the new completed count.
    pub fn complete_one(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self, operation: Operation, completed: u64) -> Progress {
        let elapsed = self.started.elapsed();
        Progress {
            operation,
            completed,
            total: self.total,
            percent: percent(completed, self.total),
            eta: estimate_remaining(elapsed, completed, self.total),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

fn percent(completed: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Linear extrapolation: `elapsed / fraction - elapsed`.
pub fn estimate_remaining(elapsed: Duration, completed: u64, total: u64) -> Option<Duration> {
    if completed == 0 || total == 0 {
        return None;
    }
    let fraction = completed.min(total) as f64 / total as f64;
    let estimated_total = elapsed.as_secs_f64() / fraction;
    Some(Duration::from_secs_f64((estimated_total - elapsed.as_secs_f64()).max(0.0)))
}

/// Throttled progress reporter: emits at most every 200ms, and always on completion.
///
/// Updates that are not newer than the last one delivered for the same
/// operation are dropped, so a slow worker never rewinds the count.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last: Mutex<LastEmit>,
}

#[derive(Default)]
struct LastEmit {
    at: Option<Instant>,
    operation: Option<Operation>,
    completed: u64,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last: Mutex::new(LastEmit::default()),
        }
    }

    pub fn report(&self, progress: &Progress) {
        let Ok(mut last) = self.last.lock() else {
            return;
        };

        let same_operation = last.operation == Some(progress.operation);
        if same_operation && last.at.is_some() && progress.completed <= last.completed {
            return;
        }
        let is_done = progress.completed >= progress.total;
        if !is_done && same_operation && last.at.is_some_and(|t| t.elapsed() < Duration::from_millis(200)) {
            return;
        }

        *last = LastEmit {
            at: Some(Instant::now()),
            operation: Some(progress.operation),
            completed: progress.completed,
        };
        // delivered under the lock so updates reach the callback in order
        (self.inner)(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_eta_undefined_before_first_completion() {
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0, 10), None);
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0, 0), None);
    }

    #[test]
    fn test_eta_extrapolates_linearly() {
        let eta = estimate_remaining(Duration::from_secs(10), 1, 4).unwrap();
        assert_eq!(eta.as_secs(), 30);
        let eta = estimate_remaining(Duration::from_secs(10), 4, 4).unwrap();
        assert_eq!(eta, Duration::ZERO);
    }

    #[test]
    fn test_counter_and_snapshot() {
        let state = ProgressState::new(2);
        let first = state.snapshot(Operation::DirectoryCopy, 0);
        assert_eq!(first.percent, 0.0);
        assert!(first.eta.is_none());

        assert_eq!(state.complete_one(), 1);
        assert_eq!(state.complete_one(), 2);
        let last = state.snapshot(Operation::DirectoryCopy, 2);
        assert_eq!(last.percent, 100.0);
    }

    #[test]
    fn test_throttle_always_delivers_final_update() {
        let calls = AtomicUsize::new(0);
        let cb = |_: &Progress| {
            calls.fetch_add(1, Ordering::SeqCst);
        };
        let tp = ThrottledProgress::new(&cb);
        let state = ProgressState::new(3);

        // first update passes, the second is inside the 200ms window
        tp.report(&state.snapshot(Operation::ExifReduction, 1));
        tp.report(&state.snapshot(Operation::ExifReduction, 2));
        tp.report(&state.snapshot(Operation::ExifReduction, 3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_late_update_never_rewinds_the_count() {
        let seen = Mutex::new(Vec::new());
        let cb = |p: &Progress| seen.lock().unwrap().push((p.operation, p.completed));
        let tp = ThrottledProgress::new(&cb);
        let state = ProgressState::new(3);

        tp.report(&state.snapshot(Operation::FolderStructure, 3));
        std::thread::sleep(Duration::from_millis(250));
        // a worker that finished earlier reports after the final update
        tp.report(&state.snapshot(Operation::FolderStructure, 2));
        assert_eq!(*seen.lock().unwrap(), vec![(Operation::FolderStructure, 3)]);

        // the next operation starts counting again
        tp.report(&state.snapshot(Operation::ExifReduction, 0));
        assert_eq!(seen.lock().unwrap().last(), Some(&(Operation::ExifReduction, 0)));
    }
}
