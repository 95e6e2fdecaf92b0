use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore bounding how many chunks run at once.
pub struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// A held permit; released when dropped, including when the chunk bails out with an error.
pub struct Permit<'a> {
    sem: &'a Semaphore,
    waited: Duration,
}

impl Semaphore {
    /// `permits` must be non-zero; [`super::ExecutionOptions`] validation guarantees this.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    /// Acquire one permit, blocking until available.
    pub fn acquire(&self) -> Permit<'_> {
        let start = Instant::now();
        let mut waited = false;
        let mut g = self.lock();
        while *g == 0 {
            waited = true;
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        *g -= 1;
        Permit {
            sem: self,
            waited: if waited { start.elapsed() } else { Duration::ZERO },
        }
    }

    // The guarded value is a plain counter, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) {
        *self.lock() += 1;
        self.cv.notify_one();
    }
}

impl Permit<'_> {
    /// Time spent blocked before the permit was granted (zero if none).
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::Semaphore;

    #[test]
    fn dropping_a_permit_releases_it() {
        let sem = Semaphore::new(1);
        let first = sem.acquire();
        assert_eq!(first.waited(), Duration::ZERO);
        drop(first);
        let second = sem.acquire();
        assert_eq!(second.waited(), Duration::ZERO);
    }

    #[test]
    fn acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(1));
        let held = sem.acquire();

        let sem2 = Arc::clone(&sem);
        let handle = std::thread::spawn(move || {
            let permit = sem2.acquire();
            permit.waited()
        });

        std::thread::sleep(Duration::from_millis(20));
        drop(held);
        let waited = handle.join().unwrap();
        assert!(waited > Duration::ZERO);
    }
}
