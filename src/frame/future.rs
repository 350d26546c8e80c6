// Copyright 2026 @lucent

use std::sync::{Arc, Condvar, Mutex};

pub(crate) struct FutureInner {
    done: Mutex<bool>,
    cv: Condvar,
}

impl FutureInner {
    pub(crate) fn complete(&self) {
        if let Ok(mut done) = self.done.lock() {
            *done = true;
        }
        self.cv.notify_all();
    }
}

/// Handle to one in-flight launch. The only things a caller can do with it
/// are block until the launch finishes or poll whether it already has.
pub struct RenderFuture {
    inner: Arc<FutureInner>,
}

impl RenderFuture {
    pub(crate) fn pending() -> (Self, Arc<FutureInner>) {
        let inner = Arc::new(FutureInner {
            done: Mutex::new(false),
            cv: Condvar::new(),
        });
        (Self { inner: inner.clone() }, inner)
    }

    /// Already-finished future, for renders that were no-ops.
    pub(crate) fn completed() -> Self {
        let (future, inner) = Self::pending();
        inner.complete();
        future
    }

    pub fn ready(&self) -> bool {
        self.inner.done.lock().map(|done| *done).unwrap_or(true)
    }

    pub fn wait(&self) {
        let mut done = match self.inner.done.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        while !*done {
            done = match self.inner.cv.wait(done) {
                Ok(guard) => guard,
                Err(_) => return,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_completed_future_is_ready() {
        let future = RenderFuture::completed();
        assert!(future.ready());
        future.wait();
    }

    #[test]
    fn test_wait_blocks_until_complete() {
        let (future, inner) = RenderFuture::pending();
        assert!(!future.ready());

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            inner.complete();
        });

        future.wait();
        assert!(future.ready());
        worker.join().expect("worker");
    }
}
