//! Background loads for components
//!
//! A view never awaits storage on the event loop. It spawns the read with
//! [`BackgroundLoad::spawn`], keeps the handle, and picks the result up in
//! [`Component::poll_updates`](crate::component::Component::poll_updates)
//! once the task has woken the shell through its [`LoadWaker`].
//!
//! Dropping a handle aborts the task, so replacing a pending load with a
//! newer one discards the older result instead of letting it overwrite the
//! newer state.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tracing::trace;

/// Wakes the shell's event loop when background work finishes
#[derive(Debug, Clone, Default)]
pub struct LoadWaker(Arc<Notify>);

impl LoadWaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the loop; a signal sent while nobody waits is kept
    pub fn wake(&self) {
        self.0.notify_one();
    }

    /// Resolve at the next [`LoadWaker::wake`]
    pub async fn notified(&self) {
        self.0.notified().await;
    }
}

/// State of a [`BackgroundLoad`] when polled
#[derive(Debug, PartialEq, Eq)]
pub enum LoadPoll<T> {
    Pending,
    Ready(T),
    /// The task ended without a result (it panicked or was cancelled)
    Lost,
}

/// Handle to a spawned load whose result is collected by polling
#[derive(Debug)]
pub struct BackgroundLoad<T> {
    rx: oneshot::Receiver<T>,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> BackgroundLoad<T> {
    /// Run `future` on the runtime and wake `waker` when it completes
    pub fn spawn<F>(future: F, waker: LoadWaker) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let value = future.await;
            if tx.send(value).is_ok() {
                waker.wake();
            } else {
                trace!("Background load finished after its handle was dropped");
            }
        });
        Self { rx, handle }
    }
}

impl<T> BackgroundLoad<T> {
    /// Take the result if the task has finished
    pub fn poll(&mut self) -> LoadPoll<T> {
        match self.rx.try_recv() {
            Ok(value) => LoadPoll::Ready(value),
            Err(oneshot::error::TryRecvError::Empty) => LoadPoll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => LoadPoll::Lost,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Drop for BackgroundLoad<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_result_arrives_after_wake() {
        let waker = LoadWaker::new();
        let mut load = BackgroundLoad::spawn(async { 41 + 1 }, waker.clone());

        tokio::time::timeout(Duration::from_secs(5), waker.notified())
            .await
            .unwrap();
        assert_eq!(load.poll(), LoadPoll::Ready(42));
    }

    #[tokio::test]
    async fn test_pending_until_complete() {
        let waker = LoadWaker::new();
        let (tx, rx) = oneshot::channel::<()>();
        let mut load = BackgroundLoad::spawn(
            async move {
                let _ = rx.await;
                "done"
            },
            waker.clone(),
        );
        assert_eq!(load.poll(), LoadPoll::Pending);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), waker.notified())
            .await
            .unwrap();
        assert_eq!(load.poll(), LoadPoll::Ready("done"));
    }

    #[tokio::test]
    async fn test_panicked_task_is_lost() {
        let waker = LoadWaker::new();
        let mut load: BackgroundLoad<u8> = BackgroundLoad::spawn(
            async {
                if true {
                    panic!("boom");
                }
                0
            },
            waker,
        );
        while !load.is_finished() {
            tokio::task::yield_now().await;
        }
        assert_eq!(load.poll(), LoadPoll::Lost);
    }

    #[tokio::test]
    async fn test_dropping_handle_aborts() {
        let waker = LoadWaker::new();
        let (mut tx, rx) = oneshot::channel::<()>();
        let load = BackgroundLoad::spawn(
            async move {
                let _ = rx.await;
            },
            waker,
        );
        drop(load);
        // The receiving half goes away with the aborted task
        tokio::time::timeout(Duration::from_secs(5), tx.closed())
            .await
            .unwrap();
    }
}
