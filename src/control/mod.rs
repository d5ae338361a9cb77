//! Control Channel
//!
//! Delivers control messages to the worker over a tokio channel and routes
//! each reply back to its sender.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{Result, WorkerError};
use crate::models::{ControlMessage, ControlReply};
use crate::worker::Worker;

/// A message in flight, with the port its reply goes to.
#[derive(Debug)]
struct Envelope {
    message: ControlMessage,
    reply: Option<oneshot::Sender<ControlReply>>,
}

/// Sending side of the control channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ControlHandle {
    /// Sends `message` and waits for its reply, if it expects one.
    pub async fn send(&self, message: ControlMessage) -> Result<Option<ControlReply>> {
        if !message.expects_reply() {
            self.tx
                .send(Envelope {
                    message,
                    reply: None,
                })
                .await
                .map_err(|_| WorkerError::ChannelClosed)?;
            return Ok(None);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                message,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| WorkerError::ChannelClosed)?;

        reply_rx
            .await
            .map(Some)
            .map_err(|_| WorkerError::ChannelClosed)
    }
}

/// Spawns the task that applies control messages to `worker`, one at a time
/// in arrival order.
///
/// # Returns
/// The handle clients send through, and the task's JoinHandle. The task ends
/// once every ControlHandle has been dropped.
pub fn spawn_control_task(worker: Arc<Worker>, capacity: usize) -> (ControlHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(capacity.max(1));

    let handle = tokio::spawn(async move {
        info!("Control channel open for cache version {}", worker.version());

        while let Some(Envelope { message, reply }) = rx.recv().await {
            let kind = message.kind();
            let response = worker.handle_message(message).await;

            match (reply, response) {
                (Some(port), Some(response)) => {
                    if port.send(response).is_err() {
                        debug!("Reply to {} dropped: sender went away", kind);
                    }
                }
                (Some(_), None) => debug!("{} produced no reply", kind),
                (None, _) => debug!("Handled {}", kind),
            }
        }

        info!("Control channel closed");
    });

    (ControlHandle { tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStorage;
    use crate::config::Config;
    use crate::network::StubFetcher;
    use crate::worker::WorkerState;

    fn worker() -> Arc<Worker> {
        let config = Config {
            cache_version: "v9".to_string(),
            precache_manifest: Vec::new(),
            ..Config::default()
        };
        Arc::new(Worker::new(
            config,
            CacheStorage::new(None).shared(),
            Arc::new(StubFetcher::new()),
        ))
    }

    #[tokio::test]
    async fn test_reply_is_routed_back() {
        let (control, _task) = spawn_control_task(worker(), 8);

        let reply = control.send(ControlMessage::GetVersion).await.unwrap();
        assert_eq!(reply, Some(ControlReply::version("v9")));
    }

    #[tokio::test]
    async fn test_skip_waiting_gets_no_reply() {
        let worker = worker();
        worker.install().await.unwrap();
        let (control, _task) = spawn_control_task(worker.clone(), 8);

        let reply = control.send(ControlMessage::SkipWaiting).await.unwrap();
        assert!(reply.is_none());

        // Messages are handled in order; a later reply proves skip-waiting ran
        control.send(ControlMessage::GetVersion).await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Active);
    }

    #[tokio::test]
    async fn test_concurrent_senders_each_get_one_reply() {
        let (control, _task) = spawn_control_task(worker(), 2);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let control = control.clone();
            handles.push(tokio::spawn(async move {
                control.send(ControlMessage::GetCacheStats).await
            }));
        }

        for handle in handles {
            let reply = handle.await.unwrap().unwrap();
            assert!(matches!(reply, Some(ControlReply::CacheStats(ref s)) if s.len() == 4));
        }
    }

    #[tokio::test]
    async fn test_task_ends_when_handles_dropped() {
        let (control, task) = spawn_control_task(worker(), 1);
        drop(control);

        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("control task exits")
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_after_task_abort_is_channel_closed() {
        let (control, task) = spawn_control_task(worker(), 1);
        task.abort();
        let _ = task.await;

        let result = control.send(ControlMessage::GetVersion).await;
        assert!(matches!(result, Err(WorkerError::ChannelClosed)));
    }
}
