//! Bounded admission queue between the upload entry point and the worker.

use crate::domain::jobs::ProcessingTask;
use crate::error::QueueError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Producer handle. Cheap to clone; the queue closes when every handle is dropped.
#[derive(Clone)]
pub struct AdmissionQueue {
    sender: mpsc::Sender<ProcessingTask>,
}

/// Consumer handle, owned by the single worker.
pub struct TaskReceiver {
    receiver: mpsc::Receiver<ProcessingTask>,
}

/// Create a FIFO queue holding at most `capacity` pending tasks.
pub fn admission_queue(capacity: usize) -> (AdmissionQueue, TaskReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (AdmissionQueue { sender }, TaskReceiver { receiver })
}

impl AdmissionQueue {
    /// Waits for capacity while the queue is full.
    pub async fn enqueue(&self, task: ProcessingTask) -> Result<(), QueueError> {
        self.sender.send(task).await.map_err(|_| QueueError::Closed)
    }

    /// Like `enqueue`, but gives up with `Interrupted` once `cancel` fires.
    pub async fn enqueue_cancellable(
        &self,
        task: ProcessingTask,
        cancel: &CancellationToken,
    ) -> Result<(), QueueError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(QueueError::Interrupted),
            sent = self.sender.send(task) => sent.map_err(|_| QueueError::Closed),
        }
    }

    /// For callers outside the async runtime. Must not be called from async code.
    pub fn blocking_enqueue(&self, task: ProcessingTask) -> Result<(), QueueError> {
        self.sender.blocking_send(task).map_err(|_| QueueError::Closed)
    }

    #[cfg(test)]
    fn remaining_capacity(&self) -> usize {
        self.sender.capacity()
    }
}

impl TaskReceiver {
    /// Next task in FIFO order, or `None` on shutdown or once all producers are gone.
    pub async fn dequeue(&mut self, shutdown: &CancellationToken) -> Option<ProcessingTask> {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            task = self.receiver.recv() => task,
        }
    }
}
