//! Bounded FIFO queues connecting the producer, the workers and the writer.
//!
//! A queue is a tokio `mpsc` channel of fixed capacity. `put` waits while the
//! queue is full, `get` waits while it is empty; nothing is ever dropped to
//! make room. The receiving half can be cloned so several workers compete for
//! the same intake queue.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};

/// A document together with its zero-based position in the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub seq: u64,
    pub tokens: Vec<String>,
}

/// What travels on a queue: a payload or the per-consumer stop signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    Item(T),
    /// No more work for the consumer that receives it.
    Stop,
}

/// Build a bounded queue named `name` holding at most `capacity` messages.
pub fn bounded<T>(name: &'static str, capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        QueueSender { name, tx },
        QueueReceiver {
            name,
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

pub struct QueueSender<T> {
    name: &'static str,
    tx: mpsc::Sender<Message<T>>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<T> QueueSender<T> {
    /// Enqueue `msg`, waiting for a free slot.
    pub async fn put(&self, msg: Message<T>) -> Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| Error::QueueClosed { queue: self.name })
    }

    pub async fn put_item(&self, item: T) -> Result<()> {
        self.put(Message::Item(item)).await
    }

    pub async fn put_stop(&self) -> Result<()> {
        self.put(Message::Stop).await
    }

    /// Messages currently buffered.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub struct QueueReceiver<T> {
    name: &'static str,
    rx: Arc<Mutex<mpsc::Receiver<Message<T>>>>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Dequeue the next message, waiting while the queue is empty.
    ///
    /// Returns `None` once every sender is gone and the buffer is drained.
    pub async fn get(&self) -> Option<Message<T>> {
        self.rx.lock().await.recv().await
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn fifo_within_a_queue() {
        let (tx, rx) = bounded::<u32>("test", 4);
        for i in 0..4 {
            tx.put_item(i).await.unwrap();
        }
        for i in 0..4 {
            assert_eq!(rx.get().await, Some(Message::Item(i)));
        }
        tx.put_stop().await.unwrap();
        assert_eq!(rx.get().await, Some(Message::Stop));
    }

    #[tokio::test]
    async fn put_blocks_when_full() {
        let (tx, rx) = bounded::<u32>("test", 3);
        let pushed = Arc::new(AtomicUsize::new(0));

        let producer = {
            let pushed = pushed.clone();
            tokio::spawn(async move {
                for i in 0..100 {
                    tx.put_item(i).await.unwrap();
                    pushed.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pushed.load(Ordering::SeqCst), 3);

        for _ in 0..100 {
            assert!(matches!(rx.get().await, Some(Message::Item(_))));
        }
        producer.await.unwrap();
        assert_eq!(pushed.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn put_fails_once_receivers_are_gone() {
        let (tx, rx) = bounded::<u32>("outtake", 1);
        drop(rx);
        let err = tx.put_item(1).await.unwrap_err();
        assert!(matches!(err, Error::QueueClosed { queue: "outtake" }));
    }

    #[tokio::test]
    async fn get_returns_none_when_senders_are_gone() {
        let (tx, rx) = bounded::<u32>("intake", 2);
        tx.put_item(7).await.unwrap();
        drop(tx);
        assert_eq!(rx.get().await, Some(Message::Item(7)));
        assert_eq!(rx.get().await, None);
    }

    #[tokio::test]
    async fn len_tracks_buffered_messages() {
        let (tx, rx) = bounded::<u32>("test", 5);
        assert!(tx.is_empty());
        tx.put_item(1).await.unwrap();
        tx.put_stop().await.unwrap();
        assert_eq!(tx.len(), 2);
        assert_eq!(tx.capacity(), 5);
        rx.get().await;
        assert_eq!(tx.len(), 1);
    }
}
