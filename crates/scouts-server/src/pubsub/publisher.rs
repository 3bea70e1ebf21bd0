use crate::pubsub::ConcurrentQueue;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Subscriber<T> {
    queue: Arc<ConcurrentQueue<T>>,
    cancel: CancellationToken,
}

/// Fans events out to a set of subscriber queues.
///
/// A publish to a live subscriber is never dropped. Unsubscribing fires the
/// subscriber's cancellation token, which unblocks any in-flight delivery to
/// it; losing events on a cancelled subscription is permitted. Event order
/// within one publish call is preserved per subscriber.
pub struct Publisher<T> {
    subscribers: DashMap<u64, Subscriber<T>>,
}

impl<T: Clone + Send + 'static> Publisher<T> {
    /// Create a publisher with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Register a subscriber queue.
    pub fn subscribe(&self, queue: Arc<ConcurrentQueue<T>>) {
        self.subscribers.insert(
            queue.id(),
            Subscriber {
                queue,
                cancel: CancellationToken::new(),
            },
        );
    }

    /// Remove a subscriber and cancel any delivery pending on it.
    pub fn unsubscribe(&self, queue: &ConcurrentQueue<T>) {
        if let Some((_, sub)) = self.subscribers.remove(&queue.id()) {
            sub.cancel.cancel();
        }
    }

    /// Snapshot of the current subscriber queues.
    #[must_use]
    pub fn subscribers(&self) -> Vec<Arc<ConcurrentQueue<T>>> {
        self.subscribers
            .iter()
            .map(|entry| Arc::clone(&entry.queue))
            .collect()
    }

    /// Deliver the events, in order, to every subscriber. Delivery to a
    /// subscriber stops early if it unsubscribes mid-publish; other
    /// subscribers are unaffected.
    pub async fn publish(&self, events: &[T]) {
        let subscribers: Vec<(Arc<ConcurrentQueue<T>>, CancellationToken)> = self
            .subscribers
            .iter()
            .map(|entry| (Arc::clone(&entry.queue), entry.cancel.clone()))
            .collect();

        for (queue, cancel) in subscribers {
            for event in events {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    pushed = queue.push(event.clone()) => {
                        if !pushed {
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<T: Clone + Send + 'static> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let publisher = Publisher::new();
        let (q1, mut out1) = ConcurrentQueue::new();
        let (q2, mut out2) = ConcurrentQueue::new();
        let (q1, q2) = (Arc::new(q1), Arc::new(q2));
        q1.start();
        q2.start();
        publisher.subscribe(Arc::clone(&q1));
        publisher.subscribe(Arc::clone(&q2));

        publisher.publish(&[1, 2, 3]).await;
        publisher.publish(&[4]).await;

        for out in [&mut out1, &mut out2] {
            for want in 1..=4 {
                assert_eq!(out.recv().await, Some(want));
            }
        }
    }

    #[tokio::test]
    async fn unsubscribed_queue_receives_nothing_further() {
        let publisher = Publisher::new();
        let (q1, mut out1) = ConcurrentQueue::new();
        let (q2, mut out2) = ConcurrentQueue::new();
        let (q1, q2) = (Arc::new(q1), Arc::new(q2));
        q1.start();
        q2.start();
        publisher.subscribe(Arc::clone(&q1));
        publisher.subscribe(Arc::clone(&q2));

        publisher.publish(&[1]).await;
        publisher.unsubscribe(&q1);
        publisher.publish(&[2]).await;

        assert_eq!(out1.recv().await, Some(1));
        q1.close();
        assert_eq!(out1.recv().await, None);

        assert_eq!(out2.recv().await, Some(1));
        assert_eq!(out2.recv().await, Some(2));
    }

    #[tokio::test]
    async fn unsubscribe_unblocks_inflight_publish() {
        let publisher: Arc<Publisher<u32>> = Arc::new(Publisher::new());
        // A queue whose mover was never started stops accepting pushes once
        // its input channel fills, so a publish to it can only finish
        // through the cancellation.
        let (q, _out) = ConcurrentQueue::new();
        let q = Arc::new(q);
        publisher.subscribe(Arc::clone(&q));

        let task = tokio::spawn({
            let publisher = Arc::clone(&publisher);
            async move { publisher.publish(&[1, 2, 3]).await }
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        publisher.unsubscribe(&q);

        tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("publish should unblock after unsubscribe")
            .unwrap();
    }
}
