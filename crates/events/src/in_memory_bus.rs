//! Process-local fan-out of the lending audit stream.
//!
//! Every subscription owns an unbounded queue. A subscription that is never
//! drained keeps every event published after it was created; dropping it is
//! the only way to detach. Dead queues are pruned on the next publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, mpsc};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InMemoryBusError {
    /// The bus was closed; the event was not delivered to anyone.
    #[error("event bus is closed")]
    Closed,
}

#[derive(Debug)]
struct Fanout<M> {
    queues: Vec<mpsc::Sender<M>>,
    closed: bool,
}

/// In-memory audit bus shared by every lending operation of one service.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    fanout: Mutex<Fanout<M>>,
    published: AtomicU64,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while fanning out leaves the queue list intact, so a poisoned
    // lock is still safe to use.
    fn fanout(&self) -> MutexGuard<'_, Fanout<M>> {
        self.fanout.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live subscriptions as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.fanout().queues.len()
    }

    /// Events accepted since the bus was created.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Stop distributing events. Queued events stay readable; once a
    /// subscription has drained them its receive calls report disconnection.
    pub fn close(&self) {
        let mut fanout = self.fanout();
        fanout.closed = true;
        fanout.queues.clear();
        tracing::debug!(published = self.published(), "event bus closed");
    }

    pub fn is_closed(&self) -> bool {
        self.fanout().closed
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            fanout: Mutex::new(Fanout {
                queues: Vec::new(),
                closed: false,
            }),
            published: AtomicU64::new(0),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut fanout = self.fanout();
        if fanout.closed {
            return Err(InMemoryBusError::Closed);
        }
        // Held across the sends so every queue sees the same order.
        fanout.queues.retain(|queue| queue.send(message.clone()).is_ok());
        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        let mut fanout = self.fanout();
        // On a closed bus `tx` is dropped here and the subscription starts out
        // disconnected.
        if !fanout.closed {
            fanout.queues.push(tx);
        }
        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc::TryRecvError;
    use std::thread;

    use super::*;

    #[test]
    fn every_subscription_sees_the_same_order() {
        let bus = Arc::new(InMemoryEventBus::<u32>::new());
        let first = bus.subscribe();
        let second = bus.subscribe();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || {
                    for n in 0..50 {
                        bus.publish(t * 100 + n).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let seen = first.drain();
        assert_eq!(seen.len(), 200);
        assert_eq!(second.drain(), seen);
        assert_eq!(bus.published(), 200);
    }

    #[test]
    fn undrained_subscription_keeps_everything() {
        let bus = InMemoryEventBus::<u32>::new();
        let idle = bus.subscribe();
        for n in 0..10_000 {
            bus.publish(n).unwrap();
        }
        let queued = idle.drain();
        assert_eq!(queued.len(), 10_000);
        assert_eq!(queued.first(), Some(&0));
        assert_eq!(queued.last(), Some(&9_999));
    }

    #[test]
    fn dropped_subscriptions_are_pruned_on_publish() {
        let bus = InMemoryEventBus::<u32>::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(1).unwrap();

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.drain(), vec![1]);
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = InMemoryEventBus::<u32>::new();
        bus.publish(1).unwrap();
        let sub = bus.subscribe();
        assert_eq!(sub.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(bus.published(), 1);
    }

    #[test]
    fn close_ends_subscriptions_after_their_backlog() {
        let bus = InMemoryEventBus::<u32>::new();
        let sub = bus.subscribe();
        bus.publish(1).unwrap();
        bus.close();

        assert!(bus.is_closed());
        assert_eq!(bus.publish(2), Err(InMemoryBusError::Closed));
        assert_eq!(bus.published(), 1);
        assert_eq!(sub.try_recv(), Ok(1));
        assert_eq!(sub.try_recv(), Err(TryRecvError::Disconnected));

        let late = bus.subscribe();
        assert_eq!(late.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn poisoned_lock_does_not_stop_the_stream() {
        let bus = Arc::new(InMemoryEventBus::<u32>::new());
        let sub = bus.subscribe();
        let poisoner = Arc::clone(&bus);
        let _ = thread::spawn(move || {
            let _guard = poisoner.fanout.lock().unwrap();
            panic!("poison the fan-out lock");
        })
        .join();

        bus.publish(5).unwrap();
        assert_eq!(sub.drain(), vec![5]);
        assert_eq!(bus.subscriber_count(), 1);
    }
}
