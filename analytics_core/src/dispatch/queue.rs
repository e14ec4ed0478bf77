/**
 * The event queue shared between producers and dispatchers.
 *
 * Dispatchers only need two things from a queue: a non-blocking emptiness
 * check and a pop. `Queue` captures exactly that, so any thread-safe FIFO
 * can feed a dispatcher. `ChannelQueue` is the bounded crossbeam channel
 * the client uses.
 */
use crossbeam_channel::{Receiver, Sender, TrySendError};

/**
 * Consumer side of a thread-safe FIFO.
 *
 * `pop` is only called right after `is_empty` returned `false`, but when
 * several dispatchers share one queue another consumer may win the race,
 * hence the `Option`. It must never block.
 */
pub trait Queue<E>: Send + Sync {
    fn is_empty(&self) -> bool;
    fn pop(&self) -> Option<E>;
}

impl<E: Send> Queue<E> for Receiver<E> {
    fn is_empty(&self) -> bool {
        Receiver::is_empty(self)
    }

    fn pop(&self) -> Option<E> {
        self.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// ChannelQueue
// ---------------------------------------------------------------------------

/**
 * Bounded MPMC queue holding both ends of a crossbeam channel.
 *
 * Because the queue owns its own sender and receiver the channel can never
 * disconnect; the only push failure is a full queue.
 */
pub struct ChannelQueue<E> {
    sender: Sender<E>,
    receiver: Receiver<E>,
}

impl<E> ChannelQueue<E> {
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self { sender, receiver }
    }

    /**
     * Non-blocking enqueue.
     *
     * # Returns
     * `Err(event)` handing the event back when the queue is full.
     */
    pub fn try_push(&self, event: E) -> Result<(), E> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event) | TrySendError::Disconnected(event)) => Err(event),
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.receiver.capacity()
    }
}

impl<E: Send> Queue<E> for ChannelQueue<E> {
    fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    fn pop(&self) -> Option<E> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = ChannelQueue::bounded(4);
        for n in 1..=3 {
            queue.try_push(n).unwrap();
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert!(Queue::is_empty(&queue));
        assert_eq!(queue.pop(), None);
    }

    /**
     * A full queue hands the event back instead of blocking.
     */
    #[test]
    fn test_full_queue_rejects() {
        let queue = ChannelQueue::bounded(1);
        queue.try_push("a").unwrap();
        assert_eq!(queue.try_push("b"), Err("b"));
        assert_eq!(queue.capacity(), Some(1));
    }

    #[test]
    fn test_receiver_as_queue() {
        let (tx, rx) = crossbeam_channel::unbounded();
        assert!(Queue::is_empty(&rx));
        tx.send(7).unwrap();
        assert!(!Queue::is_empty(&rx));
        assert_eq!(Queue::pop(&rx), Some(7));
    }
}
