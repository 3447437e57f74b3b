use ringbuffer::{AllocRingBuffer, RingBuffer};
use thiserror::Error;

use std::sync::{Arc, Condvar, Mutex};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("The channel was closed (no sender)")]
    Closed,

    #[error("No data available in channel")]
    Empty,
}

/// Single-producer, multi-subscriber broadcast channel where every receiver
/// owns its own ring buffer. When a receiver's buffer is full, the oldest
/// element is overwritten, so a capacity of one behaves as a latest-value
/// mailbox.
#[derive(Debug)]
pub struct Channel<T> {
    inner: Mutex<ChannelInner<T>>,
}

#[derive(Debug)]
struct ChannelInner<T> {
    receivers: Vec<(usize, Arc<ReceiverShared<T>>)>,
    counter: usize,
    is_closed: bool,
}

impl<T: Clone> Channel<T> {
    fn write(&self, data: T) {
        let receivers = &self.inner.lock().unwrap().receivers;

        for (_, receiver) in receivers.iter() {
            receiver.write(data.clone());
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(ChannelInner {
                receivers: vec![],
                counter: 0usize,
                is_closed: false,
            }),
        }
    }
}

impl<T> Channel<T> {
    pub fn add_receiver(capacity: usize, this: &Arc<Channel<T>>) -> Receiver<T> {
        let mut inner = this.inner.lock().unwrap();

        let index = inner.counter;
        inner.counter += 1;

        let shared = Arc::new(ReceiverShared::<T>::new(capacity, inner.is_closed));

        inner.receivers.push((index, shared.clone()));

        Receiver {
            shared,
            channel_index: index,
            capacity,
            channel: this.clone(),
        }
    }

    fn remove_receiver(&self, index: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.receivers.retain(|(i, _)| *i != index);
    }

    fn close(&self) {
        let mut inner = self.inner.lock().unwrap();

        inner.is_closed = true;

        for (_, recv) in inner.receivers.iter() {
            recv.inner.lock().unwrap().closed = true;
            recv.cv.notify_one();
        }
    }

    #[allow(dead_code)]
    fn num_receivers(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.receivers.len()
    }
}

#[derive(Debug)]
pub struct Receiver<T> {
    shared: Arc<ReceiverShared<T>>,
    channel_index: usize,
    capacity: usize,
    channel: Arc<Channel<T>>,
}

#[derive(Debug)]
struct ReceiverShared<T> {
    inner: Mutex<ReceiverInner<T>>,
    cv: Condvar,
}

#[derive(Debug)]
struct ReceiverInner<T> {
    buf: AllocRingBuffer<T>,
    closed: bool,
}

impl<T> ReceiverShared<T> {
    fn new(capacity: usize, closed: bool) -> Self {
        Self {
            inner: Mutex::new(ReceiverInner {
                buf: AllocRingBuffer::new(capacity),
                closed,
            }),
            cv: Condvar::default(),
        }
    }

    fn write(&self, data: T) {
        let mut inner = self.inner.lock().unwrap();
        inner.buf.push(data);

        self.cv.notify_one();
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Channel::<T>::add_receiver(self.capacity, &self.channel)
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.channel.remove_receiver(self.channel_index);
    }
}

impl<T> Receiver<T> {
    /// Blocks until an element is available or the sender is dropped.
    pub fn recv(&self) -> Result<T, ChannelError> {
        let inner = self.shared.inner.lock().unwrap();

        let mut inner = self
            .shared
            .cv
            .wait_while(inner, |inner| inner.buf.is_empty() && !inner.closed)
            .unwrap();

        if inner.closed && inner.buf.is_empty() {
            Err(ChannelError::Closed)
        } else {
            Ok(inner.buf.dequeue().unwrap())
        }
    }

    pub fn try_recv(&self) -> Result<T, ChannelError> {
        let mut inner = self.shared.inner.lock().unwrap();

        if inner.closed && inner.buf.is_empty() {
            Err(ChannelError::Closed)
        } else if inner.buf.is_empty() {
            Err(ChannelError::Empty)
        } else {
            Ok(inner.buf.dequeue().unwrap())
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug)]
pub struct Sender<T> {
    channel: Arc<Channel<T>>,
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        self.channel.close();
    }
}

impl<T: Clone> Sender<T> {
    pub fn send(&self, val: T) {
        self.channel.write(val);
    }
}

impl<T> Sender<T> {
    pub fn get_channel(&self) -> Arc<Channel<T>> {
        self.channel.clone()
    }
}

pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let channel = Arc::new(Channel::<T>::default());

    let receiver = Channel::<T>::add_receiver(capacity, &channel);
    let sender = Sender { channel };

    (sender, receiver)
}
