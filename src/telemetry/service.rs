use std::{
    any::{Any, type_name},
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::utils::ringchannel::{Channel, ChannelError, Receiver, Sender, channel};

#[derive(PartialEq, Eq, Error, Debug)]
pub enum TelemetryError {
    #[error("Requested channel type '{requested}', but channel is a '{expected}'")]
    WrongChannelType { requested: String, expected: String },

    #[error("Trying to read from an empty channel")]
    EmptyChannel,

    #[error("Trying to read from a closed channel")]
    ClosedChannel,

    #[error("Cannot create more than one producer for a channel")]
    AlreadyHasProducer,
}

/// A value paired with the time it refers to (usually the navigation sample
/// time, not the wall-clock instant of publication).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Timestamped<T>(pub DateTime<Utc>, pub T);

#[derive(Debug)]
pub struct TelemetrySender<T> {
    sender: Sender<Timestamped<T>>,
}

impl<T: 'static + Clone> TelemetrySender<T> {
    pub fn send(&self, time: DateTime<Utc>, value: T) {
        self.sender.send(Timestamped(time, value));
    }
}

#[derive(Debug)]
pub struct TelemetryReceiver<T> {
    receiver: Receiver<Timestamped<T>>,
}

impl<T> TelemetryReceiver<T> {
    pub fn recv(&self) -> Result<Timestamped<T>, TelemetryError> {
        self.receiver.recv().map_err(|e| match e {
            ChannelError::Closed => TelemetryError::ClosedChannel,
            ChannelError::Empty => TelemetryError::EmptyChannel,
        })
    }

    pub fn try_recv(&self) -> Result<Timestamped<T>, TelemetryError> {
        self.receiver.try_recv().map_err(|e| match e {
            ChannelError::Closed => TelemetryError::ClosedChannel,
            ChannelError::Empty => TelemetryError::EmptyChannel,
        })
    }
}

#[derive(Debug)]
struct TelemetryChannel {
    #[allow(dead_code)]
    name: String,

    typename: String,

    channel: Box<dyn Any + Send>, // Box<TelemetryChannelTransport<T>>
}

struct TelemetryChannelTransport<T> {
    channel: Weak<Channel<Timestamped<T>>>,
    sender: Option<Sender<Timestamped<T>>>,
}

impl TelemetryChannel {
    fn new<T: 'static + Send>(name: &str) -> Self {
        // The producer-side handle is parked here until someone claims it, so
        // its ring capacity is irrelevant.
        let (sender, _) = channel::<Timestamped<T>>(1);

        let transport = TelemetryChannelTransport::<T> {
            channel: Arc::downgrade(&sender.get_channel()),
            sender: Some(sender),
        };

        Self {
            name: name.to_string(),
            typename: type_name::<T>().to_string(),
            channel: Box::new(transport),
        }
    }

    fn take_producer<T: 'static>(&mut self) -> Result<TelemetrySender<T>, TelemetryError> {
        let channel = self.downcast_mut::<T>()?;

        Ok(TelemetrySender {
            sender: channel
                .sender
                .take()
                .ok_or(TelemetryError::AlreadyHasProducer)?,
        })
    }

    fn add_subscriber<T: 'static>(
        &mut self,
        capacity: usize,
    ) -> Result<TelemetryReceiver<T>, TelemetryError> {
        let channel = self.downcast_mut::<T>()?;

        let ch = Weak::upgrade(&channel.channel).ok_or(TelemetryError::ClosedChannel)?;

        Ok(TelemetryReceiver {
            receiver: Channel::<Timestamped<T>>::add_receiver(capacity, &ch),
        })
    }

    fn downcast_mut<T: 'static>(
        &mut self,
    ) -> Result<&mut TelemetryChannelTransport<T>, TelemetryError> {
        self.channel
            .downcast_mut::<TelemetryChannelTransport<T>>()
            .ok_or(TelemetryError::WrongChannelType {
                requested: type_name::<T>().to_string(),
                expected: self.typename.clone(),
            })
    }
}

/// Registry of named pub/sub channels. Channels are created on first use by
/// either side; each channel has at most one producer and any number of
/// subscribers, each with its own ring capacity.
#[derive(Debug, Default, Clone)]
pub struct TelemetryService {
    inner: Arc<Mutex<TelemetryServiceInner>>,
}

#[derive(Debug, Default)]
struct TelemetryServiceInner {
    channels: HashMap<String, TelemetryChannel>,
}

impl TelemetryService {
    pub fn publish<T: 'static + Send>(
        &self,
        channel_name: &str,
    ) -> Result<TelemetrySender<T>, TelemetryError> {
        let mut inner = self.inner.lock().unwrap();
        let channel = inner.get_channel::<T>(channel_name);

        channel.take_producer()
    }

    pub fn subscribe<T: 'static + Send>(
        &self,
        channel_name: &str,
        capacity: usize,
    ) -> Result<TelemetryReceiver<T>, TelemetryError> {
        let mut inner = self.inner.lock().unwrap();
        let channel = inner.get_channel::<T>(channel_name);

        channel.add_subscriber(capacity)
    }
}

impl TelemetryServiceInner {
    fn get_channel<'a, T: 'static + Send>(
        &'a mut self,
        channel_name: &str,
    ) -> &'a mut TelemetryChannel {
        self.channels
            .entry(channel_name.to_string())
            .or_insert_with(|| TelemetryChannel::new::<T>(channel_name))
    }
}
