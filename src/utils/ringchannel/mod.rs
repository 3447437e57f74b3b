mod channel;

pub use channel::{Channel, ChannelError, Receiver, Sender, channel};
