pub mod ringchannel;
