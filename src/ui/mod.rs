pub mod channel;
pub mod listener;
pub mod types;
