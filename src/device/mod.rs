pub mod color;
pub mod connection;
pub mod constants;
pub mod link;
pub mod locator;
pub mod mock;
pub mod touch;
pub mod types;
