pub mod commands;
pub mod feed;
pub mod handler;

pub use commands::Commands;
pub use feed::{EventFeed, WriteRequest};
pub use handler::TriggerHandler;
