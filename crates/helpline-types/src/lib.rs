pub mod api;
pub mod events;
pub mod models;
pub mod thread;

pub use models::{Message, MessageBody, MessageId, ThreadKey, UserId};
