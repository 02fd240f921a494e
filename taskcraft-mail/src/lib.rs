//! # taskcraft demo email app
//!
//! A file-backed mailbox (one JSON record per message) with three
//! operations - send, list, read - exposed as agent tools. The "relay" is
//! the file sink itself: sent messages land in the same directory the
//! listing reads, which is what the demo needs to observe its own mail.

mod message;
mod store;
mod tools;

pub use message::EmailMessage;
pub use store::{MailStore, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
pub use tools::demo_tools;
