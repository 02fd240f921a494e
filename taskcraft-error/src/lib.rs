//! # taskcraft-error
//!
//! Unified error handling for taskcraft - following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., ToolNotFound, InferenceFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use taskcraft_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ToolNotFound, "tool 'send_email' not registered")
//!         .with_operation("agent::execute")
//!         .with_context("tool", "send_email")
//!         .with_context("provider", "direct"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, taskcraft_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using taskcraft Error
pub type Result<T> = std::result::Result<T, Error>;
