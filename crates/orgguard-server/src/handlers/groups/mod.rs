//! Organization group management.
//!
//! Every endpoint authorizes through the access gate before touching a
//! group. Mutations then run through [`GroupCommands`], whose errors are
//! returned unchanged inside [`GroupError::Command`].

mod commands;
mod handler;
mod types;

pub use commands::{GroupCommands, StoreGroupCommands};
pub use handler::GroupHandler;
pub use types::{GroupError, GroupRequest, GroupResult, MAX_GROUP_NAME_LEN};
