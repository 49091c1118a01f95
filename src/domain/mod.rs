//! Domain types and the ports the engine consumes.
//!
//! Nothing in here performs I/O; adapters in `infrastructure` implement the
//! traits declared in [`ports`].

pub mod account;
pub mod cursor;
pub mod package;
pub mod pagination;
pub mod ports;
pub mod swipe;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned, monotonically increasing row identifier.
///
/// Never serialized to clients directly; pagination exposes it only through
/// [`cursor::CursorCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl RowId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
