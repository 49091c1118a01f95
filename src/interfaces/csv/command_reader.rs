use super::{Result, ScriptError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// `actor` registers with display name `target` and password hash `detail`.
    Register,
    /// Adds package `actor` titled `target` priced at `detail`.
    Package,
    /// `actor` swipes `target`; `detail` is `LIKE` or `PASS`.
    Swipe,
    /// `actor` buys package `target`.
    Checkout,
}

/// One row of a command script. Accounts are referenced by login name.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ScriptCommand {
    pub action: Action,
    pub actor: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub detail: String,
}

/// Streams a command script.
///
/// A script is a CSV file headed `action,actor,target,detail`, one command
/// per row, applied in file order. Cells are trimmed, `target` and `detail`
/// may be left off when an action does not use them, and lines starting
/// with `#` are skipped, so a scenario can be annotated inline:
///
/// ```text
/// action,actor,target,detail
/// # ann buys the verification package
/// register,ann,Ann,$2a$10$hash
/// checkout,ann,pkg-verified
/// ```
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(script: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(script);
        Self { reader }
    }

    /// Yields commands as they are read. A row that does not parse yields
    /// an error carrying its position; later rows are still read.
    pub fn commands(self) -> impl Iterator<Item = Result<ScriptCommand>> {
        self.reader
            .into_deserialize()
            .map(|row| row.map_err(ScriptError::from))
    }
}
