use super::Result;
use crate::domain::account::AccountType;
use serde::Serialize;
use std::io::Write;

/// Final state of one account after a script run.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct AccountSummary {
    pub login_name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub verified: bool,
    pub swipes_today: u32,
    pub purchases: usize,
}

/// Writes account summaries as CSV with a header row.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, accounts: impl IntoIterator<Item = AccountSummary>) -> Result<()> {
        for account in accounts {
            self.writer.serialize(account)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
