use super::RowId;
use super::package::PremiumPackage;
use super::pagination::Keyed;
use crate::error::{MatchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    #[default]
    Free,
    Premium,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Free => "FREE",
            AccountType::Premium => "PREMIUM",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account row as held by the store.
///
/// `id` is the internal row id and must never leave the process; the public
/// face of an account is [`AccountProfile`].
#[derive(Debug, PartialEq, Clone)]
pub struct Account {
    pub id: RowId,
    /// Immutable, globally unique public identifier.
    pub mask_id: Uuid,
    pub account_type: AccountType,
    pub name: String,
    pub login_name: String,
    pub password_hash: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl Account {
    /// Applies the entitlements granted by buying `package`.
    ///
    /// A free account is promoted to premium, and buying the package titled
    /// `verification_title` sets the verified flag. Only the in-memory value
    /// changes; persisting it is the caller's job.
    pub fn apply_purchase(&mut self, package: &PremiumPackage, verification_title: &str) {
        if self.account_type == AccountType::Free {
            self.account_type = AccountType::Premium;
        }
        if package.title == verification_title {
            self.verified = true;
        }
        self.updated_by = Some(self.login_name.clone());
    }

    /// Folds the entitlements of an upgraded copy into this row.
    ///
    /// Entitlements only ever grow: the premium tier and the verified flag
    /// are never taken back, so an upgrade computed from an older snapshot
    /// cannot undo one committed in between.
    pub fn merge_upgrade(&mut self, upgraded: &Account) {
        if upgraded.account_type == AccountType::Premium {
            self.account_type = AccountType::Premium;
        }
        self.verified |= upgraded.verified;
        if upgraded.updated_by.is_some() {
            self.updated_by.clone_from(&upgraded.updated_by);
        }
    }
}

impl Keyed for Account {
    fn row_id(&self) -> RowId {
        self.id
    }
}

/// Insert payload; the store assigns `id`, `mask_id` and timestamps.
#[derive(Debug, PartialEq, Clone)]
pub struct NewAccount {
    pub account_type: AccountType,
    pub name: String,
    pub login_name: String,
    pub password_hash: String,
    pub created_by: String,
}

/// Registration request as received from the authentication layer.
///
/// Password hashing happens before this point.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterAccount {
    pub login_name: String,
    pub name: String,
    pub password_hash: String,
}

impl RegisterAccount {
    pub fn validate(self) -> Result<NewAccount> {
        let mut missing = Vec::new();
        if self.login_name.trim().is_empty() {
            missing.push("login_name");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.password_hash.is_empty() {
            missing.push("password_hash");
        }
        if !missing.is_empty() {
            return Err(required_fields(&missing));
        }

        let login_name = self.login_name.trim().to_string();
        Ok(NewAccount {
            account_type: AccountType::Free,
            name: self.name.trim().to_string(),
            created_by: login_name.clone(),
            login_name,
            password_hash: self.password_hash,
        })
    }
}

/// Client-facing view of an account.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct AccountProfile {
    pub account_id: Uuid,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub name: String,
    pub user_name: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.mask_id,
            account_type: account.account_type,
            name: account.name.clone(),
            user_name: account.login_name.clone(),
            is_verified: account.verified,
            created_at: account.created_at,
            created_by: account.created_by.clone(),
            updated_at: account.updated_at,
            updated_by: account.updated_by.clone(),
        }
    }
}

/// Parses a public mask id supplied by a caller.
pub fn parse_mask_id(field: &str, value: &str) -> Result<Uuid> {
    let value = value.trim();
    if value.is_empty() {
        return Err(required_fields(&[field]));
    }
    Uuid::parse_str(value)
        .map_err(|_| MatchError::ValidationError(format!("{field}: must be a valid account id")))
}

pub(crate) fn required_fields(fields: &[&str]) -> MatchError {
    MatchError::ValidationError(
        fields
            .iter()
            .map(|field| format!("{field}: non zero value required"))
            .collect::<Vec<_>>()
            .join(";"),
    )
}
