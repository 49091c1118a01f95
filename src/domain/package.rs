use super::RowId;
use super::account::{parse_mask_id, required_fields};
use super::pagination::Keyed;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable entitlement.
///
/// The title doubles as a semantic key: specific titles unlock specific
/// behaviour (unlimited swipes, the verified flag).
#[derive(Debug, PartialEq, Clone)]
pub struct PremiumPackage {
    pub id: RowId,
    pub package_uid: String,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl Keyed for PremiumPackage {
    fn row_id(&self) -> RowId {
        self.id
    }
}

/// Catalogue entry to be created by the store.
#[derive(Debug, PartialEq, Clone)]
pub struct NewPackage {
    pub package_uid: String,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub active: bool,
    pub created_by: String,
}

/// A purchase record; append-only.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Purchase {
    pub id: RowId,
    pub package_id: RowId,
    pub account_id: RowId,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NewPurchase {
    pub package_id: RowId,
    pub account_id: RowId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    /// Public mask id of the buyer, taken from the authenticated identity.
    pub buyer_id: String,
    pub package_id: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ValidCheckout {
    pub buyer: Uuid,
    pub package_uid: String,
}

impl CheckoutRequest {
    pub fn validate(self) -> Result<ValidCheckout> {
        let mut missing = Vec::new();
        if self.buyer_id.trim().is_empty() {
            missing.push("buyer_id");
        }
        if self.package_id.trim().is_empty() {
            missing.push("package_id");
        }
        if !missing.is_empty() {
            return Err(required_fields(&missing));
        }

        Ok(ValidCheckout {
            buyer: parse_mask_id("buyer_id", &self.buyer_id)?,
            package_uid: self.package_id.trim().to_string(),
        })
    }
}

/// Client-facing catalogue entry, annotated for the calling account.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PackageListing {
    pub package_uid: String,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub is_purchased: bool,
}

impl PackageListing {
    pub fn new(package: &PremiumPackage, is_purchased: bool) -> Self {
        Self {
            package_uid: package.package_uid.clone(),
            title: package.title.clone(),
            description: package.description.clone(),
            price: package.price,
            is_active: package.active,
            created_at: package.created_at,
            created_by: package.created_by.clone(),
            updated_at: package.updated_at,
            updated_by: package.updated_by.clone(),
            is_purchased,
        }
    }
}
