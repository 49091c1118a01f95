use super::RowId;
use super::account::{Account, NewAccount};
use super::package::{NewPurchase, PremiumPackage, Purchase};
use super::pagination::PageWindow;
use super::swipe::{NewSwipeLog, SwipeCount, SwipeLog};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Postgres phrasing for unique index violations, for adapters that only
/// surface driver text.
const UNIQUE_VIOLATION_TEXT: &str = "duplicate key value violates unique constraint";

/// Failures reported by store adapters.
///
/// The engine classifies these; they never reach its callers verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("store call exceeded its deadline")]
    DeadlineExceeded,
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn unique(constraint: impl Into<String>) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::UniqueViolation { .. } => true,
            StoreError::Backend(message) => message.contains(UNIQUE_VIOLATION_TEXT),
            StoreError::DeadlineExceeded => false,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_login_name(&self, login_name: &str) -> StoreResult<Option<Account>>;
    async fn find_by_public_id(&self, mask_id: &Uuid) -> StoreResult<Option<Account>>;
    /// Inserts a new account; a taken login name is a unique violation.
    async fn insert(&self, account: NewAccount) -> StoreResult<Account>;
    /// Accounts other than `caller` that `caller` has not swiped today,
    /// ordered for `window` and capped at `window.fetch_limit`.
    async fn list_candidates(&self, caller: &Uuid, window: &PageWindow)
    -> StoreResult<Vec<Account>>;
}

#[async_trait]
pub trait SwipeLogStore: Send + Sync {
    /// Inserts a swipe; a second swipe of the same pair on the same day is a
    /// unique violation.
    async fn insert_swipe_log(&self, log: NewSwipeLog) -> StoreResult<SwipeLog>;
    /// Today's counters for the account, `None` when it has not swiped today.
    async fn today_quota(&self, mask_id: &Uuid) -> StoreResult<Option<SwipeCount>>;
    async fn find_pair_today(
        &self,
        swiper_id: RowId,
        swipee_id: RowId,
    ) -> StoreResult<Option<SwipeLog>>;
}

#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Active packages only, ordered for `window` and capped at its fetch limit.
    async fn list_active(&self, window: &PageWindow) -> StoreResult<Vec<PremiumPackage>>;
    async fn find_by_package_id(&self, package_uid: &str) -> StoreResult<Option<PremiumPackage>>;
    /// The account's purchase of the package with this title, if any.
    async fn find_entitlement(&self, title: &str, account_id: RowId)
    -> StoreResult<Option<Purchase>>;
    async fn purchases_by_account(&self, account_id: RowId) -> StoreResult<Vec<Purchase>>;
}

/// Writes grouped into one atomic unit.
///
/// Nothing written through a unit of work is observable until `commit`
/// succeeds. Dropping it without committing discards every staged write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// A second purchase of the same package by the same account is a unique
    /// violation, reported here or at commit.
    async fn insert_purchase(&mut self, purchase: NewPurchase) -> StoreResult<()>;
    /// Stages an upgraded account. At commit its entitlements are merged
    /// into the current row (see [`Account::merge_upgrade`]) rather than
    /// overwriting it, so concurrent upgrades of one account compose.
    async fn update_account(&mut self, account: &Account) -> StoreResult<()>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait TransactionProvider: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type SwipeLogStoreBox = Box<dyn SwipeLogStore>;
pub type PackageStoreBox = Box<dyn PackageStore>;
pub type TransactionProviderBox = Box<dyn TransactionProvider>;
