use super::context::CallContext;
use crate::config::EngineConfig;
use crate::domain::account::{Account, AccountProfile, RegisterAccount};
use crate::domain::cursor::CursorCodec;
use crate::domain::ports::{
    AccountStore, AccountStoreBox, PackageStore, PackageStoreBox, StoreError, SwipeLogStore,
    SwipeLogStoreBox, TransactionProvider, TransactionProviderBox,
};
use crate::error::{MatchError, Result};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// The entry point for every account-facing operation.
///
/// `MatchEngine` holds the store ports and the configuration, both injected
/// at construction. It holds no mutable state of its own, so one instance
/// can serve any number of concurrent calls.
pub struct MatchEngine {
    pub(super) accounts: AccountStoreBox,
    pub(super) swipes: SwipeLogStoreBox,
    pub(super) packages: PackageStoreBox,
    pub(super) transactions: TransactionProviderBox,
    pub(super) cursor: CursorCodec,
    pub(super) config: EngineConfig,
}

impl MatchEngine {
    /// Creates a new `MatchEngine`.
    ///
    /// # Arguments
    ///
    /// * `accounts` - Account lookups, registration and the candidate feed.
    /// * `swipes` - Swipe log and daily counters.
    /// * `packages` - Package catalogue and purchase records.
    /// * `transactions` - Opens units of work for checkout.
    /// * `config` - Quotas, page size bound and entitlement titles.
    pub fn new(
        accounts: AccountStoreBox,
        swipes: SwipeLogStoreBox,
        packages: PackageStoreBox,
        transactions: TransactionProviderBox,
        config: EngineConfig,
    ) -> Self {
        Self {
            accounts,
            swipes,
            packages,
            transactions,
            cursor: CursorCodec::new(&config.cursor_salt),
            config,
        }
    }

    /// Creates an engine whose ports are all served by clones of one store.
    pub fn with_shared_store<S>(store: S, config: EngineConfig) -> Self
    where
        S: AccountStore + SwipeLogStore + PackageStore + TransactionProvider + Clone + 'static,
    {
        Self::new(
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store),
            config,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cursor_codec(&self) -> &CursorCodec {
        &self.cursor
    }

    /// Registers a new free account.
    ///
    /// A login name that is already taken is reported as
    /// [`MatchError::DuplicateAccount`].
    #[instrument(skip_all, fields(login_name = %request.login_name))]
    pub async fn register_account(
        &self,
        ctx: &CallContext,
        request: RegisterAccount,
    ) -> Result<AccountProfile> {
        let new_account = request
            .validate()
            .inspect_err(|err| warn!(error = %err, "invalid registration request"))?;

        match ctx.run(self.accounts.insert(new_account)).await {
            Ok(account) => {
                debug!(account_id = %account.mask_id, "account registered");
                Ok(AccountProfile::from(&account))
            }
            Err(err) if err.is_unique_violation() => {
                warn!("login name already registered");
                Err(MatchError::DuplicateAccount)
            }
            Err(err) => Err(store_fault("insert account", err)),
        }
    }

    /// Looks up the public profile registered under `login_name`.
    #[instrument(skip_all, fields(login_name = %login_name))]
    pub async fn find_account(&self, ctx: &CallContext, login_name: &str) -> Result<AccountProfile> {
        let login_name = login_name.trim();
        if login_name.is_empty() {
            return Err(MatchError::ValidationError(
                "login_name: non zero value required".to_string(),
            ));
        }

        match ctx.run(self.accounts.find_by_login_name(login_name)).await {
            Ok(Some(account)) => Ok(AccountProfile::from(&account)),
            Ok(None) => Err(MatchError::NotFound { entity: "account" }),
            Err(err) => Err(store_fault("find account by login name", err)),
        }
    }

    /// Resolves an account the authentication layer has already vouched for.
    ///
    /// A miss here means the stores are inconsistent, not that the caller
    /// erred, so it is an internal error.
    pub(super) async fn resolve_authenticated(
        &self,
        ctx: &CallContext,
        mask_id: &Uuid,
        role: &'static str,
    ) -> Result<Account> {
        match ctx.run(self.accounts.find_by_public_id(mask_id)).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => {
                error!(role, account_id = %mask_id, "authenticated account does not exist");
                Err(MatchError::internal(format!("{role} account does not exist")))
            }
            Err(err) => Err(store_fault("find account by public id", err)),
        }
    }
}

/// Logs a store failure and converts it into an internal error.
pub(super) fn store_fault(operation: &'static str, err: StoreError) -> MatchError {
    error!(operation, error = %err, "store operation failed");
    MatchError::from(err)
}
