use super::context::CallContext;
use super::engine::{MatchEngine, store_fault};
use crate::domain::package::{CheckoutRequest, NewPurchase};
use crate::domain::ports::{StoreError, UnitOfWork};
use crate::error::{MatchError, Result};
use tracing::{debug, error, instrument, warn};

impl MatchEngine {
    /// Purchases a premium package for the buyer.
    ///
    /// The purchase record and the upgraded account are written in one unit
    /// of work: either both become visible or neither does. Buying the same
    /// package twice fails with [`MatchError::AlreadyPurchased`] and leaves
    /// the account untouched.
    #[instrument(skip_all, fields(buyer = %request.buyer_id, package = %request.package_id))]
    pub async fn checkout(&self, ctx: &CallContext, request: CheckoutRequest) -> Result<()> {
        let checkout = request
            .validate()
            .inspect_err(|err| warn!(error = %err, "invalid checkout request"))?;

        let mut buyer = match ctx.run(self.accounts.find_by_public_id(&checkout.buyer)).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!("buyer account not found");
                return Err(MatchError::NotFound { entity: "account" });
            }
            Err(err) => return Err(store_fault("find buyer account", err)),
        };

        let package = match ctx
            .run(self.packages.find_by_package_id(&checkout.package_uid))
            .await
        {
            Ok(Some(package)) => package,
            Ok(None) => {
                warn!("premium package not found");
                return Err(MatchError::NotFound { entity: "package" });
            }
            Err(err) => return Err(store_fault("find premium package", err)),
        };

        let mut tx = ctx
            .run(self.transactions.begin())
            .await
            .map_err(|err| store_fault("begin transaction", err))?;

        let purchase = NewPurchase {
            package_id: package.id,
            account_id: buyer.id,
        };
        if let Err(err) = ctx.run(tx.insert_purchase(purchase)).await {
            rollback(tx).await;
            return Err(purchase_failure("insert purchase", err));
        }

        buyer.apply_purchase(&package, &self.config.verification_title);

        if let Err(err) = ctx.run(tx.update_account(&buyer)).await {
            rollback(tx).await;
            return Err(store_fault("upgrade account", err));
        }

        // On failure the caller cannot assume the purchase was recorded.
        ctx.run(tx.commit())
            .await
            .map_err(|err| purchase_failure("commit checkout", err))?;

        debug!(
            account_type = %buyer.account_type,
            verified = buyer.verified,
            "package purchased"
        );
        Ok(())
    }
}

/// Rolls back without the caller's deadline, so an expired call still
/// releases its unit of work.
async fn rollback(tx: Box<dyn UnitOfWork>) {
    if let Err(err) = tx.rollback().await {
        error!(error = %err, "rollback failed");
    }
}

fn purchase_failure(operation: &'static str, err: StoreError) -> MatchError {
    if err.is_unique_violation() {
        warn!(operation, "package already purchased");
        MatchError::AlreadyPurchased
    } else {
        store_fault(operation, err)
    }
}
