use super::context::CallContext;
use super::engine::{MatchEngine, store_fault};
use crate::domain::account::{AccountProfile, parse_mask_id};
use crate::domain::package::PackageListing;
use crate::domain::pagination::{Page, PageRequest, paginate};
use crate::error::Result;
use std::collections::HashSet;
use tracing::{instrument, warn};

impl MatchEngine {
    /// Lists accounts the caller has not swiped today, newest first.
    #[instrument(skip_all, fields(caller = %request.caller, direction = ?request.direction))]
    pub async fn list_candidates(
        &self,
        ctx: &CallContext,
        request: PageRequest,
    ) -> Result<Page<AccountProfile>> {
        let caller = parse_mask_id("caller", &request.caller)?;
        let (window, limit) = request
            .window(&self.cursor, self.config.max_page_size)
            .inspect_err(|err| warn!(error = %err, "invalid candidate page request"))?;

        let rows = ctx
            .run(self.accounts.list_candidates(&caller, &window))
            .await
            .map_err(|err| store_fault("list candidates", err))?;

        Ok(paginate(rows, &window, limit, &self.cursor).map(|account| AccountProfile::from(&account)))
    }

    /// Lists active packages, flagging the ones the caller already owns.
    #[instrument(skip_all, fields(caller = %request.caller, direction = ?request.direction))]
    pub async fn list_packages(
        &self,
        ctx: &CallContext,
        request: PageRequest,
    ) -> Result<Page<PackageListing>> {
        let caller = parse_mask_id("caller", &request.caller)?;
        let (window, limit) = request
            .window(&self.cursor, self.config.max_page_size)
            .inspect_err(|err| warn!(error = %err, "invalid package page request"))?;

        let rows = ctx
            .run(self.packages.list_active(&window))
            .await
            .map_err(|err| store_fault("list active packages", err))?;
        let page = paginate(rows, &window, limit, &self.cursor);
        if page.items.is_empty() {
            return Ok(page.map(|package| PackageListing::new(&package, false)));
        }

        let account = self.resolve_authenticated(ctx, &caller, "caller").await?;
        let owned: HashSet<_> = ctx
            .run(self.packages.purchases_by_account(account.id))
            .await
            .map_err(|err| store_fault("list purchases", err))?
            .into_iter()
            .map(|purchase| purchase.package_id)
            .collect();

        Ok(page.map(|package| {
            let is_purchased = owned.contains(&package.id);
            PackageListing::new(&package, is_purchased)
        }))
    }
}
