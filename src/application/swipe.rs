use super::context::CallContext;
use super::engine::{MatchEngine, store_fault};
use crate::domain::swipe::{NewSwipeLog, SwipeRequest};
use crate::error::{MatchError, Result};
use tracing::{debug, instrument, warn};

impl MatchEngine {
    /// Records a swipe against the caller's daily quota.
    ///
    /// Checks run in a fixed order: request shape, daily quota (lifted by the
    /// unlimited swipe entitlement), then the one-swipe-per-pair-per-day rule.
    /// When both the quota and the pair rule would reject a swipe, the quota
    /// error wins. The target account is not looked up until the quota check
    /// has passed.
    #[instrument(skip_all, fields(swiper = %request.swiper_id, swipee = %request.swipee_id))]
    pub async fn record_swipe(&self, ctx: &CallContext, request: SwipeRequest) -> Result<()> {
        let swipe = request
            .validate()
            .inspect_err(|err| warn!(error = %err, "invalid swipe request"))?;

        let quota = ctx
            .run(self.swipes.today_quota(&swipe.swiper))
            .await
            .map_err(|err| store_fault("load today's swipe quota", err))?
            .unwrap_or_default();

        let swiper = self
            .resolve_authenticated(ctx, &swipe.swiper, "swiper")
            .await?;

        let unlimited = ctx
            .run(
                self.packages
                    .find_entitlement(&self.config.unlimited_swipe_title, swiper.id),
            )
            .await
            .map_err(|err| store_fault("find unlimited swipe entitlement", err))?
            .is_some();

        if quota.today >= self.config.max_swipes_per_day && !unlimited {
            warn!(
                swipes_today = quota.today,
                limit = self.config.max_swipes_per_day,
                "daily swipe limit reached"
            );
            return Err(MatchError::QuotaExceeded);
        }

        let swipee = self
            .resolve_authenticated(ctx, &swipe.swipee, "swipee")
            .await?;

        let earlier = ctx
            .run(self.swipes.find_pair_today(swiper.id, swipee.id))
            .await
            .map_err(|err| store_fault("find today's swipe for pair", err))?;
        if earlier.is_some() {
            warn!("account already swiped today");
            return Err(MatchError::DuplicateSwipe);
        }

        let log = NewSwipeLog {
            swiper_id: swiper.id,
            swipee_id: swipee.id,
            decision: swipe.decision,
        };
        match ctx.run(self.swipes.insert_swipe_log(log)).await {
            Ok(_) => {
                debug!(decision = %swipe.decision, unlimited, "swipe recorded");
                Ok(())
            }
            // a concurrent swipe of the same pair won the race
            Err(err) if err.is_unique_violation() => {
                warn!("account already swiped today");
                Err(MatchError::DuplicateSwipe)
            }
            Err(err) => Err(store_fault("insert swipe log", err)),
        }
    }
}
