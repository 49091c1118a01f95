use super::account_writer::AccountSummary;
use super::command_reader::{Action, ScriptCommand};
use super::{Result, ScriptError};
use crate::application::context::CallContext;
use crate::application::engine::MatchEngine;
use crate::domain::account::RegisterAccount;
use crate::domain::package::{CheckoutRequest, NewPackage};
use crate::domain::swipe::SwipeRequest;
use crate::error::MatchError;
use crate::infrastructure::in_memory::InMemoryStore;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const SCRIPT_AUTHOR: &str = "script";

/// Applies script commands to an engine backed by an [`InMemoryStore`].
///
/// The script names accounts by login name; the runner resolves them to
/// public ids the way an authentication layer would.
pub struct ScriptRunner {
    engine: MatchEngine,
    store: InMemoryStore,
}

impl ScriptRunner {
    pub fn new(engine: MatchEngine, store: InMemoryStore) -> Self {
        Self { engine, store }
    }

    pub async fn apply(&self, command: ScriptCommand) -> Result<()> {
        let ctx = CallContext::background();
        match command.action {
            Action::Register => {
                let request = RegisterAccount {
                    name: command.target,
                    login_name: command.actor,
                    password_hash: command.detail,
                };
                self.engine.register_account(&ctx, request).await?;
            }
            Action::Package => {
                let price = Decimal::from_str(&command.detail).map_err(|_| {
                    ScriptError::InvalidCommand(format!("invalid price {:?}", command.detail))
                })?;
                let package = NewPackage {
                    package_uid: command.actor,
                    title: command.target,
                    description: String::new(),
                    price,
                    active: true,
                    created_by: SCRIPT_AUTHOR.to_string(),
                };
                self.store.add_package(package).await.map_err(|err| {
                    if err.is_unique_violation() {
                        ScriptError::InvalidCommand("package id already exists".to_string())
                    } else {
                        MatchError::from(err).into()
                    }
                })?;
            }
            Action::Swipe => {
                let request = SwipeRequest {
                    swiper_id: self.public_id(&ctx, &command.actor).await?.to_string(),
                    swipee_id: self.public_id(&ctx, &command.target).await?.to_string(),
                    swipe_type: command.detail,
                };
                self.engine.record_swipe(&ctx, request).await?;
            }
            Action::Checkout => {
                let request = CheckoutRequest {
                    buyer_id: self.public_id(&ctx, &command.actor).await?.to_string(),
                    package_id: command.target,
                };
                self.engine.checkout(&ctx, request).await?;
            }
        }
        Ok(())
    }

    async fn public_id(&self, ctx: &CallContext, login_name: &str) -> Result<Uuid> {
        Ok(self.engine.find_account(ctx, login_name).await?.account_id)
    }

    /// One summary per registered account, in registration order.
    pub async fn summaries(&self) -> Vec<AccountSummary> {
        let purchases = self.store.purchases().await;
        let mut summaries = Vec::new();
        for account in self.store.accounts().await {
            summaries.push(AccountSummary {
                swipes_today: self.store.swipes_today(account.id).await,
                purchases: purchases
                    .iter()
                    .filter(|p| p.account_id == account.id)
                    .count(),
                login_name: account.login_name,
                account_type: account.account_type,
                verified: account.verified,
            });
        }
        summaries
    }
}
