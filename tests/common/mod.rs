#![allow(dead_code)]

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use matchcore::application::context::CallContext;
use matchcore::application::engine::MatchEngine;
use matchcore::config::EngineConfig;
use matchcore::domain::account::{AccountProfile, RegisterAccount};
use matchcore::domain::package::{CheckoutRequest, NewPackage, PremiumPackage};
use matchcore::domain::swipe::SwipeRequest;
use matchcore::infrastructure::in_memory::InMemoryStore;
use mockable::Clock;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex, PoisonError};

/// A clock tests can move forward.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

pub struct Harness {
    pub engine: Arc<MatchEngine>,
    pub store: InMemoryStore,
    pub clock: Arc<MutableClock>,
}

pub fn harness(config: EngineConfig) -> Harness {
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap(),
    ));
    let store = InMemoryStore::with_clock(clock.clone());
    let engine = Arc::new(MatchEngine::with_shared_store(store.clone(), config));
    Harness {
        engine,
        store,
        clock,
    }
}

impl Harness {
    pub async fn register(&self, login_name: &str) -> AccountProfile {
        self.engine
            .register_account(
                &CallContext::background(),
                RegisterAccount {
                    login_name: login_name.to_string(),
                    name: login_name.to_string(),
                    password_hash: "$2a$10$hash".to_string(),
                },
            )
            .await
            .unwrap()
    }

    pub async fn register_many(&self, prefix: &str, count: usize) -> Vec<AccountProfile> {
        let mut profiles = Vec::with_capacity(count);
        for i in 0..count {
            profiles.push(self.register(&format!("{prefix}{i}")).await);
        }
        profiles
    }

    pub async fn package(&self, package_uid: &str, title: &str) -> PremiumPackage {
        self.store
            .add_package(NewPackage {
                package_uid: package_uid.to_string(),
                title: title.to_string(),
                description: format!("{title} package"),
                price: dec!(9.99),
                active: true,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap()
    }
}

pub fn swipe(from: &AccountProfile, to: &AccountProfile, decision: &str) -> SwipeRequest {
    SwipeRequest {
        swiper_id: from.account_id.to_string(),
        swipee_id: to.account_id.to_string(),
        swipe_type: decision.to_string(),
    }
}

pub fn checkout(buyer: &AccountProfile, package_uid: &str) -> CheckoutRequest {
    CheckoutRequest {
        buyer_id: buyer.account_id.to_string(),
        package_id: package_uid.to_string(),
    }
}
