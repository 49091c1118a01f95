use crate::domain::RowId;
use crate::domain::account::{Account, NewAccount};
use crate::domain::package::{NewPackage, NewPurchase, PremiumPackage, Purchase};
use crate::domain::pagination::PageWindow;
use crate::domain::ports::{
    AccountStore, PackageStore, StoreError, StoreResult, SwipeLogStore, TransactionProvider,
    UnitOfWork,
};
use crate::domain::swipe::{NewSwipeLog, SwipeCount, SwipeLog};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockable::{Clock, DefaultClock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use uuid::Uuid;

const LOGIN_NAME_KEY: &str = "account_login_name_key";
const PACKAGE_UID_KEY: &str = "premium_package_package_id_key";
const PURCHASE_KEY: &str = "premium_package_user_package_account_key";
const DAILY_SWIPE_KEY: &str = "swipe_log_swiper_swipee_day_key";

/// Store calls that can be made to fail or stall once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindAccount,
    InsertAccount,
    ListCandidates,
    InsertSwipeLog,
    TodayQuota,
    FindPairToday,
    ListPackages,
    FindPackage,
    FindEntitlement,
    ListPurchases,
    Begin,
    InsertPurchase,
    UpdateAccount,
    Commit,
    Rollback,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Fail,
    Stall,
}

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<RowId, Account>,
    packages: BTreeMap<RowId, PremiumPackage>,
    purchases: Vec<Purchase>,
    swipe_logs: Vec<SwipeLog>,
    last_account_id: u64,
    last_package_id: u64,
    last_purchase_id: u64,
    last_swipe_id: u64,
}

impl Tables {
    fn account_by_mask(&self, mask_id: &Uuid) -> Option<&Account> {
        self.accounts.values().find(|a| &a.mask_id == mask_id)
    }

    fn owns(&self, purchase: &NewPurchase) -> bool {
        self.purchases
            .iter()
            .any(|p| p.package_id == purchase.package_id && p.account_id == purchase.account_id)
    }

    fn swipes_on(&self, swiper_id: RowId, day: NaiveDate) -> impl Iterator<Item = &SwipeLog> {
        self.swipe_logs
            .iter()
            .filter(move |log| log.swiper_id == swiper_id && log.created_at.date_naive() == day)
    }
}

/// Rows walked in the window's direction, capped at its fetch limit.
fn window_rows<'a, T: Clone + 'a>(
    rows: impl DoubleEndedIterator<Item = (&'a RowId, &'a T)>,
    window: &PageWindow,
    keep: impl Fn(&T) -> bool,
) -> Vec<T> {
    let admitted = rows.filter(|(id, row)| window.admits(**id) && keep(*row));
    if window.walks_backward() {
        admitted
            .take(window.fetch_limit)
            .map(|(_, row)| row.clone())
            .collect()
    } else {
        admitted
            .rev()
            .take(window.fetch_limit)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

/// A thread-safe in-memory store serving every engine port.
///
/// Enforces the same unique constraints a relational schema would: one
/// account per login name, one purchase per package and account, and one
/// swipe per ordered pair per UTC day. Clones share the same tables.
///
/// Individual calls can be armed to fail or hang once with
/// [`fail_next`](Self::fail_next) and [`stall_next`](Self::stall_next).
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    clock: Arc<dyn Clock>,
    faults: Arc<Mutex<HashMap<StoreOp, Fault>>>,
    rollbacks: Arc<AtomicUsize>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl InMemoryStore {
    /// Creates a new, empty store on the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::default(),
            clock,
            faults: Arc::default(),
            rollbacks: Arc::default(),
        }
    }

    /// The next call of `op` returns a backend error.
    pub fn fail_next(&self, op: StoreOp) {
        self.arm(op, Fault::Fail);
    }

    /// The next call of `op` never completes.
    pub fn stall_next(&self, op: StoreOp) {
        self.arm(op, Fault::Stall);
    }

    fn arm(&self, op: StoreOp, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op, fault);
    }

    async fn enter(&self, op: StoreOp) -> StoreResult<()> {
        let fault = self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&op);
        match fault {
            None => Ok(()),
            Some(Fault::Fail) => Err(StoreError::Backend(format!("injected failure in {op:?}"))),
            Some(Fault::Stall) => std::future::pending().await,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Adds a package to the catalogue. Package ids are unique.
    pub async fn add_package(&self, package: NewPackage) -> StoreResult<PremiumPackage> {
        let mut tables = self.tables.write().await;
        if tables
            .packages
            .values()
            .any(|p| p.package_uid == package.package_uid)
        {
            return Err(StoreError::unique(PACKAGE_UID_KEY));
        }
        tables.last_package_id += 1;
        let package = PremiumPackage {
            id: RowId(tables.last_package_id),
            package_uid: package.package_uid,
            title: package.title,
            description: package.description,
            price: package.price,
            active: package.active,
            created_at: self.now(),
            created_by: package.created_by,
            updated_at: None,
            updated_by: None,
        };
        tables.packages.insert(package.id, package.clone());
        Ok(package)
    }

    /// Every account, oldest first.
    pub async fn accounts(&self) -> Vec<Account> {
        self.tables.read().await.accounts.values().cloned().collect()
    }

    pub async fn account(&self, mask_id: &Uuid) -> Option<Account> {
        self.tables.read().await.account_by_mask(mask_id).cloned()
    }

    pub async fn purchases(&self) -> Vec<Purchase> {
        self.tables.read().await.purchases.clone()
    }

    pub async fn swipe_logs(&self) -> Vec<SwipeLog> {
        self.tables.read().await.swipe_logs.clone()
    }

    /// Swipes recorded by the account on the current UTC day.
    pub async fn swipes_today(&self, account_id: RowId) -> u32 {
        let today = self.today();
        let tables = self.tables.read().await;
        tables.swipes_on(account_id, today).count() as u32
    }

    /// Number of units of work rolled back so far.
    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_login_name(&self, login_name: &str) -> StoreResult<Option<Account>> {
        self.enter(StoreOp::FindAccount).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.login_name == login_name)
            .cloned())
    }

    async fn find_by_public_id(&self, mask_id: &Uuid) -> StoreResult<Option<Account>> {
        self.enter(StoreOp::FindAccount).await?;
        Ok(self.tables.read().await.account_by_mask(mask_id).cloned())
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        self.enter(StoreOp::InsertAccount).await?;
        let mut tables = self.tables.write().await;
        if tables
            .accounts
            .values()
            .any(|a| a.login_name == account.login_name)
        {
            return Err(StoreError::unique(LOGIN_NAME_KEY));
        }
        tables.last_account_id += 1;
        let now = self.now();
        let account = Account {
            id: RowId(tables.last_account_id),
            mask_id: Uuid::new_v4(),
            account_type: account.account_type,
            name: account.name,
            login_name: account.login_name,
            password_hash: account.password_hash,
            verified: false,
            created_at: now,
            created_by: account.created_by,
            updated_at: now,
            updated_by: None,
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn list_candidates(
        &self,
        caller: &Uuid,
        window: &PageWindow,
    ) -> StoreResult<Vec<Account>> {
        self.enter(StoreOp::ListCandidates).await?;
        let today = self.today();
        let tables = self.tables.read().await;
        let swiped: HashSet<RowId> = match tables.account_by_mask(caller) {
            Some(account) => tables
                .swipes_on(account.id, today)
                .map(|log| log.swipee_id)
                .collect(),
            None => HashSet::new(),
        };
        Ok(window_rows(tables.accounts.iter(), window, |account| {
            &account.mask_id != caller
                && !swiped.contains(&account.id)
                && window.matches_keywords(&[&account.name, &account.login_name])
        }))
    }
}

#[async_trait]
impl SwipeLogStore for InMemoryStore {
    async fn insert_swipe_log(&self, log: NewSwipeLog) -> StoreResult<SwipeLog> {
        self.enter(StoreOp::InsertSwipeLog).await?;
        let now = self.now();
        let mut tables = self.tables.write().await;
        if tables
            .swipes_on(log.swiper_id, now.date_naive())
            .any(|earlier| earlier.swipee_id == log.swipee_id)
        {
            return Err(StoreError::unique(DAILY_SWIPE_KEY));
        }
        tables.last_swipe_id += 1;
        let log = SwipeLog {
            id: RowId(tables.last_swipe_id),
            swiper_id: log.swiper_id,
            swipee_id: log.swipee_id,
            decision: log.decision,
            created_at: now,
        };
        tables.swipe_logs.push(log.clone());
        Ok(log)
    }

    async fn today_quota(&self, mask_id: &Uuid) -> StoreResult<Option<SwipeCount>> {
        self.enter(StoreOp::TodayQuota).await?;
        let today = self.today();
        let tables = self.tables.read().await;
        let Some(account) = tables.account_by_mask(mask_id) else {
            return Ok(None);
        };
        let swiped_today = tables.swipes_on(account.id, today).count() as u32;
        if swiped_today == 0 {
            return Ok(None);
        }
        let total = tables
            .swipe_logs
            .iter()
            .filter(|log| log.swiper_id == account.id)
            .count() as u64;
        Ok(Some(SwipeCount {
            today: swiped_today,
            total,
        }))
    }

    async fn find_pair_today(
        &self,
        swiper_id: RowId,
        swipee_id: RowId,
    ) -> StoreResult<Option<SwipeLog>> {
        self.enter(StoreOp::FindPairToday).await?;
        let today = self.today();
        let tables = self.tables.read().await;
        Ok(tables
            .swipes_on(swiper_id, today)
            .find(|log| log.swipee_id == swipee_id)
            .cloned())
    }
}

#[async_trait]
impl PackageStore for InMemoryStore {
    async fn list_active(&self, window: &PageWindow) -> StoreResult<Vec<PremiumPackage>> {
        self.enter(StoreOp::ListPackages).await?;
        let tables = self.tables.read().await;
        Ok(window_rows(tables.packages.iter(), window, |package| {
            package.active && window.matches_keywords(&[&package.title])
        }))
    }

    async fn find_by_package_id(&self, package_uid: &str) -> StoreResult<Option<PremiumPackage>> {
        self.enter(StoreOp::FindPackage).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .packages
            .values()
            .find(|p| p.package_uid == package_uid)
            .cloned())
    }

    async fn find_entitlement(
        &self,
        title: &str,
        account_id: RowId,
    ) -> StoreResult<Option<Purchase>> {
        self.enter(StoreOp::FindEntitlement).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .purchases
            .iter()
            .filter(|p| p.account_id == account_id)
            .find(|p| {
                tables
                    .packages
                    .get(&p.package_id)
                    .is_some_and(|package| package.title == title)
            })
            .cloned())
    }

    async fn purchases_by_account(&self, account_id: RowId) -> StoreResult<Vec<Purchase>> {
        self.enter(StoreOp::ListPurchases).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .purchases
            .iter()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionProvider for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        self.enter(StoreOp::Begin).await?;
        Ok(Box::new(InMemoryUnitOfWork {
            store: self.clone(),
            purchases: Vec::new(),
            accounts: Vec::new(),
        }))
    }
}

/// Staged writes against an [`InMemoryStore`], applied under one write lock
/// at commit.
struct InMemoryUnitOfWork {
    store: InMemoryStore,
    purchases: Vec<NewPurchase>,
    accounts: Vec<Account>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn insert_purchase(&mut self, purchase: NewPurchase) -> StoreResult<()> {
        self.store.enter(StoreOp::InsertPurchase).await?;
        let tables = self.store.tables.read().await;
        if tables.owns(&purchase) || self.purchases.contains(&purchase) {
            return Err(StoreError::unique(PURCHASE_KEY));
        }
        self.purchases.push(purchase);
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<()> {
        self.store.enter(StoreOp::UpdateAccount).await?;
        self.accounts.retain(|staged| staged.id != account.id);
        self.accounts.push(account.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.store.enter(StoreOp::Commit).await?;
        let now = self.store.now();
        let mut tables = self.store.tables.write().await;

        // re-checked under the write lock; a concurrent unit may have won
        if self.purchases.iter().any(|purchase| tables.owns(purchase)) {
            return Err(StoreError::unique(PURCHASE_KEY));
        }
        if let Some(missing) = self
            .accounts
            .iter()
            .find(|account| !tables.accounts.contains_key(&account.id))
        {
            return Err(StoreError::Backend(format!(
                "account {} does not exist",
                missing.id
            )));
        }

        for purchase in &self.purchases {
            tables.last_purchase_id += 1;
            let id = RowId(tables.last_purchase_id);
            tables.purchases.push(Purchase {
                id,
                package_id: purchase.package_id,
                account_id: purchase.account_id,
                purchased_at: now,
            });
        }
        for upgraded in &self.accounts {
            if let Some(stored) = tables.accounts.get_mut(&upgraded.id) {
                stored.merge_upgrade(upgraded);
                stored.updated_at = now;
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.store.enter(StoreOp::Rollback).await?;
        self.store.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountType;
    use crate::domain::pagination::Direction;
    use crate::domain::swipe::SwipeDecision;
    use chrono::{Local, TimeZone};
    use rust_decimal_macros::dec;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn new_account(login_name: &str) -> NewAccount {
        NewAccount {
            account_type: AccountType::Free,
            name: login_name.to_string(),
            login_name: login_name.to_string(),
            password_hash: "hash".to_string(),
            created_by: login_name.to_string(),
        }
    }

    fn window(cursor: Option<u64>, direction: Direction, fetch_limit: usize) -> PageWindow {
        PageWindow {
            keywords: String::new(),
            cursor: cursor.map(RowId),
            direction,
            fetch_limit,
        }
    }

    #[tokio::test]
    async fn test_login_names_are_unique() {
        let store = InMemoryStore::new();
        store.insert(new_account("ann")).await.unwrap();
        let err = store.insert(new_account("ann")).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(store.accounts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_window_ordering() {
        let store = InMemoryStore::new();
        let caller = store.insert(new_account("caller")).await.unwrap();
        for i in 0..5 {
            store.insert(new_account(&format!("user{i}"))).await.unwrap();
        }
        let ids = |rows: Vec<Account>| rows.iter().map(|a| a.id.value()).collect::<Vec<_>>();

        let head = store
            .list_candidates(&caller.mask_id, &window(None, Direction::Next, 3))
            .await
            .unwrap();
        assert_eq!(ids(head), [6, 5, 4]);

        let next = store
            .list_candidates(&caller.mask_id, &window(Some(4), Direction::Next, 10))
            .await
            .unwrap();
        assert_eq!(ids(next), [3, 2]);

        let prev = store
            .list_candidates(&caller.mask_id, &window(Some(3), Direction::Prev, 2))
            .await
            .unwrap();
        assert_eq!(ids(prev), [4, 5]);
    }

    #[tokio::test]
    async fn test_one_swipe_per_pair_per_day() {
        let store = InMemoryStore::new();
        let ann = store.insert(new_account("ann")).await.unwrap();
        let bob = store.insert(new_account("bob")).await.unwrap();
        let log = NewSwipeLog {
            swiper_id: ann.id,
            swipee_id: bob.id,
            decision: SwipeDecision::Like,
        };
        store.insert_swipe_log(log).await.unwrap();
        let err = store.insert_swipe_log(log).await.unwrap_err();
        assert!(err.is_unique_violation());

        // the reverse direction is a different pair
        store
            .insert_swipe_log(NewSwipeLog {
                swiper_id: bob.id,
                swipee_id: ann.id,
                decision: SwipeDecision::Pass,
            })
            .await
            .unwrap();
        assert!(store.find_pair_today(ann.id, bob.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_today_quota_counts_only_today() {
        let yesterday = Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2024, 3, 2, 1, 0, 0).unwrap();
        let store = InMemoryStore::with_clock(Arc::new(FixedClock(yesterday)));
        let ann = store.insert(new_account("ann")).await.unwrap();
        let bob = store.insert(new_account("bob")).await.unwrap();
        store
            .insert_swipe_log(NewSwipeLog {
                swiper_id: ann.id,
                swipee_id: bob.id,
                decision: SwipeDecision::Like,
            })
            .await
            .unwrap();
        let quota = store.today_quota(&ann.mask_id).await.unwrap().unwrap();
        assert_eq!((quota.today, quota.total), (1, 1));

        let store = InMemoryStore {
            clock: Arc::new(FixedClock(today)),
            ..store
        };
        assert_eq!(store.today_quota(&ann.mask_id).await.unwrap(), None);
        assert!(store.find_pair_today(ann.id, bob.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unit_of_work_is_invisible_until_commit() {
        let store = InMemoryStore::new();
        let mut ann = store.insert(new_account("ann")).await.unwrap();
        let package = store
            .add_package(NewPackage {
                package_uid: "pkg".to_string(),
                title: "Verified Label".to_string(),
                description: String::new(),
                price: dec!(1.00),
                active: true,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();
        let purchase = NewPurchase {
            package_id: package.id,
            account_id: ann.id,
        };

        let mut tx = store.begin().await.unwrap();
        tx.insert_purchase(purchase).await.unwrap();
        ann.account_type = AccountType::Premium;
        tx.update_account(&ann).await.unwrap();
        assert!(store.purchases().await.is_empty());
        drop(tx);
        assert!(store.purchases().await.is_empty());

        let mut tx = store.begin().await.unwrap();
        tx.insert_purchase(purchase).await.unwrap();
        tx.update_account(&ann).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.purchases().await.len(), 1);
        let stored = store.account(&ann.mask_id).await.unwrap();
        assert_eq!(stored.account_type, AccountType::Premium);
        assert!(
            store
                .find_entitlement("Verified Label", ann.id)
                .await
                .unwrap()
                .is_some()
        );

        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_purchase(purchase).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_commit_rechecks_concurrent_purchase() {
        let store = InMemoryStore::new();
        let ann = store.insert(new_account("ann")).await.unwrap();
        let package = store
            .add_package(NewPackage {
                package_uid: "pkg".to_string(),
                title: "Unlimited Swipe".to_string(),
                description: String::new(),
                price: dec!(1.00),
                active: true,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();
        let purchase = NewPurchase {
            package_id: package.id,
            account_id: ann.id,
        };

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.insert_purchase(purchase).await.unwrap();
        second.insert_purchase(purchase).await.unwrap();
        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(store.purchases().await.len(), 1);
    }

    #[tokio::test]
    async fn test_interleaved_upgrades_keep_every_entitlement() {
        let store = InMemoryStore::new();
        let snapshot = store.insert(new_account("ann")).await.unwrap();
        let mut packages = Vec::new();
        for (uid, title) in [("pkg-verified", "Verified Label"), ("pkg-swipe", "Unlimited Swipe")] {
            packages.push(
                store
                    .add_package(NewPackage {
                        package_uid: uid.to_string(),
                        title: title.to_string(),
                        description: String::new(),
                        price: dec!(1.00),
                        active: true,
                        created_by: "admin".to_string(),
                    })
                    .await
                    .unwrap(),
            );
        }

        // both units start from the same stale read of the buyer
        let mut units = Vec::new();
        for package in &packages {
            let mut buyer = snapshot.clone();
            buyer.apply_purchase(package, "Verified Label");
            let mut tx = store.begin().await.unwrap();
            tx.insert_purchase(NewPurchase {
                package_id: package.id,
                account_id: snapshot.id,
            })
            .await
            .unwrap();
            tx.update_account(&buyer).await.unwrap();
            units.push(tx);
        }
        for tx in units {
            tx.commit().await.unwrap();
        }

        let stored = store.account(&snapshot.mask_id).await.unwrap();
        assert_eq!(store.purchases().await.len(), 2);
        assert_eq!(stored.account_type, AccountType::Premium);
        assert!(stored.verified);
    }

    #[tokio::test]
    async fn test_faults_fire_once() {
        let store = InMemoryStore::new();
        store.fail_next(StoreOp::InsertAccount);
        assert!(matches!(
            store.insert(new_account("ann")).await,
            Err(StoreError::Backend(_))
        ));
        store.insert(new_account("ann")).await.unwrap();
    }
}
