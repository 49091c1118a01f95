//! Application layer: the business rules and transaction orchestration.
//!
//! [`engine::MatchEngine`] owns the store ports and exposes one async entry
//! point per operation. It keeps no state between calls; every decision is
//! re-derived from the stores, which are the only synchronization point
//! between concurrent callers.

pub mod checkout;
pub mod context;
pub mod engine;
pub mod feed;
pub mod swipe;
