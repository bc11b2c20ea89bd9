//! Batch orchestration
//!
//! A batch runs every configured feed once:
//! - feeds are fetched with a bounded number of concurrent sessions
//! - fresh feeds are reconciled with their previous snapshot and written
//! - failures follow the feed's `onFail` policy; in scheduled runs a failing
//!   feed that used to have entries is replaced by an empty placeholder
//! - the combined feed is written last
//! - the first unsuppressed failure is returned after everything else is written

mod orchestrator;

pub use orchestrator::{Batch, BatchReport};
