//! End-to-end flows.

pub mod flows;
pub mod ledger;
