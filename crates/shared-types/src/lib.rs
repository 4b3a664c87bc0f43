//! # Shared Types Crate
//!
//! This crate contains the ledger-facing entities every point-of-sale crate
//! agrees on: addresses, opaque identifiers, and the transaction shape the
//! ledger collaborator hands back when a transaction is looked up, created or
//! submitted.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate ledger types are defined here.
//! - **Validated at the Edge**: `Address` can only be constructed from a
//!   well-formed hex public key, including when deserialized.
//! - **Opaque Identifiers**: Transaction and wallet ids are newtypes so they
//!   cannot be mixed up at call sites.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
