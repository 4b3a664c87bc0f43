//! Domain layer for the checkout subsystem.
//!
//! Pure business logic with no I/O.

pub mod cart_builder;
pub mod catalog;
pub mod entities;
pub mod errors;
pub mod history;
pub mod identity;
pub mod value_objects;
pub mod wallet;

pub use cart_builder::*;
pub use catalog::*;
pub use entities::*;
pub use errors::*;
pub use history::*;
pub use identity::*;
pub use value_objects::*;
pub use wallet::*;
