//! Ports layer for the checkout subsystem.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (Driving) ports: API exposed to the presentation layer
//! - Outbound (Driven) ports: Dependencies on external systems

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
