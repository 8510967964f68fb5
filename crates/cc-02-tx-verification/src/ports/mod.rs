//! # Ports Layer
//!
//! - **Inbound** (`inbound.rs`): the verification API this crate offers
//! - **Outbound** (`outbound.rs`): chain state and mempool it depends on

pub mod inbound;
pub mod outbound;
