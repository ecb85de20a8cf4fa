//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs` — Rich domain types (validated, business-logic-ready)
//! - `wire.rs` — Raw serde structs matching venue responses
//! - `client.rs` — Sub-client with HTTP methods

pub mod exchange;
pub mod info;
