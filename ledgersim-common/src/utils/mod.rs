//! utils.rs
//!
//! Common types and helper implementations shared across LedgerSim.
//!
//! This module provides basic utilities such as unique peer identifiers
//! and conversion helpers.

pub mod peer_id;
pub use peer_id::PeerId;
