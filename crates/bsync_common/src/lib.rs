//! Shared foundational types used across the bsync sync engine.
//!
//! This crate provides build-target labels, content hashing for change
//! detection, a minimal protobuf wire codec for the build tool's binary
//! outputs, and the cooperative cancellation token threaded through a sync.

#![warn(missing_docs)]

pub mod cancel;
pub mod hash;
pub mod label;
pub mod wire;

pub use cancel::{CancellationToken, Cancelled};
pub use hash::ContentHash;
pub use label::{Label, LabelError};
pub use wire::{WireError, WireReader, WireType, WireWriter};
