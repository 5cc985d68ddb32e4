//! Core types for Tabula: the error taxonomy, canonical stat keys, and the
//! stat name normalizer.
//!
//! Every other crate in the workspace speaks in terms of [`StatKey`] and
//! [`TbError`]. A `StatKey` can only be obtained through a
//! [`StatNameNormalizer`], so localized display names ("肉体") never leak
//! into stat maps where a canonical key ("Body") is expected.

/// Error taxonomy shared by the whole workspace.
pub mod error;
/// Canonical stat keys and the localized-name normalizer.
pub mod stat;

/// Re-export error types.
pub use error::{ErrorCode, TbError, TbResult};
/// Re-export stat types.
pub use stat::{StatKey, StatMap, StatNameNormalizer};
