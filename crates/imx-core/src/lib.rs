#![deny(missing_docs)]
//! # imx-core — Foundational Types for the Imagery Index
//!
//! Leaf crate of the workspace. Everything that decides what a document
//! looks like on disk lives here, so that the loaders, the rewriter and
//! the emitter cannot disagree about it.
//!
//! ## Key Design Principles
//!
//! 1. **`SourceId` newtype.** Feature and resource identifiers are only
//!    constructed through a validated constructor; indices are keyed by it.
//!
//! 2. **Strict parsing.** [`strict::parse_document`] rejects duplicate
//!    object keys instead of silently keeping the last one.
//!
//! 3. **`CanonicalText` newtype.** All bytes compared against or written
//!    to a source file flow through `CanonicalText::pretty()`. There is
//!    exactly one pretty-printing path.
//!
//! 4. **Geometry canonicalization.** [`GeometryCanonicalizer`] reduces
//!    coordinate precision and fixes ring winding. Applying it twice is
//!    the same as applying it once.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `imx-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod precision;
pub mod strict;

pub use canonical::{order_feature_keys, CanonicalText};
pub use error::{CanonicalizationError, IdentifierError, ParseError};
pub use geometry::{GeometryCanonicalizer, Winding, DEFAULT_PRECISION};
pub use identity::SourceId;
pub use precision::round_half_away;
pub use strict::parse_document;
