//! # imx-build — The Imagery Index Build
//!
//! Turns a tree of contributed feature and resource documents into
//! canonical sources and aggregate artifacts.
//!
//! ## Stages
//!
//! 1. **Discovery** ([`discover`]): recursive, sorted byte-wise by path.
//! 2. **Features** ([`features`]): parse, unwrap, validate, canonicalize,
//!    index, detect duplicates.
//! 3. **Resources** ([`resources`]): parse, validate, index, detect
//!    duplicates, reject the deprecated zoom token, resolve feature
//!    references, collect translation strings ([`i18n`]).
//! 4. **Rewrite** ([`rewrite`]): overwrite sources whose canonical text
//!    differs from disk.
//! 5. **Emit** ([`emit`]): aggregate JSON (pretty and compact) and the
//!    localization extract, written only when changed.
//!
//! [`Pipeline`] runs the stages from a [`BuildConfig`]. Every stage
//! reports all failing documents at once through [`BuildFailure`].
//!
//! ## Determinism
//!
//! Two runs over the same tree produce the same bytes, whether or not
//! files are processed in parallel: per-file work is independent, and
//! everything that depends on order (indexing, duplicate detection,
//! error reporting) happens sequentially in path order afterwards.

pub mod config;
pub mod discover;
pub mod document;
pub mod emit;
pub mod error;
pub mod features;
pub mod i18n;
pub mod lint;
pub mod pipeline;
pub mod resources;
pub mod rewrite;

pub use config::{BuildConfig, DEFAULT_CONFIG_FILE};
pub use error::{BuildError, BuildFailure};
pub use features::{Feature, FeatureIndex, FeatureLoader, LoadedFeatures};
pub use i18n::{I18nBundle, I18nEntry};
pub use lint::{Lint, LintKind};
pub use pipeline::{BuildReport, Mode, Pipeline};
pub use resources::{
    LoadedResources, Resource, ResourceIndex, ResourceLoader, FEATURE_ID_EXEMPT_TYPES,
};
pub use rewrite::{RewriteQueue, RewriteReport};
