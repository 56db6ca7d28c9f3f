//! # Build Errors
//!
//! Every failure a build can hit, each carrying the file path(s) a
//! contributor needs to fix the source document.
//!
//! ## Design
//!
//! - All dataset errors are fatal at build granularity. There is no
//!   skip-and-continue mode: nothing is rewritten or emitted once a
//!   stage has recorded a failure.
//! - A stage still reports every failing document it saw, in the same
//!   byte-wise path order it processed them, through [`BuildFailure`].

use std::fmt;
use std::path::PathBuf;

use imx_core::{CanonicalizationError, IdentifierError, ParseError};
use imx_schema::{DocumentKind, SchemaValidationError, ValidationViolations};
use thiserror::Error;

/// A single build error.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The document is not well-formed JSON or repeats a key.
    #[error("{}: {source}", .path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },

    /// The document is not UTF-8 text.
    #[error("{}: not valid UTF-8 text", .path.display())]
    Encoding {
        /// Offending file.
        path: PathBuf,
    },

    /// The document violates its schema.
    #[error("{}: does not match {kind} schema:\n{violations}", .path.display())]
    Schema {
        /// Offending file.
        path: PathBuf,
        /// Which schema was applied.
        kind: DocumentKind,
        /// Every violation, in validator order.
        violations: ValidationViolations,
    },

    /// Two documents of the same collection declare the same id.
    #[error("duplicate {kind} id {id:?}: declared in {} and {}", .first.display(), .second.display())]
    DuplicateId {
        /// Collection in which the clash occurred.
        kind: DocumentKind,
        /// The clashing identifier.
        id: String,
        /// File that declared the id first (in path order).
        first: PathBuf,
        /// File that declared it again.
        second: PathBuf,
    },

    /// A resource URL uses the deprecated zoom token.
    #[error("{}: resource {id:?} url uses {found} instead of {expected}", .path.display())]
    BadToken {
        /// Offending file.
        path: PathBuf,
        /// Resource id.
        id: String,
        /// The deprecated token found in the URL.
        found: &'static str,
        /// The token that should be used instead.
        expected: &'static str,
    },

    /// A resource references a feature that does not exist.
    #[error("{}: resource {id:?} references unknown feature {feature_id:?}", .path.display())]
    UnresolvedFeature {
        /// Offending file.
        path: PathBuf,
        /// Resource id.
        id: String,
        /// The unresolved reference.
        feature_id: String,
    },

    /// A resource lacks the feature reference its scope requires.
    #[error("{}: resource {id:?} of type {resource_type:?} has no featureId and is not world-scoped", .path.display())]
    MissingFeatureId {
        /// Offending file.
        path: PathBuf,
        /// Resource id.
        id: String,
        /// The resource's `type`.
        resource_type: String,
    },

    /// An identifier passed the schema but not the identifier rules.
    #[error("{}: {source}", .path.display())]
    Identifier {
        /// Offending file.
        path: PathBuf,
        /// Underlying identifier error.
        #[source]
        source: IdentifierError,
    },

    /// Geometry or serialization canonicalization failed.
    #[error("{}: {source}", .path.display())]
    Canonicalization {
        /// Offending file.
        path: PathBuf,
        /// Underlying canonicalization error.
        #[source]
        source: CanonicalizationError,
    },

    /// Reading or writing a file failed.
    #[error("{}: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The localization extract could not be rendered.
    #[error("{}: cannot render extract: {source}", .path.display())]
    Extract {
        /// Extract path.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The schemas could not be loaded or compiled.
    #[error("cannot load schemas: {0}")]
    Schemas(#[source] SchemaValidationError),

    /// The build configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl BuildError {
    /// Wrap an IO error with the path being accessed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short name of the error class, for log fields and summaries.
    pub fn class(&self) -> &'static str {
        match self {
            BuildError::Parse { .. } => "ParseError",
            BuildError::Encoding { .. } => "EncodingError",
            BuildError::Schema { .. } => "SchemaError",
            BuildError::DuplicateId { .. } => "DuplicateIdError",
            BuildError::BadToken { .. } => "BadTokenError",
            BuildError::UnresolvedFeature { .. } => "UnresolvedFeatureError",
            BuildError::MissingFeatureId { .. } => "MissingFeatureIdError",
            BuildError::Identifier { .. } => "IdentifierError",
            BuildError::Canonicalization { .. } => "CanonicalizationError",
            BuildError::Io { .. } => "IoError",
            BuildError::Extract { .. } => "ExtractError",
            BuildError::Schemas(_) => "SchemaLoadError",
            BuildError::Config(_) => "ConfigError",
        }
    }

    /// True for failures of the dataset itself, as opposed to the
    /// environment (IO, configuration).
    pub fn is_dataset_error(&self) -> bool {
        !matches!(
            self,
            BuildError::Io { .. }
                | BuildError::Extract { .. }
                | BuildError::Schemas(_)
                | BuildError::Config(_)
        )
    }
}

/// The non-empty, ordered list of errors that aborted a build stage.
#[derive(Debug)]
pub struct BuildFailure {
    errors: Vec<BuildError>,
}

impl BuildFailure {
    /// Collect errors into a failure, or `None` if there are none.
    pub fn from_errors(errors: Vec<BuildError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// The errors, in the order they were recorded.
    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    /// Returns the number of errors. Always at least one.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if every error is a dataset error (exit status 1 rather than 2).
    pub fn is_dataset_failure(&self) -> bool {
        self.errors.iter().all(BuildError::is_dataset_error)
    }
}

impl From<BuildError> for BuildFailure {
    fn from(error: BuildError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  [{}] {error}", error.class())?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildFailure {}
