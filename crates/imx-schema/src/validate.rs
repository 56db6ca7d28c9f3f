//! # Schema Validation
//!
//! Validates parsed feature and resource documents against JSON Schema
//! definitions (Draft 2020-12).
//!
//! ## Trust Boundary
//!
//! A document that fails validation is unusable: the caller must not
//! index, rewrite or emit it. Violations are returned as an ordered list,
//! each naming the offending property path and a human-readable reason,
//! so a contributor can fix the source file directly.
//!
//! ## Schemas as Data
//!
//! The schemas are JSON files, not Rust code. Copies are embedded in the
//! binary (`schemas/*.schema.json`); a directory holding
//! `feature.schema.json` and `resource.schema.json` can replace them.
//! Both are compiled once at construction and audited for strictness
//! (see [`crate::audit`]).

use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Draft, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::audit::audit_additional_properties;

const BUNDLED_FEATURE_SCHEMA: &str = include_str!("../schemas/feature.schema.json");
const BUNDLED_RESOURCE_SCHEMA: &str = include_str!("../schemas/resource.schema.json");

/// The two document collections of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// A boundary polygon document.
    Feature,
    /// An imagery source descriptor.
    Resource,
}

impl DocumentKind {
    /// Filename of the schema governing this kind of document.
    pub fn schema_file(self) -> &'static str {
        match self {
            DocumentKind::Feature => "feature.schema.json",
            DocumentKind::Resource => "resource.schema.json",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Feature => f.write_str("feature"),
            DocumentKind::Resource => f.write_str("resource"),
        }
    }
}

/// Failure to load the document schemas or to satisfy one.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// A feature or resource document breaks its schema.
    #[error("document breaks {schema_name} ({} violation(s)):\n{violations}", .violations.len())]
    ValidationFailed {
        /// Schema file the document was checked against.
        schema_name: String,
        /// What is wrong, in validator order.
        violations: ValidationViolations,
    },

    /// A schema file is missing or is not JSON.
    #[error("cannot read {schema_name}: {reason}")]
    SchemaLoadError {
        /// Schema file name.
        schema_name: String,
        /// Why it could not be read.
        reason: String,
    },

    /// A schema file is JSON but not a usable draft 2020-12 schema.
    #[error("cannot compile {schema_name}: {reason}")]
    ValidatorBuildError {
        /// Schema file name.
        schema_name: String,
        /// Compiler message.
        reason: String,
    },

    /// An object schema accepts properties it does not name.
    #[error("{schema_name} admits unknown properties at: {}", .locations.join(", "))]
    PermissiveSchema {
        /// Schema file name.
        schema_name: String,
        /// JSON Pointers of the open object schemas.
        locations: Vec<String>,
    },
}

/// One way in which a document breaks its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the offending member, empty for the whole document.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that rejected it.
    pub schema_path: String,
    /// The validator's explanation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let member = if self.instance_path.is_empty() {
            "document"
        } else {
            &self.instance_path
        };
        write!(f, "  - {member}: {} [{}]", self.message, self.schema_path)
    }
}

/// The violations of one document; empty when it is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// True for a valid document.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterate in validator order.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }
}

impl IntoIterator for ValidationViolations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.violations.iter().map(Violation::to_string).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Where the schemas of a validator came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOrigin {
    /// The copies compiled into the binary.
    Bundled,
    /// A directory on disk.
    Directory(PathBuf),
}

/// Compiled validators for feature and resource documents.
///
/// `SchemaValidator` is `Send + Sync`; one instance is shared by all
/// loader workers.
pub struct SchemaValidator {
    origin: SchemaOrigin,
    feature: Validator,
    resource: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Build a validator from the schemas embedded in the binary.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled schemas are themselves broken, which the
    /// test suite guards against.
    pub fn bundled() -> Result<Self, SchemaValidationError> {
        let feature = parse_schema(DocumentKind::Feature.schema_file(), BUNDLED_FEATURE_SCHEMA)?;
        let resource = parse_schema(DocumentKind::Resource.schema_file(), BUNDLED_RESOURCE_SCHEMA)?;
        Self::from_values(SchemaOrigin::Bundled, &feature, &resource)
    }

    /// Build a validator from `feature.schema.json` and
    /// `resource.schema.json` in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaLoadError` if a file is missing or not JSON,
    /// `PermissiveSchema` if a schema admits unknown properties, and
    /// `ValidatorBuildError` if a schema does not compile.
    pub fn from_dir(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let schema_dir = schema_dir.as_ref();
        let load = |kind: DocumentKind| -> Result<Value, SchemaValidationError> {
            let path = schema_dir.join(kind.schema_file());
            let text = std::fs::read_to_string(&path).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    schema_name: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            parse_schema(kind.schema_file(), &text)
        };
        let feature = load(DocumentKind::Feature)?;
        let resource = load(DocumentKind::Resource)?;
        Self::from_values(SchemaOrigin::Directory(schema_dir.to_path_buf()), &feature, &resource)
    }

    fn from_values(
        origin: SchemaOrigin,
        feature: &Value,
        resource: &Value,
    ) -> Result<Self, SchemaValidationError> {
        let feature = compile(DocumentKind::Feature.schema_file(), feature)?;
        let resource = compile(DocumentKind::Resource.schema_file(), resource)?;
        tracing::debug!(?origin, "compiled document schemas");
        Ok(Self {
            origin,
            feature,
            resource,
        })
    }

    /// Where the schemas were loaded from.
    pub fn origin(&self) -> &SchemaOrigin {
        &self.origin
    }

    /// Collect every violation of `instance` against the schema for `kind`.
    ///
    /// Pure: the same instance always yields the same ordered list. An
    /// empty list means the document is valid.
    pub fn violations(&self, kind: DocumentKind, instance: &Value) -> ValidationViolations {
        let validator = match kind {
            DocumentKind::Feature => &self.feature,
            DocumentKind::Resource => &self.resource,
        };
        let violations = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        ValidationViolations { violations }
    }

    /// Validate `instance` against the schema for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidationFailed` with structured
    /// violation details if the document is invalid.
    pub fn validate(&self, kind: DocumentKind, instance: &Value) -> Result<(), SchemaValidationError> {
        let violations = self.violations(kind, instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: kind.schema_file().to_string(),
                violations,
            })
        }
    }
}

fn parse_schema(schema_name: &str, text: &str) -> Result<Value, SchemaValidationError> {
    serde_json::from_str(text).map_err(|e| SchemaValidationError::SchemaLoadError {
        schema_name: schema_name.to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}

fn compile(schema_name: &str, schema: &Value) -> Result<Validator, SchemaValidationError> {
    let findings = audit_additional_properties(schema);
    if !findings.is_empty() {
        return Err(SchemaValidationError::PermissiveSchema {
            schema_name: schema_name.to_string(),
            locations: findings.into_iter().map(|f| f.to_string()).collect(),
        });
    }
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|e| SchemaValidationError::ValidatorBuildError {
            schema_name: schema_name.to_string(),
            reason: e.to_string(),
        })
}
