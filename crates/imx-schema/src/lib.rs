//! # imx-schema — Document Schema Validation
//!
//! Validates feature and resource documents against declarative JSON
//! Schemas and reports structured violations.
//!
//! ## Runtime Validation (`validate`)
//!
//! [`SchemaValidator`] compiles `feature.schema.json` and
//! `resource.schema.json` once (bundled copies or a directory) and
//! validates parsed documents against them:
//!
//! - [`SchemaValidator::violations`] — the ordered violation list (pure).
//! - [`SchemaValidator::validate`] — the same, as a `Result`.
//!
//! ## Strictness Audit (`audit`)
//!
//! [`audit_additional_properties`] lists object schemas that would accept
//! unknown properties. Schemas with findings are refused at load time.
//!
//! ## Crate Policy
//!
//! - No internal dependencies; the schemas are the contract.
//! - Schema validation is a trust boundary: invalid documents are rejected
//!   with the offending path and a reason for every violation.

pub mod audit;
pub mod validate;

pub use audit::{audit_additional_properties, AdditionalPropertiesFinding};
pub use validate::{
    DocumentKind, SchemaOrigin, SchemaValidationError, SchemaValidator, ValidationViolations,
    Violation,
};
