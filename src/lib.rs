//! Validation of Lottie animation documents against the Lottie
//! JSON-Schema, producing human-readable diagnostics that name the
//! offending field, locate it in the document, and link into the format
//! documentation. Consumed by the linter, the web playground, and editor
//! tooling.
//!
//! The schema alone cannot express several rules of the format — `ty`-
//! discriminated unions, animated-property dispatch, keyframe ordering,
//! asset cross-references, unknown-property accumulation — so construction
//! runs a preparation pipeline over the schema document (see [`schema`])
//! before compiling it, and the domain keywords in [`rules`] are
//! registered with the [`engine`] to enforce what plain vocabulary cannot.

mod compare;
pub mod diagnostic;
pub mod engine;
pub mod location;
pub mod rules;
pub mod schema;
mod validator;

pub use diagnostic::{Diagnostic, Severity, WarningKind};
pub use validator::{
    canonical_schema_url, Config, Error, Input, Validator, DOCS_URL, SCHEMA_FILE_NAME,
};
