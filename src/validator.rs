//! The public validator: construction runs the preparation pipeline and
//! compiles the engine; each `validate` call turns raw engine outcomes
//! into documentation-linked diagnostics sorted by path.

use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::{CompileError, Engine, RawError};
use crate::location::nodes_along;
use crate::rules;
use crate::schema::{self, keywords, SchemaDocument};
use serde_json::Value;

/// Canonical documentation site for the Lottie format.
pub const DOCS_URL: &str = "https://lottiefiles.github.io/lottie-docs/";

/// Name of the published schema file.
pub const SCHEMA_FILE_NAME: &str = "lottie.schema.json";

/// Location of the published schema file under a CDN prefix.
pub fn canonical_schema_url(cdn_prefix: &str) -> String {
    format!("{}/{}", cdn_prefix.trim_end_matches('/'), SCHEMA_FILE_NAME)
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Attach the `nm` chain of `ty`-carrying ancestors to each diagnostic.
    pub name_paths: bool,
    /// Base URL for documentation links.
    pub docs_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_paths: false,
            docs_url: DOCS_URL.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] schema::Error),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Validation input: raw text or an already parsed document.
pub enum Input<'a> {
    Text(&'a str),
    Document(&'a Value),
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(text: &'a str) -> Self {
        Input::Text(text)
    }
}

impl<'a> From<&'a Value> for Input<'a> {
    fn from(document: &'a Value) -> Self {
        Input::Document(document)
    }
}

/// A compiled Lottie document validator. Construction failures indicate a
/// broken schema (a programming error); document problems are always
/// reported as diagnostics, never as Rust errors. Immutable once built,
/// and each call to `validate` is stateless against other calls.
pub struct Validator {
    engine: Engine,
    config: Config,
}

impl Validator {
    pub fn new(schema: Value) -> Result<Self, Error> {
        Self::with_config(schema, Config::default())
    }

    pub fn with_config(schema: Value, config: Config) -> Result<Self, Error> {
        let mut doc = SchemaDocument::new(schema)?;
        doc.prepare(&config.docs_url);

        let mut engine = Engine::new(doc);
        rules::register_all(&mut engine);
        engine.compile()?;

        tracing::debug!(name_paths = config.name_paths, "validator ready");
        Ok(Self { engine, config })
    }

    /// Validates either a JSON string or a parsed document.
    pub fn validate<'a>(
        &self,
        input: impl Into<Input<'a>>,
        show_warnings: bool,
    ) -> Vec<Diagnostic> {
        match input.into() {
            Input::Text(text) => self.validate_string(text, show_warnings),
            Input::Document(document) => self.validate_object(document, show_warnings),
        }
    }

    /// Parses and validates a JSON string. A document that isn't valid
    /// JSON yields two errors: a fixed first message, then the parser's.
    pub fn validate_string(&self, input: &str, show_warnings: bool) -> Vec<Diagnostic> {
        match serde_json::from_str::<Value>(input) {
            Ok(document) => self.validate_object(&document, show_warnings),
            Err(parse_error) => vec![
                plain_error("Document is not a valid JSON file".to_string()),
                plain_error(parse_error.to_string()),
            ],
        }
    }

    /// Validates a parsed document, returning diagnostics sorted by path.
    pub fn validate_object(&self, input: &Value, show_warnings: bool) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = self
            .engine
            .validate(input)
            .into_iter()
            .filter_map(|raw| self.document_diagnostic(raw, input, show_warnings))
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }

    fn document_diagnostic(
        &self,
        raw: RawError,
        input: &Value,
        show_warnings: bool,
    ) -> Option<Diagnostic> {
        if raw.severity == Severity::Warning && !show_warnings {
            return None;
        }
        // The `if` summary duplicates the guarded branch's own errors.
        if raw.keyword == keywords::IF {
            return None;
        }

        let (name, docs) = self.context_of(&raw.schema_ptr);
        let body = if raw.keyword == keywords::PATTERN {
            "doesn't match the pattern".to_string()
        } else {
            raw.message
        };
        let path_names = self
            .config
            .name_paths
            .then(|| name_path(input, &raw.instance_ptr));

        Some(Diagnostic {
            severity: raw.severity,
            warning: raw.warning,
            message: format!("{name} {body}"),
            path: raw.instance_ptr,
            name,
            docs,
            path_names,
        })
    }

    /// Contextual name and documentation link for a schema location: the
    /// nearest annotated node at or above `schema_ptr`.
    fn context_of(&self, schema_ptr: &str) -> (String, Option<String>) {
        let mut name = None;
        let mut docs = None;
        let mut fragment = schema_ptr;

        loop {
            if let Some(node) = self.engine.schema().node_at(fragment) {
                if name.is_none() {
                    name = node
                        .get(keywords::NAME)
                        .and_then(Value::as_str)
                        .map(str::to_string);
                }
                if docs.is_none() {
                    docs = node
                        .get(keywords::DOCS)
                        .and_then(Value::as_str)
                        .map(str::to_string);
                }
                if name.is_some() && docs.is_some() {
                    break;
                }
            }
            match fragment.rfind('/') {
                Some(cut) if cut > 0 => fragment = &fragment[..cut],
                _ => break,
            }
        }

        (name.unwrap_or_else(|| "Value".to_string()), docs)
    }
}

fn plain_error(message: String) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        warning: None,
        message,
        path: String::new(),
        name: "Value".to_string(),
        docs: None,
        path_names: None,
    }
}

/// The `nm` of every `ty`-carrying node along the instance path, null for
/// anonymous ones.
fn name_path(document: &Value, ptr: &str) -> Vec<Option<String>> {
    nodes_along(document, ptr)
        .into_iter()
        .filter(|node| node.get("ty").is_some())
        .map(|node| node.get("nm").and_then(Value::as_str).map(str::to_string))
        .collect()
}
