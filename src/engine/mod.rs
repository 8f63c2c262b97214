//! The underlying schema engine: a keyword registry, a sub-schema index
//! keyed by identifier, a compile step that verifies the graph, and an
//! error-collecting evaluator over the prepared schema document.
//!
//! The engine knows nothing about Lottie. Domain rules are registered as
//! named [`Keyword`]s and receive a [`Ctx`] carrying the instance location,
//! the enclosing container, the document root, and the diagnostic
//! collector.

use crate::diagnostic::{Severity, WarningKind};
use crate::location::Location;
use crate::schema::{keywords, SchemaDocument};
use serde_json::Value;
use std::collections::BTreeMap;

mod eval;

#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("schema reference '{target}' at '{at}' does not resolve")]
    InvalidReference { target: String, at: String },
    #[error("invalid pattern '{pattern}' at '{at}': {source}")]
    InvalidPattern {
        pattern: String,
        at: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// A raw validation outcome, prior to diagnostic post-processing.
#[derive(Debug, Clone)]
pub struct RawError {
    /// The keyword that produced this outcome.
    pub keyword: &'static str,
    /// JSON Pointer into the validated document.
    pub instance_ptr: String,
    /// Fragment pointer to the schema node the violation occurred at.
    pub schema_ptr: String,
    pub message: String,
    pub severity: Severity,
    pub warning: Option<WarningKind>,
}

/// Schema-side location of an evaluation: the fragment of the last `$ref`
/// target, plus the segments walked since.
#[derive(Copy, Clone)]
pub struct Scope<'a> {
    pub base: &'a str,
    pub rel: &'a Location<'a>,
}

impl Scope<'_> {
    pub fn fragment(&self) -> String {
        format!("{}{}", self.base, self.rel.pointer())
    }
}

/// A named custom keyword. `value` is the keyword's value as it appears in
/// the schema, `parent` the schema node carrying it. Implementations
/// publish outcomes through the context and return overall validity;
/// warnings do not affect validity.
pub trait Keyword: std::fmt::Debug {
    fn validate(&self, value: &Value, data: &Value, parent: &Value, ctx: &mut Ctx<'_>) -> bool;
}

/// Context threaded through each custom keyword call.
pub struct Ctx<'c> {
    pub engine: &'c Engine,
    pub instance: &'c Location<'c>,
    pub schema_ptr: &'c str,
    pub parent_data: Option<&'c Value>,
    pub root_data: &'c Value,
    pub out: &'c mut Vec<RawError>,
}

impl Ctx<'_> {
    pub fn error(&mut self, keyword: &'static str, message: String) {
        self.out.push(RawError {
            keyword,
            instance_ptr: self.instance.pointer(),
            schema_ptr: self.schema_ptr.to_string(),
            message,
            severity: Severity::Error,
            warning: None,
        });
    }

    pub fn warning(&mut self, keyword: &'static str, kind: WarningKind, message: String) {
        self.out.push(RawError {
            keyword,
            instance_ptr: self.instance.pointer(),
            schema_ptr: self.schema_ptr.to_string(),
            message,
            severity: Severity::Warning,
            warning: Some(kind),
        });
    }

    /// Index of the validated value within its enclosing sequence.
    pub fn index(&self) -> Option<usize> {
        self.instance.last_index()
    }

    /// Delegates validation of `data` to the sub-schema known as `id`.
    pub fn apply_id(&mut self, keyword: &'static str, id: &str, data: &Value) -> bool {
        let Some((target, fragment)) = self.engine.fetch(id) else {
            self.error(keyword, format!("references unknown schema '{id}'"));
            return false;
        };
        let rel = Location::Root;
        let scope = Scope {
            base: fragment,
            rel: &rel,
        };
        self.engine.eval(
            &scope,
            target,
            data,
            self.instance,
            self.parent_data,
            self.root_data,
            &mut *self.out,
        )
    }

    /// Validates `data` against an inline sub-schema of the keyword value.
    pub fn apply_inline(
        &mut self,
        keyword: &'static str,
        index: usize,
        schema: &Value,
        data: &Value,
    ) -> bool {
        let base = format!("{}/{}/{}", self.schema_ptr, keyword, index);
        let rel = Location::Root;
        let scope = Scope {
            base: &base,
            rel: &rel,
        };
        self.engine.eval(
            &scope,
            schema,
            data,
            self.instance,
            self.parent_data,
            self.root_data,
            &mut *self.out,
        )
    }
}

/// The compiled validator: the frozen schema document, the registered
/// custom keywords, and the pre-compiled `pattern` regexes. Immutable once
/// compiled; each `validate` call is stateless against other calls.
pub struct Engine {
    doc: SchemaDocument,
    custom: BTreeMap<&'static str, Box<dyn Keyword>>,
    patterns: BTreeMap<String, regex::Regex>,
}

impl Engine {
    pub fn new(doc: SchemaDocument) -> Self {
        Self {
            doc,
            custom: BTreeMap::new(),
            patterns: BTreeMap::new(),
        }
    }

    pub fn register_keyword(&mut self, name: &'static str, keyword: Box<dyn Keyword>) {
        self.custom.insert(name, keyword);
    }

    pub fn schema(&self) -> &SchemaDocument {
        &self.doc
    }

    /// Sub-schema lookup by identifier, returning the node and its
    /// fragment pointer.
    pub fn fetch<'e, 'i>(&'e self, id: &'i str) -> Option<(&'e Value, &'i str)> {
        let fragment = self.doc.fragment_of(id)?;
        Some((self.doc.node_at(fragment)?, fragment))
    }

    /// Verifies that every `$ref` and every id named by a dispatch table
    /// resolves, and compiles every `pattern`. A failure here is a broken
    /// schema, not a bad document.
    pub fn compile(&mut self) -> Result<(), CompileError> {
        let mut patterns = BTreeMap::new();
        self.verify(self.doc.root(), "#", &mut patterns)?;
        tracing::debug!(patterns = patterns.len(), "compiled schema");
        self.patterns = patterns;
        Ok(())
    }

    fn verify(
        &self,
        node: &Value,
        at: &str,
        patterns: &mut BTreeMap<String, regex::Regex>,
    ) -> Result<(), CompileError> {
        let map = match node {
            Value::Object(map) => map,
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.verify(item, &format!("{at}/{i}"), patterns)?;
                }
                return Ok(());
            }
            _ => return Ok(()),
        };

        for (key, value) in map {
            match key.as_str() {
                keywords::REF => {
                    if let Some(reference) = value.as_str() {
                        self.check_id(&self.doc.resolve(reference), at)?;
                    }
                }
                keywords::PATTERN => {
                    if let Some(pattern) = value.as_str() {
                        if !patterns.contains_key(pattern) {
                            let compiled = regex::Regex::new(pattern).map_err(|source| {
                                CompileError::InvalidPattern {
                                    pattern: pattern.to_string(),
                                    at: at.to_string(),
                                    source: Box::new(source),
                                }
                            })?;
                            patterns.insert(pattern.to_string(), compiled);
                        }
                    }
                }
                keywords::TY_ONEOF | keywords::SPLITPOS_ONEOF => {
                    if let Some(table) = value.as_object() {
                        for entry in table.values() {
                            if let Some(id) = entry.get("id").and_then(Value::as_str) {
                                self.check_id(id, at)?;
                            }
                        }
                    }
                }
                keywords::ASSET_ONEOF => {
                    if let Some(root_id) = value.as_str() {
                        for kind in ["image", "precomposition"] {
                            self.check_id(&format!("{root_id}#/$defs/assets/{kind}"), at)?;
                        }
                    }
                }
                _ => (),
            }
            if !keywords::is_annotation(key) {
                self.verify(value, &format!("{at}/{key}"), patterns)?;
            }
        }
        Ok(())
    }

    fn check_id(&self, id: &str, at: &str) -> Result<(), CompileError> {
        if self.fetch(id).is_none() {
            return Err(CompileError::InvalidReference {
                target: id.to_string(),
                at: at.to_string(),
            });
        }
        Ok(())
    }

    /// Validates a document against the compiled root schema, collecting
    /// every outcome; never fail-fast.
    pub fn validate(&self, data: &Value) -> Vec<RawError> {
        let rel = Location::Root;
        let scope = Scope {
            base: "#",
            rel: &rel,
        };
        let loc = Location::Root;
        let mut out = Vec::new();
        self.eval(&scope, self.doc.root(), data, &loc, None, data, &mut out);
        tracing::trace!(outcomes = out.len(), "validated document");
        out
    }
}
