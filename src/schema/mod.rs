//! The Lottie schema document and the preparation pipeline which turns it
//! into a validatable form: documentation metadata, closed property sets,
//! and discriminated-union rewrites.

use serde_json::Value;

pub mod docs;
pub mod keywords;
pub mod props;
pub mod rewrite;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("schema document has no '$id'")]
    MissingId,
    #[error("schema '$id' is not a valid URL: {0}")]
    InvalidId(#[from] url::ParseError),
    #[error("expected the schema root to be an object")]
    ExpectedObject,
}

/// An owned, in-memory schema document. All preparation passes mutate it in
/// place; once handed to the engine it is frozen.
///
/// Sub-schemas are identified by `<rootId>#/<json-pointer>` strings, the
/// stable keys shared by the property index and the engine's lookup table.
pub struct SchemaDocument {
    id: String,
    root: Value,
}

impl SchemaDocument {
    pub fn new(root: Value) -> Result<Self, Error> {
        if !root.is_object() {
            return Err(Error::ExpectedObject);
        }
        let id = root
            .get(keywords::ID)
            .and_then(Value::as_str)
            .ok_or(Error::MissingId)?;
        url::Url::parse(id)?;
        let id = id.trim_end_matches('#').to_string();

        Ok(Self { id, root })
    }

    /// The declared `$id` of the document, without a trailing fragment.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Full identifier of the sub-schema at `fragment` ("#/$defs/…").
    pub fn node_id(&self, fragment: &str) -> String {
        format!("{}{}", self.id, fragment)
    }

    /// Resolves a reference as it appears in the document ("#/…" or an
    /// absolute URI) into a full identifier.
    pub fn resolve(&self, reference: &str) -> String {
        if reference.starts_with('#') {
            self.node_id(reference)
        } else {
            reference.to_string()
        }
    }

    /// The fragment ("#/…") of an identifier within this document, or None
    /// for identifiers rooted elsewhere.
    pub fn fragment_of<'a>(&self, id: &'a str) -> Option<&'a str> {
        let rest = id.strip_prefix(self.id.as_str())?;
        rest.starts_with('#').then_some(rest)
    }

    /// Sub-schema at a fragment pointer, e.g. `#/$defs/layers/shape-layer`.
    pub fn node_at(&self, fragment: &str) -> Option<&Value> {
        match fragment {
            "#" | "" => Some(&self.root),
            _ => self.root.pointer(fragment.strip_prefix('#')?),
        }
    }

    pub fn node_at_mut(&mut self, fragment: &str) -> Option<&mut Value> {
        match fragment {
            "#" | "" => Some(&mut self.root),
            _ => self.root.pointer_mut(fragment.strip_prefix('#')?),
        }
    }

    /// Runs the preparation pipeline: documentation metadata, then the
    /// property index, then the union rewrites. Idempotent in its first
    /// stage; the rewrites assume a freshly loaded document.
    pub fn prepare(&mut self, docs_url: &str) {
        docs::annotate(self, docs_url);
        props::close_properties(self);
        rewrite::rewrite(self);
    }

    /// Category maps under `$defs`, e.g. ("layers", {"shape-layer": …}).
    pub(crate) fn defs(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.root
            .get(keywords::DEFS)
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
    }
}
