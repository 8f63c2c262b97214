//! The property index: for every named schema node, the closed set of
//! property names it recognizes, following `$ref` chains transitively.
//! The closed set is written back onto the node as `warn_extra_props`,
//! which at validation time turns unrecognized document keys into
//! warnings.

use super::{keywords, SchemaDocument};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Properties recognized by one named schema node.
#[derive(Debug, Default)]
pub struct PropertyList {
    /// Node location within the schema document ("#/…").
    fragment: String,
    /// Directly declared property names.
    props: BTreeSet<String>,
    /// Identifiers of referenced schemas whose properties are inherited.
    references: BTreeSet<String>,
    /// Set when `additionalProperties` is declared: the node is open and
    /// must never warn about extra properties.
    skip: bool,
}

impl PropertyList {
    /// A list closes its node when the node is not open and is more than a
    /// pass-through: a node whose sole content is a single `$ref` carries
    /// no property knowledge of its own, the target does.
    fn is_closeable(&self) -> bool {
        !self.skip && (!self.props.is_empty() || self.references.len() >= 2)
    }
}

/// Index of [`PropertyList`]s keyed by schema identifier.
#[derive(Debug, Default)]
pub struct PropertyIndex {
    lists: BTreeMap<String, PropertyList>,
    /// Identifiers referenced under an `allOf`: mix-in bases whose closed
    /// set is inherited by subtypes, never independently warned about.
    base_refs: BTreeSet<String>,
}

impl PropertyIndex {
    /// Pass 1: walk the schema graph, accumulating one list per named node.
    pub fn extract(doc: &SchemaDocument) -> Self {
        let mut index = Self::default();

        for (category, objects) in doc.defs() {
            let Some(objects) = objects.as_object() else {
                continue;
            };
            for (object, node) in objects {
                let fragment = format!("#/$defs/{category}/{object}");
                let id = doc.node_id(&fragment);
                index.ensure(&id, doc);
                index.scan(node, &id, doc);
            }
        }

        tracing::debug!(
            lists = index.lists.len(),
            bases = index.base_refs.len(),
            "extracted property index"
        );
        index
    }

    fn ensure(&mut self, id: &str, doc: &SchemaDocument) {
        if !self.lists.contains_key(id) {
            let fragment = doc.fragment_of(id).unwrap_or("#").to_string();
            self.lists.insert(
                id.to_string(),
                PropertyList {
                    fragment,
                    ..PropertyList::default()
                },
            );
        }
    }

    fn list_mut(&mut self, id: &str) -> &mut PropertyList {
        self.lists.entry(id.to_string()).or_default()
    }

    fn scan(&mut self, node: &Value, list: &str, doc: &SchemaDocument) {
        let map = match node {
            Value::Object(map) => map,
            Value::Array(items) => {
                for item in items {
                    self.scan(item, list, doc);
                }
                return;
            }
            _ => return,
        };

        for (key, value) in map {
            match key.as_str() {
                keywords::PROPERTIES => {
                    let Some(props) = value.as_object() else {
                        continue;
                    };
                    for (prop, child) in props {
                        self.list_mut(list).props.insert(prop.clone());

                        let child_id = format!("{list}/properties/{prop}");
                        self.ensure(&child_id, doc);
                        self.scan(child, &child_id, doc);
                    }
                }
                keywords::ONE_OF => {
                    let Some(variants) = value.as_array() else {
                        continue;
                    };
                    for (i, variant) in variants.iter().enumerate() {
                        // An animated property keeps one conceptual identity
                        // across its constant and keyframed shapes: both
                        // variants contribute to the same closed set.
                        if list.ends_with("-property") {
                            self.scan(variant, list, doc);
                        } else {
                            let variant_id = format!("{list}/oneOf/{i}");
                            self.ensure(&variant_id, doc);
                            self.scan(variant, &variant_id, doc);
                        }
                    }
                }
                keywords::ALL_OF => {
                    let Some(variants) = value.as_array() else {
                        continue;
                    };
                    for variant in variants {
                        if let Some(base) = variant.get(keywords::REF).and_then(Value::as_str) {
                            self.base_refs.insert(doc.resolve(base));
                        }
                        // Inlined: the variant's properties are this node's.
                        self.scan(variant, list, doc);
                    }
                }
                keywords::ADDITIONAL_PROPERTIES => self.list_mut(list).skip = true,
                keywords::REF => {
                    if let Some(target) = value.as_str() {
                        self.list_mut(list).references.insert(doc.resolve(target));
                    }
                }
                keywords::NOT => (),
                key if keywords::is_annotation(key) => (),
                _ => self.scan(value, list, doc),
            }
        }
    }

    /// Transitive property closure of `id`, cycle-safe: a node already in
    /// progress contributes only its directly-known properties to the
    /// recursion frame.
    fn closure(
        &self,
        id: &str,
        memo: &mut BTreeMap<String, BTreeSet<String>>,
        stack: &mut BTreeSet<String>,
    ) -> BTreeSet<String> {
        if let Some(done) = memo.get(id) {
            return done.clone();
        }
        let Some(list) = self.lists.get(id) else {
            return BTreeSet::new();
        };
        if !stack.insert(id.to_string()) {
            return list.props.clone();
        }

        let mut out = list.props.clone();
        for reference in &list.references {
            out.extend(self.closure(reference, memo, stack));
        }

        stack.remove(id);
        memo.insert(id.to_string(), out.clone());
        out
    }
}

/// Pass 2: write the closure of every closeable, non-base node back onto
/// its schema node as `warn_extra_props`.
pub fn close_properties(doc: &mut SchemaDocument) {
    let index = PropertyIndex::extract(doc);

    let mut memo = BTreeMap::new();
    let mut writes = Vec::new();
    for (id, list) in &index.lists {
        if !list.is_closeable() || index.base_refs.contains(id) {
            continue;
        }
        let mut stack = BTreeSet::new();
        let names = index.closure(id, &mut memo, &mut stack);
        writes.push((list.fragment.clone(), names));
    }

    let mut closed = 0usize;
    for (fragment, names) in writes {
        if let Some(Value::Object(map)) = doc.node_at_mut(&fragment) {
            let names = names.into_iter().map(Value::String).collect();
            map.insert(keywords::WARN_EXTRA_PROPS.to_string(), Value::Array(names));
            closed += 1;
        }
    }

    tracing::debug!(closed, "wrote closed property sets");
}
