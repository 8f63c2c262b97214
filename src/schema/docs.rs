//! Documentation metadata: a single walk over `$defs` annotating every
//! sub-schema with `_docs` (documentation URL), `_docs_name` (category
//! title) and `_name` (human per-field title). Diagnostics read
//! "Shape Layer.ks is missing …", never a bare instance pointer, because
//! of the names derived here.

use super::{keywords, SchemaDocument};
use serde_json::Value;

/// Annotates every schema node reachable from `$defs`. Idempotent: a second
/// run overwrites each annotation with the identical value.
pub fn annotate(doc: &mut SchemaDocument, docs_url: &str) {
    let base = format!("{}/", docs_url.trim_end_matches('/'));
    let mut count = 0usize;

    let Some(defs) = doc
        .root
        .get_mut(keywords::DEFS)
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    for (category, objects) in defs.iter_mut() {
        let category_docs = format!("{base}{category}/");
        let docs_name = category_title(category);

        let Some(objects) = objects.as_object_mut() else {
            continue;
        };
        for (object, node) in objects.iter_mut() {
            // Top-level objects having a `type` document a concrete entity
            // and link to its own section of the category page.
            let docs = if node.get(keywords::TYPE).is_some() {
                format!("{category_docs}#{object}")
            } else {
                category_docs.clone()
            };
            let name = match node.get(keywords::TITLE).and_then(Value::as_str) {
                Some(title) => title.to_string(),
                None => title_case(object),
            };
            annotate_node(node, &docs, &docs_name, &name, &mut count);
        }
    }

    tracing::debug!(nodes = count, "annotated schema documentation metadata");
}

fn annotate_node(node: &mut Value, docs: &str, docs_name: &str, name: &str, count: &mut usize) {
    match node {
        Value::Object(map) => {
            map.insert(keywords::DOCS.to_string(), Value::String(docs.to_string()));
            map.insert(
                keywords::DOCS_NAME.to_string(),
                Value::String(docs_name.to_string()),
            );
            map.insert(keywords::NAME.to_string(), Value::String(name.to_string()));
            *count += 1;

            for (key, child) in map.iter_mut() {
                if keywords::is_annotation(key) {
                    continue;
                }
                if key == keywords::PROPERTIES {
                    let Some(props) = child.as_object_mut() else {
                        continue;
                    };
                    for (prop, prop_schema) in props.iter_mut() {
                        // A titled child is a named sub-entity; an untitled
                        // one is merely a structural field.
                        let child_name = match prop_schema
                            .get(keywords::TITLE)
                            .and_then(Value::as_str)
                        {
                            Some(title) => format!("{} {}", name, title.to_lowercase()),
                            None => format!("{name}.{prop}"),
                        };
                        annotate_node(prop_schema, docs, docs_name, &child_name, count);
                    }
                } else {
                    annotate_node(child, docs, docs_name, name, count);
                }
            }
        }
        // Array elements inherit the ambient name unchanged.
        Value::Array(items) => {
            for item in items {
                annotate_node(item, docs, docs_name, name, count);
            }
        }
        _ => (),
    }
}

/// "shape-layer" -> "Shape Layer".
fn title_case(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Category title: trailing "s" stripped, then title-cased.
fn category_title(category: &str) -> String {
    title_case(category.strip_suffix('s').unwrap_or(category))
}
