//! Union rewrites: generic `oneOf` constructs whose variant is selected by
//! a sibling value are replaced with tagged custom keywords the validation
//! engine can dispatch on directly. A plain schema validator tries every
//! branch and reports a wall of mismatches; a tagged dispatch reports the
//! one branch the document actually meant.

use super::{keywords, SchemaDocument};
use serde_json::{json, Value};

/// Applies all rewrites. Assumes a freshly prepared document: documentation
/// metadata and closed property sets are already in place.
pub fn rewrite(doc: &mut SchemaDocument) {
    rewrite_ty_unions(doc);
    rewrite_animated_properties(doc);
    rewrite_enums(doc);
    seed_asset_dispatch(doc);
}

/// Canonical table key for a discriminator value. Tags are numbers for
/// layers, strings for shapes, booleans for the split-position flag.
/// Numeric tags are keyed by magnitude, so a document's `4.0` reaches the
/// table entry built from the schema's `4`.
pub(crate) fn discriminant_key(tag: &Value) -> Option<String> {
    match tag {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 9e15 {
                        (f as i64).to_string()
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// (a) `ty`-discriminated unions: every `all-*` object (except
/// `all-assets`) is a disjunction over the siblings of its category,
/// keyed by each sibling's `ty` constant.
fn rewrite_ty_unions(doc: &mut SchemaDocument) {
    let mut tables = Vec::new();

    for (category, objects) in doc.defs() {
        let Some(objects) = objects.as_object() else {
            continue;
        };
        for object in objects.keys() {
            if !object.starts_with("all-") || object == "all-assets" {
                continue;
            }
            let mut table = serde_json::Map::new();
            for (sibling, node) in objects {
                if sibling == object {
                    continue;
                }
                // A sibling without a `ty` constant (another union, a
                // mix-in base) is not a dispatch target.
                let Some(key) = extract_ty(node).and_then(discriminant_key) else {
                    continue;
                };
                let id = doc.node_id(&format!("#/$defs/{category}/{sibling}"));
                table.insert(key, json!({ "id": id }));
            }
            tables.push((format!("#/$defs/{category}/{object}"), table));
        }
    }

    let count = tables.len();
    for (fragment, table) in tables {
        if let Some(Value::Object(map)) = doc.node_at_mut(&fragment) {
            map.remove(keywords::ONE_OF);
            map.insert(keywords::TY_ONEOF.to_string(), Value::Object(table));
        }
    }
    tracing::debug!(unions = count, "rewrote ty-discriminated unions");
}

/// The `ty` constant a schema requires: `properties.ty.const` if declared
/// directly, otherwise the first constant found among `oneOf`/`anyOf`/
/// `allOf` children in declaration order.
fn extract_ty(node: &Value) -> Option<&Value> {
    if let Some(constant) = node.pointer("/properties/ty/const") {
        return Some(constant);
    }
    for key in [keywords::ONE_OF, keywords::ANY_OF, keywords::ALL_OF] {
        if let Some(children) = node.get(key).and_then(Value::as_array) {
            for child in children {
                if let Some(constant) = extract_ty(child) {
                    return Some(constant);
                }
            }
        }
    }
    None
}

/// (b) Animated-property unions under the `properties` category.
fn rewrite_animated_properties(doc: &mut SchemaDocument) {
    let split = json!({
        "true": { "id": doc.node_id("#/$defs/properties/split-position") },
        "false": { "id": doc.node_id("#/$defs/properties/position-property") },
    });

    let Some(category) = doc
        .root
        .pointer_mut("/$defs/properties")
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    for (name, node) in category.iter_mut() {
        if !(name.ends_with("-property") || name == "gradient-stops") {
            continue;
        }
        match name.as_str() {
            // Split positions dispatch on the sibling `s` flag rather than
            // on `a`; default is the non-split shape.
            "splittable-position-property" => {
                let Some(map) = node.as_object_mut() else {
                    continue;
                };
                map.remove(keywords::ONE_OF);
                map.insert(keywords::SPLITPOS_ONEOF.to_string(), split.clone());
            }
            // The gradient wrapper itself is not animated; its `k` is.
            "gradient-property" => {
                if let Some(k) = node.pointer_mut("/properties/k") {
                    let bare_ref = k
                        .as_object()
                        .map_or(true, |m| m.contains_key(keywords::REF));
                    if !bare_ref {
                        rewrite_property(k);
                    }
                }
            }
            _ => rewrite_property(node),
        }
    }
}

/// Replaces a node's `oneOf` with `prop_oneof`: the ordered variants, each
/// wrapped as an object schema. Dispatch keys on the sibling `a` field.
fn rewrite_property(node: &mut Value) {
    let Some(map) = node.as_object_mut() else {
        return;
    };
    let Some(Value::Array(variants)) = map.remove(keywords::ONE_OF) else {
        return;
    };
    let variants = variants
        .into_iter()
        .map(|mut variant| {
            if let Some(obj) = variant.as_object_mut() {
                obj.entry(keywords::TYPE).or_insert(json!("object"));
            }
            variant
        })
        .collect();
    map.insert(keywords::PROP_ONEOF.to_string(), Value::Array(variants));
}

/// (c) Enum rewriting: `constants` schemas and `int-boolean`.
fn rewrite_enums(doc: &mut SchemaDocument) {
    let Some(defs) = doc
        .root
        .get_mut(keywords::DEFS)
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    for (category, objects) in defs.iter_mut() {
        let constants = category == "constants";
        let Some(objects) = objects.as_object_mut() else {
            continue;
        };
        for (name, node) in objects.iter_mut() {
            if constants || name == "int-boolean" {
                normalize_enum(node);
            }
        }
    }
}

/// Swaps a `oneOf` over `const` values for an `enum_oneof` list.
pub(crate) fn normalize_enum(node: &mut Value) {
    let Some(map) = node.as_object_mut() else {
        return;
    };
    let all_const = map
        .get(keywords::ONE_OF)
        .and_then(Value::as_array)
        .map_or(false, |variants| {
            !variants.is_empty() && variants.iter().all(|v| v.get(keywords::CONST).is_some())
        });
    if !all_const {
        return;
    }
    if let Some(variants) = map.remove(keywords::ONE_OF) {
        map.insert(keywords::ENUM_ONEOF.to_string(), variants);
    }
}

/// (d) Asset dispatch: a synthetic `assets/all-assets` routing on document
/// shape, `reference_asset` markers on the layers that name assets by id,
/// and the `keyframe` marker on the base keyframe.
fn seed_asset_dispatch(doc: &mut SchemaDocument) {
    let root_id = doc.id().to_string();

    if let Some(assets) = doc
        .root
        .pointer_mut("/$defs/assets")
        .and_then(Value::as_object_mut)
    {
        assets.insert(
            "all-assets".to_string(),
            json!({ keywords::ASSET_ONEOF: root_id }),
        );
    }

    for layer in ["image-layer", "precomposition-layer"] {
        if let Some(node) = doc.node_at_mut(&format!("#/$defs/layers/{layer}")) {
            mark_ref_id(node);
        }
    }

    let keyframe = doc.defs().find_map(|(category, objects)| {
        objects
            .as_object()
            .is_some_and(|m| m.contains_key("base-keyframe"))
            .then(|| format!("#/$defs/{category}/base-keyframe"))
    });
    if let Some(fragment) = keyframe {
        if let Some(Value::Object(map)) = doc.node_at_mut(&fragment) {
            map.insert(keywords::KEYFRAME.to_string(), json!(true));
        }
    }
}

/// Marks the `refId` sub-schema, wherever the layer declares it: directly
/// or within an applicator branch.
fn mark_ref_id(node: &mut Value) -> bool {
    if let Some(Value::Object(map)) = node.pointer_mut("/properties/refId") {
        map.insert(keywords::REFERENCE_ASSET.to_string(), json!(true));
        return true;
    }
    for key in [keywords::ALL_OF, keywords::ONE_OF, keywords::ANY_OF] {
        if let Some(children) = node.get_mut(key).and_then(Value::as_array_mut) {
            for child in children {
                if mark_ref_id(child) {
                    return true;
                }
            }
        }
    }
    false
}
