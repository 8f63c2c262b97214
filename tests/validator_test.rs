//! End-to-end tests driving the full pipeline — metadata, property
//! closure, union rewrites, keyword dispatch, diagnostic post-processing —
//! against a miniature Lottie schema.

use lottie_validation::{Config, Diagnostic, Severity, Validator, WarningKind};
use serde_json::{json, Value};

/// A reduced Lottie schema: one layer category with a `ty` union, animated
/// properties with the splittable position, assets with cross-references,
/// constants, and keyframes. Shaped exactly like the published
/// `lottie.schema.json`.
fn schema() -> Value {
    json!({
        "$id": "https://lottiefiles.github.io/lottie-docs/schema/lottie.schema.json",
        "$ref": "#/$defs/animation/animation",
        "$defs": {
            "animation": {
                "animation": {
                    "type": "object",
                    "title": "Animation",
                    "properties": {
                        "v": {"title": "Version", "type": "string", "pattern": "^[0-9.]+$"},
                        "ip": {"title": "In Point", "type": "number"},
                        "op": {"title": "Out Point", "type": "number"},
                        "fr": {"title": "Framerate", "type": "number", "exclusiveMinimum": 0},
                        "w": {"title": "Width", "type": "integer", "minimum": 0},
                        "h": {"title": "Height", "type": "integer", "minimum": 0},
                        "nm": {"title": "Name", "type": "string"},
                        "assets": {
                            "title": "Assets",
                            "type": "array",
                            "items": {"$ref": "#/$defs/assets/all-assets"},
                        },
                        "layers": {
                            "title": "Layers",
                            "type": "array",
                            "items": {"$ref": "#/$defs/layers/all-layers"},
                        },
                    },
                    "required": ["ip", "op", "fr", "w", "h", "layers"],
                },
            },
            "assets": {
                "asset": {
                    "type": "object",
                    "properties": {
                        "id": {"title": "ID", "type": "string"},
                    },
                    "required": ["id"],
                },
                "image": {
                    "type": "object",
                    "title": "Image",
                    "allOf": [
                        {"$ref": "#/$defs/assets/asset"},
                        {
                            "properties": {
                                "w": {"title": "Width", "type": "number"},
                                "h": {"title": "Height", "type": "number"},
                                "p": {"title": "File Name", "type": "string"},
                            },
                        },
                    ],
                },
                "precomposition": {
                    "type": "object",
                    "title": "Precomposition",
                    "allOf": [
                        {"$ref": "#/$defs/assets/asset"},
                        {
                            "properties": {
                                "layers": {
                                    "title": "Layers",
                                    "type": "array",
                                    "items": {"$ref": "#/$defs/layers/all-layers"},
                                },
                            },
                            "required": ["layers"],
                        },
                    ],
                },
            },
            "layers": {
                "all-layers": {
                    "oneOf": [
                        {"$ref": "#/$defs/layers/shape-layer"},
                        {"$ref": "#/$defs/layers/image-layer"},
                        {"$ref": "#/$defs/layers/precomposition-layer"},
                    ],
                },
                "visual-layer": {
                    "type": "object",
                    "properties": {
                        "nm": {"title": "Name", "type": "string"},
                        "hd": {"title": "Hidden", "$ref": "#/$defs/values/int-boolean"},
                        "ks": {"title": "Transform", "$ref": "#/$defs/helpers/transform"},
                        "ip": {"title": "In Point", "type": "number"},
                        "op": {"title": "Out Point", "type": "number"},
                        "bm": {"title": "Blend Mode", "$ref": "#/$defs/constants/blend-mode"},
                    },
                    "required": ["ks"],
                },
                "shape-layer": {
                    "type": "object",
                    "title": "Shape Layer",
                    "allOf": [
                        {"$ref": "#/$defs/layers/visual-layer"},
                        {
                            "properties": {
                                "ty": {"title": "Type", "const": 4},
                                "shapes": {
                                    "title": "Shapes",
                                    "type": "array",
                                    "items": {"type": "object"},
                                },
                            },
                            "required": ["ty", "shapes"],
                        },
                    ],
                },
                "image-layer": {
                    "type": "object",
                    "title": "Image Layer",
                    "allOf": [
                        {"$ref": "#/$defs/layers/visual-layer"},
                        {
                            "properties": {
                                "ty": {"title": "Type", "const": 2},
                                "refId": {"title": "Reference Id", "type": "string"},
                            },
                            "required": ["ty", "refId"],
                        },
                    ],
                },
                "precomposition-layer": {
                    "type": "object",
                    "title": "Precomposition Layer",
                    "allOf": [
                        {"$ref": "#/$defs/layers/visual-layer"},
                        {
                            "properties": {
                                "ty": {"title": "Type", "const": 0},
                                "refId": {"title": "Reference Id", "type": "string"},
                            },
                            "required": ["ty", "refId"],
                        },
                    ],
                },
            },
            "helpers": {
                "transform": {
                    "type": "object",
                    "title": "Transform",
                    "properties": {
                        "a": {"title": "Anchor Point", "$ref": "#/$defs/properties/position-property"},
                        "p": {"title": "Position", "$ref": "#/$defs/properties/splittable-position-property"},
                        "s": {"title": "Scale", "$ref": "#/$defs/properties/vector-property"},
                        "r": {"title": "Rotation", "$ref": "#/$defs/properties/scalar-property"},
                        "o": {"title": "Opacity", "$ref": "#/$defs/properties/scalar-property"},
                    },
                },
            },
            "properties": {
                "base-keyframe": {
                    "type": "object",
                    "title": "Keyframe",
                    "properties": {
                        "t": {"title": "Time", "type": "number"},
                        "h": {"title": "Hold", "$ref": "#/$defs/values/int-boolean"},
                        "i": {"title": "In Tangent", "type": "object"},
                        "o": {"title": "Out Tangent", "type": "object"},
                        "s": {"title": "Value", "type": "array"},
                    },
                    "required": ["t"],
                },
                "scalar-property": {
                    "title": "Scalar Property",
                    "oneOf": [
                        {
                            "properties": {
                                "a": {"title": "Animated", "$ref": "#/$defs/values/int-boolean", "const": 0},
                                "k": {"title": "Value", "type": "number"},
                            },
                            "required": ["k"],
                        },
                        {
                            "properties": {
                                "a": {"title": "Animated", "$ref": "#/$defs/values/int-boolean", "const": 1},
                                "k": {
                                    "title": "Keyframes",
                                    "type": "array",
                                    "items": {"$ref": "#/$defs/properties/base-keyframe"},
                                },
                            },
                            "required": ["a", "k"],
                        },
                    ],
                },
                "vector-property": {
                    "title": "Vector Property",
                    "oneOf": [
                        {
                            "properties": {
                                "a": {"title": "Animated", "$ref": "#/$defs/values/int-boolean", "const": 0},
                                "k": {"title": "Value", "type": "array", "items": {"type": "number"}},
                            },
                            "required": ["k"],
                        },
                        {
                            "properties": {
                                "a": {"title": "Animated", "$ref": "#/$defs/values/int-boolean", "const": 1},
                                "k": {
                                    "title": "Keyframes",
                                    "type": "array",
                                    "items": {"$ref": "#/$defs/properties/base-keyframe"},
                                },
                            },
                            "required": ["a", "k"],
                        },
                    ],
                },
                "position-property": {
                    "title": "Position Property",
                    "oneOf": [
                        {
                            "properties": {
                                "a": {"title": "Animated", "$ref": "#/$defs/values/int-boolean", "const": 0},
                                "k": {"title": "Value", "type": "array", "items": {"type": "number"}},
                            },
                            "required": ["k"],
                        },
                        {
                            "properties": {
                                "a": {"title": "Animated", "$ref": "#/$defs/values/int-boolean", "const": 1},
                                "k": {
                                    "title": "Keyframes",
                                    "type": "array",
                                    "items": {"$ref": "#/$defs/properties/base-keyframe"},
                                },
                            },
                            "required": ["a", "k"],
                        },
                    ],
                },
                "split-position": {
                    "type": "object",
                    "title": "Split Position",
                    "properties": {
                        "s": {"title": "Split", "type": "boolean"},
                        "x": {"title": "X Position", "$ref": "#/$defs/properties/scalar-property"},
                        "y": {"title": "Y Position", "$ref": "#/$defs/properties/scalar-property"},
                    },
                    "required": ["x", "y"],
                },
                "splittable-position-property": {
                    "title": "Position",
                    "oneOf": [
                        {"$ref": "#/$defs/properties/position-property"},
                        {"$ref": "#/$defs/properties/split-position"},
                    ],
                },
            },
            "constants": {
                "blend-mode": {
                    "title": "Blend Mode",
                    "type": "integer",
                    "oneOf": [
                        {"title": "Normal", "const": 0},
                        {"title": "Multiply", "const": 1},
                        {"title": "Screen", "const": 2},
                    ],
                },
            },
            "values": {
                "int-boolean": {
                    "title": "Integer Boolean",
                    "type": "integer",
                    "oneOf": [
                        {"title": "True", "const": 1},
                        {"title": "False", "const": 0},
                    ],
                },
            },
        },
    })
}

fn validator() -> Validator {
    Validator::new(schema()).expect("fixture schema compiles")
}

/// A minimal valid animation the scenario documents build on.
fn animation(layers: Value) -> Value {
    json!({
        "v": "5.0",
        "ip": 0,
        "op": 60,
        "fr": 60,
        "w": 512,
        "h": 512,
        "layers": layers,
    })
}

fn shape_layer() -> Value {
    json!({"ty": 4, "shapes": [], "ks": {}})
}

fn errors(diags: &[Diagnostic]) -> Vec<&Diagnostic> {
    diags
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect()
}

fn warnings(diags: &[Diagnostic]) -> Vec<&Diagnostic> {
    diags
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect()
}

#[test]
fn test_valid_animation_is_clean() {
    let diags = validator().validate_object(&animation(json!([shape_layer()])), true);
    assert_eq!(diags, vec![]);
}

#[test]
fn test_unknown_layer_type_warns() {
    let document = json!({
        "v": "5.0", "ip": 0, "op": 1, "fr": 60, "w": 1, "h": 1,
        "layers": [{"ty": 999, "ks": {}}],
    });
    let diags = validator().validate_object(&document, true);

    assert!(errors(&diags).is_empty());
    let warns = warnings(&diags);
    assert_eq!(warns.len(), 1);
    assert!(warns[0].message.contains("unknown 'ty' value 999"));
    assert_eq!(warns[0].warning, Some(WarningKind::Type));
    assert_eq!(warns[0].path, "/layers/0");

    // Suppressing warnings empties the report entirely.
    assert_eq!(validator().validate_object(&document, false), vec![]);
}

#[test]
fn test_keyframe_ordering() {
    let mut layer = shape_layer();
    layer["ks"]["r"] = json!({
        "a": 1,
        "k": [
            {"t": 10, "i": {}, "o": {}, "s": [0]},
            {"t": 5, "s": [1]},
        ],
    });
    let diags = validator().validate_object(&animation(json!([layer])), true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert!(errs[0]
        .message
        .contains("keyframe 't' must be in ascending order"));
    assert_eq!(errs[0].path, "/layers/0/ks/r/k/1");
    assert_eq!(errs[0].name, "Keyframe");
}

#[test]
fn test_triple_coincident_keyframes() {
    let mut layer = shape_layer();
    layer["ks"]["r"] = json!({
        "a": 1,
        "k": [
            {"t": 0, "i": {}, "o": {}, "s": [0]},
            {"t": 0, "i": {}, "o": {}, "s": [1]},
            {"t": 0, "s": [2]},
        ],
    });
    let diags = validator().validate_object(&animation(json!([layer])), true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert!(errs[0]
        .message
        .contains("there can be at most 2 keyframes with the same 't' value"));
    assert_eq!(errs[0].path, "/layers/0/ks/r/k/2");
}

#[test]
fn test_missing_tangents() {
    let mut layer = shape_layer();
    layer["ks"]["r"] = json!({
        "a": 1,
        "k": [
            {"t": 0, "s": [0]},
            {"t": 5, "h": 1, "s": [1]},
            {"t": 10, "s": [2]},
        ],
    });
    let diags = validator().validate_object(&animation(json!([layer])), true);

    // Both tangents are reported for the first keyframe; the hold and the
    // trailing keyframe are exempt.
    let errs = errors(&diags);
    assert_eq!(errs.len(), 2);
    assert!(errs[0].message.contains("keyframe is missing 'i'"));
    assert!(errs[1].message.contains("keyframe is missing 'o'"));
    assert_eq!(errs[0].path, "/layers/0/ks/r/k/0");
}

#[test]
fn test_unknown_property_warns() {
    let mut layer = shape_layer();
    layer["bogus"] = json!(1);
    let diags = validator().validate_object(&animation(json!([layer])), true);

    assert!(errors(&diags).is_empty());
    let warns = warnings(&diags);
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0].warning, Some(WarningKind::Property));
    assert!(warns[0].message.ends_with("has unknown property 'bogus'"));
    assert!(warns[0].message.starts_with("Shape Layer "));
}

#[test]
fn test_missing_asset_reference() {
    let mut document = animation(json!([
        {"ty": 0, "refId": "missing", "ks": {}},
    ]));
    document["assets"] = json!([{"id": "other", "p": "img.png"}]);
    let diags = validator().validate_object(&document, true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert!(errs[0]
        .message
        .contains("\"missing\" is not a valid asset id"));
    assert_eq!(errs[0].path, "/layers/0/refId");
}

#[test]
fn test_valid_asset_reference() {
    let mut document = animation(json!([
        {"ty": 2, "refId": "img_0", "ks": {}},
    ]));
    document["assets"] = json!([{"id": "img_0", "p": "img.png", "w": 10, "h": 10}]);
    assert_eq!(validator().validate_object(&document, true), vec![]);
}

#[test]
fn test_precomposition_asset_routes_on_shape() {
    // An asset carrying `layers` is validated as a precomposition: its
    // nested layers are validated too.
    let mut document = animation(json!([
        {"ty": 0, "refId": "comp_0", "ks": {}},
    ]));
    document["assets"] = json!([
        {"id": "comp_0", "layers": [{"ty": 4, "ks": {}}]},
    ]);
    let diags = validator().validate_object(&document, true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].message.contains("'shapes'"));
    assert_eq!(errs[0].path, "/assets/0/layers/0");
}

#[test]
fn test_parse_failure() {
    let diags = validator().validate_string("not json", true);
    assert_eq!(diags.len(), 2);
    assert_eq!(diags[0].severity, Severity::Error);
    assert_eq!(diags[0].message, "Document is not a valid JSON file");
    assert_eq!(diags[1].severity, Severity::Error);
}

#[test]
fn test_name_paths_mode() {
    let validator = Validator::with_config(
        schema(),
        Config {
            name_paths: true,
            ..Config::default()
        },
    )
    .unwrap();

    let mut layer = shape_layer();
    layer["nm"] = json!("Bg");
    layer["ks"]["p"] = json!({"a": 0, "k": "wrong"});
    let diags = validator.validate_object(&animation(json!([layer])), true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].path, "/layers/0/ks/p/k");
    assert_eq!(errs[0].path_names, Some(vec![Some("Bg".to_string())]));
}

#[test]
fn test_name_paths_null_for_anonymous() {
    let validator = Validator::with_config(
        schema(),
        Config {
            name_paths: true,
            ..Config::default()
        },
    )
    .unwrap();

    let mut layer = shape_layer();
    layer["ks"]["r"] = json!({"a": 0, "k": "wrong"});
    let diags = validator.validate_object(&animation(json!([layer])), true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].path_names, Some(vec![None]));
}

#[test]
fn test_split_position_dispatch() {
    let mut layer = shape_layer();
    layer["ks"]["p"] = json!({
        "s": true,
        "x": {"a": 0, "k": 10},
        "y": {"a": 0, "k": 20},
    });
    let clean = validator().validate_object(&animation(json!([layer.clone()])), true);
    assert_eq!(clean, vec![]);

    // Without the flag the same value must be a plain position.
    layer["ks"]["p"] = json!({"x": {"a": 0, "k": 10}, "y": {"a": 0, "k": 20}});
    let diags = validator().validate_object(&animation(json!([layer])), true);
    assert!(errors(&diags)
        .iter()
        .any(|d| d.message.contains("required property 'k'")));
}

#[test]
fn test_enum_dispatch() {
    let mut layer = shape_layer();
    layer["bm"] = json!(9);
    let diags = validator().validate_object(&animation(json!([layer])), true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert!(errs[0]
        .message
        .contains("'9' is not a valid enumeration value"));
    assert_eq!(errs[0].path, "/layers/0/bm");
    assert_eq!(errs[0].name, "Blend Mode");
}

#[test]
fn test_pattern_message_is_rewritten() {
    let mut document = animation(json!([shape_layer()]));
    document["v"] = json!("not-a-version");
    let diags = validator().validate_object(&document, true);

    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].message, "Animation version doesn't match the pattern");
    assert_eq!(errs[0].path, "/v");
}

#[test]
fn test_docs_links() {
    let diags = validator().validate_object(&animation(json!([{"ty": 4, "ks": {}}])), true);

    // Missing `shapes` is reported at the shape layer, which links to its
    // section of the layers page.
    let errs = errors(&diags);
    assert_eq!(errs.len(), 1);
    assert_eq!(
        errs[0].docs.as_deref(),
        Some("https://lottiefiles.github.io/lottie-docs/layers/#shape-layer")
    );
    assert_eq!(errs[0].name, "Shape Layer");
}

#[test]
fn test_diagnostics_sorted_by_path() {
    let document = animation(json!([
        {"ty": 4, "shapes": [], "ks": {}, "bogus": 1},
        {"ty": 999},
        {"ty": 4, "ks": {}},
    ]));
    let diags = validator().validate_object(&document, true);

    assert!(diags.len() >= 3);
    for pair in diags.windows(2) {
        assert!(pair[0].path <= pair[1].path);
    }
}

#[test]
fn test_validation_is_idempotent() {
    let validator = validator();
    let document = animation(json!([
        {"ty": 4, "shapes": [], "ks": {}, "bogus": 1},
        {"ty": 999},
    ]));

    let first = validator.validate_object(&document, true);
    let second = validator.validate_object(&document, true);
    assert_eq!(first, second);
}

#[test]
fn test_string_object_round_trip() {
    let validator = validator();
    for document in [
        animation(json!([shape_layer()])),
        animation(json!([{"ty": 999}])),
        json!({"ip": "wrong"}),
    ] {
        assert_eq!(
            validator.validate_string(&document.to_string(), true),
            validator.validate_object(&document, true),
        );
    }
}

#[test]
fn test_missing_required_fields_are_named() {
    let diags = validator().validate_object(&json!({}), true);
    let errs = errors(&diags);

    // One error per missing required field, each carrying the animation's
    // name and documentation link.
    assert_eq!(errs.len(), 6);
    for err in &errs {
        assert!(err.message.starts_with("Animation is missing"));
        assert_eq!(err.path, "");
        assert!(err.docs.is_some());
    }
}

#[test]
fn test_metadata_covers_reachable_nodes() {
    // After the metadata stage every mapping node under $defs carries the
    // three annotations.
    let mut doc = lottie_validation::schema::SchemaDocument::new(schema()).unwrap();
    lottie_validation::schema::docs::annotate(&mut doc, "https://example.com/docs");

    fn check(node: &Value, path: &str) {
        let Value::Object(map) = node else { return };
        for key in ["_docs", "_docs_name", "_name"] {
            let value = node.get(key).and_then(Value::as_str);
            assert!(
                value.is_some_and(|v| !v.is_empty()),
                "node {path} lacks {key}"
            );
        }
        for (key, child) in map {
            match key.as_str() {
                "_docs" | "_docs_name" | "_name" => (),
                // The properties container maps names to sub-schemas; the
                // container itself is not a schema node.
                "properties" => {
                    if let Value::Object(props) = child {
                        for (prop, prop_schema) in props {
                            check_any(prop_schema, &format!("{path}/properties/{prop}"));
                        }
                    }
                }
                _ => check_any(child, &format!("{path}/{key}")),
            }
        }
    }
    fn check_any(node: &Value, path: &str) {
        match node {
            Value::Object(_) => check(node, path),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_any(item, &format!("{path}/{i}"));
                }
            }
            _ => (),
        }
    }

    for (category, objects) in doc.root()["$defs"].as_object().unwrap() {
        for (object, node) in objects.as_object().unwrap() {
            check(node, &format!("/$defs/{category}/{object}"));
        }
    }
}
