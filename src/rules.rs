//! The Lottie-specific keywords registered with the engine: tagged-union
//! dispatch, keyframe sequencing, asset cross-references, and
//! unknown-property accumulation. The boundary between error and warning
//! here is part of the format specification, not user-configurable.

use crate::compare::json_eq;
use crate::diagnostic::WarningKind;
use crate::engine::{Ctx, Engine, Keyword};
use crate::schema::keywords::{
    ASSET_ONEOF, ENUM_ONEOF, KEYFRAME, PROP_ONEOF, REFERENCE_ASSET, SPLITPOS_ONEOF, TY_ONEOF,
    WARN_EXTRA_PROPS,
};
use crate::schema::rewrite::discriminant_key;
use serde_json::Value;

/// Registers every Lottie keyword with the engine.
pub fn register_all(engine: &mut Engine) {
    engine.register_keyword(TY_ONEOF, Box::new(TyOneOf));
    engine.register_keyword(PROP_ONEOF, Box::new(PropOneOf));
    engine.register_keyword(SPLITPOS_ONEOF, Box::new(SplitPositionOneOf));
    engine.register_keyword(ASSET_ONEOF, Box::new(AssetOneOf));
    engine.register_keyword(ENUM_ONEOF, Box::new(EnumOneOf));
    engine.register_keyword(KEYFRAME, Box::new(KeyframeRule));
    engine.register_keyword(REFERENCE_ASSET, Box::new(ReferenceAsset));
    engine.register_keyword(WARN_EXTRA_PROPS, Box::new(WarnExtraProps));
}

/// Renders a document value for a message: strings bare, everything else
/// as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        value => value.to_string(),
    }
}

/// Shared tagged-union dispatch: look the discriminator field up in the
/// keyword's table and delegate to the matching sub-schema. A missing
/// field is not reported here — the enclosing schema's `required` is the
/// single source of that error. An unknown tag is an error or a warning
/// depending on how strict the discriminator is.
fn discriminate(
    keyword: &'static str,
    field: &'static str,
    table: &Value,
    data: &Value,
    default: Option<&Value>,
    fail_unknown: bool,
    ctx: &mut Ctx<'_>,
) -> bool {
    let Some(obj) = data.as_object() else {
        return true;
    };
    let Some(tag) = obj.get(field).or(default) else {
        return true;
    };

    let entry = discriminant_key(tag).and_then(|key| table.get(key.as_str()));
    match entry {
        Some(entry) => match entry.get("id").and_then(Value::as_str) {
            Some(id) => ctx.apply_id(keyword, id, data),
            None => true,
        },
        None => {
            let message = format!("has unknown '{field}' value {}", display_value(tag));
            if fail_unknown {
                ctx.error(keyword, message);
                false
            } else {
                ctx.warning(keyword, WarningKind::Type, message);
                true
            }
        }
    }
}

/// `ty`-discriminated union over the objects of a category. Unknown types
/// occur in the wild (exporters run ahead of the spec), so strictness is
/// relaxed to a warning.
#[derive(Debug)]
struct TyOneOf;

impl Keyword for TyOneOf {
    fn validate(&self, value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        discriminate(TY_ONEOF, "ty", value, data, None, false, ctx)
    }
}

/// Animated-property dispatch on the `a` flag: `0` selects the constant
/// shape, `1` the keyframed one. A missing flag means constant; a present
/// flag is strictly 0/1.
#[derive(Debug)]
struct PropOneOf;

impl Keyword for PropOneOf {
    fn validate(&self, value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        let Some(obj) = data.as_object() else {
            return true;
        };
        let constant = Value::from(0);
        let flag = obj.get("a").unwrap_or(&constant);
        let Some(variants) = value.as_array() else {
            return true;
        };

        for (index, variant) in variants.iter().enumerate() {
            let Some(constant) = variant.pointer("/properties/a/const") else {
                continue;
            };
            if json_eq(flag, constant) {
                return ctx.apply_inline(PROP_ONEOF, index, variant, data);
            }
        }

        ctx.error(
            PROP_ONEOF,
            format!("has unknown 'a' value {}", display_value(flag)),
        );
        false
    }
}

/// Split-position dispatch on the `s` flag. A missing `s` means "not
/// split"; a non-boolean `s` is warned about, not failed.
#[derive(Debug)]
struct SplitPositionOneOf;

impl Keyword for SplitPositionOneOf {
    fn validate(&self, value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        discriminate(
            SPLITPOS_ONEOF,
            "s",
            value,
            data,
            Some(&Value::Bool(false)),
            false,
            ctx,
        )
    }
}

/// Asset dispatch on document shape: an asset carrying `layers` is a
/// precomposition, anything else an image.
#[derive(Debug)]
struct AssetOneOf;

impl Keyword for AssetOneOf {
    fn validate(&self, value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        let Some(root_id) = value.as_str() else {
            return true;
        };
        let kind = match data.get("layers") {
            Some(_) => "precomposition",
            None => "image",
        };
        let id = format!("{root_id}#/$defs/assets/{kind}");
        ctx.apply_id(ASSET_ONEOF, &id, data)
    }
}

/// Closed enumeration produced by the enum normalizer.
#[derive(Debug)]
struct EnumOneOf;

impl Keyword for EnumOneOf {
    fn validate(&self, value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        let Some(variants) = value.as_array() else {
            return true;
        };
        let valid = variants
            .iter()
            .any(|v| v.get("const").is_some_and(|c| json_eq(data, c)));
        if !valid {
            ctx.error(
                ENUM_ONEOF,
                format!(
                    "'{}' is not a valid enumeration value",
                    display_value(data)
                ),
            );
        }
        valid
    }
}

/// Keyframe sequencing. A keyframe needs its `i` and `o` tangents unless
/// it is a hold keyframe or the last of its sequence; `t` values must
/// ascend, and at most two keyframes may share a `t` (an instantaneous
/// discontinuity; a third would be ambiguous).
#[derive(Debug)]
struct KeyframeRule;

impl Keyword for KeyframeRule {
    fn validate(&self, _value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        let Some(sequence) = ctx.parent_data.and_then(Value::as_array) else {
            return true;
        };
        let Some(index) = ctx.index().filter(|i| *i < sequence.len()) else {
            return true;
        };
        let mut ok = true;

        let last = index + 1 == sequence.len();
        let hold = data.get("h").is_some_and(is_truthy);
        if !hold && !last {
            for tangent in ["i", "o"] {
                if data.get(tangent).is_none() {
                    ctx.error(KEYFRAME, format!("keyframe is missing '{tangent}'"));
                    ok = false;
                }
            }
        }

        if index > 0 {
            let time = data.get("t").and_then(Value::as_f64);
            let prev = sequence[index - 1].get("t").and_then(Value::as_f64);
            if let (Some(time), Some(prev)) = (time, prev) {
                if time < prev {
                    ctx.error(
                        KEYFRAME,
                        "keyframe 't' must be in ascending order".to_string(),
                    );
                    ok = false;
                } else if time == prev && index > 1 {
                    let prev_prev = sequence[index - 2].get("t").and_then(Value::as_f64);
                    if prev_prev == Some(time) {
                        ctx.error(
                            KEYFRAME,
                            "there can be at most 2 keyframes with the same 't' value".to_string(),
                        );
                        ok = false;
                    }
                }
            }
        }

        ok
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => false,
    }
}

/// `refId` values must name an asset declared in the document-level list.
#[derive(Debug)]
struct ReferenceAsset;

impl Keyword for ReferenceAsset {
    fn validate(&self, _value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        let assets = ctx.root_data.get("assets").and_then(Value::as_array);
        let found = assets.is_some_and(|assets| {
            assets
                .iter()
                .any(|asset| asset.get("id").is_some_and(|id| json_eq(id, data)))
        });
        if !found {
            ctx.error(REFERENCE_ASSET, format!("{data} is not a valid asset id"));
        }
        found
    }
}

/// The closed-world property check: every document key outside the node's
/// accumulated property set is warned about. Never fails validation.
#[derive(Debug)]
struct WarnExtraProps;

impl Keyword for WarnExtraProps {
    fn validate(&self, value: &Value, data: &Value, _parent: &Value, ctx: &mut Ctx<'_>) -> bool {
        let (Some(known), Some(obj)) = (value.as_array(), data.as_object()) else {
            return true;
        };
        for key in obj.keys() {
            let recognized = known
                .iter()
                .filter_map(Value::as_str)
                .any(|name| name == key);
            if !recognized {
                ctx.warning(
                    WARN_EXTRA_PROPS,
                    WarningKind::Property,
                    format!("has unknown property '{key}'"),
                );
            }
        }
        true
    }
}
