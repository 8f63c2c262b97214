//! String constants for every schema keyword this crate recognizes.

// JSON-Schema vocabulary.
pub const ADDITIONAL_PROPERTIES: &str = "additionalProperties";
pub const ALL_OF: &str = "allOf";
pub const ANY_OF: &str = "anyOf";
pub const CONST: &str = "const";
pub const DEFS: &str = "$defs";
pub const ELSE: &str = "else";
pub const ENUM: &str = "enum";
pub const EXCLUSIVE_MAXIMUM: &str = "exclusiveMaximum";
pub const EXCLUSIVE_MINIMUM: &str = "exclusiveMinimum";
pub const ID: &str = "$id";
pub const IF: &str = "if";
pub const ITEMS: &str = "items";
pub const MAXIMUM: &str = "maximum";
pub const MAX_ITEMS: &str = "maxItems";
pub const MAX_LENGTH: &str = "maxLength";
pub const MINIMUM: &str = "minimum";
pub const MIN_ITEMS: &str = "minItems";
pub const MIN_LENGTH: &str = "minLength";
pub const NOT: &str = "not";
pub const ONE_OF: &str = "oneOf";
pub const PATTERN: &str = "pattern";
pub const PREFIX_ITEMS: &str = "prefixItems";
pub const PROPERTIES: &str = "properties";
pub const REF: &str = "$ref";
pub const REQUIRED: &str = "required";
pub const THEN: &str = "then";
pub const TITLE: &str = "title";
pub const TYPE: &str = "type";

// Annotation keys added by the preparation pipeline.
pub const DOCS: &str = "_docs";
pub const DOCS_NAME: &str = "_docs_name";
pub const NAME: &str = "_name";

// Custom keyword markers spliced in by the rewriter.
pub const ASSET_ONEOF: &str = "asset_oneof";
pub const ENUM_ONEOF: &str = "enum_oneof";
pub const KEYFRAME: &str = "keyframe";
pub const PROP_ONEOF: &str = "prop_oneof";
pub const REFERENCE_ASSET: &str = "reference_asset";
pub const SPLITPOS_ONEOF: &str = "splitpos_oneof";
pub const TY_ONEOF: &str = "ty_oneof";
pub const WARN_EXTRA_PROPS: &str = "warn_extra_props";

/// True for the keys the preparation pipeline itself adds; walks over the
/// schema must not treat these as sub-schemas.
pub fn is_annotation(key: &str) -> bool {
    matches!(key, DOCS | DOCS_NAME | NAME)
}
