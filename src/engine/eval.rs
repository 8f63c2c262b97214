//! Evaluation of the standard JSON-Schema vocabulary, plus dispatch to
//! registered custom keywords. Speculative branches (`oneOf`, `anyOf`,
//! `not`, `if`) evaluate into a scratch collector and discard it.

use super::{Ctx, Engine, RawError, Scope};
use crate::compare::json_eq;
use crate::diagnostic::Severity;
use crate::location::Location;
use crate::schema::keywords;
use serde_json::Value;

impl Engine {
    pub(crate) fn eval(
        &self,
        scope: &Scope<'_>,
        schema: &Value,
        data: &Value,
        loc: &Location<'_>,
        parent: Option<&Value>,
        root: &Value,
        out: &mut Vec<RawError>,
    ) -> bool {
        let map = match schema {
            Value::Object(map) => map,
            Value::Bool(true) => return true,
            Value::Bool(false) => {
                emit(scope, loc, out, "false", "is never valid".to_string());
                return false;
            }
            _ => return true,
        };
        let mut ok = true;

        // In-place $ref application: evaluation continues at the target,
        // in the target's scope.
        if let Some(reference) = map.get(keywords::REF).and_then(Value::as_str) {
            let id = self.schema().resolve(reference);
            match self.fetch(&id) {
                Some((target, fragment)) => {
                    let rel = Location::Root;
                    let scope = Scope {
                        base: fragment,
                        rel: &rel,
                    };
                    ok &= self.eval(&scope, target, data, loc, parent, root, out);
                }
                None => {
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::REF,
                        format!("references unknown schema '{id}'"),
                    );
                    ok = false;
                }
            }
        }

        ok &= self.eval_validations(scope, map, data, loc, out);
        ok &= self.eval_applicators(scope, map, data, loc, parent, root, out);
        ok &= self.eval_custom(scope, map, schema, data, loc, parent, root, out);
        ok
    }

    fn eval_validations(
        &self,
        scope: &Scope<'_>,
        map: &serde_json::Map<String, Value>,
        data: &Value,
        loc: &Location<'_>,
        out: &mut Vec<RawError>,
    ) -> bool {
        let mut ok = true;

        if let Some(expected) = map.get(keywords::TYPE) {
            if !type_matches(data, expected) {
                emit(
                    scope,
                    loc,
                    out,
                    keywords::TYPE,
                    format!("must be {}", type_names(expected)),
                );
                ok = false;
            }
        }

        if let Some(constant) = map.get(keywords::CONST) {
            if !json_eq(data, constant) {
                emit(
                    scope,
                    loc,
                    out,
                    keywords::CONST,
                    format!("must be the constant {constant}"),
                );
                ok = false;
            }
        }

        if let Some(Value::Array(variants)) = map.get(keywords::ENUM) {
            if !variants.iter().any(|v| json_eq(data, v)) {
                emit(
                    scope,
                    loc,
                    out,
                    keywords::ENUM,
                    "must be one of the allowed values".to_string(),
                );
                ok = false;
            }
        }

        if let (Some(pattern), Value::String(s)) =
            (map.get(keywords::PATTERN).and_then(Value::as_str), data)
        {
            if let Some(re) = self.patterns.get(pattern) {
                if !re.is_match(s) {
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::PATTERN,
                        format!("must match the pattern \"{pattern}\""),
                    );
                    ok = false;
                }
            }
        }

        if let Value::Number(n) = data {
            if let Some(value) = n.as_f64() {
                let bound = |key| map.get(key).and_then(Value::as_f64);
                if let Some(min) = bound(keywords::MINIMUM) {
                    if value < min {
                        emit(
                            scope,
                            loc,
                            out,
                            keywords::MINIMUM,
                            format!("must be greater than or equal to {min}"),
                        );
                        ok = false;
                    }
                }
                if let Some(max) = bound(keywords::MAXIMUM) {
                    if value > max {
                        emit(
                            scope,
                            loc,
                            out,
                            keywords::MAXIMUM,
                            format!("must be less than or equal to {max}"),
                        );
                        ok = false;
                    }
                }
                if let Some(min) = bound(keywords::EXCLUSIVE_MINIMUM) {
                    if value <= min {
                        emit(
                            scope,
                            loc,
                            out,
                            keywords::EXCLUSIVE_MINIMUM,
                            format!("must be greater than {min}"),
                        );
                        ok = false;
                    }
                }
                if let Some(max) = bound(keywords::EXCLUSIVE_MAXIMUM) {
                    if value >= max {
                        emit(
                            scope,
                            loc,
                            out,
                            keywords::EXCLUSIVE_MAXIMUM,
                            format!("must be less than {max}"),
                        );
                        ok = false;
                    }
                }
            }
        }

        if let Value::String(s) = data {
            let length = s.chars().count();
            if let Some(min) = map.get(keywords::MIN_LENGTH).and_then(Value::as_u64) {
                if (length as u64) < min {
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::MIN_LENGTH,
                        format!("must be at least {min} characters long"),
                    );
                    ok = false;
                }
            }
            if let Some(max) = map.get(keywords::MAX_LENGTH).and_then(Value::as_u64) {
                if (length as u64) > max {
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::MAX_LENGTH,
                        format!("must be at most {max} characters long"),
                    );
                    ok = false;
                }
            }
        }

        if let Value::Array(items) = data {
            if let Some(min) = map.get(keywords::MIN_ITEMS).and_then(Value::as_u64) {
                if (items.len() as u64) < min {
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::MIN_ITEMS,
                        format!("must have a minimum of {min} items"),
                    );
                    ok = false;
                }
            }
            if let Some(max) = map.get(keywords::MAX_ITEMS).and_then(Value::as_u64) {
                if (items.len() as u64) > max {
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::MAX_ITEMS,
                        format!("must have a maximum of {max} items"),
                    );
                    ok = false;
                }
            }
        }

        if let (Some(Value::Array(required)), Value::Object(obj)) =
            (map.get(keywords::REQUIRED), data)
        {
            for prop in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(prop) {
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::REQUIRED,
                        format!("is missing the required property '{prop}'"),
                    );
                    ok = false;
                }
            }
        }

        ok
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_applicators(
        &self,
        scope: &Scope<'_>,
        map: &serde_json::Map<String, Value>,
        data: &Value,
        loc: &Location<'_>,
        parent: Option<&Value>,
        root: &Value,
        out: &mut Vec<RawError>,
    ) -> bool {
        let mut ok = true;

        if let (Some(Value::Object(props)), Value::Object(obj)) =
            (map.get(keywords::PROPERTIES), data)
        {
            for (name, child_schema) in props {
                let Some(child) = obj.get(name) else {
                    continue;
                };
                let rel_kw = scope.rel.push_prop(keywords::PROPERTIES);
                let rel = rel_kw.push_prop(name);
                let child_scope = Scope {
                    base: scope.base,
                    rel: &rel,
                };
                let child_loc = loc.push_prop(name);
                ok &= self.eval(
                    &child_scope,
                    child_schema,
                    child,
                    &child_loc,
                    Some(data),
                    root,
                    out,
                );
            }
        }

        match map.get(keywords::ADDITIONAL_PROPERTIES) {
            Some(Value::Bool(false)) => {
                if let Value::Object(obj) = data {
                    let declared = map.get(keywords::PROPERTIES).and_then(Value::as_object);
                    for name in obj.keys() {
                        if !declared.is_some_and(|p| p.contains_key(name)) {
                            emit(
                                scope,
                                loc,
                                out,
                                keywords::ADDITIONAL_PROPERTIES,
                                format!("must not have the property '{name}'"),
                            );
                            ok = false;
                        }
                    }
                }
            }
            Some(extra) if extra.is_object() => {
                if let Value::Object(obj) = data {
                    let declared = map.get(keywords::PROPERTIES).and_then(Value::as_object);
                    for (name, child) in obj {
                        if declared.is_some_and(|p| p.contains_key(name)) {
                            continue;
                        }
                        let rel = scope.rel.push_prop(keywords::ADDITIONAL_PROPERTIES);
                        let child_scope = Scope {
                            base: scope.base,
                            rel: &rel,
                        };
                        let child_loc = loc.push_prop(name);
                        ok &= self.eval(
                            &child_scope,
                            extra,
                            child,
                            &child_loc,
                            Some(data),
                            root,
                            out,
                        );
                    }
                }
            }
            _ => (),
        }

        if let Value::Array(items) = data {
            let prefix = map.get(keywords::PREFIX_ITEMS).and_then(Value::as_array);
            if let Some(prefix) = prefix {
                for (i, (child_schema, item)) in prefix.iter().zip(items).enumerate() {
                    let rel_kw = scope.rel.push_prop(keywords::PREFIX_ITEMS);
                    let rel = rel_kw.push_item(i);
                    let child_scope = Scope {
                        base: scope.base,
                        rel: &rel,
                    };
                    let child_loc = loc.push_item(i);
                    ok &= self.eval(
                        &child_scope,
                        child_schema,
                        item,
                        &child_loc,
                        Some(data),
                        root,
                        out,
                    );
                }
            }
            if let Some(items_schema) = map.get(keywords::ITEMS) {
                let skip = prefix.map_or(0, |p| p.len());
                for (i, item) in items.iter().enumerate().skip(skip) {
                    let rel = scope.rel.push_prop(keywords::ITEMS);
                    let child_scope = Scope {
                        base: scope.base,
                        rel: &rel,
                    };
                    let child_loc = loc.push_item(i);
                    ok &= self.eval(
                        &child_scope,
                        items_schema,
                        item,
                        &child_loc,
                        Some(data),
                        root,
                        out,
                    );
                }
            }
        }

        if let Some(Value::Array(children)) = map.get(keywords::ALL_OF) {
            for (i, child) in children.iter().enumerate() {
                let rel_kw = scope.rel.push_prop(keywords::ALL_OF);
                let rel = rel_kw.push_item(i);
                let child_scope = Scope {
                    base: scope.base,
                    rel: &rel,
                };
                ok &= self.eval(&child_scope, child, data, loc, parent, root, out);
            }
        }

        if let Some(Value::Array(children)) = map.get(keywords::ANY_OF) {
            let matched = children.iter().any(|child| {
                let mut scratch = Vec::new();
                self.eval(scope, child, data, loc, parent, root, &mut scratch)
            });
            if !matched {
                emit(
                    scope,
                    loc,
                    out,
                    keywords::ANY_OF,
                    "does not match any of the allowed schemas".to_string(),
                );
                ok = false;
            }
        }

        if let Some(Value::Array(children)) = map.get(keywords::ONE_OF) {
            let matched = children
                .iter()
                .filter(|child| {
                    let mut scratch = Vec::new();
                    self.eval(scope, child, data, loc, parent, root, &mut scratch)
                })
                .count();
            if matched == 0 {
                emit(
                    scope,
                    loc,
                    out,
                    keywords::ONE_OF,
                    "does not match any of the allowed schemas".to_string(),
                );
                ok = false;
            } else if matched > 1 {
                emit(
                    scope,
                    loc,
                    out,
                    keywords::ONE_OF,
                    "matches more than one of the allowed schemas".to_string(),
                );
                ok = false;
            }
        }

        if let Some(child) = map.get(keywords::NOT) {
            let mut scratch = Vec::new();
            if self.eval(scope, child, data, loc, parent, root, &mut scratch) {
                emit(
                    scope,
                    loc,
                    out,
                    keywords::NOT,
                    "must not match the disallowed schema".to_string(),
                );
                ok = false;
            }
        }

        if let Some(condition) = map.get(keywords::IF) {
            let mut scratch = Vec::new();
            let branch_key = if self.eval(scope, condition, data, loc, parent, root, &mut scratch) {
                keywords::THEN
            } else {
                keywords::ELSE
            };
            if let Some(branch) = map.get(branch_key) {
                let rel = scope.rel.push_prop(branch_key);
                let branch_scope = Scope {
                    base: scope.base,
                    rel: &rel,
                };
                if !self.eval(&branch_scope, branch, data, loc, parent, root, out) {
                    // Summary outcome, suppressed in post-processing in
                    // favor of the branch's own errors.
                    emit(
                        scope,
                        loc,
                        out,
                        keywords::IF,
                        "does not match the conditional schema".to_string(),
                    );
                    ok = false;
                }
            }
        }

        ok
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_custom(
        &self,
        scope: &Scope<'_>,
        map: &serde_json::Map<String, Value>,
        schema: &Value,
        data: &Value,
        loc: &Location<'_>,
        parent: Option<&Value>,
        root: &Value,
        out: &mut Vec<RawError>,
    ) -> bool {
        let mut ok = true;
        for (name, keyword) in &self.custom {
            let Some(value) = map.get(*name) else {
                continue;
            };
            let fragment = scope.fragment();
            let mut ctx = Ctx {
                engine: self,
                instance: loc,
                schema_ptr: &fragment,
                parent_data: parent,
                root_data: root,
                out: &mut *out,
            };
            ok &= keyword.validate(value, data, schema, &mut ctx);
        }
        ok
    }
}

fn emit(
    scope: &Scope<'_>,
    loc: &Location<'_>,
    out: &mut Vec<RawError>,
    keyword: &'static str,
    message: String,
) {
    out.push(RawError {
        keyword,
        instance_ptr: loc.pointer(),
        schema_ptr: scope.fragment(),
        message,
        severity: Severity::Error,
        warning: None,
    });
}

fn type_matches(data: &Value, expected: &Value) -> bool {
    match expected {
        Value::String(t) => matches_one(data, t),
        Value::Array(ts) => ts
            .iter()
            .filter_map(Value::as_str)
            .any(|t| matches_one(data, t)),
        _ => true,
    }
}

fn matches_one(data: &Value, expected: &str) -> bool {
    match expected {
        "object" => data.is_object(),
        "array" => data.is_array(),
        "string" => data.is_string(),
        "boolean" => data.is_boolean(),
        "null" => data.is_null(),
        "number" => data.is_number(),
        "integer" => match data {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        // An unrecognized type name constrains nothing.
        _ => true,
    }
}

fn type_names(expected: &Value) -> String {
    match expected {
        Value::String(t) => t.clone(),
        Value::Array(ts) => ts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        _ => "any".to_string(),
    }
}
