use serde::{Deserialize, Serialize};

/// Severity of a [`Diagnostic`]: a structural violation of the
/// specification, or a soft issue the document author should look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Kind of a warning diagnostic: an unknown property on a closed object,
/// or an unknown discriminator value where strictness is relaxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    Property,
    Type,
}

/// A single validation finding, shaped for the linter, the playground and
/// editor tooling. `message` is always prefixed with the human name of the
/// offending field, and `docs` links into the format documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<WarningKind>,
    pub message: String,
    /// JSON Pointer into the validated document.
    pub path: String,
    /// Human name of the offending field ("Value" when unknown).
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// In name-paths mode, the `nm` of every `ty`-carrying ancestor along
    /// `path`, null for anonymous ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_names: Option<Vec<Option<String>>>,
}

#[cfg(test)]
mod test {
    use super::{Diagnostic, Severity, WarningKind};

    #[test]
    fn test_serialized_shape() {
        let diag = Diagnostic {
            severity: Severity::Warning,
            warning: Some(WarningKind::Property),
            message: "Shape Layer has unknown property 'bogus'".to_string(),
            path: "/layers/0".to_string(),
            name: "Shape Layer".to_string(),
            docs: Some("https://lottiefiles.github.io/lottie-docs/layers/#shape-layer".to_string()),
            path_names: None,
        };

        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["warning"], "property");
        // Optional fields are omitted, not nulled.
        assert!(json.get("path_names").is_none());

        let back: Diagnostic = serde_json::from_value(json).unwrap();
        assert_eq!(back, diag);
    }
}
