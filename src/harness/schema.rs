//! Resource schema metadata
//!
//! A schema lists a resource's attributes with their requiredness,
//! computed/sensitive flags, defaults and validators. The adapter applies
//! defaults to every plan and validates it before a handler sees it.

use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use super::Diagnostics;

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// String
    String,
    /// Boolean
    Bool,
    /// 64-bit integer
    Int,
    /// Floating point number
    Float,
    /// Ordered list of strings
    StringList,
    /// Unordered set of unique strings
    StringSet,
    /// String-keyed map of strings
    StringMap,
    /// Any JSON value
    Dynamic,
    /// Nested object
    Object(Vec<Attribute>),
}

/// Plan-time check on an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// String has at least this many characters
    LengthAtLeast(usize),
    /// String is one of the listed values
    OneOf(&'static [&'static str]),
    /// Integer is at least this value
    AtLeast(i64),
    /// String is an RFC 3339 timestamp
    Rfc3339,
}

impl Validator {
    fn check(self, path: &str, value: &Value, diagnostics: &mut Diagnostics) {
        match (self, value) {
            (Self::LengthAtLeast(min), Value::String(s)) if s.chars().count() < min => {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid Attribute Value Length",
                    format!("{path} must be at least {min} characters long"),
                );
            }
            (Self::OneOf(allowed), Value::String(s)) if !allowed.contains(&s.as_str()) => {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid Attribute Value Match",
                    format!("{path} must be one of {allowed:?}, got \"{s}\""),
                );
            }
            (Self::AtLeast(min), Value::Number(n)) if n.as_i64().is_some_and(|i| i < min) => {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid Attribute Value",
                    format!("{path} must be at least {min}, got {n}"),
                );
            }
            (Self::Rfc3339, Value::String(s)) if DateTime::parse_from_rfc3339(s).is_err() => {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid Attribute Value",
                    format!("{path} must be an RFC 3339 timestamp, got \"{s}\""),
                );
            }
            _ => {}
        }
    }
}

/// A single attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Attribute name
    pub name: &'static str,
    /// Value type
    pub kind: AttributeKind,
    /// Must be set in the plan
    pub required: bool,
    /// May be set in the plan
    pub optional: bool,
    /// Filled in by the provider
    pub computed: bool,
    /// Never shown in plain text
    pub sensitive: bool,
    /// Value used when the plan leaves the attribute unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Plan-time checks
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    /// Human readable description
    pub description: &'static str,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            default: None,
            validators: Vec::new(),
            description: "",
        }
    }

    /// Attribute the operator must set
    pub fn required(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            required: true,
            ..Self::new(name, kind)
        }
    }

    /// Attribute the operator may set
    pub fn optional(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            optional: true,
            ..Self::new(name, kind)
        }
    }

    /// Attribute only the provider sets
    pub fn computed(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            computed: true,
            ..Self::new(name, kind)
        }
    }

    /// Attribute the operator may set, filled in by the provider otherwise
    pub fn optional_computed(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::new(name, kind)
        }
    }

    /// Mark as sensitive
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Add a validator
    #[must_use]
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Set the description
    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// Schema of one resource type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSchema {
    /// Resource type name, e.g. `corax_project`
    pub type_name: &'static str,
    /// Human readable description
    pub description: &'static str,
    /// Top-level attributes
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    /// Empty schema
    pub fn new(type_name: &'static str, description: &'static str) -> Self {
        Self {
            type_name,
            description,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Look up a top-level attribute
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Fill unset attributes that have a default
    pub fn apply_defaults(&self, values: &mut Map<String, Value>) {
        apply_defaults(&self.attributes, values);
    }

    /// Check a plan against the schema, collecting every problem
    pub fn validate(&self, plan: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        match plan {
            Value::Object(values) => validate_object(&self.attributes, "", values, &mut diagnostics),
            other => diagnostics.add_error(
                "Invalid Plan",
                format!(
                    "{} plan must be an object, got {}",
                    self.type_name,
                    kind_name(other)
                ),
            ),
        }
        diagnostics
    }
}

fn apply_defaults(attributes: &[Attribute], values: &mut Map<String, Value>) {
    for attribute in attributes {
        if values.get(attribute.name).is_none_or(Value::is_null) {
            if let Some(default) = &attribute.default {
                values.insert(attribute.name.to_string(), default.clone());
            }
            continue;
        }
        if let (AttributeKind::Object(children), Some(Value::Object(nested))) =
            (&attribute.kind, values.get_mut(attribute.name))
        {
            apply_defaults(children, nested);
        }
    }
}

fn validate_object(
    attributes: &[Attribute],
    prefix: &str,
    values: &Map<String, Value>,
    diagnostics: &mut Diagnostics,
) {
    for attribute in attributes {
        let path = if prefix.is_empty() {
            attribute.name.to_string()
        } else {
            format!("{prefix}.{}", attribute.name)
        };

        match values.get(attribute.name) {
            None | Some(Value::Null) => {
                if attribute.required {
                    diagnostics.add_attribute_error(
                        &path,
                        "Missing Required Attribute",
                        format!("The attribute {path} is required"),
                    );
                }
            }
            Some(value) => {
                if check_kind(&attribute.kind, &path, value, diagnostics) {
                    for validator in &attribute.validators {
                        validator.check(&path, value, diagnostics);
                    }
                }
            }
        }
    }
}

/// Returns whether the value has the right shape for its validators to run
fn check_kind(kind: &AttributeKind, path: &str, value: &Value, diagnostics: &mut Diagnostics) -> bool {
    let expected = match (kind, value) {
        (AttributeKind::String, Value::String(_))
        | (AttributeKind::Bool, Value::Bool(_))
        | (AttributeKind::Float, Value::Number(_))
        | (AttributeKind::Dynamic, _) => return true,
        (AttributeKind::Int, Value::Number(n)) if n.is_i64() => return true,
        (AttributeKind::StringList | AttributeKind::StringSet, Value::Array(items)) => {
            if let Some(index) = items.iter().position(|v| !v.is_string()) {
                diagnostics.add_attribute_error(
                    format!("{path}[{index}]"),
                    "Incorrect Attribute Type",
                    format!("{path}[{index}] must be a string"),
                );
                return false;
            }
            if matches!(kind, AttributeKind::StringSet) {
                let mut seen = std::collections::BTreeSet::new();
                if let Some(dup) = items.iter().filter_map(Value::as_str).find(|s| !seen.insert(*s)) {
                    diagnostics.add_attribute_error(
                        path,
                        "Duplicate Set Element",
                        format!("{path} contains \"{dup}\" more than once"),
                    );
                    return false;
                }
            }
            return true;
        }
        (AttributeKind::StringMap, Value::Object(entries)) => {
            if let Some((key, _)) = entries.iter().find(|(_, v)| !v.is_string()) {
                diagnostics.add_attribute_error(
                    format!("{path}.{key}"),
                    "Incorrect Attribute Type",
                    format!("{path}.{key} must be a string"),
                );
                return false;
            }
            return true;
        }
        (AttributeKind::Object(children), Value::Object(nested)) => {
            validate_object(children, path, nested, diagnostics);
            return true;
        }
        (AttributeKind::String, _) => "a string",
        (AttributeKind::Bool, _) => "a bool",
        (AttributeKind::Int, _) => "an integer",
        (AttributeKind::Float, _) => "a number",
        (AttributeKind::StringList, _) => "a list of strings",
        (AttributeKind::StringSet, _) => "a set of strings",
        (AttributeKind::StringMap, _) => "a map of strings",
        (AttributeKind::Object(_), _) => "an object",
    };

    diagnostics.add_attribute_error(
        path,
        "Incorrect Attribute Type",
        format!("{path} must be {expected}, got {}", kind_name(value)),
    );
    false
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
