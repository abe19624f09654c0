//! Argument schema declarations
//!
//! Pure data: each capability declares an ordered set of named, typed
//! parameters with constraints. Checking happens in [`crate::validate`];
//! this module only describes what a well-formed argument payload looks
//! like and renders it as a JSON Schema for agent tool registration.

use serde_json::{Map, Value, json};

/// Declared type of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer (floats are rejected, not truncated)
    Integer,
    /// Boolean
    Boolean,
    /// String restricted to a declared set of values (via
    /// [`Constraint::OneOf`])
    Enumeration,
    /// Structured JSON object or array, passed through as-is
    Composite,
}

impl ParamType {
    /// JSON Schema `type` keyword for this parameter type
    #[must_use]
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String | Self::Enumeration => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Composite => "object",
        }
    }
}

/// Type-specific constraint on a parameter value.
///
/// Constraints are structural; semantic interpretation (e.g. actually
/// decoding an invoice) is the node's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// String must be non-empty
    NonEmpty,
    /// String length must not exceed the given number of bytes
    MaxLength(usize),
    /// Integer must be at least this value
    MinInt(i64),
    /// Integer must be at most this value
    MaxInt(i64),
    /// String must be one of the listed values (enumeration membership)
    OneOf(Vec<String>),
    /// String must look like a BOLT11 payment request: lowercase `ln`
    /// prefix, bech32 charset, a `1` separator, and a minimum length
    Bolt11,
}

/// A single parameter descriptor
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name, unique within its schema
    pub name: String,

    /// Declared type
    pub param_type: ParamType,

    /// Whether the parameter must be present
    pub required: bool,

    /// LLM-facing description
    pub description: String,

    /// Constraints checked after the type check passes
    pub constraints: Vec<Constraint>,
}

impl ParamSpec {
    /// Create a required parameter with no constraints
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
            constraints: Vec::new(),
        }
    }

    /// Mark the parameter optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach a constraint
    #[must_use]
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Ordered set of parameter descriptors for one capability.
///
/// Parameter names are unique within a schema; [`ArgumentSchema::with`]
/// enforces this at construction time.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSchema {
    params: Vec<ParamSpec>,
}

impl ArgumentSchema {
    /// Create an empty schema (capability takes no arguments)
    #[must_use]
    pub const fn empty() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter, preserving declaration order
    ///
    /// # Panics
    ///
    /// Panics if a parameter with the same name is already declared.
    /// Schemas come from static capability tables, so a collision is a
    /// programming error caught at startup.
    #[must_use]
    pub fn with(mut self, param: ParamSpec) -> Self {
        assert!(
            !self.params.iter().any(|p| p.name == param.name),
            "parameter '{}' declared twice",
            param.name
        );
        self.params.push(param);
        self
    }

    /// Parameters in declaration order
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Look up a parameter by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render the schema as a JSON Schema object for the calling agent's
    /// tool-description mechanism
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut prop = Map::new();
            prop.insert("type".to_owned(), json!(param.param_type.json_type()));
            prop.insert("description".to_owned(), json!(param.description));

            for constraint in &param.constraints {
                match constraint {
                    Constraint::OneOf(values) => {
                        prop.insert("enum".to_owned(), json!(values));
                    }
                    Constraint::MinInt(min) => {
                        prop.insert("minimum".to_owned(), json!(min));
                    }
                    Constraint::MaxInt(max) => {
                        prop.insert("maximum".to_owned(), json!(max));
                    }
                    Constraint::MaxLength(len) => {
                        prop.insert("maxLength".to_owned(), json!(len));
                    }
                    Constraint::NonEmpty => {
                        prop.insert("minLength".to_owned(), json!(1));
                    }
                    // Structural envelope only; not expressible in JSON Schema
                    Constraint::Bolt11 => {}
                }
            }

            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
