//! Argument validation
//!
//! Checks a raw, model-generated argument payload against a capability's
//! schema before any node call is issued. Validation is pure, has no side
//! effects, and collects every violation found so the model can fix all
//! problems in one round-trip. Invalid input never reaches the node —
//! some capabilities are irreversible.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result, Violation};
use crate::schema::{ArgumentSchema, Constraint, ParamSpec, ParamType};

/// Bech32 data-part alphabet (BIP-173)
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Shortest plausible BOLT11 payment request (`ln` + hrp + `1` + data)
const MIN_INVOICE_LEN: usize = 15;

/// A validated argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// String (also carries enumeration values)
    String(String),
    /// 64-bit signed integer
    Integer(i64),
    /// Boolean
    Boolean(bool),
    /// Structured JSON passed through as-is
    Composite(Value),
}

/// Typed argument record produced by a successful validation.
///
/// Values are keyed by parameter name in schema declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedArgs {
    values: IndexMap<String, ArgValue>,
}

impl TypedArgs {
    /// Look up a validated value by parameter name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// String value of a parameter, if present and a string
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer value of a parameter, if present and an integer
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    /// Boolean value of a parameter, if present and a boolean
    #[must_use]
    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    /// String value of a required parameter.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the parameter is absent. Dispatch runs
    /// only on validated arguments, so this fires only on a schema/dispatch
    /// binding mismatch.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.str(name).ok_or_else(|| {
            Error::Validation(vec![Violation::param(name, "required parameter missing")])
        })
    }

    /// Integer value of a required parameter.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the parameter is absent, same contract
    /// as [`require_str`](Self::require_str).
    pub fn require_int(&self, name: &str) -> Result<i64> {
        self.integer(name).ok_or_else(|| {
            Error::Validation(vec![Violation::param(name, "required parameter missing")])
        })
    }

    /// Number of validated arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were supplied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validate a raw argument payload against a schema.
///
/// Checks, in order: payload is a JSON object (or null/absent for
/// no-argument capabilities), every required parameter is present, no
/// unrecognized names, each value matches its declared type, and every
/// type-specific constraint holds. All violations are collected.
///
/// # Errors
///
/// Returns [`Error::Validation`] listing every violation found.
pub fn validate(schema: &ArgumentSchema, raw: &Value) -> Result<TypedArgs> {
    let empty = serde_json::Map::new();
    let object = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(Error::Validation(vec![Violation::payload(
                "arguments must be a JSON object",
            )]));
        }
    };

    let mut violations = Vec::new();
    let mut values = IndexMap::new();

    for param in schema.params() {
        // JSON null is treated as absent: models routinely emit
        // `"param": null` for omitted optionals
        let supplied = object.get(&param.name).filter(|v| !v.is_null());

        let Some(value) = supplied else {
            if param.required {
                violations.push(Violation::param(&param.name, "required parameter missing"));
            }
            continue;
        };

        match coerce(param, value) {
            Ok(typed) => {
                for constraint in &param.constraints {
                    if let Some(message) = check_constraint(constraint, &typed) {
                        violations.push(Violation::param(&param.name, message));
                    }
                }
                values.insert(param.name.clone(), typed);
            }
            Err(message) => violations.push(Violation::param(&param.name, message)),
        }
    }

    for name in object.keys() {
        if schema.get(name).is_none() {
            violations.push(Violation::param(name, "unrecognized parameter"));
        }
    }

    if violations.is_empty() {
        Ok(TypedArgs { values })
    } else {
        Err(Error::Validation(violations))
    }
}

/// Check a raw JSON value against the declared parameter type
fn coerce(param: &ParamSpec, value: &Value) -> std::result::Result<ArgValue, String> {
    match param.param_type {
        ParamType::String | ParamType::Enumeration => value
            .as_str()
            .map(|s| ArgValue::String(s.to_owned()))
            .ok_or_else(|| "must be a string".to_owned()),
        ParamType::Integer => value
            .as_i64()
            .map(ArgValue::Integer)
            .ok_or_else(|| "must be an integer".to_owned()),
        ParamType::Boolean => value
            .as_bool()
            .map(ArgValue::Boolean)
            .ok_or_else(|| "must be a boolean".to_owned()),
        ParamType::Composite => {
            if value.is_object() || value.is_array() {
                Ok(ArgValue::Composite(value.clone()))
            } else {
                Err("must be a JSON object or array".to_owned())
            }
        }
    }
}

/// Check one constraint against a coerced value; `None` means it holds
fn check_constraint(constraint: &Constraint, value: &ArgValue) -> Option<String> {
    match (constraint, value) {
        (Constraint::NonEmpty, ArgValue::String(s)) => {
            s.is_empty().then(|| "must not be empty".to_owned())
        }
        (Constraint::MaxLength(max), ArgValue::String(s)) => (s.len() > *max)
            .then(|| format!("must be at most {max} bytes, got {}", s.len())),
        (Constraint::MinInt(min), ArgValue::Integer(n)) => {
            (n < min).then(|| format!("must be at least {min}, got {n}"))
        }
        (Constraint::MaxInt(max), ArgValue::Integer(n)) => {
            (n > max).then(|| format!("must be at most {max}, got {n}"))
        }
        (Constraint::OneOf(allowed), ArgValue::String(s)) => {
            if allowed.iter().any(|a| a == s) {
                None
            } else {
                Some(format!("must be one of: {}", allowed.join(", ")))
            }
        }
        (Constraint::Bolt11, ArgValue::String(s)) => (!is_bolt11_envelope(s))
            .then(|| "not a plausible BOLT11 payment request".to_owned()),
        // Constraint applies to a different type; the type check already
        // produced a violation
        _ => None,
    }
}

/// Structural check for a BOLT11 payment request: lowercase `ln` prefix,
/// bech32 charset throughout, a `1` separator, and a minimum data length.
/// No semantic decoding — that is the node's job.
#[must_use]
pub fn is_bolt11_envelope(s: &str) -> bool {
    if s.len() < MIN_INVOICE_LEN || !s.starts_with("ln") {
        return false;
    }
    if !s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()) {
        return false;
    }
    let Some(separator) = s.rfind('1') else {
        return false;
    };
    let data = &s[separator + 1..];
    data.len() >= 6 && data.chars().all(|c| BECH32_CHARSET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ArgumentSchema, ParamSpec, ParamType};
    use serde_json::json;

    const TEST_INVOICE: &str =
        "lnsb100u1p3pj257pp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypq";

    fn payment_schema() -> ArgumentSchema {
        ArgumentSchema::empty()
            .with(
                ParamSpec::new("invoice", ParamType::String, "BOLT11 payment request")
                    .constrain(Constraint::NonEmpty)
                    .constrain(Constraint::Bolt11),
            )
            .with(
                ParamSpec::new("fee_limit_sat", ParamType::Integer, "Fee limit in sats")
                    .optional()
                    .constrain(Constraint::MinInt(0)),
            )
    }

    fn violations(err: Error) -> Vec<Violation> {
        match err {
            Error::Validation(v) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    // -- presence and shape ---------------------------------------------------

    #[test]
    fn accepts_well_formed_arguments() {
        let args = validate(
            &payment_schema(),
            &json!({"invoice": TEST_INVOICE, "fee_limit_sat": 50}),
        )
        .unwrap();

        assert_eq!(args.str("invoice"), Some(TEST_INVOICE));
        assert_eq!(args.integer("fee_limit_sat"), Some(50));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn missing_required_parameter_named_in_violation() {
        let err = validate(&payment_schema(), &json!({})).unwrap_err();
        let v = violations(err);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].param.as_deref(), Some("invoice"));
    }

    #[test]
    fn optional_parameter_may_be_absent() {
        let args = validate(&payment_schema(), &json!({"invoice": TEST_INVOICE})).unwrap();
        assert_eq!(args.integer("fee_limit_sat"), None);
    }

    #[test]
    fn null_treated_as_absent() {
        let args = validate(
            &payment_schema(),
            &json!({"invoice": TEST_INVOICE, "fee_limit_sat": null}),
        )
        .unwrap();
        assert_eq!(args.integer("fee_limit_sat"), None);
    }

    #[test]
    fn null_required_parameter_is_missing() {
        let err = validate(&payment_schema(), &json!({"invoice": null})).unwrap_err();
        let v = violations(err);
        assert_eq!(v[0].param.as_deref(), Some("invoice"));
    }

    #[test]
    fn unrecognized_parameter_rejected() {
        let err = validate(
            &payment_schema(),
            &json!({"invoice": TEST_INVOICE, "amount": 5}),
        )
        .unwrap_err();
        let v = violations(err);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].param.as_deref(), Some("amount"));
        assert!(v[0].message.contains("unrecognized"));
    }

    #[test]
    fn non_object_payload_rejected() {
        let err = validate(&payment_schema(), &json!([1, 2, 3])).unwrap_err();
        let v = violations(err);
        assert!(v[0].param.is_none());
    }

    #[test]
    fn null_payload_means_no_arguments() {
        let args = validate(&ArgumentSchema::empty(), &Value::Null).unwrap();
        assert!(args.is_empty());
    }

    // -- type checks ----------------------------------------------------------

    #[test]
    fn wrong_types_rejected() {
        let err = validate(
            &payment_schema(),
            &json!({"invoice": 42, "fee_limit_sat": "fifty"}),
        )
        .unwrap_err();
        let v = violations(err);
        assert_eq!(v.len(), 2, "{v:?}");
    }

    #[test]
    fn float_is_not_an_integer() {
        let err = validate(
            &payment_schema(),
            &json!({"invoice": TEST_INVOICE, "fee_limit_sat": 1.5}),
        )
        .unwrap_err();
        let v = violations(err);
        assert_eq!(v[0].param.as_deref(), Some("fee_limit_sat"));
    }

    #[test]
    fn boolean_parameter() {
        let schema = ArgumentSchema::empty().with(
            ParamSpec::new("active_only", ParamType::Boolean, "Filter to active").optional(),
        );
        let args = validate(&schema, &json!({"active_only": true})).unwrap();
        assert_eq!(args.boolean("active_only"), Some(true));

        let err = validate(&schema, &json!({"active_only": "yes"})).unwrap_err();
        assert_eq!(violations(err).len(), 1);
    }

    #[test]
    fn composite_parameter_accepts_structured_json() {
        let schema = ArgumentSchema::empty()
            .with(ParamSpec::new("route", ParamType::Composite, "Route hint").optional());

        let args = validate(&schema, &json!({"route": {"hops": []}})).unwrap();
        assert!(matches!(args.get("route"), Some(ArgValue::Composite(_))));

        let err = validate(&schema, &json!({"route": "not structured"})).unwrap_err();
        assert_eq!(violations(err).len(), 1);
    }

    // -- constraints ----------------------------------------------------------

    #[test]
    fn require_int_errors_on_absent_parameter() {
        let args = validate(&payment_schema(), &json!({"invoice": TEST_INVOICE})).unwrap();

        let err = args.require_int("fee_limit_sat").unwrap_err();
        assert!(
            matches!(&err, Error::Validation(v) if v[0].param.as_deref() == Some("fee_limit_sat")),
            "{err:?}"
        );

        let args = validate(
            &payment_schema(),
            &json!({"invoice": TEST_INVOICE, "fee_limit_sat": 7}),
        )
        .unwrap();
        assert_eq!(args.require_int("fee_limit_sat").unwrap(), 7);
    }

    #[test]
    fn integer_range_enforced() {
        let err = validate(
            &payment_schema(),
            &json!({"invoice": TEST_INVOICE, "fee_limit_sat": -1}),
        )
        .unwrap_err();
        let v = violations(err);
        assert_eq!(v[0].param.as_deref(), Some("fee_limit_sat"));
        assert!(v[0].message.contains("at least 0"));
    }

    #[test]
    fn enumeration_membership_enforced() {
        let schema = ArgumentSchema::empty().with(
            ParamSpec::new("network", ParamType::Enumeration, "Network").constrain(
                Constraint::OneOf(vec!["mainnet".into(), "testnet".into()]),
            ),
        );

        assert!(validate(&schema, &json!({"network": "testnet"})).is_ok());

        let err = validate(&schema, &json!({"network": "dogenet"})).unwrap_err();
        assert!(violations(err)[0].message.contains("one of"));
    }

    #[test]
    fn malformed_invoice_rejected_structurally() {
        let err = validate(&payment_schema(), &json!({"invoice": "<malformed>"})).unwrap_err();
        let v = violations(err);
        assert_eq!(v[0].param.as_deref(), Some("invoice"));
        assert!(v[0].message.contains("BOLT11"));
    }

    #[test]
    fn all_violations_collected_in_one_pass() {
        let err = validate(
            &payment_schema(),
            &json!({"fee_limit_sat": -5, "bogus": 1}),
        )
        .unwrap_err();
        let v = violations(err);
        // missing invoice + fee range + unrecognized name
        assert_eq!(v.len(), 3, "{v:?}");
    }

    // -- bolt11 envelope ------------------------------------------------------

    #[test]
    fn bolt11_accepts_plausible_invoices() {
        assert!(is_bolt11_envelope(TEST_INVOICE));
        assert!(is_bolt11_envelope(
            "lnbc2500u1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypq"
        ));
    }

    #[test]
    fn bolt11_rejects_wrong_prefix() {
        assert!(!is_bolt11_envelope("bc1qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqf"));
    }

    #[test]
    fn bolt11_rejects_uppercase() {
        assert!(!is_bolt11_envelope(
            "LNSB100U1P3PJ257PP5QQQSYQCYQ5RQWZQFQQQSYQCYQ5RQWZQF"
        ));
    }

    #[test]
    fn bolt11_rejects_short_or_separatorless_strings() {
        assert!(!is_bolt11_envelope("ln"));
        assert!(!is_bolt11_envelope("lnsbqqqsyqcyqrqwzqfqqqsyqcyqrqwzqf"));
    }

    #[test]
    fn bolt11_rejects_invalid_charset() {
        // 'b', 'i', 'o' are excluded from the bech32 data alphabet
        assert!(!is_bolt11_envelope("lnsb100u1bioqqqsyqcyq5rqwzqf"));
    }
}
