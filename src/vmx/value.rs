//! Typed values for VM descriptor entries.
//!
//! Every value in a `.vmx` file is a quoted string. The parser coerces each
//! one into a [`Value`] by walking [`COERCION_RULES`] in order; the first rule
//! that accepts the raw text wins and anything left over stays [`Value::Text`].

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Section whose values are identifiers (`uuid.bios`, `uuid.location`).
pub const IDENTIFIER_SECTION: &str = "uuid";

/// A typed descriptor value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => f.write_str("TRUE"),
            Value::Bool(false) => f.write_str("FALSE"),
            Value::Int(number) => write!(f, "{}", number),
            Value::Uuid(id) => write!(f, "{}", id),
            Value::Text(text) => f.write_str(text),
        }
    }
}

/// Options controlling how raw strings are coerced
#[derive(Debug, Clone, Copy)]
pub struct Coercion {
    pub parse_uuid: bool,
}

impl Default for Coercion {
    fn default() -> Self {
        Self { parse_uuid: true }
    }
}

type Rule = fn(&Coercion, Option<&str>, &str) -> Option<Value>;

/// Coercion rules in priority order. Text is the implicit last rule.
pub const COERCION_RULES: &[(&str, Rule)] = &[
    ("boolean", coerce_bool),
    ("identifier", coerce_uuid),
    ("integer", coerce_int),
];

impl Coercion {
    /// Coerce a raw value found under `section` (None for top-level keys).
    pub fn apply(&self, section: Option<&str>, raw: &str) -> Value {
        COERCION_RULES
            .iter()
            .find_map(|(_, rule)| rule(self, section, raw))
            .unwrap_or_else(|| Value::Text(raw.to_string()))
    }
}

fn coerce_bool(_: &Coercion, _: Option<&str>, raw: &str) -> Option<Value> {
    // ethernet0.present = "TRUE", floppy0.present = "FALSE"
    match raw {
        "TRUE" => Some(Value::Bool(true)),
        "FALSE" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn coerce_uuid(options: &Coercion, section: Option<&str>, raw: &str) -> Option<Value> {
    if !options.parse_uuid || section != Some(IDENTIFIER_SECTION) {
        return None;
    }
    // uuid.bios = "56 4d 12 34 56 78 9a bc-de f0 12 34 56 78 9a bc"
    let compact: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-')
        .collect();
    match Uuid::try_parse(&compact) {
        Ok(id) => Some(Value::Uuid(id)),
        Err(e) => {
            log::debug!("Keeping non-UUID identifier value {:?}: {}", raw, e);
            None
        }
    }
}

fn coerce_int(_: &Coercion, _: Option<&str>, raw: &str) -> Option<Value> {
    // memsize = "2048", ehci:0.parent = "-1". Values outside i64 stay text.
    raw.parse::<i64>().ok().map(Value::Int)
}
