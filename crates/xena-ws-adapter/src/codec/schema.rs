/*
[INPUT]:  Per-shape field declarations (name, wire tag, kind, default)
[OUTPUT]: Static schema tables consumed by the wire codec
[POS]:    Codec layer - explicit replacement for reflective field enumeration
[UPDATE]: When adding field kinds or changing default semantics
*/

use std::borrow::Cow;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Readable key holding the message type
pub const MSG_TYPE_KEY: &str = "msgType";
/// Compact key holding the message type
pub const MSG_TYPE_TAG: &str = "35";

/// Field naming used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Keys are the field display names (`"clOrdId"`)
    Readable,
    /// Keys are the numeric tags as strings (`"11"`)
    #[default]
    Compact,
}

impl KeyMode {
    pub fn key(self, field: &FieldSpec) -> Cow<'static, str> {
        match self {
            KeyMode::Readable => Cow::Borrowed(field.name),
            KeyMode::Compact => Cow::Owned(field.tag.to_string()),
        }
    }
}

/// Declared default of a scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Optional value (decimals, enums)
    Null,
    EmptyString,
    Zero,
    False,
}

impl FieldDefault {
    /// Whether `value` equals this default. `null` counts as default for every kind.
    pub fn matches(self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            FieldDefault::Null => false,
            FieldDefault::EmptyString => value.as_str() == Some(""),
            FieldDefault::Zero => value.as_f64() == Some(0.0),
            FieldDefault::False => value.as_bool() == Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Scalar(FieldDefault),
    Message(&'static Schema),
    RepeatedScalar,
    RepeatedMessage(&'static Schema),
    /// String-keyed map, copied as-is in both directions
    Map,
}

/// One field descriptor: `(name, wireTag, kind, defaultValue)`
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub tag: u32,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn string(name: &'static str, tag: u32) -> Self {
        Self::scalar(name, tag, FieldDefault::EmptyString)
    }

    pub const fn int(name: &'static str, tag: u32) -> Self {
        Self::scalar(name, tag, FieldDefault::Zero)
    }

    pub const fn flag(name: &'static str, tag: u32) -> Self {
        Self::scalar(name, tag, FieldDefault::False)
    }

    pub const fn optional(name: &'static str, tag: u32) -> Self {
        Self::scalar(name, tag, FieldDefault::Null)
    }

    pub const fn msg_type() -> Self {
        Self::string(MSG_TYPE_KEY, 35)
    }

    pub const fn repeated(name: &'static str, tag: u32) -> Self {
        Self {
            name,
            tag,
            kind: FieldKind::RepeatedScalar,
        }
    }

    pub const fn message(name: &'static str, tag: u32, schema: &'static Schema) -> Self {
        Self {
            name,
            tag,
            kind: FieldKind::Message(schema),
        }
    }

    pub const fn messages(name: &'static str, tag: u32, schema: &'static Schema) -> Self {
        Self {
            name,
            tag,
            kind: FieldKind::RepeatedMessage(schema),
        }
    }

    pub const fn map(name: &'static str, tag: u32) -> Self {
        Self {
            name,
            tag,
            kind: FieldKind::Map,
        }
    }

    const fn scalar(name: &'static str, tag: u32, default: FieldDefault) -> Self {
        Self {
            name,
            tag,
            kind: FieldKind::Scalar(default),
        }
    }
}

/// Ordered field table describing one message shape
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_by_tag(&self, tag: u32) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.tag == tag)
    }
}

/// A typed shape the codec can move to and from the wire.
///
/// Serde carries values in and out of the struct using the readable names;
/// `SCHEMA` drives sparseness, key translation and nesting.
pub trait WireMessage: Serialize + DeserializeOwned + Default {
    const SCHEMA: &'static Schema;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static LEAF: Schema = Schema {
        name: "Leaf",
        fields: &[FieldSpec::string("symbol", 55)],
    };

    static ROOT: Schema = Schema {
        name: "Root",
        fields: &[
            FieldSpec::msg_type(),
            FieldSpec::int("account", 1),
            FieldSpec::message("leaf", 900, &LEAF),
        ],
    };

    #[test]
    fn test_defaults_match() {
        assert!(FieldDefault::EmptyString.matches(&json!("")));
        assert!(!FieldDefault::EmptyString.matches(&json!("x")));
        assert!(FieldDefault::Zero.matches(&json!(0)));
        assert!(FieldDefault::Zero.matches(&json!(0.0)));
        assert!(!FieldDefault::Zero.matches(&json!(-1)));
        assert!(FieldDefault::False.matches(&json!(false)));
        assert!(FieldDefault::Null.matches(&Value::Null));
        assert!(!FieldDefault::Null.matches(&json!("0")));
    }

    #[test]
    fn test_key_mode() {
        let field = ROOT.field("account").unwrap();
        assert_eq!(KeyMode::Readable.key(field), "account");
        assert_eq!(KeyMode::Compact.key(field), "1");
    }

    #[test]
    fn test_nested_lookup() {
        let field = ROOT.field_by_tag(900).unwrap();
        match field.kind {
            FieldKind::Message(schema) => assert_eq!(schema.name, "Leaf"),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
