/// Decoded CBOR value, restricted to the types WebAuthn attestation
/// objects and COSE keys actually use.
///
/// Negative integers keep the raw CBOR argument: `Negative(n)` represents
/// the integer `-(n + 1)`. COSE key labels -2 and -3 are therefore
/// `Negative(1)` and `Negative(2)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Negative(u64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Bool(bool),
    Null,
}

impl Value {
    /// Signed interpretation, if it fits in i128 (always does for CBOR).
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Unsigned(n) => Some(*n as i128),
            Value::Negative(n) => Some(-1 - *n as i128),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// Look up a map entry by integer label (COSE convention).
pub fn map_get_int<'a>(map: &'a [(Value, Value)], label: i128) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_integer() == Some(label))
        .map(|(_, v)| v)
}

/// Look up a map entry by text key (WebAuthn convention).
pub fn map_get_str<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Text(s) if s == key))
        .map(|(_, v)| v)
}
