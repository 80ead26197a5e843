// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Schema-checked decoding of remote results

use std::fmt::{Debug, Display};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Error;

/// Expected result shape, reported in [Error::Decode]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    Bool,
    String,
    Object,
    Array,
    /// Object with the named key
    Key(&'static str),
    /// URL or path with a trailing identifier
    Path,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Bool => write!(f, "boolean"),
            Expected::String => write!(f, "string"),
            Expected::Object => write!(f, "object"),
            Expected::Array => write!(f, "array"),
            Expected::Key(k) => write!(f, "object with key '{k}'"),
            Expected::Path => write!(f, "path"),
        }
    }
}

fn mismatch<E: Display + Debug>(method: &str, expected: Expected) -> Error<E> {
    Error::Decode {
        method: method.to_string(),
        expected,
    }
}

/// Decode a boolean result
pub fn bool<E: Display + Debug>(method: &str, v: &Value) -> Result<bool, Error<E>> {
    v.as_bool().ok_or_else(|| mismatch(method, Expected::Bool))
}

/// Decode a string result
pub fn string<E: Display + Debug>(method: &str, v: &Value) -> Result<String, Error<E>> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(method, Expected::String))
}

/// Fetch `key` from an object result
fn field<'a, E: Display + Debug>(
    method: &str,
    v: &'a Value,
    key: &'static str,
) -> Result<&'a Value, Error<E>> {
    let o = v
        .as_object()
        .ok_or_else(|| mismatch(method, Expected::Object))?;

    o.get(key).ok_or_else(|| mismatch(method, Expected::Key(key)))
}

/// Decode a string stored under `key` in an object result
pub fn key_string<E: Display + Debug>(
    method: &str,
    v: &Value,
    key: &'static str,
) -> Result<String, Error<E>> {
    field(method, v, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(method, Expected::Key(key)))
}

/// Decode a boolean stored under `key` in an object result
pub fn key_bool<E: Display + Debug>(
    method: &str,
    v: &Value,
    key: &'static str,
) -> Result<bool, Error<E>> {
    field(method, v, key)?
        .as_bool()
        .ok_or_else(|| mismatch(method, Expected::Key(key)))
}

/// Decode the last path segment of a string result, dropping any query
pub fn path_id<E: Display + Debug>(method: &str, v: &Value) -> Result<String, Error<E>> {
    let s = v
        .as_str()
        .ok_or_else(|| mismatch(method, Expected::String))?;

    s.split('/')
        .filter(|p| !p.is_empty())
        .last()
        .and_then(|p| p.split('?').find(|p| !p.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| mismatch(method, Expected::Path))
}

/// Decode an array of objects, each deserialised as `T`
pub fn objects<T: DeserializeOwned, E: Display + Debug>(
    method: &str,
    v: Value,
) -> Result<Vec<T>, Error<E>> {
    let items = match v {
        Value::Array(a) => a,
        _ => return Err(mismatch(method, Expected::Array)),
    };

    items
        .into_iter()
        .map(|i| match i {
            Value::Object(_) => {
                serde_json::from_value(i).map_err(|_| mismatch(method, Expected::Object))
            }
            _ => Err(mismatch(method, Expected::Object)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    type E = Error<String>;

    #[test]
    fn scalars() {
        assert!(bool::<String>("m", &json!(true)).unwrap());
        assert_eq!(string::<String>("m", &json!("s")).unwrap(), "s");

        let e: E = bool("checkIfUserExists", &json!("true")).unwrap_err();
        match e {
            Error::Decode { method, expected } => {
                assert_eq!(method, "checkIfUserExists");
                assert_eq!(expected, Expected::Bool);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(string::<String>("m", &Value::Null).is_err());
    }

    #[test]
    fn keyed_values() {
        let v = json!({ "signature": "0xabc", "isSetup": false });

        assert_eq!(key_string::<String>("m", &v, "signature").unwrap(), "0xabc");
        assert!(!key_bool::<String>("m", &v, "isSetup").unwrap());

        assert!(matches!(
            key_string::<String>("m", &v, "uri"),
            Err(Error::Decode { expected: Expected::Key("uri"), .. })
        ));
        assert!(matches!(
            key_string::<String>("m", &json!("0xabc"), "signature"),
            Err(Error::Decode { expected: Expected::Object, .. })
        ));
        assert!(matches!(
            key_bool::<String>("m", &v, "signature"),
            Err(Error::Decode { expected: Expected::Key("signature"), .. })
        ));
    }

    #[test]
    fn path_ids() {
        let id = |s: &str| path_id::<String>("verifyEmail", &json!(s));

        assert_eq!(id("https://app.example/biometrics/abc123?x=1").unwrap(), "abc123");
        assert_eq!(id("/web/abc/").unwrap(), "abc");
        assert_eq!(id("abc").unwrap(), "abc");
        assert!(matches!(id("/?/"), Err(Error::Decode { expected: Expected::Path, .. })));
        assert!(matches!(
            path_id::<String>("verifyEmail", &json!(1)),
            Err(Error::Decode { expected: Expected::String, .. })
        ));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    #[test]
    fn object_arrays() {
        let items: Vec<Item> =
            objects::<_, String>("m", json!([{ "id": "a" }, { "id": "b" }])).unwrap();
        assert_eq!(items.len(), 2);

        assert!(objects::<Item, String>("m", json!({ "id": "a" })).is_err());
        assert!(objects::<Item, String>("m", json!([{ "id": "a" }, 7])).is_err());
        assert!(objects::<Item, String>("m", json!([{ "name": "a" }])).is_err());
    }
}
