//! Caller-supplied template arguments.

use crate::error::CodegenError;
use minijinja::value::{Enumerator, Object, Value, from_args};
use minijinja::{Error, ErrorKind, State};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Key/value arguments exposed to templates through `args()`.
///
/// Parsed from `key=value` pairs separated by `;`, e.g.
/// `package=store;mock=true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgMap {
    values: BTreeMap<String, String>,
}

impl ArgMap {
    /// Creates an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an argument, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Returns true if `key` was supplied.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the value for `key`, or an empty string.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }

    /// Returns the value for `key`, or `default` when absent.
    #[must_use]
    pub fn get_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map_or(default, String::as_str)
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no argument was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates arguments sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for ArgMap {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut args = Self::new();
        for pair in s.split(';').filter(|pair| !pair.trim().is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(CodegenError::InvalidArgument {
                    pair: pair.to_string(),
                });
            };
            args.insert(key.trim(), value.trim());
        }
        Ok(args)
    }
}

impl fmt::Display for ArgMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArgMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Object for ArgMap {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.values.get(key.as_str()?).map(|v| Value::from(v.clone()))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.values.keys().map(|k| Value::from(k.clone())).collect())
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "has" => {
                let (key,): (&str,) = from_args(args)?;
                Ok(Value::from(self.has(key)))
            }
            "get" => {
                let (key,): (&str,) = from_args(args)?;
                Ok(Value::from(self.get(key)))
            }
            "get_or_default" => {
                let (key, default): (&str, &str) = from_args(args)?;
                Ok(Value::from(self.get_or_default(key, default)))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::Environment;

    #[test]
    fn test_parse() {
        let args: ArgMap = " package = store ;; mock=true;empty=".parse().expect("Failed to parse");
        assert_eq!(args.len(), 3);
        assert_eq!(args.get("package"), "store");
        assert_eq!(args.get("mock"), "true");
        assert!(args.has("empty"));
        assert_eq!(args.get("empty"), "");
    }

    #[test]
    fn test_parse_keeps_extra_equals() {
        let args: ArgMap = "expr=a=b".parse().expect("Failed to parse");
        assert_eq!(args.get("expr"), "a=b");
    }

    #[test]
    fn test_parse_malformed() {
        let err = "good=1;bad".parse::<ArgMap>().unwrap_err();
        assert!(matches!(err, CodegenError::InvalidArgument { ref pair } if pair == "bad"));
    }

    #[test]
    fn test_get_or_default() {
        let args: ArgMap = [("a", "1")].into_iter().collect();
        assert_eq!(args.get_or_default("a", "x"), "1");
        assert_eq!(args.get_or_default("b", "x"), "x");
        assert_eq!(args.get("b"), "");
        assert!(!args.has("b"));
    }

    #[test]
    fn test_display_sorted() {
        let args: ArgMap = "z=1;a=2".parse().expect("Failed to parse");
        assert_eq!(args.to_string(), "a=2;z=1");
        assert_eq!(ArgMap::new().to_string(), "");
    }

    #[test]
    fn test_template_methods() {
        let args: ArgMap = "name=Store".parse().expect("Failed to parse");
        let env = Environment::new();
        let out = env
            .render_str(
                "{{ a.has('name') }} {{ a.get('name') }} {{ a.get('nope') }}|{{ a.get_or_default('pkg', 'main') }} {{ a.name }}",
                minijinja::context! { a => Value::from_object(args) },
            )
            .expect("Failed to render");
        assert_eq!(out, "true Store |main Store");
    }
}
