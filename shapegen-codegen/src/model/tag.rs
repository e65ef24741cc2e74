//! Template wrapper for field metadata tags.

use minijinja::value::{Object, Value, from_args};
use minijinja::{Error, ErrorKind, State};
use shapegen_universe::Tag;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Field tag as seen by templates.
///
/// Renders as the raw tag text and offers `has(key)`, `get(key)`,
/// `has_flag(key, flag)` and `values(key)`.
#[derive(Debug, Clone)]
pub struct TagValue(Tag);

impl TagValue {
    /// Wraps a tag.
    #[must_use]
    pub fn new(tag: Tag) -> Self {
        Self(tag)
    }
}

impl Deref for TagValue {
    type Target = Tag;

    fn deref(&self) -> &Tag {
        &self.0
    }
}

impl Object for TagValue {
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
            "has_flag" => {
                let (key, flag): (&str, &str) = from_args(args)?;
                Ok(Value::from(self.has_flag(key, flag)))
            }
            "values" => {
                let (key,): (&str,) = from_args(args)?;
                Ok(Value::from(self.values(key)))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
