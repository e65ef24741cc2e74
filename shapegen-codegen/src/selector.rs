//! Target type selectors.

use crate::error::CodegenError;
use std::fmt;
use std::str::FromStr;

/// Names the type to generate code for.
///
/// Written either as a bare type name (`Person`), resolved in the module of
/// the output destination, or as `"module/path".Person`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelector {
    /// Module declaring the target, if not the destination module.
    pub module: Option<String>,
    /// Target type name.
    pub name: String,
}

impl TargetSelector {
    /// Creates a selector for a type in the destination module.
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            module: None,
            name: name.into(),
        }
    }

    /// Creates a selector for a type in another module.
    #[must_use]
    pub fn qualified(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            name: name.into(),
        }
    }

    /// Parses a selector.
    ///
    /// # Errors
    /// Returns `CodegenError::InvalidSelector` for an empty selector, an
    /// unterminated or empty quoted module, or a missing type name.
    pub fn parse(selector: &str) -> Result<Self, CodegenError> {
        let Some(quoted) = selector.strip_prefix('"') else {
            if selector.is_empty() {
                return Err(CodegenError::invalid_selector(selector, "empty selector"));
            }
            return Ok(Self::local(selector));
        };

        let Some((module, rest)) = quoted.split_once('"') else {
            return Err(CodegenError::invalid_selector(
                selector,
                "unterminated module path",
            ));
        };
        if module.is_empty() {
            return Err(CodegenError::invalid_selector(selector, "empty module path"));
        }
        match rest.strip_prefix('.') {
            Some(name) if !name.is_empty() => Ok(Self::qualified(module, name)),
            _ => Err(CodegenError::invalid_selector(
                selector,
                "expected .TypeName after the module path",
            )),
        }
    }
}

impl FromStr for TargetSelector {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{module:?}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        let selector = TargetSelector::parse("Person").expect("Failed to parse");
        assert_eq!(selector, TargetSelector::local("Person"));
        assert_eq!(selector.to_string(), "Person");
    }

    #[test]
    fn test_parse_qualified() {
        let selector: TargetSelector = "\"example.com/app/models\".Person"
            .parse()
            .expect("Failed to parse");
        assert_eq!(selector.module.as_deref(), Some("example.com/app/models"));
        assert_eq!(selector.name, "Person");
        assert_eq!(selector.to_string(), "\"example.com/app/models\".Person");
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["", "\"unterminated", "\"\".Person", "\"example.com/m\"", "\"example.com/m\".", "\"example.com/m\"Person"] {
            let err = TargetSelector::parse(input).unwrap_err();
            assert!(
                matches!(err, CodegenError::InvalidSelector { .. }),
                "{input:?} should be rejected"
            );
        }
    }
}
