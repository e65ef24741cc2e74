//! Module validation utilities.
//!
//! Validation never rejects a module. Problems are reported as
//! [`Diagnostic`]s that ride along with the loaded snapshot so that
//! generation can still proceed.

use crate::snapshot::Diagnostic;
use crate::type_ref::TypeRef;
use crate::types::{CapabilitySetShape, ModuleDef, RecordShape, Shape};
use std::collections::HashSet;

/// Validates a parsed module for consistency.
///
/// # Arguments
/// * `module` - The module to validate
///
/// # Returns
/// Diagnostics describing every problem found (empty if none).
#[must_use]
pub fn validate_module(module: &ModuleDef) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut report = |message: String| diagnostics.push(Diagnostic::new(&module.path, message));

    if module.name.is_empty() {
        report("module has an empty name".to_string());
    }

    let mut seen_types = HashSet::new();
    for declared in &module.types {
        if !seen_types.insert(&declared.name) {
            report(format!("duplicate type '{}'", declared.name));
        }

        match &declared.shape {
            Shape::Record(record) => validate_record(&declared.name, record, &mut report),
            Shape::CapabilitySet(set) => validate_capability_set(&declared.name, set, &mut report),
            Shape::Defined(_) => {}
        }
    }

    let mut seen_imports = HashSet::new();
    for import in &module.imports {
        if !seen_imports.insert(&import.path) {
            report(format!("duplicate import {:?}", import.path));
        }
    }

    diagnostics
}

/// Validates a record type definition.
fn validate_record(name: &str, record: &RecordShape, report: &mut impl FnMut(String)) {
    let mut seen = HashSet::new();
    for field in &record.fields {
        if !seen.insert(&field.name) {
            report(format!("duplicate field '{}' in record '{name}'", field.name));
        }
    }
}

/// Validates a capability set type definition.
fn validate_capability_set(name: &str, set: &CapabilitySetShape, report: &mut impl FnMut(String)) {
    let mut seen = HashSet::new();
    for method in &set.methods {
        if !seen.insert(&method.name) {
            report(format!(
                "duplicate method '{}' in capability set '{name}'",
                method.name
            ));
        }

        if !method.variadic {
            continue;
        }
        match method.params.last() {
            None => report(format!(
                "variadic method '{name}.{}' has no parameters",
                method.name
            )),
            Some(last) if !matches!(last.ty, TypeRef::Slice(_)) => report(format!(
                "variadic parameter '{}' of '{name}.{}' is not a slice",
                last.name, method.name
            )),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    #[test]
    fn test_validate_valid_module() {
        let xml = r#"<module path="example.com/m" name="m">
    <record name="A"><field name="X" type="int"/></record>
    <capabilities name="B">
        <method name="Log" variadic="true"><param name="v" type="[]any"/></method>
    </capabilities>
</module>"#;

        let module = parse_module(xml).expect("Failed to parse");
        assert!(validate_module(&module).is_empty());
    }

    #[test]
    fn test_validate_duplicates() {
        let xml = r#"<module path="example.com/m" name="m">
    <import path="time"/>
    <import path="time"/>
    <record name="A">
        <field name="X" type="int"/>
        <field name="X" type="string"/>
    </record>
    <record name="A"/>
    <capabilities name="B">
        <method name="Do"/>
        <method name="Do"/>
    </capabilities>
</module>"#;

        let module = parse_module(xml).expect("Failed to parse");
        let diagnostics = validate_module(&module);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();

        assert_eq!(diagnostics.len(), 4);
        assert!(messages.contains(&"duplicate type 'A'"));
        assert!(messages.contains(&"duplicate field 'X' in record 'A'"));
        assert!(messages.contains(&"duplicate method 'Do' in capability set 'B'"));
        assert!(messages.contains(&"duplicate import \"time\""));
        assert!(diagnostics.iter().all(|d| d.module == "example.com/m"));
    }

    #[test]
    fn test_validate_variadic() {
        let xml = r#"<module path="example.com/m" name="m">
    <capabilities name="B">
        <method name="Empty" variadic="true"/>
        <method name="NotSlice" variadic="true"><param name="v" type="int"/></method>
    </capabilities>
</module>"#;

        let module = parse_module(xml).expect("Failed to parse");
        let diagnostics = validate_module(&module);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("has no parameters"));
        assert!(diagnostics[1].message.contains("is not a slice"));
    }
}
