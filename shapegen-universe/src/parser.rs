//! Module manifest parser.
//!
//! This module parses XML module manifests into [`ModuleDef`] values. A
//! manifest declares exactly one module:
//!
//! ```xml
//! <module path="example.com/app/models" name="models" root="example.com/app">
//!     <import path="example.com/app/money" name="money"/>
//!     <record name="Person">
//!         <field name="Name" type="string" tag='json:"name"'/>
//!         <field name="Wallet" type="*example.com/app/money.Amount"/>
//!     </record>
//!     <capabilities name="Reader">
//!         <method name="Read">
//!             <param name="p" type="[]byte"/>
//!             <result name="n" type="int"/>
//!             <result name="err" type="error"/>
//!         </method>
//!     </capabilities>
//!     <type name="ID" underlying="string"/>
//! </module>
//! ```

use crate::error::ParseError;
use crate::type_ref::{ModuleRef, TypeRef, default_short_name};
use crate::types::{
    CapabilitySetShape, DeclaredType, FieldDecl, ImportDecl, MethodDecl, ModuleDef, RecordShape,
    Shape, VarDecl,
};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

/// Parses a module manifest from a string.
///
/// # Arguments
/// * `xml` - Manifest content
///
/// # Returns
/// Parsed module with local and imported type names qualified.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed, an element appears outside
/// `<module>`, or a required attribute is missing or invalid.
pub fn parse_module(xml: &str) -> Result<ModuleDef, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut module: Option<ModuleDef> = None;
    let mut buf = Vec::new();

    loop {
        let (e, has_content) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (e.into_owned(), true),
            Ok(Event::Empty(e)) => (e.into_owned(), false),
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {
                buf.clear();
                continue;
            }
        };
        buf.clear();

        let name_bytes = e.name().as_ref().to_vec();
        let name = std::str::from_utf8(&name_bytes)?;

        if name == "module" {
            if module.is_some() {
                return Err(ParseError::InvalidStructure {
                    message: "more than one <module> element".to_string(),
                });
            }
            module = Some(parse_module_element(&e)?);
            continue;
        }

        let Some(current) = module.as_mut() else {
            return Err(ParseError::InvalidStructure {
                message: format!("<{name}> outside of <module>"),
            });
        };

        match name {
            "import" => {
                current.imports.push(parse_import(&e)?);
                skip_content(&mut reader, has_content)?;
            }
            "record" => {
                let type_name = required_attr(&e, "record", "name")?;
                let record = if has_content {
                    parse_record(&mut reader)?
                } else {
                    RecordShape::default()
                };
                current.add_type(DeclaredType::new(type_name, Shape::Record(record)));
            }
            "capabilities" => {
                let type_name = required_attr(&e, "capabilities", "name")?;
                let set = if has_content {
                    parse_capability_set(&mut reader)?
                } else {
                    CapabilitySetShape::default()
                };
                current.add_type(DeclaredType::new(type_name, Shape::CapabilitySet(set)));
            }
            "type" => {
                let type_name = required_attr(&e, "type", "name")?;
                let underlying = required_type(&e, "type", "underlying")?;
                current.add_type(DeclaredType::new(type_name, Shape::Defined(underlying)));
                skip_content(&mut reader, has_content)?;
            }
            _ => skip_content(&mut reader, has_content)?,
        }
    }

    let mut module = module.ok_or_else(|| ParseError::InvalidStructure {
        message: "No module element found".to_string(),
    })?;
    qualify(&mut module);
    Ok(module)
}

/// Parses the module element attributes.
fn parse_module_element(e: &BytesStart<'_>) -> Result<ModuleDef, ParseError> {
    let mut path = None;
    let mut name = None;
    let mut root = None;

    for (key, value) in attributes(e)? {
        match key.as_str() {
            "path" => path = Some(value),
            "name" => name = Some(value),
            "root" => root = Some(value),
            _ => {}
        }
    }

    let path = path.ok_or_else(|| ParseError::missing_attr("module", "path"))?;
    let name = name.unwrap_or_else(|| default_short_name(&path));

    let mut module = ModuleDef::new(path, name);
    module.root = root;
    Ok(module)
}

/// Parses an import declaration.
fn parse_import(e: &BytesStart<'_>) -> Result<ImportDecl, ParseError> {
    let path = required_attr(e, "import", "path")?;
    let name = optional_attr(e, "name")?.unwrap_or_else(|| default_short_name(&path));
    Ok(ImportDecl { path, name })
}

/// Parses the fields of a record up to its end tag.
fn parse_record(reader: &mut Reader<&[u8]>) -> Result<RecordShape, ParseError> {
    let mut record = RecordShape::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"field" {
                    record.add_field(parse_field(e)?);
                }
                skip_to_end(reader)?;
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"field" {
                    record.add_field(parse_field(e)?);
                }
            }
            Ok(Event::End(_)) | Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(record)
}

/// Parses a field declaration.
fn parse_field(e: &BytesStart<'_>) -> Result<FieldDecl, ParseError> {
    let name = required_attr(e, "field", "name")?;
    let ty = required_type(e, "field", "type")?;
    let tag = optional_attr(e, "tag")?.unwrap_or_default();
    Ok(FieldDecl::new(name, ty).with_tag(tag))
}

/// Parses the methods of a capability set up to its end tag.
fn parse_capability_set(reader: &mut Reader<&[u8]>) -> Result<CapabilitySetShape, ParseError> {
    let mut set = CapabilitySetShape::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"method" {
                    let mut method = parse_method_element(e)?;
                    parse_signature(reader, &mut method)?;
                    set.add_method(method);
                } else {
                    skip_to_end(reader)?;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"method" {
                    set.add_method(parse_method_element(e)?);
                }
            }
            Ok(Event::End(_)) | Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(set)
}

/// Parses the method element attributes.
fn parse_method_element(e: &BytesStart<'_>) -> Result<MethodDecl, ParseError> {
    let mut method = MethodDecl::new(required_attr(e, "method", "name")?);
    if let Some(value) = optional_attr(e, "variadic")? {
        method.variadic = match value.as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(ParseError::invalid_attr("method", "variadic", value)),
        };
    }
    Ok(method)
}

/// Parses parameters and results up to the method's end tag.
fn parse_signature(reader: &mut Reader<&[u8]>, method: &mut MethodDecl) -> Result<(), ParseError> {
    let mut buf = Vec::new();

    loop {
        let (e, has_content) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (e.into_owned(), true),
            Ok(Event::Empty(e)) => (e.into_owned(), false),
            Ok(Event::End(_)) | Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {
                buf.clear();
                continue;
            }
        };
        buf.clear();

        match e.name().as_ref() {
            b"param" => method.params.push(parse_var(&e, "param")?),
            b"result" => method.results.push(parse_var(&e, "result")?),
            _ => {}
        }
        skip_content(reader, has_content)?;
    }

    Ok(())
}

/// Parses a parameter or result.
fn parse_var(e: &BytesStart<'_>, element: &str) -> Result<VarDecl, ParseError> {
    let name = optional_attr(e, "name")?.unwrap_or_default();
    let ty = required_type(e, element, "type")?;
    Ok(VarDecl::new(name, ty))
}

/// Qualifies unqualified references to locally declared types and applies
/// import short names to qualified references.
fn qualify(module: &mut ModuleDef) {
    let own = module.module_ref();
    let declared: std::collections::HashSet<String> =
        module.types.iter().map(|t| t.name.clone()).collect();
    let imports = module.imports.clone();

    let fix = |ty: &mut TypeRef| {
        let TypeRef::Named { module: owner, name } = ty.leaf_mut() else {
            return;
        };
        if owner.is_none() {
            if declared.contains(name.as_str()) {
                *owner = Some(own.clone());
            }
        } else if let Some(m) = owner.as_mut() {
            if m.path == own.path {
                *m = own.clone();
            } else if let Some(import) = imports.iter().find(|i| i.path == m.path) {
                *m = ModuleRef::new(import.path.clone(), import.name.clone());
            }
        }
    };

    for declared_type in &mut module.types {
        match &mut declared_type.shape {
            Shape::Record(record) => {
                for field in &mut record.fields {
                    fix(&mut field.ty);
                }
            }
            Shape::CapabilitySet(set) => {
                for method in &mut set.methods {
                    for var in method.params.iter_mut().chain(method.results.iter_mut()) {
                        fix(&mut var.ty);
                    }
                }
            }
            Shape::Defined(underlying) => fix(underlying),
        }
    }
}

/// Collects unescaped attribute key/value pairs.
fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, ParseError> {
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let raw = std::str::from_utf8(&attr.value)?;
        attrs.push((key.to_string(), unescape(raw)?.into_owned()));
    }
    Ok(attrs)
}

fn optional_attr(e: &BytesStart<'_>, attribute: &str) -> Result<Option<String>, ParseError> {
    Ok(attributes(e)?
        .into_iter()
        .find_map(|(key, value)| (key == attribute).then_some(value)))
}

fn required_attr(e: &BytesStart<'_>, element: &str, attribute: &str) -> Result<String, ParseError> {
    optional_attr(e, attribute)?
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ParseError::missing_attr(element, attribute))
}

fn required_type(e: &BytesStart<'_>, element: &str, attribute: &str) -> Result<TypeRef, ParseError> {
    let value = required_attr(e, element, attribute)?;
    TypeRef::parse(&value).ok_or_else(|| ParseError::invalid_attr(element, attribute, value))
}

/// Skips the rest of an element when it was opened with a start tag.
fn skip_content(reader: &mut Reader<&[u8]>, has_content: bool) -> Result<(), ParseError> {
    if has_content {
        skip_to_end(reader)?;
    }
    Ok(())
}

/// Skips to the end of the current element.
fn skip_to_end(reader: &mut Reader<&[u8]>) -> Result<(), ParseError> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODELS_MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<module path="example.com/app/models" name="models" root="example.com/app">
    <import path="example.com/app/money/v2" name="money"/>
    <record name="Person">
        <field name="Name" type="string" tag='json:"name"'/>
        <field name="age" type="int" tag="gen:&quot;,skip&quot;"/>
        <field name="Wallet" type="*example.com/app/money/v2.Amount"/>
        <field name="Friends" type="[]*Person"/>
    </record>
    <capabilities name="Reader">
        <method name="Read">
            <param name="p" type="[]byte"/>
            <result name="n" type="int"/>
            <result name="err" type="error"/>
        </method>
        <method name="Close"/>
    </capabilities>
    <capabilities name="Logger">
        <method name="Printf" variadic="true">
            <param name="format" type="string"/>
            <param name="args" type="[]any"/>
        </method>
    </capabilities>
    <type name="ID" underlying="string"/>
    <type name="People" underlying="[]Person"/>
</module>"#;

    #[test]
    fn test_parse_module_attributes() {
        let module = parse_module(MODELS_MANIFEST).expect("Failed to parse manifest");

        assert_eq!(module.path, "example.com/app/models");
        assert_eq!(module.name, "models");
        assert_eq!(module.root.as_deref(), Some("example.com/app"));
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].name, "money");
        assert_eq!(module.types.len(), 5);
    }

    #[test]
    fn test_parse_record_fields() {
        let module = parse_module(MODELS_MANIFEST).expect("Failed to parse manifest");
        let Shape::Record(person) = &module.get_type("Person").unwrap().shape else {
            panic!("Person should be a record");
        };

        assert_eq!(person.fields.len(), 4);
        assert_eq!(person.fields[0].tag, r#"json:"name""#);
        assert_eq!(person.fields[1].tag, r#"gen:",skip""#);
        assert_eq!(
            person.fields[2].ty,
            TypeRef::qualified(ModuleRef::new("example.com/app/money/v2", "money"), "Amount")
                .pointer_to()
        );
        assert_eq!(
            person.fields[3].ty,
            TypeRef::qualified(ModuleRef::new("example.com/app/models", "models"), "Person")
                .pointer_to()
                .slice_of()
        );
    }

    #[test]
    fn test_parse_methods() {
        let module = parse_module(MODELS_MANIFEST).expect("Failed to parse manifest");
        let Shape::CapabilitySet(reader) = &module.get_type("Reader").unwrap().shape else {
            panic!("Reader should be a capability set");
        };

        assert_eq!(reader.methods.len(), 2);
        assert_eq!(reader.methods[0].name, "Read");
        assert_eq!(reader.methods[0].params.len(), 1);
        assert_eq!(reader.methods[0].results.len(), 2);
        assert_eq!(reader.methods[0].results[1].ty, TypeRef::builtin("error"));
        assert!(reader.methods[1].params.is_empty());

        let Shape::CapabilitySet(logger) = &module.get_type("Logger").unwrap().shape else {
            panic!("Logger should be a capability set");
        };
        assert!(logger.methods[0].variadic);
    }

    #[test]
    fn test_parse_defined_types() {
        let module = parse_module(MODELS_MANIFEST).expect("Failed to parse manifest");
        let Shape::Defined(underlying) = &module.get_type("People").unwrap().shape else {
            panic!("People should be a defined type");
        };
        assert_eq!(underlying.to_string(), "[]example.com/app/models.Person");
    }

    #[test]
    fn test_missing_module() {
        let err = parse_module("<other/>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }

    #[test]
    fn test_missing_field_type() {
        let xml = r#"<module path="m"><record name="R"><field name="A"/></record></module>"#;
        let err = parse_module(xml).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingAttribute { ref element, ref attribute }
                if element == "field" && attribute == "type"
        ));
    }

    #[test]
    fn test_invalid_variadic() {
        let xml = r#"<module path="m"><capabilities name="C"><method name="M" variadic="maybe"/></capabilities></module>"#;
        let err = parse_module(xml).unwrap_err();
        assert!(matches!(err, ParseError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_default_module_name() {
        let module = parse_module(r#"<module path="example.com/x/store"/>"#)
            .expect("Failed to parse manifest");
        assert_eq!(module.name, "store");
        assert!(module.types.is_empty());
    }
}
