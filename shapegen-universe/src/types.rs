//! Declared type definitions.
//!
//! This module contains the data structures describing a module as declared
//! in its manifest: imports, records, capability sets and defined types.

use crate::type_ref::{ModuleRef, TypeRef};
use std::collections::HashMap;

/// Complete module definition as parsed from a manifest.
#[derive(Debug, Clone)]
pub struct ModuleDef {
    /// Full module path.
    pub path: String,
    /// Short module name.
    pub name: String,
    /// Enclosing module root (the prefix treated as local by import organizers).
    pub root: Option<String>,
    /// Import declarations.
    pub imports: Vec<ImportDecl>,
    /// Declared types, in declaration order.
    pub types: Vec<DeclaredType>,
    /// Type lookup map (built while adding types).
    type_map: HashMap<String, usize>,
}

impl ModuleDef {
    /// Creates a new empty module definition.
    #[must_use]
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            root: None,
            imports: Vec::new(),
            types: Vec::new(),
            type_map: HashMap::new(),
        }
    }

    /// Returns a reference to this module usable in qualified type names.
    #[must_use]
    pub fn module_ref(&self) -> ModuleRef {
        ModuleRef::new(self.path.clone(), self.name.clone())
    }

    /// Adds a type definition. A later definition with the same name shadows
    /// the earlier one for lookups.
    pub fn add_type(&mut self, declared: DeclaredType) {
        let index = self.types.len();
        self.type_map.insert(declared.name.clone(), index);
        self.types.push(declared);
    }

    /// Looks up a declared type by name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&DeclaredType> {
        self.type_map.get(name).map(|&idx| &self.types[idx])
    }

    /// Returns true if a type with the given name is declared.
    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.type_map.contains_key(name)
    }

    /// Rebuilds the type lookup map from the types vector.
    pub fn build_type_map(&mut self) {
        self.type_map.clear();
        for (idx, declared) in self.types.iter().enumerate() {
            self.type_map.insert(declared.name.clone(), idx);
        }
    }
}

/// Import declaration binding a module path to its short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Imported module path.
    pub path: String,
    /// Short name of the imported module.
    pub name: String,
}

/// A name bound to a type shape within a module.
#[derive(Debug, Clone)]
pub struct DeclaredType {
    /// Type name.
    pub name: String,
    /// Type shape.
    pub shape: Shape,
}

impl DeclaredType {
    /// Creates a declared type.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// Shape variants of a declared type.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Struct-like type with named fields.
    Record(RecordShape),
    /// Interface-like type with methods only.
    CapabilitySet(CapabilitySetShape),
    /// Type defined over another type (`type ID string`).
    Defined(TypeRef),
}

impl Shape {
    /// Returns a short human-readable description of the shape.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Record(_) => "record".to_string(),
            Self::CapabilitySet(_) => "capability set".to_string(),
            Self::Defined(underlying) => format!("defined type over {underlying}"),
        }
    }
}

/// Fields of a record, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RecordShape {
    /// Declared fields.
    pub fields: Vec<FieldDecl>,
}

impl RecordShape {
    /// Adds a field to the record.
    pub fn add_field(&mut self, field: FieldDecl) {
        self.fields.push(field);
    }
}

/// Field declaration.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Raw metadata tag.
    pub tag: String,
    /// Field type.
    pub ty: TypeRef,
}

impl FieldDecl {
    /// Creates a field without a tag.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            tag: String::new(),
            ty,
        }
    }

    /// Sets the raw metadata tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// Methods of a capability set, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySetShape {
    /// Declared methods.
    pub methods: Vec<MethodDecl>,
}

impl CapabilitySetShape {
    /// Adds a method to the capability set.
    pub fn add_method(&mut self, method: MethodDecl) {
        self.methods.push(method);
    }
}

/// Method declaration.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name.
    pub name: String,
    /// Parameters, in order.
    pub params: Vec<VarDecl>,
    /// Results, in order.
    pub results: Vec<VarDecl>,
    /// Whether the last parameter is variadic.
    pub variadic: bool,
}

impl MethodDecl {
    /// Creates a method with no parameters or results.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            results: Vec::new(),
            variadic: false,
        }
    }
}

/// Named and typed parameter or result.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Variable name (may be empty).
    pub name: String,
    /// Variable type.
    pub ty: TypeRef,
}

impl VarDecl {
    /// Creates a variable declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
