//! Record model.

use super::{GEN_NAMESPACE, SKIP_FLAG, TagValue, TypeView, no_args, sequence};
use crate::error::ModelError;
use crate::session::Session;
use minijinja::value::{Enumerator, Object, Value};
use minijinja::{Error, ErrorKind, State};
use shapegen_universe::resolver::{shape_kind, underlying};
use shapegen_universe::{FieldDecl, Kind, LocatedType, RecordShape, Shape, Tag, TypeRef, canonical_name};
use std::sync::{Arc, OnceLock};

/// Record type exposed to templates.
#[derive(Debug)]
pub struct Record {
    session: Arc<Session>,
    name: String,
    shape: RecordShape,
    fields: OnceLock<Vec<Field>>,
}

impl Record {
    /// Creates a record model over a record shape.
    #[must_use]
    pub fn new(session: Arc<Session>, name: impl Into<String>, shape: RecordShape) -> Self {
        Self {
            session,
            name: name.into(),
            shape,
            fields: OnceLock::new(),
        }
    }

    /// Builds the model for a located type, following defined types across
    /// modules. The model keeps the located type's own name.
    ///
    /// # Errors
    /// Returns `ModelError::KindMismatch` if the type is not a record.
    pub fn from_located(session: &Arc<Session>, located: &LocatedType) -> Result<Self, ModelError> {
        let resolved = session.resolve(located);
        match underlying(&resolved.module, &resolved.declared) {
            Shape::Record(shape) => Ok(Self::new(
                Arc::clone(session),
                located.declared.name.clone(),
                shape.clone(),
            )),
            other => Err(ModelError::KindMismatch {
                name: located.declared.name.clone(),
                expected: Kind::Record.to_string(),
                found: shape_kind(other).to_string(),
            }),
        }
    }

    /// Returns the record name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the visible fields sorted by name.
    ///
    /// Fields tagged with the `skip` flag under the `gen` namespace are left
    /// out. Computed on first access.
    pub fn fields(&self) -> &[Field] {
        self.fields.get_or_init(|| {
            let mut fields: Vec<Field> = self
                .shape
                .fields
                .iter()
                .map(|decl| Field::new(Arc::clone(&self.session), decl))
                .filter(|field| !field.is_skipped())
                .collect();
            fields.sort_by(|a, b| a.name.cmp(&b.name));
            fields
        })
    }
}

impl Object for Record {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "name" => Some(Value::from(self.name.clone())),
            "kind" => Some(Value::from(Kind::Record.as_str())),
            "fields" => Some(sequence(self.fields())),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["name", "kind", "fields"])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "fields" => {
                no_args(method, args)?;
                Ok(sequence(self.fields()))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

/// Record field exposed to templates.
#[derive(Debug, Clone)]
pub struct Field {
    session: Arc<Session>,
    name: String,
    tag: Tag,
    ty: TypeRef,
}

impl Field {
    fn new(session: Arc<Session>, decl: &FieldDecl) -> Self {
        Self {
            session,
            name: decl.name.clone(),
            tag: Tag::new(decl.tag.clone()),
            ty: decl.ty.clone(),
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field's metadata tag.
    #[must_use]
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Returns the field's type reference.
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    /// Returns true if the field is excluded from generation.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.tag.has_flag(GEN_NAMESPACE, SKIP_FLAG)
    }

    /// Returns the bare leaf type name, without indirection or module.
    #[must_use]
    pub fn type_name(&self) -> String {
        canonical_name(&self.ty)
    }

    /// Renders the field type for generated code, registering imports.
    pub fn type_string(&self) -> String {
        self.session.type_string(&self.ty)
    }

    /// Renders the field type with its module path quoted.
    #[must_use]
    pub fn type_canonical(&self) -> String {
        self.session.type_canonical(&self.ty)
    }

    /// Returns a navigable view of the field type.
    #[must_use]
    pub fn type_view(&self) -> TypeView {
        TypeView::resolve(&self.session, &self.ty)
    }
}

impl Object for Field {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "name" => Some(Value::from(self.name.clone())),
            "tag" => Some(Value::from_object(TagValue::new(self.tag.clone()))),
            "type_name" => Some(Value::from(self.type_name())),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["name", "tag", "type_name"])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "type_string" => {
                no_args(method, args)?;
                Ok(Value::from(self.type_string()))
            }
            "type_canonical" => {
                no_args(method, args)?;
                Ok(Value::from(self.type_canonical()))
            }
            "type" => {
                no_args(method, args)?;
                Ok(Value::from_object(self.type_view()))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}
