//! Navigable view of a field or argument type.

use super::{CapabilitySet, Record, no_args};
use crate::error::ModelError;
use crate::session::Session;
use minijinja::value::{Enumerator, Object, Value};
use minijinja::{Error, ErrorKind, State};
use shapegen_universe::{Kind, LocatedType, TypeRef, canonical_name};
use std::sync::Arc;

/// Type reachable from the target, exposing its kind and, for records and
/// capability sets, their models.
///
/// The kind is taken from the type as written: a pointer or slice is
/// unsupported even when it wraps a record.
#[derive(Debug, Clone)]
pub struct TypeView {
    session: Arc<Session>,
    ty: TypeRef,
    kind: Kind,
    located: Option<LocatedType>,
}

impl TypeView {
    /// Resolves a type reference, loading its module through the session's
    /// universe when needed.
    ///
    /// Types whose module cannot be loaded resolve to an unsupported kind.
    #[must_use]
    pub fn resolve(session: &Arc<Session>, ty: &TypeRef) -> Self {
        let (kind, located) = match ty {
            TypeRef::Named {
                module: Some(module),
                name,
            } => match session.locate(module, name) {
                Ok(located) => (session.resolve(&located).kind(), Some(located)),
                Err(err) => {
                    tracing::debug!("Type {} left unresolved: {}", ty, err);
                    (Kind::Unsupported(format!("unresolved type {ty}")), None)
                }
            },
            TypeRef::Named { module: None, name } => {
                (Kind::Unsupported(format!("builtin type {name}")), None)
            }
            TypeRef::Pointer(_) => (Kind::Unsupported(format!("pointer {ty}")), None),
            TypeRef::Slice(_) => (Kind::Unsupported(format!("slice {ty}")), None),
            TypeRef::Opaque(text) => (Kind::Unsupported(format!("type {text}")), None),
        };

        Self {
            session: Arc::clone(session),
            ty: ty.clone(),
            kind,
            located,
        }
    }

    /// Returns the type's kind.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns the bare leaf type name.
    #[must_use]
    pub fn name(&self) -> String {
        canonical_name(&self.ty)
    }

    /// Returns the viewed type reference.
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    /// Returns the record model for this type.
    ///
    /// # Errors
    /// Returns `ModelError::KindMismatch` if the type is not a record.
    pub fn record(&self) -> Result<Record, ModelError> {
        match (&self.kind, &self.located) {
            (Kind::Record, Some(located)) => Record::from_located(&self.session, located),
            _ => Err(self.mismatch(Kind::Record)),
        }
    }

    /// Returns the capability set model for this type.
    ///
    /// # Errors
    /// Returns `ModelError::KindMismatch` if the type is not a capability set.
    pub fn capability_set(&self) -> Result<CapabilitySet, ModelError> {
        match (&self.kind, &self.located) {
            (Kind::CapabilitySet, Some(located)) => {
                CapabilitySet::from_located(&self.session, located)
            }
            _ => Err(self.mismatch(Kind::CapabilitySet)),
        }
    }

    fn mismatch(&self, expected: Kind) -> ModelError {
        ModelError::KindMismatch {
            name: self.ty.to_string(),
            expected: expected.to_string(),
            found: self.kind.to_string(),
        }
    }
}

impl Object for TypeView {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "kind" => Some(Value::from(self.kind.as_str())),
            "name" => Some(Value::from(self.name())),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["kind", "name"])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "record" => {
                no_args(method, args)?;
                Ok(Value::from_object(self.record()?))
            }
            "capability_set" => {
                no_args(method, args)?;
                Ok(Value::from_object(self.capability_set()?))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}
