//! Capability set model: methods and their arguments.

use super::{TypeView, no_args, sequence};
use crate::error::ModelError;
use crate::session::Session;
use minijinja::value::{Enumerator, Object, Value, from_args};
use minijinja::{Error, ErrorKind, State};
use shapegen_universe::resolver::{shape_kind, underlying};
use shapegen_universe::{
    CapabilitySetShape, Kind, LocatedType, MethodDecl, Shape, TypeRef, VarDecl, canonical_name,
};
use std::sync::{Arc, OnceLock};

/// Capability set (interface-like type) exposed to templates.
#[derive(Debug)]
pub struct CapabilitySet {
    session: Arc<Session>,
    name: String,
    shape: CapabilitySetShape,
    methods: OnceLock<Vec<Method>>,
}

impl CapabilitySet {
    /// Creates a capability set model over a capability set shape.
    #[must_use]
    pub fn new(session: Arc<Session>, name: impl Into<String>, shape: CapabilitySetShape) -> Self {
        Self {
            session,
            name: name.into(),
            shape,
            methods: OnceLock::new(),
        }
    }

    /// Builds the model for a located type, following defined types across
    /// modules. The model keeps the located type's own name.
    ///
    /// # Errors
    /// Returns `ModelError::KindMismatch` if the type is not a capability set.
    pub fn from_located(session: &Arc<Session>, located: &LocatedType) -> Result<Self, ModelError> {
        let resolved = session.resolve(located);
        match underlying(&resolved.module, &resolved.declared) {
            Shape::CapabilitySet(shape) => Ok(Self::new(
                Arc::clone(session),
                located.declared.name.clone(),
                shape.clone(),
            )),
            other => Err(ModelError::KindMismatch {
                name: located.declared.name.clone(),
                expected: Kind::CapabilitySet.to_string(),
                found: shape_kind(other).to_string(),
            }),
        }
    }

    /// Returns the capability set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the methods sorted by name. Computed on first access.
    pub fn methods(&self) -> &[Method] {
        self.methods.get_or_init(|| {
            let mut methods: Vec<Method> = self
                .shape
                .methods
                .iter()
                .map(|decl| Method::new(&self.session, decl))
                .collect();
            methods.sort_by(|a, b| a.name.cmp(&b.name));
            methods
        })
    }
}

impl Object for CapabilitySet {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "name" => Some(Value::from(self.name.clone())),
            "kind" => Some(Value::from(Kind::CapabilitySet.as_str())),
            "methods" => Some(sequence(self.methods())),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["name", "kind", "methods"])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "methods" => {
                no_args(method, args)?;
                Ok(sequence(self.methods()))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

/// Method of a capability set.
#[derive(Debug, Clone)]
pub struct Method {
    name: String,
    variadic: bool,
    args: Vec<Argument>,
    returns: Vec<Argument>,
}

impl Method {
    fn new(session: &Arc<Session>, decl: &MethodDecl) -> Self {
        let last = decl.params.len().saturating_sub(1);
        let args = decl
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| Argument::new(Arc::clone(session), param, decl.variadic && i == last))
            .collect();
        let returns = decl
            .results
            .iter()
            .map(|result| Argument::new(Arc::clone(session), result, false))
            .collect();

        Self {
            name: decl.name.clone(),
            variadic: decl.variadic,
            args,
            returns,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the last argument is variadic.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Returns the results in declaration order.
    #[must_use]
    pub fn returns(&self) -> &[Argument] {
        &self.returns
    }

    /// Returns the result at `index`.
    ///
    /// # Errors
    /// Returns `ModelError::NoResults` if the method has no results, or
    /// `ModelError::ResultOutOfRange` if `index` is past the last result.
    pub fn result(&self, index: usize) -> Result<&Argument, ModelError> {
        if self.returns.is_empty() {
            return Err(ModelError::NoResults {
                method: self.name.clone(),
            });
        }
        self.returns
            .get(index)
            .ok_or_else(|| ModelError::ResultOutOfRange {
                method: self.name.clone(),
                index,
                count: self.returns.len(),
            })
    }
}

impl Object for Method {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "name" => Some(Value::from(self.name.clone())),
            "variadic" => Some(Value::from(self.variadic)),
            "args" => Some(sequence(&self.args)),
            "returns" => Some(sequence(&self.returns)),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["name", "variadic", "args", "returns"])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "args" => {
                no_args(method, args)?;
                Ok(sequence(&self.args))
            }
            "returns" if args.is_empty() => Ok(sequence(&self.returns)),
            "returns" => {
                let (index,): (usize,) = from_args(args)?;
                Ok(Value::from_object(self.result(index)?.clone()))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

/// Method parameter or result.
#[derive(Debug, Clone)]
pub struct Argument {
    session: Arc<Session>,
    name: String,
    ty: TypeRef,
    variadic: bool,
}

impl Argument {
    fn new(session: Arc<Session>, var: &VarDecl, variadic: bool) -> Self {
        Self {
            session,
            name: var.name.clone(),
            ty: var.ty.clone(),
            variadic,
        }
    }

    /// Returns the argument name (may be empty).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true for the variadic last parameter.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Returns the argument's type reference.
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    /// Returns the bare leaf type name.
    #[must_use]
    pub fn type_name(&self) -> String {
        canonical_name(&self.ty)
    }

    /// Renders the argument type for generated code, registering imports.
    pub fn type_string(&self) -> String {
        self.session.type_string(&self.ty)
    }

    /// Renders the argument type with its module path quoted.
    #[must_use]
    pub fn type_canonical(&self) -> String {
        self.session.type_canonical(&self.ty)
    }

    /// Returns a navigable view of the argument type.
    #[must_use]
    pub fn type_view(&self) -> TypeView {
        TypeView::resolve(&self.session, &self.ty)
    }
}

impl Object for Argument {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "name" => Some(Value::from(self.name.clone())),
            "variadic" => Some(Value::from(self.variadic)),
            "type_name" => Some(Value::from(self.type_name())),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["name", "variadic", "type_name"])
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
