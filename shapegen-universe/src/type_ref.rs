//! Type references and their textual syntax.
//!
//! A type reference is a chain of pointer (`*`) and slice (`[]`) markers
//! wrapped around a single leaf. Leaves are either named types (optionally
//! owned by a module) or opaque type expressions that are carried verbatim,
//! so the model never needs the full type grammar of the target language.

use std::fmt;

/// A module referenced by a qualified type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleRef {
    /// Full module path, e.g. `example.com/app/models`.
    pub path: String,
    /// Short name used to derive import aliases, e.g. `models`.
    pub name: String,
}

impl ModuleRef {
    /// Creates a module reference with an explicit short name.
    #[must_use]
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Creates a module reference whose short name is derived from the path.
    #[must_use]
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = default_short_name(&path);
        Self { path, name }
    }
}

/// A possibly indirected reference to a leaf type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Pointer to the inner type (`*T`).
    Pointer(Box<TypeRef>),
    /// Slice of the inner type (`[]T`).
    Slice(Box<TypeRef>),
    /// Named leaf type. `module` is `None` for built-in types.
    Named {
        /// Owning module, if any.
        module: Option<ModuleRef>,
        /// Bare type name.
        name: String,
    },
    /// Leaf type expression outside the modelled grammar, kept as written.
    Opaque(String),
}

impl TypeRef {
    /// Creates an unqualified (built-in) named type.
    #[must_use]
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::Named {
            module: None,
            name: name.into(),
        }
    }

    /// Creates a named type owned by `module`.
    #[must_use]
    pub fn qualified(module: ModuleRef, name: impl Into<String>) -> Self {
        Self::Named {
            module: Some(module),
            name: name.into(),
        }
    }

    /// Wraps `self` in a pointer.
    #[must_use]
    pub fn pointer_to(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    /// Wraps `self` in a slice.
    #[must_use]
    pub fn slice_of(self) -> Self {
        Self::Slice(Box::new(self))
    }

    /// Parses a type expression.
    ///
    /// Accepted forms are `*T`, `[]T`, `"path".Name`, `path.Name` and bare
    /// identifiers. Anything else becomes an [`TypeRef::Opaque`] leaf.
    /// Qualified names get a short name derived from their path; use
    /// [`TypeRef::leaf_mut`] to adjust it afterwards.
    ///
    /// # Returns
    /// `None` if the expression (or an indirection's element) is empty.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(rest) = text.strip_prefix('*') {
            return Self::parse(rest).map(Self::pointer_to);
        }
        if let Some(rest) = text.strip_prefix("[]") {
            return Self::parse(rest).map(Self::slice_of);
        }

        if let Some(quoted) = text.strip_prefix('"') {
            let leaf = quoted.split_once('"').and_then(|(path, rest)| {
                let name = rest.strip_prefix('.')?;
                (!path.is_empty() && is_identifier(name))
                    .then(|| Self::qualified(ModuleRef::from_path(path), name))
            });
            return Some(leaf.unwrap_or_else(|| Self::Opaque(text.to_string())));
        }

        if is_identifier(text) {
            return Some(Self::builtin(text));
        }

        if let Some((path, name)) = text.rsplit_once('.') {
            if is_identifier(name) && is_module_path(path) {
                return Some(Self::qualified(ModuleRef::from_path(path), name));
            }
        }

        Some(Self::Opaque(text.to_string()))
    }

    /// Returns the innermost type after stripping all indirection.
    #[must_use]
    pub fn leaf(&self) -> &TypeRef {
        match self {
            Self::Pointer(inner) | Self::Slice(inner) => inner.leaf(),
            leaf => leaf,
        }
    }

    /// Mutable access to the innermost type.
    pub fn leaf_mut(&mut self) -> &mut TypeRef {
        match self {
            Self::Pointer(inner) | Self::Slice(inner) => inner.leaf_mut(),
            leaf => leaf,
        }
    }

    /// Returns true for pointer or slice references.
    #[must_use]
    pub fn is_indirect(&self) -> bool {
        matches!(self, Self::Pointer(_) | Self::Slice(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(inner) => write!(f, "[]{inner}"),
            Self::Named {
                module: Some(module),
                name,
            } => write!(f, "{}.{name}", module.path),
            Self::Named { module: None, name } => f.write_str(name),
            Self::Opaque(text) => f.write_str(text),
        }
    }
}

/// Returns true if `s` is a valid identifier (`[A-Za-z_][A-Za-z0-9_]*`).
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_module_path(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('/')
        && !s.ends_with('/')
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | '~'))
}

/// Derives a module's short name from its path.
///
/// Takes the last path segment, skipping a trailing major-version segment
/// (`/v2`) and a `.vN` suffix (`yaml.v3`), then replaces characters that
/// cannot appear in an identifier with `_`.
#[must_use]
pub fn default_short_name(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut last = segments.last().copied().unwrap_or(path);
    if segments.len() > 1 && is_major_version(last) {
        last = segments[segments.len() - 2];
    }
    if let Some((base, version)) = last.rsplit_once('.') {
        if is_major_version(version) && !base.is_empty() {
            last = base;
        }
    }

    let mut name: String = last
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn is_major_version(s: &str) -> bool {
    s.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
