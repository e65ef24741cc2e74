//! Type model exposed to templates.
//!
//! Records, capability sets and their members are read-only projections over
//! a declared type. Every model value implements [`minijinja::value::Object`]
//! so templates can navigate it, and offers the same queries as plain Rust
//! methods.

pub mod capability_set;
pub mod record;
pub mod tag;
pub mod type_view;

pub use capability_set::{Argument, CapabilitySet, Method};
pub use record::{Field, Record};
pub use tag::TagValue;
pub use type_view::TypeView;

use minijinja::value::{Object, Value};
use minijinja::{Error, ErrorKind};

/// Tag namespace holding generation flags.
pub const GEN_NAMESPACE: &str = "gen";

/// Flag excluding a field from [`Record::fields`].
pub const SKIP_FLAG: &str = "skip";

/// Rejects arguments passed to a zero-argument template method.
fn no_args(method: &str, args: &[Value]) -> Result<(), Error> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::TooManyArguments,
            format!("{method}() takes no arguments"),
        ))
    }
}

/// Wraps model values into a template sequence.
fn sequence<T: Object + Clone + Send + Sync + 'static>(items: &[T]) -> Value {
    Value::from(
        items
            .iter()
            .cloned()
            .map(Value::from_object)
            .collect::<Vec<_>>(),
    )
}
