//! Deferred-placeholder renderer.
//!
//! The import block belongs at the top of the generated file, but the modules
//! to import are only known once the whole template has run. Templates call
//! `imports()` exactly where the block goes; the call returns a unique token,
//! and once rendering finishes the token is replaced by the import block
//! accumulated in the session.

use crate::args::ArgMap;
use crate::error::{CodegenError, ModelError};
use crate::session::Session;
use crate::template::TemplateSource;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use parking_lot::Mutex;
use std::sync::Arc;
use ulid::Ulid;

/// Prefix of the token returned by `imports()`.
pub const PLACEHOLDER_PREFIX: &str = "__shapegen_imports_";

/// Renders one template against a session.
///
/// Templates see four functions besides the root object:
/// - `imports()` returns the import placeholder; callable at most once
/// - `export(s)` title-cases each word of `s`
/// - `args()` returns the caller's [`ArgMap`]
/// - `template_path()` returns the template location
#[derive(Debug)]
pub struct Renderer<'a> {
    session: &'a Arc<Session>,
    template: &'a TemplateSource,
    args: &'a ArgMap,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer.
    #[must_use]
    pub fn new(session: &'a Arc<Session>, template: &'a TemplateSource, args: &'a ArgMap) -> Self {
        Self {
            session,
            template,
            args,
        }
    }

    /// Renders the template with `root` as context and splices in the import
    /// block.
    ///
    /// # Arguments
    /// * `root` - Root object (a record or capability set model)
    ///
    /// # Returns
    /// The rendered text. Without an `imports()` call it is exactly the
    /// template output.
    ///
    /// # Errors
    /// Returns `CodegenError::Template` if the template does not compile, or
    /// `CodegenError::Render` if execution fails, including a second
    /// `imports()` call.
    pub fn render(&self, root: Value) -> Result<String, CodegenError> {
        let name = self.template.name();
        let placeholder: Arc<Mutex<Option<String>>> = Arc::default();

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        let slot = Arc::clone(&placeholder);
        env.add_function("imports", move || -> Result<String, minijinja::Error> {
            let mut slot = slot.lock();
            if slot.is_some() {
                return Err(ModelError::ImportsAlreadyCalled.into());
            }
            let token = placeholder_token();
            *slot = Some(token.clone());
            Ok(token)
        });
        env.add_function("export", |s: String| export(&s));
        let args = Value::from_object(self.args.clone());
        env.add_function("args", move || args.clone());
        let path = name.clone();
        env.add_function("template_path", move || path.clone());

        env.add_template(&name, &self.template.source)?;
        let template = env.get_template(&name)?;

        tracing::debug!("Rendering template {}", name);
        let body = template
            .render(root)
            .map_err(|source| CodegenError::Render {
                template: name.clone(),
                source,
            })?;

        let token = placeholder.lock().take();
        Ok(match token {
            Some(token) => body.replacen(&token, &self.session.emit_imports(), 1),
            None => body,
        })
    }
}

/// Returns a fresh, collision-resistant placeholder token.
fn placeholder_token() -> String {
    format!("{PLACEHOLDER_PREFIX}{}__", Ulid::new())
}

/// Upper-cases the first letter of every word.
///
/// Letters, digits and `_` continue a word; anything else separates words.
#[must_use]
pub fn export(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}
