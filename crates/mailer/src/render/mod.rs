//! # Renderer
//!
//! Named templates behind a read-mostly lock. Templates are registered during startup
//! by the template loader and at runtime by nobody else, but the engine is shared by the
//! processor, the campaign coordinator and the command surface, so lookups take a read
//! lock rather than requiring `&mut`.

pub mod error;
pub mod template;

pub use error::RenderError;
pub use template::Template;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TemplateEngine {
    templates: RwLock<HashMap<String, Template>>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register `source` under `name`, replacing any previous template of
    /// that name.
    pub fn load_template(&self, name: &str, source: &str) -> Result<(), RenderError> {
        if name.is_empty() {
            return Err(RenderError::EmptyName);
        }
        let template = Template::parse(source)?;
        let replaced = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), template)
            .is_some();
        debug!(template = name, replaced, "Template registered");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn render(
        &self,
        name: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, RenderError> {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        templates
            .get(name)
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_string()))?
            .render(name, vars)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
