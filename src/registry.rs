//! Parser registry for lookup by name.
//!
//! Registration is explicit: a host builds a [`ParserRegistry`] at startup
//! (usually via [`ParserRegistry::with_builtins`]) and creates parsers from
//! it by the name its configuration names.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ExtractError, Result};
use crate::parser::{CommandRToolParser, ToolParser, Tokenizer};

/// Builds a parser from the tokenizer handle, its only dependency.
pub type ParserFactory = fn(Arc<dyn Tokenizer>) -> Box<dyn ToolParser>;

/// Static name → factory table.
///
/// # Example
///
/// ```
/// use llm_toolcall::parser::NullTokenizer;
/// use llm_toolcall::registry::ParserRegistry;
/// use std::sync::Arc;
///
/// let registry = ParserRegistry::with_builtins();
/// let parser = registry.create("commandr", Arc::new(NullTokenizer)).unwrap();
/// assert_eq!(parser.name(), "commandr");
/// assert!(registry.create("nope", Arc::new(NullTokenizer)).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    factories: BTreeMap<&'static str, ParserFactory>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every parser this crate ships.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(CommandRToolParser::NAME, |tokenizer| {
            Box::new(CommandRToolParser::new(tokenizer))
        });
        registry
    }

    /// Register a factory under `name`. Names are unique.
    pub fn register(&mut self, name: &'static str, factory: ParserFactory) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(ExtractError::DuplicateParser(name.to_string()));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Create the parser registered under `name`.
    pub fn create(&self, name: &str, tokenizer: Arc<dyn Tokenizer>) -> Result<Box<dyn ToolParser>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ExtractError::UnknownParser(name.to_string()))?;
        tracing::debug!(parser = name, "creating tool parser");
        Ok(factory(tokenizer))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
