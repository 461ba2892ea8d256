//! Strategy Registry
//!
//! Ordered list of format strategies with first-match resolution.

use std::path::Path;

use crate::config::UnknownFormatPolicy;
use crate::error::{Result, StashError};
use crate::value::StoredValue;

use super::{
    extension_of, BlobStrategy, CsvStrategy, FormatStrategy, JsonStrategy, NpyStrategy,
    YamlStrategy,
};

/// Resolves which strategy handles a value or a file
///
/// ## Ordering
/// - Built-ins: JSON → YAML → CSV → NPY
/// - Custom strategies from `register()` follow the built-ins
/// - The fallback (Blob, `RawCopy` only) is always last
pub struct StrategyRegistry {
    /// Strategies in priority order
    strategies: Vec<Box<dyn FormatStrategy>>,
}

impl StrategyRegistry {
    /// Registry with the built-in formats, composed for `policy`
    pub fn new(policy: UnknownFormatPolicy) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(JsonStrategy));
        registry.register(Box::new(YamlStrategy));
        registry.register(Box::new(CsvStrategy));
        registry.register(Box::new(NpyStrategy));

        if policy == UnknownFormatPolicy::RawCopy {
            registry.register(Box::new(BlobStrategy));
        }

        registry
    }

    /// Registry with no strategies at all
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Add a strategy, keeping any fallback strategy last
    pub fn register(&mut self, strategy: Box<dyn FormatStrategy>) {
        let position = if strategy.is_fallback() {
            self.strategies.len()
        } else {
            self.strategies
                .iter()
                .position(|s| s.is_fallback())
                .unwrap_or(self.strategies.len())
        };
        self.strategies.insert(position, strategy);
    }

    /// First strategy that can write `value`
    pub fn resolve_for_save(&self, value: &StoredValue) -> Result<&dyn FormatStrategy> {
        self.strategies
            .iter()
            .find(|s| s.matches_value(value))
            .map(|s| s.as_ref())
            .ok_or_else(|| StashError::unsupported_value(value.kind()))
    }

    /// First strategy that can read the file at `path`, by extension
    pub fn resolve_for_load(&self, path: &Path) -> Result<&dyn FormatStrategy> {
        self.resolve_extension(&extension_of(path))
    }

    /// First strategy that reads files with `extension` (leading dot included)
    pub fn resolve_extension(&self, extension: &str) -> Result<&dyn FormatStrategy> {
        self.strategies
            .iter()
            .find(|s| s.matches_extension(extension))
            .map(|s| s.as_ref())
            .ok_or_else(|| StashError::unsupported_format(extension))
    }

    /// Strategy names in priority order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Whether unrecognized input falls back to raw bytes
    pub fn has_fallback(&self) -> bool {
        self.strategies.iter().any(|s| s.is_fallback())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new(UnknownFormatPolicy::default())
    }
}
