//! Ordered multi-source field resolution
//!
//! Several logical values can live in more than one place (legacy cart
//! mirrors, remote vs inline attachment copies). Instead of chained `||`
//! lookups scattered across call sites, a [`FieldResolver`] evaluates an
//! ordered list of named sources once and records which one won, so
//! diagnostics can say where a value actually came from.

/// A resolved value and the name of the source that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField<T> {
    pub value: Option<T>,
    /// Name of the winning source; `None` when every source was empty
    pub source: Option<&'static str>,
}

impl<T> ResolvedField<T> {
    /// The empty resolution
    pub fn none() -> Self {
        Self { value: None, source: None }
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// Ordered list of lazily-evaluated named sources
pub struct FieldResolver<T> {
    field: &'static str,
    sources: Vec<(&'static str, Box<dyn FnOnce() -> Option<T>>)>,
}

impl<T> FieldResolver<T> {
    pub fn new(field: &'static str) -> Self {
        Self { field, sources: Vec::new() }
    }

    /// Append a source; earlier sources win
    pub fn source(mut self, name: &'static str, f: impl FnOnce() -> Option<T> + 'static) -> Self {
        self.sources.push((name, Box::new(f)));
        self
    }

    /// Evaluate sources in order until one yields a value
    pub fn resolve(self) -> ResolvedField<T> {
        for (name, f) in self.sources {
            if let Some(value) = f() {
                tracing::trace!(field = self.field, source = name, "field resolved");
                return ResolvedField { value: Some(value), source: Some(name) };
            }
        }
        tracing::trace!(field = self.field, "field unresolved");
        ResolvedField::none()
    }
}
