//! Cache types for commerce API responses.

use vitrine_core::Catalogue;

/// Cache key for API responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// Catalogue metadata looked up by slug.
    Catalogue(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Catalogue(Box<Catalogue>),
}
