// ABOUTME: Process-wide cache of compiled CSS selectors keyed by their source text.
// ABOUTME: Profiles carry selectors as strings, so each one is parsed once and reused.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

use crate::error::FieldError;

/// Compiled selectors; invalid ones are cached as `None` so they fail fast on reuse.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` for selectors that do not parse.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

/// Like [`get_or_compile`], but reports an invalid selector as a field failure.
pub fn compile(css: &str) -> Result<Selector, FieldError> {
    get_or_compile(css).ok_or_else(|| FieldError::InvalidSelector(css.to_string()))
}

/// Precompiles a batch of selectors into the cache.
///
/// Called when a profile registry is built so that extraction only takes read locks.
pub fn precompile_selectors<I, S>(selectors: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    for css in selectors {
        let css = css.as_ref();
        if !cache.contains_key(css) {
            cache.insert(css.to_string(), Selector::parse(css).ok());
        }
    }
}
