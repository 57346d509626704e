//! Thread-local compiled regex cache.
//!
//! Every mod manifest is re-applied per bundle, so the same handful of
//! patterns get compiled over and over. Compiled regexes are kept per thread,
//! capped at 256 entries; the cache is cleared when full.

use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

/// Get a compiled regex from cache, or compile and cache it.
pub fn get_or_compile_regex(pattern: &str) -> Result<Regex, regex::Error> {
    REGEX_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.clone());
        }
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        let compiled = Regex::new(pattern)?;
        cache.insert(pattern.to_string(), compiled.clone());
        Ok(compiled)
    })
}

/// Clear the cache (mainly for testing).
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_compiled_patterns() {
        clear_cache();
        let first = get_or_compile_regex(r"cost:\s*\d+").unwrap();
        let second = get_or_compile_regex(r"cost:\s*\d+").unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(cache_size(), 1);
    }

    #[test]
    fn invalid_patterns_are_not_cached() {
        clear_cache();
        assert!(get_or_compile_regex("(unclosed").is_err());
        assert_eq!(cache_size(), 0);
    }

    #[test]
    fn cache_is_cleared_at_capacity() {
        clear_cache();
        for i in 0..MAX_CACHE_ENTRIES {
            get_or_compile_regex(&format!("p{i}")).unwrap();
        }
        assert_eq!(cache_size(), MAX_CACHE_ENTRIES);
        get_or_compile_regex("overflow").unwrap();
        assert_eq!(cache_size(), 1);
    }
}
