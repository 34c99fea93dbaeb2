//! SQL `LIKE` patterns evaluated in memory.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex_lite::Regex;

use crate::error::{QueryError, QueryResult};

const CACHE_CAPACITY: usize = 256;

static PATTERNS: LazyLock<Mutex<HashMap<String, Arc<Regex>>>> =
    LazyLock::new(|| Mutex::new(HashMap::with_capacity(CACHE_CAPACITY)));

/// Translate a `LIKE` pattern into an anchored regular expression.
///
/// `%` becomes `.*`, `_` becomes `.`, everything else is matched literally.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex_lite::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['%', '_'])
}

/// Test `text` against a `LIKE` pattern. Matching is case-sensitive.
///
/// A pattern without wildcards is a plain equality test and never reaches
/// the regex cache.
pub fn like_matches(pattern: &str, text: &str) -> QueryResult<bool> {
    if !has_wildcards(pattern) {
        return Ok(pattern == text);
    }
    Ok(compiled(pattern)?.is_match(text))
}

fn compiled(pattern: &str) -> QueryResult<Arc<Regex>> {
    let mut cache = PATTERNS.lock();
    if let Some(regex) = cache.get(pattern) {
        return Ok(Arc::clone(regex));
    }

    let regex = Regex::new(&like_to_regex(pattern)).map_err(|e| {
        QueryError::invalid_condition(format!("LIKE pattern `{}` cannot be translated", pattern))
            .with_source(e)
    })?;
    let regex = Arc::new(regex);
    if cache.len() >= CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(pattern.to_string(), Arc::clone(&regex));
    Ok(regex)
}
