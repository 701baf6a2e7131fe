//! Parsing of mechanism option strings.
//!
//! The `auth_info` argument threaded through the facade is an opaque string
//! to the facade itself. Mechanisms that accept options read it as a comma
//! separated list of `key=value` pairs, e.g. `user=alice,host=node01`.
//! A bare word without `=` is kept as a key with an empty value.

/// Parsed `key=value` options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInfo {
    options: Vec<(String, String)>,
}

impl AuthInfo {
    /// Parses an option string. `None` yields no options.
    pub fn parse(info: Option<&str>) -> Self {
        let options = info
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => (item.to_string(), String::new()),
            })
            .collect();

        Self { options }
    }

    /// Returns the value of the last occurrence of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `key` parsed as a `u32`, or `None` if absent or not numeric.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Whether no options were given.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
