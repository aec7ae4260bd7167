//! # Configuration
//!
//! A flat string key/value store in the style of `app.set()` / `app.get()`.
//! Keys are dotted (`http.port`, `paginate.default`). Environment variables
//! under a prefix override them: `SOCIETY__PAGINATE__DEFAULT=25` becomes
//! `paginate.default = 25`.
//!
//! ```rust
//! use society_core::SocietyConfig;
//!
//! let mut cfg = SocietyConfig::new();
//! cfg.set("paginate.default", "10");
//! assert_eq!(cfg.snapshot().get_usize("paginate.default"), Some(10));
//! ```

use std::collections::HashMap;

pub const ENV_PREFIX: &str = "SOCIETY__";

#[derive(Debug, Default)]
pub struct SocietyConfig {
    values: HashMap<String, String>,
}

impl SocietyConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply overrides from `(name, value)` pairs carrying `prefix`.
    /// Returns the keys that were set.
    pub fn merge_env<I>(&mut self, prefix: &str, vars: I) -> Vec<String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = Vec::new();
        for (name, value) in vars {
            if let Some(stripped) = name.strip_prefix(prefix) {
                let key = stripped.to_lowercase().replace("__", ".");
                if key.is_empty() {
                    continue;
                }
                self.values.insert(key.clone(), value);
                applied.push(key);
            }
        }
        applied.sort();
        applied
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            map: self.values.clone(),
        }
    }
}

/// Immutable copy handed to hooks and services.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}
