use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    pub fn from_system(env_file: Option<&Path>) -> Self {
        match env_file {
            Some(path) => {
                if let Err(err) = dotenvy::from_path(path) {
                    warn!(path = %path.display(), "failed to load env file: {err}");
                }
            }
            // Load .env from the working directory if present.
            None => {
                let _ = dotenvy::dotenv();
            }
        }
        let vars = std::env::vars().collect();
        Self { vars }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut vars = HashMap::new();
        for (k, v) in pairs {
            vars.insert((*k).to_string(), (*v).to_string());
        }
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    pub fn get_any(&self, keys: &[&str]) -> Option<String> {
        for key in keys {
            if let Some(value) = self.vars.get(*key) {
                return Some(value.clone());
            }
        }
        None
    }
}

pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_any_respects_order() {
        let env = Env::from_pairs(&[("B", "second"), ("A", "first")]);
        assert_eq!(env.get_any(&["A", "B"]).as_deref(), Some("first"));
        assert_eq!(env.get_any(&["MISSING", "B"]).as_deref(), Some("second"));
        assert_eq!(env.get_any(&["MISSING"]), None);
    }

    #[test]
    fn parses_bool_variants() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
