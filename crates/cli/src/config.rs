//! Optional TOML configuration for the `hashgram` CLI.
//!
//! ```toml
//! [compile]
//! name = "Postal"
//! root = "%record"
//!
//! [backend]
//! program = "bison"
//! args = ["-o", "{name}.c", "{grammar}"]
//! ```
//!
//! Command-line flags override every value read here.

use std::path::Path;

use hashgram_core::CompileOptions;
use serde::Deserialize;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub compile: CompileSection,
    #[serde(default)]
    pub backend: BackendSection,
}

/// `[compile]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileSection {
    /// Grammar name for the `%grammar` directive.
    pub name: Option<String>,
    /// Root entity as `<sigil><name>`.
    pub root: Option<String>,
}

/// `[backend]` section, used by `hashgram build`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSection {
    pub program: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a config file. Returns a human-readable error string on failure.
pub fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

impl Config {
    /// Compile options from the config, with `name` / `root` taking precedence.
    pub fn compile_options(&self, name: Option<String>, root: Option<String>) -> CompileOptions {
        let mut options = CompileOptions::default();
        if let Some(n) = name.or_else(|| self.compile.name.clone()) {
            options.name = n;
        }
        options.root = root.or_else(|| self.compile.root.clone());
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        let options = config.compile_options(None, None);
        assert_eq!(options, CompileOptions::default());
        assert!(config.backend.program.is_none());
    }

    #[test]
    fn flags_override_config() {
        let config: Config =
            toml::from_str("[compile]\nname = \"Postal\"\nroot = \"%record\"\n").unwrap();
        let options = config.compile_options(None, None);
        assert_eq!(options.name, "Postal");
        assert_eq!(options.root.as_deref(), Some("%record"));

        let options = config.compile_options(Some("Other".into()), Some("@tags".into()));
        assert_eq!(options.name, "Other");
        assert_eq!(options.root.as_deref(), Some("@tags"));
    }

    #[test]
    fn backend_section() {
        let config: Config =
            toml::from_str("[backend]\nprogram = \"bison\"\nargs = [\"-d\", \"{grammar}\"]\n")
                .unwrap();
        assert_eq!(config.backend.program.as_deref(), Some("bison"));
        assert_eq!(config.backend.args, ["-d", "{grammar}"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[compile]\nstart = \"x\"\n").is_err());
    }
}
