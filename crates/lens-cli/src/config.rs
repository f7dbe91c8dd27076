use std::path::PathBuf;

use anyhow::{Result, bail};

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub diagram_path: PathBuf,
    pub dot_bin: String,
    pub render_diagram: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("LENS_DB_PATH").unwrap_or_else(|| "lens.db".into());
        let diagram_path = lookup("LENS_DIAGRAM_PATH").unwrap_or_else(|| "diagram.png".into());
        let dot_bin = lookup("LENS_DOT_BIN").unwrap_or_else(|| "dot".into());
        let render_diagram = match lookup("LENS_RENDER_DIAGRAM") {
            None => true,
            Some(v) => parse_flag(&v)?,
        };

        Ok(Self {
            db_path: db_path.into(),
            diagram_path: diagram_path.into(),
            dot_bin,
            render_diagram,
        })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("LENS_RENDER_DIAGRAM must be a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("lens.db"));
        assert_eq!(config.diagram_path, PathBuf::from("diagram.png"));
        assert_eq!(config.dot_bin, "dot");
        assert!(config.render_diagram);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("LENS_DB_PATH", "/var/lib/lens/lens.db"),
            ("LENS_DIAGRAM_PATH", "out/schema.svg"),
            ("LENS_DOT_BIN", "/usr/local/bin/dot"),
            ("LENS_RENDER_DIAGRAM", "off"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/lens/lens.db"));
        assert_eq!(config.diagram_path, PathBuf::from("out/schema.svg"));
        assert_eq!(config.dot_bin, "/usr/local/bin/dot");
        assert!(!config.render_diagram);
    }

    #[test]
    fn bad_flag_is_an_error() {
        assert!(config_from(&[("LENS_RENDER_DIAGRAM", "maybe")]).is_err());
    }
}
