use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub library: LibraryConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub control: ControlConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Location of the per-book JSON files served to the control surface.
#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    pub root: PathBuf,
    #[serde(default = "default_old_testament_dir")]
    pub old_testament_dir: String,
    #[serde(default = "default_new_testament_dir")]
    pub new_testament_dir: String,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

fn default_old_testament_dir() -> String {
    "Testameta taloha".to_string()
}
fn default_new_testament_dir() -> String {
    "Testameta vaovao".to_string()
}
fn default_include_globs() -> Vec<String> {
    vec!["*.json".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectionConfig {
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,
    #[serde(default = "default_initial_chunk_limit")]
    pub initial_chunk_limit: usize,
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
    #[serde(default = "default_orphan_max_chars")]
    pub orphan_max_chars: usize,
    #[serde(default = "default_cols")]
    pub cols: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            chunk_limit: default_chunk_limit(),
            initial_chunk_limit: default_initial_chunk_limit(),
            reply_timeout_ms: default_reply_timeout_ms(),
            orphan_max_chars: default_orphan_max_chars(),
            cols: default_cols(),
            rows: default_rows(),
        }
    }
}

impl ProjectionConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

fn default_chunk_limit() -> usize {
    400
}
fn default_initial_chunk_limit() -> usize {
    800
}
fn default_reply_timeout_ms() -> u64 {
    500
}
fn default_orphan_max_chars() -> usize {
    10
}
fn default_cols() -> usize {
    48
}
fn default_rows() -> usize {
    8
}

/// Source directories for `vp import`.
#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    pub old_testament: Option<PathBuf>,
    pub new_testament: Option<PathBuf>,
    pub songs: Option<PathBuf>,
    #[serde(default = "default_lang")]
    pub lang: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            old_testament: None,
            new_testament: None,
            songs: None,
            lang: default_lang(),
        }
    }
}

fn default_lang() -> String {
    "mg".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_versions")]
    pub versions: Vec<String>,
}

impl ControlConfig {
    /// Fails unless `label` is one of the configured `versions`.
    pub fn check_version(&self, label: &str) -> Result<()> {
        if !self.versions.iter().any(|v| v == label) {
            anyhow::bail!(
                "Unknown version '{}'. Configured versions: {}",
                label,
                self.versions.join(", ")
            );
        }
        Ok(())
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            versions: default_versions(),
        }
    }
}

fn default_version() -> String {
    "KJV".to_string()
}
fn default_versions() -> Vec<String> {
    ["KJV", "NIV", "ESV", "NASB", "NLT", "CSB", "AMP", "MSG"]
        .iter()
        .map(|v| v.to_string())
        .collect()
}

impl ImportConfig {
    /// Old testament source, defaulting to the library's testament directory.
    pub fn old_testament_dir(&self, library: &LibraryConfig) -> PathBuf {
        self.old_testament
            .clone()
            .unwrap_or_else(|| library.root.join(&library.old_testament_dir))
    }

    pub fn new_testament_dir(&self, library: &LibraryConfig) -> PathBuf {
        self.new_testament
            .clone()
            .unwrap_or_else(|| library.root.join(&library.new_testament_dir))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let projection = &config.projection;
    if projection.chunk_limit == 0 {
        anyhow::bail!("projection.chunk_limit must be > 0");
    }
    if projection.initial_chunk_limit == 0 {
        anyhow::bail!("projection.initial_chunk_limit must be > 0");
    }
    if projection.reply_timeout_ms == 0 {
        anyhow::bail!("projection.reply_timeout_ms must be > 0");
    }

    if config.library.include_globs.is_empty() {
        anyhow::bail!("library.include_globs must not be empty");
    }

    if config.control.version.trim().is_empty() {
        anyhow::bail!("control.version must not be empty");
    }
    if config.control.versions.is_empty() {
        anyhow::bail!("control.versions must not be empty");
    }
    config
        .control
        .check_version(&config.control.version)
        .context("control.version must be listed in control.versions")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<Config> {
        let config: Config = toml::from_str(src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = parse(
            r#"
[db]
path = "data/vp.sqlite"

[library]
root = "data/baiboly"
"#,
        )
        .unwrap();

        assert_eq!(cfg.projection.chunk_limit, 400);
        assert_eq!(cfg.projection.reply_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.library.old_testament_dir, "Testameta taloha");
        assert_eq!(cfg.control.version, "KJV");
        assert_eq!(cfg.import.lang, "mg");
        assert_eq!(
            cfg.import.new_testament_dir(&cfg.library),
            PathBuf::from("data/baiboly/Testameta vaovao")
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = parse(
            r#"
[db]
path = "vp.sqlite"

[library]
root = "lib"

[projection]
reply_timeout_ms = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reply_timeout_ms"));
    }

    #[test]
    fn test_explicit_import_dirs_win() {
        let cfg = parse(
            r#"
[db]
path = "vp.sqlite"

[library]
root = "lib"

[import]
old_testament = "/srv/ot"
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.import.old_testament_dir(&cfg.library),
            PathBuf::from("/srv/ot")
        );
    }

    #[test]
    fn test_default_version_must_be_listed() {
        let err = parse(
            r#"
[db]
path = "vp.sqlite"

[library]
root = "lib"

[control]
version = "MG 1865"
"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("control.versions"));

        let cfg = parse(
            r#"
[db]
path = "vp.sqlite"

[library]
root = "lib"

[control]
version = "MG 1865"
versions = ["KJV", "MG 1865"]
"#,
        )
        .unwrap();
        assert!(cfg.control.check_version("MG 1865").is_ok());
        assert!(cfg.control.check_version("NIV").is_err());
    }
}
