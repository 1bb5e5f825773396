use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_wfs_version() -> String {
    "2.0.0".to_string()
}
fn default_size() -> u32 {
    200
}
fn default_fill() -> String {
    "#3388ff".to_string()
}
fn default_fill_opacity() -> f64 {
    0.3
}
fn default_stroke() -> String {
    "#3388ff".to_string()
}
fn default_stroke_width() -> f64 {
    1.0
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_verbose() -> bool {
    false
}

/// Optional TOML file configuration. Explicit CLI flags take precedence
/// over every field here.
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub layer: Option<String>,
    #[serde(default = "default_wfs_version")]
    pub wfs_version: String,
    #[serde(default)]
    pub cql_filter: Option<String>,
    #[serde(default)]
    pub srs: Option<u32>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl FileConfig {
    /// Load the first parseable config file from the search paths.
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("wfs2svg.toml"));
    paths.push(PathBuf::from(".wfs2svg.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("wfs2svg").join("config.toml"));
        paths.push(config_dir.join("wfs2svg.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".wfs2svg.toml"));
        paths.push(home.join(".config").join("wfs2svg").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_path_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
url = "https://geoservices.example.org/ws"
layer = "urbis:municipalities"
count = 1
fill = "red"
"#
        )
        .unwrap();

        let config = FileConfig::from_path(file.path()).unwrap();

        assert_eq!(config.url.as_deref(), Some("https://geoservices.example.org/ws"));
        assert_eq!(config.layer.as_deref(), Some("urbis:municipalities"));
        assert_eq!(config.count, Some(1));
        assert_eq!(config.fill, "red");
        assert_eq!(config.wfs_version, "2.0.0");
        assert_eq!(config.size, 200);
        assert_eq!(config.fill_opacity, 0.3);
        assert_eq!(config.stroke_width, 1.0);
        assert!(!config.verbose);
    }

    #[test]
    fn test_from_path_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "url = ").unwrap();

        assert!(FileConfig::from_path(file.path()).is_err());
    }
}
