//! Layered configuration for hardbound.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults.
//! 2. `config.{toml,yaml,json}` in the platform config directory
//!    (`~/.config/hardbound/` on Linux).
//! 3. An explicit file passed by the caller; format from its extension.
//! 4. `HARDBOUND_`-prefixed environment variables, with `__` separating
//!    nested keys (`HARDBOUND_NAMING__PATH_CAP=150`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use hardbound_naming::{DEFAULT_EXTENSION, DEFAULT_PATH_CAP, FeatureMask, LengthUnit, SeriesJoiner};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "HARDBOUND_";
const MAX_MODE: u32 = 0o7777;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub naming: NamingConfig,
    pub link: LinkConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Cap on the torrent-internal `folder/file` length.
    pub path_cap: usize,
    pub length_unit: LengthUnit,
    /// Audio extensions looked for in a source directory, best first.
    pub ext_priority: Vec<String>,
    /// Extension used when none of `ext_priority` is present.
    pub fallback_ext: String,
    /// Optional groups rendered before any shortening.
    pub features: FeatureMask,
    pub joiner: SeriesJoiner,
}
impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            path_cap: DEFAULT_PATH_CAP,
            length_unit: LengthUnit::default(),
            ext_priority: [".m4b", ".m4a", ".mp3", ".flac"].map(String::from).to_vec(),
            fallback_ext: DEFAULT_EXTENSION.to_string(),
            features: FeatureMask::ALL,
            joiner: SeriesJoiner::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Copy when source and destination are on different devices.
    pub copy_fallback: bool,
    /// Link cue sheets, cover art and documents next to the audio file.
    pub companions: bool,
    /// Destination file names never written as companions.
    pub exclude_names: Vec<String>,
    /// Extensions never linked as companions.
    pub exclude_exts: Vec<String>,
    /// Octal; accepts `0o644`, `420` or the string `"0644"`.
    #[serde(deserialize_with = "deserialize_mode")]
    pub file_mode: Option<u32>,
    #[serde(deserialize_with = "deserialize_mode")]
    pub dir_mode: Option<u32>,
    pub owner_uid: Option<u32>,
    pub owner_gid: Option<u32>,
}
impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            copy_fallback: true,
            companions: true,
            exclude_names: vec!["cover.jpg".to_string(), "metadata.json".to_string()],
            exclude_exts: vec![".epub".to_string()],
            file_mode: None,
            dir_mode: None,
            owner_uid: None,
            owner_gid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items materialized at once by the streaming batch runner.
    pub concurrency: usize,
}
impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl Config {
    /// Load and validate configuration from every layer.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// The layered provider stack, before extraction.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dir) = default_config_dir() {
            tracing::debug!(dir = %dir.display(), "Looking for configuration files");
            figment = figment
                .merge(Toml::file(dir.join("config.toml")))
                .merge(Yaml::file(dir.join("config.yaml")))
                .merge(Json::file(dir.join("config.json")));
        }
        if let Some(path) = explicit {
            figment = merge_file(figment, path)?;
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.naming.path_cap == 0 {
            exn::bail!(ErrorKind::Invalid("naming.path_cap must be greater than zero".to_string()));
        }
        if self.naming.ext_priority.is_empty() {
            exn::bail!(ErrorKind::Invalid("naming.ext_priority must not be empty".to_string()));
        }
        let extensions = self.naming.ext_priority.iter().map(|ext| ("naming.ext_priority", ext));
        let extensions = extensions
            .chain(std::iter::once(("naming.fallback_ext", &self.naming.fallback_ext)))
            .chain(self.link.exclude_exts.iter().map(|ext| ("link.exclude_exts", ext)));
        for (key, ext) in extensions {
            if !is_valid_extension(ext) {
                exn::bail!(ErrorKind::Invalid(format!("{key}: `{ext}` is not a dot-prefixed extension")));
            }
        }
        for (key, mode) in [("link.file_mode", self.link.file_mode), ("link.dir_mode", self.link.dir_mode)] {
            if let Some(mode) = mode
                && mode > MAX_MODE
            {
                exn::bail!(ErrorKind::Invalid(format!("{key}: {mode:o} is not a valid mode")));
            }
        }
        if self.batch.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("batch.concurrency must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hardbound").map(|dirs| dirs.config_dir().to_path_buf())
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    if !path.is_file() {
        exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", path.display())));
    }
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::Invalid(format!("unsupported config format: {}", path.display()))),
    })
}

fn is_valid_extension(ext: &str) -> bool {
    ext.len() > 1 && ext.starts_with('.') && !ext[1..].contains(['.', '/', ' '])
}

fn deserialize_mode<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Mode {
        Number(u32),
        Text(String),
    }
    match Option::<Mode>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Mode::Number(mode)) => Ok(Some(mode)),
        Some(Mode::Text(text)) => {
            let digits = text.trim().trim_start_matches("0o");
            u32::from_str_radix(digits, 8)
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("`{text}` is not an octal mode")))
        },
    }
}
