use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::warn;

const LOCAL_CONFIG: &str = ".docchk.toml";
const MIN_CHUNK_SIZE: usize = 256;
const MAX_CHUNK_WORKERS: usize = 32;
const MIN_CHUNK_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub dictionary_path: Option<PathBuf>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_edit_distance: usize,
    pub max_suggestions: usize,
    pub grammar_enabled: bool,
    pub language_tool_url: Option<String>,
    /// Document-level workers; 0 derives the count from the CPU.
    pub document_workers: usize,
    /// Chunk-level workers; 0 derives the count from the CPU.
    pub chunk_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            dictionary_path: None,
            chunk_size: 4096,
            chunk_overlap: 128,
            max_edit_distance: 2,
            max_suggestions: 5,
            grammar_enabled: true,
            language_tool_url: None,
            document_workers: 0,
            chunk_workers: 0,
        }
    }
}

/// Values given on the command line or through the environment. `None`
/// leaves the file or default value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub language: Option<String>,
    pub dictionary_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub max_edit_distance: Option<usize>,
    pub max_suggestions: Option<usize>,
    pub disable_grammar: bool,
    pub language_tool_url: Option<String>,
    pub document_workers: Option<usize>,
    pub chunk_workers: Option<usize>,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG);
        if local_path.exists() {
            let local_config = Self::from_file(&local_path)?;
            config = config.merge(local_config);
        }

        config = config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Layer `other` over `self`: any value in `other` that differs from the
    /// default wins.
    pub fn merge(mut self, other: Self) -> Self {
        let defaults = Self::default();
        if other.language != defaults.language {
            self.language = other.language;
        }
        if other.dictionary_path.is_some() {
            self.dictionary_path = other.dictionary_path;
        }
        if other.chunk_size != defaults.chunk_size {
            self.chunk_size = other.chunk_size;
        }
        if other.chunk_overlap != defaults.chunk_overlap {
            self.chunk_overlap = other.chunk_overlap;
        }
        if other.max_edit_distance != defaults.max_edit_distance {
            self.max_edit_distance = other.max_edit_distance;
        }
        if other.max_suggestions != defaults.max_suggestions {
            self.max_suggestions = other.max_suggestions;
        }
        if !other.grammar_enabled {
            self.grammar_enabled = false;
        }
        if other.language_tool_url.is_some() {
            self.language_tool_url = other.language_tool_url;
        }
        if other.document_workers != defaults.document_workers {
            self.document_workers = other.document_workers;
        }
        if other.chunk_workers != defaults.chunk_workers {
            self.chunk_workers = other.chunk_workers;
        }
        self
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(raw) = overrides.language {
            match normalize_language_tag(&raw) {
                Some(tag) => self.language = tag,
                None => warn!(value = %raw, "Ignoring invalid language tag"),
            }
        }
        if let Some(path) = overrides.dictionary_path {
            self.dictionary_path = Some(path);
        }
        if let Some(size) = overrides.chunk_size {
            self.chunk_size = size;
        }
        if let Some(overlap) = overrides.chunk_overlap {
            self.chunk_overlap = overlap;
        }
        if let Some(distance) = overrides.max_edit_distance {
            self.max_edit_distance = distance;
        }
        if let Some(limit) = overrides.max_suggestions {
            self.max_suggestions = limit;
        }
        if overrides.disable_grammar {
            self.grammar_enabled = false;
        }
        if let Some(url) = overrides.language_tool_url {
            self.language_tool_url = Some(url);
        }
        if let Some(workers) = overrides.document_workers {
            self.document_workers = workers;
        }
        if let Some(workers) = overrides.chunk_workers {
            self.chunk_workers = workers;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size <= MIN_CHUNK_SIZE {
            bail!(
                "chunk_size must be greater than {}, got {}",
                MIN_CHUNK_SIZE,
                self.chunk_size
            );
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.max_edit_distance == 0 {
            bail!("max_edit_distance must be at least 1");
        }
        if self.chunk_overlap > self.chunk_size / 4 {
            warn!(
                chunk_overlap = self.chunk_overlap,
                effective = self.chunk_size / 4,
                "chunk_overlap clamped to a quarter of chunk_size"
            );
        }
        Ok(())
    }

    pub fn resolved_document_workers(&self) -> usize {
        match self.document_workers {
            0 => available_cores(),
            n => n,
        }
    }

    pub fn resolved_chunk_workers(&self) -> usize {
        match self.chunk_workers {
            0 => available_cores().clamp(MIN_CHUNK_WORKERS, MAX_CHUNK_WORKERS),
            n => n,
        }
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "docchk").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "docchk").map(|dirs| dirs.data_dir().to_path_buf())
    }
}

/// Accept tags like `en`, `en-US` or `en_GB` (returned with `-`). Locale
/// priority lists such as `en_US:en`, and `C` or `POSIX`, give `None`.
pub fn normalize_language_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().replace('_', "-");
    let mut parts = tag.split('-');
    let primary = parts.next()?;
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric())) {
        return None;
    }
    Some(tag)
}

fn available_cores() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}
