use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use serde::Deserialize;
use sponsor_core::TagNames;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_QUOTA: usize = 5;
pub const DEFAULT_GREETING_PATH: &str = "res/greeting.txt";
pub const DEFAULT_BANNED_PREFIXES_PATH: &str = "res/banned_prefixes.json";

/// Values given on the command line. Each one wins over its environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// TOML file consulted after flags and environment (env: SPONSOR_BOT_CONFIG).
    pub config_path: Option<PathBuf>,
    pub prefix: Option<String>,
    pub sponsor_tag: Option<String>,
    pub sponsee_tag: Option<String>,
    pub container_tag: Option<String>,
    pub quota: Option<usize>,
    pub greeting_path: Option<PathBuf>,
    pub banned_prefixes_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub prefix: String,
    pub tags: TagNames,
    /// Spaces a participant may own before `sponsor` refuses.
    pub quota: usize,
    /// Posted into every new space; `@name` becomes the owner's mention.
    pub greeting: String,
    pub banned_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BannedPrefixes {
    values: Vec<String>,
}

/// Lowest-precedence layer, read from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    prefix: Option<String>,
    sponsor_tag: Option<String>,
    sponsee_tag: Option<String>,
    container_tag: Option<String>,
    quota: Option<usize>,
    greeting_path: Option<PathBuf>,
    banned_prefixes_path: Option<PathBuf>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }
}

impl BotConfig {
    /// Resolve from `overrides`, then the process environment, then the TOML config
    /// file, then defaults.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| env::var(key).ok())
    }

    pub fn resolve_with(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = match overrides
            .config_path
            .clone()
            .or_else(|| lookup("SPONSOR_BOT_CONFIG").map(PathBuf::from))
        {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };
        let pick = |value: Option<String>, key: &str, from_file: Option<String>, default: &str| {
            value
                .or_else(|| lookup(key))
                .or(from_file)
                .unwrap_or_else(|| default.to_string())
        };

        let defaults = TagNames::default();
        let prefix = pick(overrides.prefix, "COMMAND_PREFIX", file.prefix, DEFAULT_PREFIX);
        let tags = TagNames {
            sponsor: pick(
                overrides.sponsor_tag,
                "SPONSOR_TAG",
                file.sponsor_tag,
                &defaults.sponsor,
            ),
            sponsee: pick(
                overrides.sponsee_tag,
                "SPONSEE_TAG",
                file.sponsee_tag,
                &defaults.sponsee,
            ),
            container: pick(
                overrides.container_tag,
                "CONTAINER_TAG",
                file.container_tag,
                &defaults.container,
            ),
        };
        let quota = match overrides.quota {
            Some(quota) => quota,
            None => match lookup("SPACES_PER_SPONSEE") {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    anyhow!("SPACES_PER_SPONSEE must be a non-negative integer, got {raw:?}")
                })?,
                None => file.quota.unwrap_or(DEFAULT_QUOTA),
            },
        };
        let greeting_path = overrides
            .greeting_path
            .or_else(|| lookup("GREETING_PATH").map(PathBuf::from))
            .or(file.greeting_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GREETING_PATH));
        let banned_path = overrides
            .banned_prefixes_path
            .or_else(|| lookup("BANNED_PREFIXES_PATH").map(PathBuf::from))
            .or(file.banned_prefixes_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BANNED_PREFIXES_PATH));

        let config = Self {
            prefix,
            tags,
            quota,
            greeting: load_greeting(&greeting_path)?,
            banned_prefixes: load_banned_prefixes(&banned_path)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim().is_empty() {
            bail!("Command prefix must not be empty");
        }
        if let Some(ban) = self.banned_prefix_of(&self.prefix) {
            bail!("Command prefix {:?} collides with banned prefix {ban:?}", self.prefix);
        }
        for (label, name) in [
            ("Sponsor", &self.tags.sponsor),
            ("Sponsee", &self.tags.sponsee),
            ("Container", &self.tags.container),
        ] {
            if name.trim().is_empty() {
                bail!("{label} tag name must not be empty");
            }
        }
        Ok(())
    }

    /// Command word that provisions a space: the sponsor tag name, lower-cased.
    pub fn sponsor_command(&self) -> String {
        self.tags.sponsor.to_lowercase()
    }

    pub fn banned_prefix_of(&self, content: &str) -> Option<&str> {
        self.banned_prefixes
            .iter()
            .map(String::as_str)
            .find(|ban| !ban.is_empty() && content.starts_with(ban))
    }
}

fn load_greeting(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::warn!("Greeting {} not found; new spaces get no greeting", path.display());
            Ok(String::new())
        }
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn load_banned_prefixes(path: &Path) -> Result<Vec<String>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("No banned prefixes at {}", path.display());
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    let parsed: BannedPrefixes = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(parsed.values)
}
