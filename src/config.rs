use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use zagadki_core::PuzzleKind;
use zagadki_relay::RelayConfig;

use crate::logging::DEFAULT_FILTER;

pub const DEFAULT_CONFIG_FILE: &str = "zagadki.toml";
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8787/ws";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown puzzle {0:?}")]
    UnknownPuzzle(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub relay_url: String,
    pub puzzle: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            puzzle: PuzzleKind::Sorting.slug().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionSettings,
    pub relay: RelayConfig,
    pub logging: LoggingSettings,
    /// File the settings were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Loads `.env.local` then `.env` into the process environment. Call it
/// before parsing arguments so `ZAGADKI_*` variables from those files reach
/// the command line's env fallbacks.
pub fn load_env_files() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
}

impl Settings {
    /// Reads `path`, or `./zagadki.toml` when none is given and it exists.
    /// Without a file every section keeps its defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(|| {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            fallback.is_file().then_some(fallback)
        });
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let mut settings = Self::from_toml_str(&contents)?;
        settings.source = Some(path);
        Ok(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn puzzle_kind(&self) -> Result<PuzzleKind, ConfigError> {
        PuzzleKind::from_slug(&self.session.puzzle)
            .ok_or_else(|| ConfigError::UnknownPuzzle(self.session.puzzle.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::from_toml_str("").expect("empty config parses");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.relay.bind, zagadki_relay::DEFAULT_BIND);
        assert!(settings.relay.replay_last_state);
    }

    #[test]
    fn sections_override_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [session]
            puzzle = "spot-the-odd"

            [relay]
            replay_last_state = false

            [logging]
            filter = "zagadki=debug"
            "#,
        )
        .expect("config parses");
        assert_eq!(settings.puzzle_kind().ok(), Some(PuzzleKind::OddOneOut));
        assert_eq!(settings.session.relay_url, DEFAULT_RELAY_URL);
        assert!(!settings.relay.replay_last_state);
        assert_eq!(settings.logging.filter, "zagadki=debug");
    }

    #[test]
    fn load_records_the_source_file() {
        let path = std::env::temp_dir().join(format!("zagadki-config-{}.toml", std::process::id()));
        let mut file = fs::File::create(&path).expect("temp file");
        writeln!(file, "[relay]\nbind = \"0.0.0.0:9000\"").expect("write config");

        let settings = Settings::load(Some(&path)).expect("config loads");
        assert_eq!(settings.relay.bind, "0.0.0.0:9000");
        assert_eq!(settings.source.as_deref(), Some(path.as_path()));
        let _ = fs::remove_file(&path);

        let missing = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_values_are_reported() {
        let mut settings = Settings::default();
        settings.session.puzzle = "match-animals".to_string();
        assert!(matches!(settings.puzzle_kind(), Err(ConfigError::UnknownPuzzle(_))));
        assert!(Settings::from_toml_str("[relay]\nreplay_last_state = 3").is_err());
    }
}
