use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use rotator_core::EasingKind;
use rotator_core::settings::{
    DEFAULT_BACKOFF, DEFAULT_DWELL, DEFAULT_LOAD_TIMEOUT,
    DEFAULT_REFRESH_INTERVAL, DEFAULT_RETRY_LIMIT, DEFAULT_SCROLL_DURATION,
    DEFAULT_SCROLL_STEP,
};
use tracing::debug;
use url::Url;

use crate::error::ConfigLoadError;
use crate::models::{
    Config, ConfigMetadata, ProbeConfig, RotationConfig, SourceConfig,
    StateConfig,
};
use crate::sources::{EnvConfig, FileConfig, FileDuration};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROBE_VIEWPORT_HEIGHT: f64 = 1080.0;

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("rotator.toml"),
        PathBuf::from("config/rotator.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Takes precedence over both the environment and the file.
    pub source_url: Option<String>,
    /// Replaces the process environment; the `.env` file is skipped.
    pub env: Option<EnvConfig>,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_source_url<S: Into<String>>(mut self, url: S) -> Self {
        self.options.source_url = Some(url.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env_config, env_file_loaded) = match &self.options.env {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = self.compose_config(
            file_config,
            env_config,
            config_path,
            env_file_loaded,
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (
            &self.options.config_path,
            &env_config.config_path,
        ) {
            (Some(path), _) => (path.clone(), true),
            (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => (path.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|source| {
            ConfigLoadError::Io {
                path: path.clone(),
                source,
            }
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "loaded configuration file");

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if file_config.is_none() {
            warnings.push_with_hint(
                "No rotator.toml detected; \
                 using environment variables and defaults",
                "Create rotator.toml or point ROTATOR_CONFIG at one",
            );
        }

        let FileConfig {
            source: file_source,
            rotation: file_rotation,
            state: file_state,
            probe: file_probe,
        } = file_config.unwrap_or_default();

        let raw_url = self
            .options
            .source_url
            .clone()
            .or(env.source_url.clone())
            .or(file_source.url.clone())
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigGuardRailError::MissingSourceUrl)?;
        let url = Url::parse(raw_url.trim()).map_err(|source| {
            ConfigLoadError::InvalidUrl {
                value: raw_url.clone(),
                source,
            }
        })?;

        let source = SourceConfig {
            url,
            request_timeout: resolve_duration(
                ("ROTATOR_REQUEST_TIMEOUT", env.request_timeout.as_deref()),
                (
                    "source.request_timeout",
                    file_source.request_timeout.as_ref(),
                ),
                DEFAULT_REQUEST_TIMEOUT,
            )?,
        };

        let rotation = RotationConfig {
            refresh_interval: resolve_duration(
                ("ROTATOR_REFRESH_INTERVAL", env.refresh_interval.as_deref()),
                (
                    "rotation.refresh_interval",
                    file_rotation.refresh_interval.as_ref(),
                ),
                DEFAULT_REFRESH_INTERVAL,
            )?,
            default_dwell: resolve_duration(
                ("ROTATOR_DEFAULT_DWELL", env.default_dwell.as_deref()),
                (
                    "rotation.default_dwell",
                    file_rotation.default_dwell.as_ref(),
                ),
                DEFAULT_DWELL,
            )?,
            scroll_duration: resolve_duration(
                ("ROTATOR_SCROLL_DURATION", env.scroll_duration.as_deref()),
                (
                    "rotation.scroll_duration",
                    file_rotation.scroll_duration.as_ref(),
                ),
                DEFAULT_SCROLL_DURATION,
            )?,
            scroll_step: resolve_duration(
                ("ROTATOR_SCROLL_STEP", env.scroll_step.as_deref()),
                ("rotation.scroll_step", file_rotation.scroll_step.as_ref()),
                DEFAULT_SCROLL_STEP,
            )?,
            scroll_easing: match env
                .scroll_easing
                .as_deref()
                .map(|raw| ("ROTATOR_SCROLL_EASING", raw))
                .or(file_rotation
                    .scroll_easing
                    .as_deref()
                    .map(|raw| ("rotation.scroll_easing", raw)))
            {
                Some((key, raw)) => parse_value::<EasingKind>(key, raw)?,
                None => EasingKind::default(),
            },
            retry_limit: match env.retry_limit.as_deref() {
                Some(raw) => parse_value("ROTATOR_RETRY_LIMIT", raw)?,
                None => {
                    file_rotation.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT)
                }
            },
            backoff: resolve_duration(
                ("ROTATOR_BACKOFF", env.backoff.as_deref()),
                ("rotation.backoff", file_rotation.backoff.as_ref()),
                DEFAULT_BACKOFF,
            )?,
            load_timeout: resolve_duration(
                ("ROTATOR_LOAD_TIMEOUT", env.load_timeout.as_deref()),
                ("rotation.load_timeout", file_rotation.load_timeout.as_ref()),
                DEFAULT_LOAD_TIMEOUT,
            )?,
            clear_on_empty: env
                .clear_on_empty
                .or(file_rotation.clear_on_empty)
                .unwrap_or(false),
        };

        let state = StateConfig {
            position_file: env
                .position_file
                .clone()
                .or(file_state.position_file),
        };

        let probe = ProbeConfig {
            content_height: match env.probe_content_height.as_deref() {
                Some(raw) => parse_value("ROTATOR_PROBE_CONTENT_HEIGHT", raw)?,
                None => file_probe.content_height.unwrap_or(0.0),
            },
            viewport_height: match env.probe_viewport_height.as_deref() {
                Some(raw) => parse_value("ROTATOR_PROBE_VIEWPORT_HEIGHT", raw)?,
                None => file_probe
                    .viewport_height
                    .unwrap_or(DEFAULT_PROBE_VIEWPORT_HEIGHT),
            },
        };

        let config = Config {
            source,
            rotation,
            state,
            probe,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        let guard_warnings = validation::apply_guard_rails(&config)?;
        warnings.extend(guard_warnings);

        Ok((config, warnings))
    }
}

/// Environment beats file beats default.
fn resolve_duration(
    env: (&'static str, Option<&str>),
    file: (&'static str, Option<&FileDuration>),
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    if let (key, Some(raw)) = env {
        return parse_duration(key, raw);
    }
    match file {
        (_, Some(FileDuration::Seconds(seconds))) => {
            Ok(Duration::from_secs(*seconds))
        }
        (key, Some(FileDuration::Text(raw))) => parse_duration(key, raw),
        (_, None) => Ok(default),
    }
}

fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            key,
            value: raw.to_owned(),
            source,
        }
    })
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigLoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err: T::Err| ConfigLoadError::InvalidValue {
            key,
            value: raw.to_owned(),
            reason: err.to_string(),
        })
}
