use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_VOICES: &[&str] = &[
    "af_alloy",
    "af_aoede",
    "af_bella",
    "af_heart",
    "af_jessica",
    "af_kore",
    "af_nicole",
    "af_nova",
    "af_river",
    "af_sarah",
    "af_sky",
    "am_adam",
    "am_michael",
    "bf_alice",
    "bf_emma",
    "bf_isabella",
    "bf_lily",
    "bm_george",
    "bm_lewis",
    "jf_alpha",
    "jf_gongitsune",
    "jf_nezumi",
    "jf_tebukuro",
];

pub const DEFAULT_VOICE: &str = "af_heart";
pub const DEFAULT_PORT: u16 = 9880;
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Program followed by any leading arguments.
    pub command: Vec<String>,
    pub timeout: Duration,
    pub max_text_length: usize,
    pub allowed_voices: Vec<String>,
    pub default_voice: String,
    pub temp_dir: PathBuf,
    /// Set to false to keep synthesized files around for debugging.
    pub cleanup_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            command: vec!["kokoro".to_string()],
            timeout: DEFAULT_TIMEOUT,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            allowed_voices: DEFAULT_VOICES.iter().map(|v| v.to_string()).collect(),
            default_voice: DEFAULT_VOICE.to_string(),
            temp_dir: PathBuf::from("output_temp"),
            cleanup_files: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Ok(cwd) = std::env::current_dir() {
            config.temp_dir = cwd.join("output_temp");
        }

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse_number("PORT", &port)?;
        }
        if let Some(command) = lookup("KOKORO_COMMAND") {
            config.command = command.split_whitespace().map(str::to_string).collect();
            if config.command.is_empty() {
                return Err(ConfigError::Empty("KOKORO_COMMAND"));
            }
        }
        if let Some(secs) = lookup("KOKORO_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("KOKORO_TIMEOUT_SECS", &secs)?);
        }
        if let Some(max) = lookup("KOKORO_MAX_TEXT_LENGTH") {
            config.max_text_length = parse_number("KOKORO_MAX_TEXT_LENGTH", &max)?;
        }
        if let Some(voices) = lookup("KOKORO_VOICES") {
            config.allowed_voices = voices
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(voice) = lookup("KOKORO_DEFAULT_VOICE") {
            config.default_voice = voice.trim().to_string();
        }
        if let Some(dir) = lookup("KOKORO_TEMP_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("KOKORO_CLEANUP_FILES") {
            config.cleanup_files = parse_bool("KOKORO_CLEANUP_FILES", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_voices.is_empty() {
            return Err(ConfigError::Empty("KOKORO_VOICES"));
        }
        if !self.allowed_voices.contains(&self.default_voice) {
            return Err(ConfigError::DefaultVoiceNotAllowed(
                self.default_voice.clone(),
            ));
        }
        Ok(())
    }

    pub fn is_allowed_voice(&self, voice: &str) -> bool {
        self.allowed_voices.iter().any(|v| v == voice)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}
