use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{ConfigError, Result},
    filter::blend::BlendFactor,
    video::Chroma,
};

/// Main configuration for the motion blur filter and its driver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter settings, read once when a filter is created
    pub filter: FilterConfig,

    /// Output buffer pool settings
    pub pool: PoolConfig,

    /// Frame decoding and conversion settings
    pub io: IoConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.filter.validate();
        self.pool.validate()?;
        self.io.validate()?;
        Ok(())
    }
}

/// Motion blur filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Weight of the previous output, 1 (almost none) to 127 (heavy trails)
    pub blur_factor: i32,

    /// Number of input buffers preallocated for the decoder
    pub direct_buffers: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blur_factor: BlendFactor::DEFAULT.value(),
            direct_buffers: 8,
        }
    }
}

impl FilterConfig {
    /// Out-of-range factors are used as given.
    fn validate(&self) {
        if !BlendFactor::new(self.blur_factor).is_in_range() {
            warn!(
                "blur_factor {} is outside {}..={}, output will wrap",
                self.blur_factor,
                BlendFactor::MIN,
                BlendFactor::MAX
            );
        }
    }
}

/// Output pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of buffers handed out at once
    pub capacity: usize,

    /// First wait after a failed acquisition (milliseconds)
    pub retry_initial_ms: u64,

    /// Upper bound on the wait between acquisition attempts (milliseconds)
    pub retry_max_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            retry_initial_ms: 5,
            retry_max_ms: 20,
        }
    }
}

impl PoolConfig {
    pub fn retry_initial(&self) -> Duration {
        Duration::from_millis(self.retry_initial_ms)
    }

    pub fn retry_max(&self) -> Duration {
        Duration::from_millis(self.retry_max_ms)
    }

    fn validate(&self) -> Result<()> {
        // one output buffer plus the retained frame
        if self.capacity < 2 {
            return Err(ConfigError::InvalidValue {
                key: "pool.capacity".to_string(),
                value: self.capacity.to_string()
            }.into());
        }

        if self.retry_initial_ms == 0 || self.retry_initial_ms > self.retry_max_ms {
            return Err(ConfigError::InvalidValue {
                key: "pool.retry_range".to_string(),
                value: format!("{}-{}", self.retry_initial_ms, self.retry_max_ms)
            }.into());
        }

        Ok(())
    }
}

/// Decoding and conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Planar layout frames are converted to before filtering
    pub chroma: Chroma,

    /// Threads used to decode input images
    pub decode_threads: usize,

    /// Timestamp step between consecutive frames (microseconds)
    pub frame_interval_us: i64,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            chroma: Chroma::I420,
            decode_threads: num_cpus::get(),
            frame_interval_us: 40_000,
        }
    }
}

impl IoConfig {
    fn validate(&self) -> Result<()> {
        if self.decode_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "io.decode_threads".to_string(),
                value: self.decode_threads.to_string()
            }.into());
        }

        if !self.chroma.is_planar_yuv() {
            return Err(ConfigError::InvalidValue {
                key: "io.chroma".to_string(),
                value: self.chroma.to_string()
            }.into());
        }

        Ok(())
    }
}
