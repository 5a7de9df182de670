use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::signal::{PipelineConfig, ZoomRange};
use crate::types::ConnectionMode;

/// Application settings, loaded from an optional JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub pipeline: PipelineConfig,
    pub connection_mode: ConnectionMode,
    pub serial_port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub tick_interval_ms: u64,
    /// Lines the transport thread may buffer before it blocks.
    pub queue_capacity: usize,
    pub zoom_x_span: f64,
    pub zoom_y_span: f64,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        let zoom = ZoomRange::default();
        Self {
            pipeline: PipelineConfig::default(),
            connection_mode: ConnectionMode::Hardware,
            serial_port: "COM3".to_owned(),
            baud_rate: 115_200,
            read_timeout_ms: 500,
            tick_interval_ms: 10,
            queue_capacity: 1024,
            zoom_x_span: zoom.x_span,
            zoom_y_span: zoom.y_span,
        }
    }
}

impl ScopeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        anyhow::ensure!(self.queue_capacity > 0, "queue_capacity must be greater than zero");
        anyhow::ensure!(self.baud_rate > 0, "baud_rate must be greater than zero");
        Ok(())
    }

    pub fn zoom(&self) -> ZoomRange {
        ZoomRange::new(self.zoom_x_span, self.zoom_y_span)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
