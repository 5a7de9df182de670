// src/signal/mod.rs
// 信号处理核心：解析 -> 滑动窗口 -> 平滑 -> 去直流 -> 统计
pub mod buffer;
pub mod channel;
pub mod error;
pub mod filter;
pub mod parser;
pub mod pipeline;
pub mod plot;
pub mod source;
pub mod stats;

use serde::{Deserialize, Serialize};

// 公开导出常用类型，方便外部调用
pub use buffer::{Sample, SlidingWindow};
pub use channel::{ChannelFrame, ChannelPipeline, ChannelState, ZoomRange};
pub use error::ScopeError;
pub use filter::{OffsetCorrector, Smoother};
pub use parser::{ChannelTag, Reading, SampleLineParser};
pub use pipeline::{ScopeFrame, TickReport, UpdateLoop};
pub use plot::{render_scope_png, PlotStyle};
pub use source::{LineSource, ManualSource, QueueSource};
pub use stats::{StatsEngine, StatsSnapshot, DEFAULT_SAMPLING_RATE_HZ};

/// Settings consumed by the processing core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window_capacity: usize,
    pub smoother_window: usize,
    /// Assumed sample rate for the zero-crossing estimate. Not measured.
    pub sampling_rate_hz: f64,
    /// Indexed by `ChannelTag::index`.
    pub offset_correction: [bool; 2],
    pub max_lines_per_tick: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_capacity: 200,
            smoother_window: 1,
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
            offset_correction: [true, true],
            max_lines_per_tick: 1024,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ScopeError> {
        if self.window_capacity == 0 {
            return Err(ScopeError::InvalidCapacity);
        }
        if self.smoother_window == 0 {
            return Err(ScopeError::InvalidSmootherWindow);
        }
        StatsEngine::new(self.sampling_rate_hz)?;
        Ok(())
    }
}
