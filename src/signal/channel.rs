use crate::signal::buffer::{Sample, SlidingWindow};
use crate::signal::filter::{OffsetCorrector, Smoother};
use crate::signal::parser::ChannelTag;
use crate::signal::stats::{StatsEngine, StatsSnapshot};
use crate::signal::{PipelineConfig, ScopeError};

pub const X_SPAN_RANGE: (f64, f64) = (50.0, 200.0);
pub const Y_SPAN_RANGE: (f64, f64) = (5.0, 100.0);

/// Visible slice of a channel's plot. Only the renderer reads this.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomRange {
    pub x_span: f64,
    pub y_span: f64,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            x_span: 200.0,
            y_span: 31.0,
        }
    }
}

impl ZoomRange {
    pub fn new(x_span: f64, y_span: f64) -> Self {
        Self { x_span, y_span }.clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            x_span: self.x_span.clamp(X_SPAN_RANGE.0, X_SPAN_RANGE.1),
            y_span: self.y_span.clamp(Y_SPAN_RANGE.0, Y_SPAN_RANGE.1),
        }
    }

    /// `[max(0, last - x_span), last]`
    pub fn x_bounds(&self, last_index: u64) -> (f64, f64) {
        let last = last_index as f64;
        ((last - self.x_span).max(0.0), last)
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        (-self.y_span, self.y_span)
    }
}

/// Everything one channel keeps for the lifetime of the application.
#[derive(Clone, Debug)]
pub struct ChannelState {
    pub raw: SlidingWindow,
    pub filtered: SlidingWindow,
    pub offset_correction: bool,
    pub zoom: ZoomRange,
}

impl ChannelState {
    pub fn new(capacity: usize, offset_correction: bool) -> Result<Self, ScopeError> {
        Ok(Self {
            raw: SlidingWindow::prefilled(capacity)?,
            filtered: SlidingWindow::prefilled(capacity)?,
            offset_correction,
            zoom: ZoomRange::default(),
        })
    }
}

/// Per-tick output for one channel.
#[derive(Clone, Debug)]
pub struct ChannelFrame {
    pub channel: ChannelTag,
    /// Corrected filtered samples, oldest first.
    pub samples: Vec<Sample>,
    pub stats: StatsSnapshot,
    pub offset_correction: bool,
}

impl ChannelFrame {
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(Sample::point).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn last_index(&self) -> u64 {
        self.samples.last().map(|s| s.index).unwrap_or(0)
    }
}

pub struct ChannelPipeline {
    tag: ChannelTag,
    state: ChannelState,
    smoother: Smoother,
    corrector: OffsetCorrector,
    stats: StatsEngine,
}

impl ChannelPipeline {
    pub fn new(tag: ChannelTag, config: &PipelineConfig) -> Result<Self, ScopeError> {
        Ok(Self {
            tag,
            state: ChannelState::new(
                config.window_capacity,
                config.offset_correction[tag.index()],
            )?,
            smoother: Smoother::new(config.smoother_window)?,
            corrector: OffsetCorrector::default(),
            stats: StatsEngine::new(config.sampling_rate_hz)?,
        })
    }

    pub fn tag(&self) -> ChannelTag {
        self.tag
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn zoom_mut(&mut self) -> &mut ZoomRange {
        &mut self.state.zoom
    }

    pub fn offset_correction(&self) -> bool {
        self.state.offset_correction
    }

    pub fn set_offset_correction(&mut self, enabled: bool) {
        self.state.offset_correction = enabled;
    }

    /// Flips offset correction and returns the new state.
    pub fn toggle_offset_correction(&mut self) -> bool {
        self.state.offset_correction = !self.state.offset_correction;
        self.state.offset_correction
    }

    /// Appends a raw reading and its smoothed value at `index`.
    pub fn ingest(&mut self, index: u64, raw_value: f64) {
        self.state.raw.push(Sample::new(index, raw_value));
        let filtered = self
            .smoother
            .apply(self.state.raw.iter().map(|s| s.value));
        self.state.filtered.push(Sample::new(index, filtered));
    }

    pub fn frame(&self) -> ChannelFrame {
        let filtered = self.state.filtered.snapshot();
        let values = filtered.iter().map(|s| s.value).collect();
        let corrected = self
            .corrector
            .correct(values, self.state.offset_correction);
        let stats = self.stats.compute(&corrected);
        let samples = filtered
            .iter()
            .zip(corrected)
            .map(|(s, value)| Sample::new(s.index, value))
            .collect();
        ChannelFrame {
            channel: self.tag,
            samples,
            stats,
            offset_correction: self.state.offset_correction,
        }
    }
}
