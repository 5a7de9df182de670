use log::{debug, trace, warn};

use crate::signal::channel::{ChannelFrame, ChannelPipeline, ZoomRange};
use crate::signal::parser::{ChannelTag, SampleLineParser};
use crate::signal::source::LineSource;
use crate::signal::{PipelineConfig, ScopeError};

/// What the renderer gets after a tick: both channels at the same x position.
#[derive(Clone, Debug)]
pub struct ScopeFrame {
    /// Newest value of the shared x axis.
    pub index: u64,
    pub channels: [ChannelFrame; 2],
}

impl ScopeFrame {
    pub fn channel(&self, tag: ChannelTag) -> &ChannelFrame {
        &self.channels[tag.index()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Lines pulled from the source.
    pub lines: usize,
    /// Lines dropped because they did not parse.
    pub rejected: usize,
    /// Times the shared x axis advanced.
    pub ticks: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.lines == 0
    }
}

/// Drains buffered lines into both channel pipelines once per scheduler tick.
pub struct UpdateLoop<S: LineSource> {
    source: Option<S>,
    parser: SampleLineParser,
    channels: [ChannelPipeline; 2],
    next_index: u64,
    max_lines_per_tick: usize,
    frame: ScopeFrame,
    transport_lost: bool,
}

impl<S: LineSource> UpdateLoop<S> {
    pub fn new(config: &PipelineConfig) -> Result<Self, ScopeError> {
        config.validate()?;
        let channels = [
            ChannelPipeline::new(ChannelTag::A0, config)?,
            ChannelPipeline::new(ChannelTag::A1, config)?,
        ];
        let frame = ScopeFrame {
            index: config.window_capacity as u64 - 1,
            channels: [channels[0].frame(), channels[1].frame()],
        };
        Ok(Self {
            source: None,
            parser: SampleLineParser::new(),
            channels,
            next_index: config.window_capacity as u64,
            max_lines_per_tick: config.max_lines_per_tick.max(1),
            frame,
            transport_lost: false,
        })
    }

    pub fn with_source(config: &PipelineConfig, source: S) -> Result<Self, ScopeError> {
        let mut update_loop = Self::new(config)?;
        update_loop.attach(source);
        Ok(update_loop)
    }

    pub fn attach(&mut self, source: S) {
        self.source = Some(source);
        self.transport_lost = false;
    }

    pub fn detach(&mut self) -> Option<S> {
        self.source.take()
    }

    /// Set once the source reports it is gone; cleared by `attach`.
    pub fn transport_lost(&self) -> bool {
        self.transport_lost
    }

    /// Latest frame. Unchanged while no data arrives.
    pub fn frame(&self) -> &ScopeFrame {
        &self.frame
    }

    pub fn channel(&self, tag: ChannelTag) -> &ChannelPipeline {
        &self.channels[tag.index()]
    }

    pub fn zoom_mut(&mut self, tag: ChannelTag) -> &mut ZoomRange {
        self.channels[tag.index()].zoom_mut()
    }

    pub fn set_offset_correction(&mut self, tag: ChannelTag, enabled: bool) {
        self.channels[tag.index()].set_offset_correction(enabled);
        self.refresh();
    }

    pub fn toggle_offset_correction(&mut self, tag: ChannelTag) -> bool {
        let enabled = self.channels[tag.index()].toggle_offset_correction();
        self.refresh();
        enabled
    }

    /// Processes every line the source already holds, up to the per-tick limit.
    /// Without a source this is a no-op.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let Some(mut source) = self.source.take() else {
            return report;
        };
        while report.lines < self.max_lines_per_tick {
            let line = match source.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    if !self.transport_lost {
                        warn!("no data source: {err}");
                        self.transport_lost = true;
                    }
                    break;
                }
            };
            report.lines += 1;
            match self.ingest_line(&line) {
                Ok(true) => report.ticks += 1,
                Ok(false) => {}
                Err(err) => {
                    report.rejected += 1;
                    warn!("invalid data received ({err}): {line:?}");
                }
            }
        }
        self.source = Some(source);
        if report.ticks > 0 {
            self.refresh();
        }
        report
    }

    /// Applies one line. Returns whether it finalized a tick.
    ///
    /// Readings after the first A1 of a line are ignored.
    pub fn ingest_line(&mut self, line: &str) -> Result<bool, ScopeError> {
        trace!("{line}");
        let readings = self.parser.parse(line)?;
        for (pos, reading) in readings.iter().enumerate() {
            self.channels[reading.channel.index()].ingest(self.next_index, reading.value);
            if reading.channel.finalizes_tick() {
                self.next_index += 1;
                let ignored = readings.len() - pos - 1;
                if ignored > 0 {
                    debug!("ignoring {ignored} reading(s) after A1 in {line:?}");
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Recomputes the frame from the current windows.
    pub fn refresh(&mut self) {
        self.frame = ScopeFrame {
            index: self.next_index - 1,
            channels: [self.channels[0].frame(), self.channels[1].frame()],
        };
    }
}
