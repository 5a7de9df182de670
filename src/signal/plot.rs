use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::signal::channel::ChannelFrame;
use crate::signal::{ScopeError, ScopeFrame};

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    /// One color per channel, A0 first.
    pub palette: [RGBColor; 2],
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
            background: RGBColor(46, 46, 46),
            palette: [RED, BLUE],
        }
    }
}

/// Renders both channels of `frame` as stacked panels and encodes a PNG.
pub fn render_scope_png(frame: &ScopeFrame, style: PlotStyle) -> Result<Vec<u8>, ScopeError> {
    if frame.channels.iter().any(|c| c.samples.is_empty()) {
        return Err(ScopeError::Plot("scope frame has no samples".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let panels = root.split_evenly((2, 1));
        for (panel, (channel, color)) in panels
            .iter()
            .zip(frame.channels.iter().zip(style.palette))
        {
            draw_channel(panel, channel, color)?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn draw_channel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    channel: &ChannelFrame,
    color: RGBColor,
) -> Result<(), ScopeError> {
    let first = channel.samples.first().map(|s| s.index).unwrap_or(0) as f64;
    let last = (channel.last_index() as f64).max(first + 1.0);
    let (low, high) = (channel.stats.low, channel.stats.high);
    let y_bounds = if (high - low).abs() < f64::EPSILON {
        (low - 50.0, high + 50.0)
    } else {
        (low, high)
    };
    let caption = format!(
        "{}  f={:.2} Hz  Vpp={:.2}  RMS={:.2}",
        channel.channel, channel.stats.frequency, channel.stats.peak_to_peak, channel.stats.rms
    );
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(caption, ("sans-serif", 20).into_font().color(&WHITE))
        .set_label_area_size(LabelAreaPosition::Left, 45)
        .set_label_area_size(LabelAreaPosition::Bottom, 30)
        .build_cartesian_2d(first..last, y_bounds.0..y_bounds.1)?;
    chart
        .configure_mesh()
        .light_line_style(&WHITE.mix(0.1))
        .draw()?;
    chart.draw_series(LineSeries::new(
        channel.samples.iter().map(|s| (s.index as f64, s.value)),
        &color,
    ))?;
    Ok(())
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScopeError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ScopeError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{ChannelTag, StatsSnapshot};

    #[test]
    fn encodes_png_signature() {
        let png = encode_png(&vec![0u8; 4 * 3 * 3], 4, 3).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn short_buffer_is_an_error() {
        assert!(matches!(
            encode_png(&[0u8; 5], 4, 3),
            Err(ScopeError::Plot(_))
        ));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let empty = |channel| ChannelFrame {
            channel,
            samples: Vec::new(),
            stats: StatsSnapshot::default(),
            offset_correction: true,
        };
        let frame = ScopeFrame {
            index: 0,
            channels: [empty(ChannelTag::A0), empty(ChannelTag::A1)],
        };
        assert!(matches!(
            render_scope_png(&frame, PlotStyle::default()),
            Err(ScopeError::Plot(_))
        ));
    }
}
