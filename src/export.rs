//! One-shot dumps: the whole buffer as CSV, the current plot as PNG.

use crate::context::CaptureBuffers;
use crate::error::ScopeError;
use crate::types::*;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use log::{info, warn};
use plotters::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Write both channels as two CSV columns with a `CH0,CH1` header.
pub fn write_csv<W: Write>(mut w: W, ch0: &[u32], ch1: &[u32]) -> io::Result<()> {
    writeln!(w, "{},{}", CHANNEL_NAMES[0], CHANNEL_NAMES[1])?;
    for (a, b) in ch0.iter().zip(ch1) {
        writeln!(w, "{},{}", a, b)?;
    }
    w.flush()
}

/// Dump the entire history (not just the visible window) to
/// `<dir>/capture_<unix-ms>.csv`. The buffer lock is held only for the copy.
pub fn export_csv(buffers: &CaptureBuffers, dir: &Path) -> Result<PathBuf, ScopeError> {
    let (ch0, ch1) = buffers.snapshot();
    let path = dir.join(format!("capture_{}.csv", unix_millis()));
    let export_err = |source: io::Error| ScopeError::Export {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(export_err)?;
    let file = File::create(&path).map_err(export_err)?;
    write_csv(BufWriter::new(file), &ch0, &ch1).map_err(export_err)?;

    info!("Exported {} samples per channel to {:?}", ch0.len(), path);
    Ok(path)
}

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: [RGBColor; 2],
    /// Caption, axis descriptions and legend. Needs a system font.
    pub labels: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            palette: [BLUE, RED],
            labels: true,
        }
    }
}

/// Draw a frame the way the live view shows it: x spans the window width,
/// y spans the vertical range. Returns PNG bytes.
///
/// If the labelled plot cannot be drawn (no usable font on the host), the
/// traces are drawn again without text.
pub fn render_plot_png(frame: &RenderFrame, style: &PlotStyle) -> Result<Vec<u8>, ScopeError> {
    if frame.is_empty() {
        return Err(ScopeError::Plot("nothing has been rendered yet".into()));
    }
    match draw_plot(frame, style) {
        Err(ScopeError::Plot(reason)) if style.labels => {
            warn!("Labelled plot failed ({}); saving traces only", reason);
            let plain = PlotStyle {
                labels: false,
                ..style.clone()
            };
            draw_plot(frame, &plain)
        }
        other => other,
    }
}

fn draw_plot(frame: &RenderFrame, style: &PlotStyle) -> Result<Vec<u8>, ScopeError> {
    let (low, high) = frame.vertical_range;
    let x_max = frame.window_width.max(frame.len()) as f32;
    let y_range = low as f32..high.max(low + 1) as f32;

    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.labels {
            builder
                .caption("ADC Scope", ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 55)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(0f32..x_max, y_range)?;

        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(&WHITE.mix(0.1))
            .bold_line_style(&WHITE.mix(0.2));
        if style.labels {
            mesh.x_desc("Time (samples)")
                .y_desc("ADC value")
                .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
                .label_style(("sans-serif", 12).into_font().color(&WHITE))
                .axis_style(&WHITE.mix(0.5));
        } else {
            mesh.disable_x_axis().disable_y_axis();
        }
        mesh.draw()?;

        for (idx, channel) in [&frame.ch0, &frame.ch1].into_iter().enumerate() {
            let color = style.palette[idx % style.palette.len()];
            let series = channel.iter().enumerate().map(|(i, v)| (i as f32, *v as f32));
            chart
                .draw_series(LineSeries::new(series, &color))?
                .label(CHANNEL_NAMES[idx])
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }

        if style.labels {
            chart
                .configure_series_labels()
                .label_font(("sans-serif", 12).into_font().color(&WHITE))
                .border_style(&WHITE.mix(0.2))
                .background_style(&style.background)
                .draw()?;
        }

        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

/// Save the given frame to `<dir>/capture_<unix-ms>.png`.
pub fn export_png(frame: &RenderFrame, dir: &Path) -> Result<PathBuf, ScopeError> {
    let png = render_plot_png(frame, &PlotStyle::default())?;
    let path = dir.join(format!("capture_{}.png", unix_millis()));
    let export_err = |source: io::Error| ScopeError::Export {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(export_err)?;
    fs::write(&path, png).map_err(export_err)?;

    info!("Plot saved to {:?}", path);
    Ok(path)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScopeError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ScopeError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
