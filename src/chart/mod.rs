//! Chart rendering
//!
//! Turns a measurement series plus resolved range metadata into a PNG image
//! with three vertically stacked panels sharing the x-axis:
//!
//! 1. outdoor + indoor temperature (legend and range title)
//! 2. indoor humidity, fixed to 0-100 %
//! 3. barometric pressure, configured fixed y-range
//!
//! The range kind drives the x-axis only: a `Today` chart pins the domain to
//! the full 24-hour day with hour-of-day ticks even when the series is
//! sparse, a `YearMonth` chart follows the data extent with month/day ticks,
//! and a rolling `Range` chart pads the domain 30 minutes past the nominal
//! end-of-day so the final tick label still renders (month/day ticks for a
//! 7-day window, rotated month/day+time ticks for 1-3 days).
//!
//! An empty series never reaches layout: `render` returns
//! [`RenderOutcome::NoData`] and the caller decides how to surface the
//! zero-record outcome. No blank image is produced silently.

pub mod error;
pub mod size;

pub use error::{ChartError, ChartResult};
pub use size::{PhysicalSize, MAX_EFFECTIVE_DENSITY};

use chrono::{Duration, NaiveDateTime, Timelike};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use crate::config::PlotConfig;
use crate::range::{RangeKind, ResolvedRange};
use crate::table::{SeriesRow, SeriesTable};

/// Extra x-domain padding past the end-of-day for rolling-range charts
const RANGE_TICK_PAD_MINUTES: i64 = 30;

/// Result of a render call
#[derive(Debug)]
pub enum RenderOutcome {
    /// PNG-encoded chart
    Image(Vec<u8>),
    /// The series was empty; nothing was drawn
    NoData,
}

impl RenderOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, RenderOutcome::NoData)
    }
}

/// Stateless renderer configured once per process
pub struct ChartRenderer {
    config: PlotConfig,
}

impl ChartRenderer {
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }

    /// Render the three-panel chart for a series
    ///
    /// `physical_size` carries a mobile client's viewport; without it the
    /// configured desktop figure size is used.
    pub fn render(
        &self,
        table: &SeriesTable,
        range: &ResolvedRange,
        physical_size: Option<PhysicalSize>,
    ) -> ChartResult<RenderOutcome> {
        if table.is_empty() {
            return Ok(RenderOutcome::NoData);
        }

        let (width, height) = match physical_size {
            Some(size) => size.figure_px(),
            None => (self.config.figure_width, self.config.figure_height),
        };
        let (x_min, x_max) = x_domain(range, table);

        let mut raster = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut raster, (width, height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let panels = root.split_evenly((3, 1));
            self.draw_temperature_panel(&panels[0], table, range, x_min, x_max)?;
            self.draw_humidity_panel(&panels[1], table, x_min, x_max)?;
            self.draw_pressure_panel(&panels[2], table, range, x_min, x_max)?;

            root.present().map_err(draw_err)?;
        }

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&raster, width, height, ColorType::Rgb8)
            .map_err(|e| ChartError::Encode(e.to_string()))?;
        Ok(RenderOutcome::Image(png))
    }

    fn draw_temperature_panel<DB>(
        &self,
        area: &DrawingArea<DB, plotters::coord::Shift>,
        table: &SeriesTable,
        range: &ResolvedRange,
        x_min: NaiveDateTime,
        x_max: NaiveDateTime,
    ) -> ChartResult<()>
    where
        DB: DrawingBackend,
    {
        let font = self.config.font_family.as_str();
        let [y_min, y_max] = self.config.temp_ylim;

        let mut chart = ChartBuilder::on(area)
            .margin(8)
            .caption(
                format!("気象データ：{}", range.title),
                (font, self.config.label_font_size as i32 + 4),
            )
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .build_cartesian_2d(RangedDateTime::from(x_min..x_max), y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .y_desc("気温 (℃)")
            .axis_desc_style((font, self.config.label_font_size as i32))
            .label_style((font, self.config.tick_font_size as i32))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                series_points(&table.rows, |r| r.temp_out),
                &BLUE,
            ))
            .map_err(draw_err)?
            .label("外気温")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .draw_series(LineSeries::new(
                series_points(&table.rows, |r| r.temp_in),
                &RED,
            ))
            .map_err(draw_err)?
            .label("室内気温")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.7))
            .border_style(BLACK.mix(0.3))
            .label_font((font, self.config.label_font_size as i32))
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(draw_err)?;

        Ok(())
    }

    fn draw_humidity_panel<DB>(
        &self,
        area: &DrawingArea<DB, plotters::coord::Shift>,
        table: &SeriesTable,
        x_min: NaiveDateTime,
        x_max: NaiveDateTime,
    ) -> ChartResult<()>
    where
        DB: DrawingBackend,
    {
        let font = self.config.font_family.as_str();

        let mut chart = ChartBuilder::on(area)
            .margin(8)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .build_cartesian_2d(RangedDateTime::from(x_min..x_max), 0.0..100.0)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .y_desc("室内湿度 (％)")
            .axis_desc_style((font, self.config.label_font_size as i32))
            .label_style((font, self.config.tick_font_size as i32))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                series_points(&table.rows, |r| r.humid),
                &GREEN,
            ))
            .map_err(draw_err)?;

        Ok(())
    }

    /// Bottom panel; the only one with visible x tick labels
    fn draw_pressure_panel<DB>(
        &self,
        area: &DrawingArea<DB, plotters::coord::Shift>,
        table: &SeriesTable,
        range: &ResolvedRange,
        x_min: NaiveDateTime,
        x_max: NaiveDateTime,
    ) -> ChartResult<()>
    where
        DB: DrawingBackend,
    {
        let font = self.config.font_family.as_str();
        let [y_min, y_max] = self.config.pressure_ylim;

        let mut chart = ChartBuilder::on(area)
            .margin(8)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(RangedDateTime::from(x_min..x_max), y_min..y_max)
            .map_err(draw_err)?;

        let tick_font_size = x_tick_font_size(range.kind, self.config.date_tick_font_size) as i32;
        let tick_style: TextStyle = if rotated_x_ticks(range.kind) {
            TextStyle::from(
                (font, tick_font_size)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .pos(Pos::new(HPos::Center, VPos::Top))
        } else {
            (font, tick_font_size).into_font().into()
        };

        chart
            .configure_mesh()
            .y_desc("hPa")
            .axis_desc_style((font, self.config.label_font_size as i32))
            .label_style((font, self.config.tick_font_size as i32))
            .x_labels(x_tick_count(range.kind))
            .x_label_style(tick_style)
            .x_label_formatter(&|t| x_tick_label(range.kind, *t))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                series_points(&table.rows, |r| r.pressure),
                &MAGENTA,
            ))
            .map_err(draw_err)?;

        Ok(())
    }
}

/// X-axis domain per range kind
///
/// `Today` pins the full 24-hour day regardless of data extent; `Range`
/// pads 30 minutes past the end-of-day so the last tick label renders;
/// `YearMonth` follows the data.
pub fn x_domain(range: &ResolvedRange, table: &SeriesTable) -> (NaiveDateTime, NaiveDateTime) {
    match range.kind {
        RangeKind::Today => (range.lower, range.upper),
        RangeKind::Range { .. } => (
            range.lower,
            range.upper + Duration::minutes(RANGE_TICK_PAD_MINUTES),
        ),
        RangeKind::YearMonth => {
            let first = table.first_time().unwrap_or(range.lower);
            let mut last = table.last_time().unwrap_or(range.upper);
            if last <= first {
                // Degenerate single-sample extent still needs a nonempty axis
                last = first + Duration::hours(1);
            }
            (first, last)
        }
    }
}

/// Tick label text per range kind
pub fn x_tick_label(kind: RangeKind, t: NaiveDateTime) -> String {
    match kind {
        RangeKind::Today => format!("{:02}", t.hour()),
        RangeKind::YearMonth => t.format("%m/%d").to_string(),
        RangeKind::Range { before_days } => {
            if before_days >= 7 {
                t.format("%m/%d").to_string()
            } else {
                t.format("%m/%d %H:%M").to_string()
            }
        }
    }
}

fn x_tick_count(kind: RangeKind) -> usize {
    match kind {
        RangeKind::Today => 9,
        RangeKind::YearMonth => 8,
        RangeKind::Range { before_days } if before_days >= 7 => 8,
        RangeKind::Range { .. } => 7,
    }
}

fn x_tick_font_size(kind: RangeKind, base: u32) -> u32 {
    match kind {
        // The denser range windows drop a point to keep labels apart
        RangeKind::Range { .. } => base.saturating_sub(1).max(1),
        _ => base,
    }
}

fn rotated_x_ticks(kind: RangeKind) -> bool {
    matches!(kind, RangeKind::Range { before_days } if before_days < 7)
}

fn series_points<F>(rows: &[SeriesRow], value: F) -> Vec<(NaiveDateTime, f64)>
where
    F: Fn(&SeriesRow) -> Option<f64>,
{
    rows.iter()
        .filter_map(|r| value(r).map(|v| (r.measurement_time, v)))
        .collect()
}

fn draw_err<E: std::error::Error>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}
