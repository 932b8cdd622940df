//! Filled-contour anomaly map: banded grid, station markers, axes and colorbar.
//!
//! Everything is drawn into an in-memory RGB buffer; [`AnomalyMap::save_png`]
//! is the only step that touches the filesystem.

pub mod colormap;
mod glyphs;

use crate::core::interpolation::{GridSummary, InterpolationGrid, SamplePoint};
use crate::domain::model::MapSettings;
use crate::utils::error::{Result, SurveyError};
use colormap::{diverging, ContourBands};
use glyphs::GlyphBackend;
use plotters::coord::{ReverseCoordTranslate, Shift};
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_backend::DrawingBackend;
use std::path::{Path, PathBuf};

const TITLE_PT: f64 = 16.0;
const AXIS_DESC_PT: f64 = 12.0;
const TICK_LABEL_PT: f64 = 10.0;
const MARKER_RADIUS_PT: f64 = 3.0;
const MARGIN_PT: f64 = 12.0;
/// Share of the figure width given to the map; the rest holds the colorbar.
const MAP_WIDTH_SHARE: f64 = 0.84;

/// A rendered map held as packed 8-bit RGB rows.
#[derive(Debug, Clone)]
pub struct AnomalyMap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    summary: GridSummary,
    stations: usize,
}

impl AnomalyMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn summary(&self) -> &GridSummary {
        &self.summary
    }

    pub fn station_count(&self) -> usize {
        self.stations
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// Writes the map as PNG. The image is encoded to a sibling temporary file
    /// first and renamed over `path`, so a failed write leaves `path` untouched.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let target = path.display().to_string();
        let tmp = temp_sibling(path);

        let written = {
            let mut backend = BitMapBackend::new(&tmp, (self.width, self.height));
            backend
                .blit_bitmap((0, 0), (self.width, self.height), &self.pixels)
                .and_then(|_| backend.present())
        };

        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(SurveyError::output(target, e));
        }

        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            SurveyError::output(target.clone(), e)
        })?;

        tracing::debug!("Wrote {}x{} PNG to {}", self.width, self.height, target);
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_string());
    let name = format!(".{}.{}.partial.png", stem, std::process::id());
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

/// Renders `grid` as filled contour bands with `stations` overlaid.
pub fn render_anomaly_map(
    stations: &[SamplePoint],
    grid: &InterpolationGrid,
    settings: &MapSettings,
) -> Result<AnomalyMap> {
    let (width, height) = settings.image_size();
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| SurveyError::render(format!("{}x{} image is too large", width, height)))?;

    for label in [
        &settings.title,
        &settings.x_label,
        &settings.y_label,
        &settings.colorbar_label,
    ] {
        let missing = glyphs::missing_glyphs(label);
        if !missing.is_empty() {
            tracing::warn!("No glyph for {:?} in label '{}'; drawn as blanks", missing, label);
        }
    }

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).map_err(|e| {
        SurveyError::render(format!("cannot allocate {}x{} image: {}", width, height, e))
    })?;
    pixels.resize(len, 255u8);

    {
        let backend = BitMapBackend::with_buffer(&mut pixels, (width, height));
        let root = GlyphBackend::new(backend).into_drawing_area();
        draw_map(&root, stations, grid, settings).map_err(SurveyError::render)?;
        root.present().map_err(SurveyError::render)?;
    }

    tracing::debug!(
        "Rendered {}x{} map with {} stations",
        width,
        height,
        stations.len()
    );

    Ok(AnomalyMap {
        width,
        height,
        pixels,
        summary: grid.summary(),
        stations: stations.len(),
    })
}

fn font(settings: &MapSettings, points: f64) -> FontDesc<'static> {
    FontDesc::new(
        FontFamily::SansSerif,
        settings.points_to_pixels(points),
        FontStyle::Normal,
    )
}

fn px(settings: &MapSettings, points: f64) -> u32 {
    settings.points_to_pixels(points).round().max(1.0) as u32
}

/// Widens a zero-length axis so the chart still has a span.
fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        let pad = (lo.abs() * 0.01).max(0.5);
        (lo - pad, hi + pad)
    }
}

/// Tick text with enough decimals to tell neighbouring ticks apart.
fn format_tick(value: f64, span: f64, ticks: usize) -> String {
    let step = span / ticks.max(1) as f64;
    let decimals = if step > 0.0 && step.is_finite() {
        (1.0 - step.log10().floor()).clamp(0.0, 6.0) as usize
    } else {
        2
    };
    format!("{:.*}", decimals, value)
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn draw_map<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    stations: &[SamplePoint],
    grid: &InterpolationGrid,
    settings: &MapSettings,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let body = root.titled(&settings.title, font(settings, TITLE_PT).color(&BLACK))?;
    let (width, _) = body.dim_in_pixel();
    let (map_area, bar_area) = body.split_horizontally((width as f64 * MAP_WIDTH_SHARE) as u32);

    let station_range = value_range(stations.iter().map(|s| s.value));
    let grid_range = grid.value_range().or(station_range).unwrap_or((0.0, 0.0));
    let bands = ContourBands::new(grid_range.0, grid_range.1, settings.contour_levels);

    let x_bounds = match (grid.xs.first(), grid.xs.last()) {
        (Some(&lo), Some(&hi)) => padded_range(lo, hi),
        _ => padded_range(0.0, 0.0),
    };
    let y_bounds = match (grid.ys.first(), grid.ys.last()) {
        (Some(&lo), Some(&hi)) => padded_range(lo, hi),
        _ => padded_range(0.0, 0.0),
    };

    let mut chart = ChartBuilder::on(&map_area)
        .margin(px(settings, MARGIN_PT))
        .x_label_area_size(px(settings, 36.0))
        .y_label_area_size(px(settings, 84.0))
        .build_cartesian_2d(x_bounds.0..x_bounds.1, y_bounds.0..y_bounds.1)?;

    // Contour fill: every plot pixel takes the band of its nearest grid node.
    let (px_range, py_range) = chart.plotting_area().get_pixel_range();
    let coords = chart.as_coord_spec();
    let columns: Vec<Option<usize>> = px_range
        .clone()
        .map(|x| {
            coords
                .reverse_translate((x, py_range.start))
                .and_then(|(gx, _)| grid.nearest_x(gx))
        })
        .collect();
    let rows: Vec<Option<usize>> = py_range
        .clone()
        .map(|y| {
            coords
                .reverse_translate((px_range.start, y))
                .and_then(|(_, gy)| grid.nearest_y(gy))
        })
        .collect();

    for (row, y) in rows.iter().zip(py_range.clone()) {
        let Some(iy) = *row else { continue };
        for (column, x) in columns.iter().zip(px_range.clone()) {
            let Some(ix) = *column else { continue };
            if let Some(value) = grid.value(ix, iy) {
                root.draw_pixel((x, y), &bands.color(value))?;
            }
        }
    }

    let x_span = x_bounds.1 - x_bounds.0;
    let y_span = y_bounds.1 - y_bounds.0;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(6)
        .y_labels(6)
        .x_desc(settings.x_label.as_str())
        .y_desc(settings.y_label.as_str())
        .x_label_formatter(&|v| format_tick(*v, x_span, 6))
        .y_label_formatter(&|v| format_tick(*v, y_span, 6))
        .label_style(font(settings, TICK_LABEL_PT).color(&BLACK))
        .axis_desc_style(font(settings, AXIS_DESC_PT).color(&BLACK))
        .draw()?;

    // Station markers on their own colour scale.
    let radius = px(settings, MARKER_RADIUS_PT);
    let (s_lo, s_hi) = station_range.unwrap_or((0.0, 0.0));
    let marker_color = |v: f64| {
        if s_hi > s_lo {
            diverging((v - s_lo) / (s_hi - s_lo))
        } else {
            diverging(0.5)
        }
    };
    chart.draw_series(
        stations
            .iter()
            .map(|s| Circle::new((s.x, s.y), radius, marker_color(s.value).filled())),
    )?;
    chart.draw_series(
        stations
            .iter()
            .map(|s| Circle::new((s.x, s.y), radius, BLACK.stroke_width(1))),
    )?;

    draw_colorbar(&bar_area, &bands, settings)?;

    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    bands: &ContourBands,
    settings: &MapSettings,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (lo, hi) = padded_range(bands.range().0, bands.range().1);
    let flat = bands.range().1 <= bands.range().0;

    let mut bar = ChartBuilder::on(area)
        .margin_top(px(settings, MARGIN_PT))
        .margin_bottom(px(settings, MARGIN_PT + 36.0))
        .margin_left(px(settings, 4.0))
        .margin_right(px(settings, MARGIN_PT))
        .right_y_label_area_size(px(settings, 64.0))
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(8)
        .y_desc(settings.colorbar_label.as_str())
        .y_label_formatter(&|v| format_tick(*v, hi - lo, 8))
        .label_style(font(settings, TICK_LABEL_PT).color(&BLACK))
        .axis_desc_style(font(settings, AXIS_DESC_PT).color(&BLACK))
        .draw()?;

    if flat {
        let color = bands.band_color(bands.levels() / 2);
        bar.draw_series(std::iter::once(Rectangle::new(
            [(0.0, lo), (1.0, hi)],
            color.filled(),
        )))?;
    } else {
        bar.draw_series((0..bands.levels()).map(|k| {
            let (b_lo, b_hi) = bands.bounds(k);
            Rectangle::new([(0.0, b_lo), (1.0, b_hi)], bands.band_color(k).filled())
        }))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interpolation::{interpolate_grid, GridSpec};

    fn small_settings() -> MapSettings {
        MapSettings {
            dpi: 30,
            ..MapSettings::default()
        }
    }

    fn stations() -> Vec<SamplePoint> {
        vec![
            SamplePoint::new(0.0, 0.0, -20.0),
            SamplePoint::new(100.0, 0.0, 0.0),
            SamplePoint::new(100.0, 80.0, 25.0),
            SamplePoint::new(0.0, 80.0, 5.0),
            SamplePoint::new(45.0, 35.0, -3.0),
        ]
    }

    fn count_where(map: &AnomalyMap, f: impl Fn([u8; 3]) -> bool) -> usize {
        map.pixels().chunks_exact(3).filter(|p| f([p[0], p[1], p[2]])).count()
    }

    #[test]
    fn test_image_size_follows_inches_and_dpi() {
        let samples = stations();
        let grid = interpolate_grid(&samples, &GridSpec { resolution: 40 }).unwrap();
        let map = render_anomaly_map(&samples, &grid, &small_settings()).unwrap();

        assert_eq!((map.width(), map.height()), (300, 240));
        assert_eq!(map.pixels().len(), 300 * 240 * 3);
        assert_eq!(map.station_count(), 5);
        assert_eq!(map.summary().defined, 40 * 40);
    }

    #[test]
    fn test_map_contains_both_ends_of_the_ramp() {
        let samples = stations();
        let grid = interpolate_grid(&samples, &GridSpec { resolution: 60 }).unwrap();
        let map = render_anomaly_map(&samples, &grid, &small_settings()).unwrap();

        let reddish = count_where(&map, |p| p[0] as i32 - p[2] as i32 > 60);
        let bluish = count_where(&map, |p| p[2] as i32 - p[0] as i32 > 60);
        assert!(reddish > 100, "reddish = {reddish}");
        assert!(bluish > 100, "bluish = {bluish}");
    }

    #[test]
    fn test_undefined_grid_still_renders() {
        let samples = vec![SamplePoint::new(1.0, 1.0, 3.0), SamplePoint::new(2.0, 2.0, 4.0)];
        let grid = interpolate_grid(&samples, &GridSpec { resolution: 20 }).unwrap();
        let map = render_anomaly_map(&samples, &grid, &small_settings()).unwrap();

        assert_eq!(map.summary().defined, 0);
        assert_eq!(map.pixel(0, 0), Some([255, 255, 255]));
        assert_eq!(map.pixel(300, 0), None);
    }

    #[test]
    fn test_unaddressable_figure_is_a_render_error() {
        let samples = vec![SamplePoint::new(1.0, 1.0, 3.0), SamplePoint::new(2.0, 2.0, 4.0)];
        let grid = interpolate_grid(&samples, &GridSpec { resolution: 4 }).unwrap();
        let settings = MapSettings {
            dpi: u32::MAX,
            width_in: 1e9,
            height_in: 1e9,
            ..MapSettings::default()
        };

        let err = render_anomaly_map(&samples, &grid, &settings).unwrap_err();
        assert!(matches!(err, SurveyError::RenderError { .. }));
    }

    #[test]
    fn test_save_png_writes_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomaly.png");
        let samples = stations();
        let grid = interpolate_grid(&samples, &GridSpec { resolution: 20 }).unwrap();
        let map = render_anomaly_map(&samples, &grid, &small_settings()).unwrap();

        map.save_png(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_png_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("anomaly.png");
        let samples = stations();
        let grid = interpolate_grid(&samples, &GridSpec { resolution: 10 }).unwrap();
        let map = render_anomaly_map(&samples, &grid, &small_settings()).unwrap();

        let err = map.save_png(&path).unwrap_err();
        assert!(matches!(err, SurveyError::OutputError { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_tick_precision_follows_span() {
        assert_eq!(format_tick(6_290_123.4, 800.0, 6), "6290123");
        assert_eq!(format_tick(-70.654321, 0.9, 6), "-70.65");
        assert_eq!(format_tick(1.5, 0.0, 6), "1.50");
    }
}
