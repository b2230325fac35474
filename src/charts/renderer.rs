//! Static Chart Renderer
//! Writes the five dashboard charts as PNG files with the plotters bitmap backend.
//!
//! Files produced by `render_all`:
//! 1. category_sales.png - bar chart, dollar label over each bar
//! 2. country_sales.png - donut, percent and country on each slice
//! 3. time_series.png - monthly sales line
//! 4. treemap.png - Region / Category / Sub-Category
//! 5. sales_vs_profit.png - scatter, marker size by Quantity

use crate::charts::plotter::ChartPlotter;
use crate::charts::treemap;
use crate::charts::Palette;
use crate::dashboard::DashboardViews;
use crate::data::{HierarchyTotal, LabelTotal, MonthlyTotal, ScatterPoint};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CATEGORY_CHART_FILE: &str = "category_sales.png";
pub const COUNTRY_CHART_FILE: &str = "country_sales.png";
pub const TIME_SERIES_CHART_FILE: &str = "time_series.png";
pub const TREEMAP_CHART_FILE: &str = "treemap.png";
pub const SCATTER_CHART_FILE: &str = "sales_vs_profit.png";

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn draw_err<E: Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Axis range covering `values` and zero, padded by 10% and never empty.
pub fn value_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((max - min) * 0.1).max(1.0);
    (if min < 0.0 { min - pad } else { 0.0 }, max + pad)
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart for `views` into `dir`, creating it when missing.
    pub fn render_all(
        views: &DashboardViews,
        palette: &Palette,
        dir: &Path,
        size: (u32, u32),
    ) -> Result<Vec<PathBuf>, RenderError> {
        std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let paths = vec![
            dir.join(CATEGORY_CHART_FILE),
            dir.join(COUNTRY_CHART_FILE),
            dir.join(TIME_SERIES_CHART_FILE),
            dir.join(TREEMAP_CHART_FILE),
            dir.join(SCATTER_CHART_FILE),
        ];
        Self::render_category_bar(&paths[0], &views.categories, palette, size)?;
        Self::render_country_donut(&paths[1], &views.countries, palette, size)?;
        Self::render_time_series(&paths[2], &views.monthly, palette, size)?;
        Self::render_treemap(&paths[3], &views.hierarchy, palette, size)?;
        Self::render_scatter(&paths[4], &views.scatter, palette, size)?;

        info!(dir = %dir.display(), charts = paths.len(), "charts written");
        Ok(paths)
    }

    fn no_data<DB: DrawingBackend>(
        area: &DrawingArea<DB, plotters::coord::Shift>,
    ) -> Result<(), RenderError> {
        let (w, h) = area.dim_in_pixel();
        let style = (FONT, 20)
            .into_font()
            .color(&RGBColor(128, 128, 128))
            .pos(Pos::new(HPos::Center, VPos::Center));
        area.draw(&Text::new(
            "No data for the current filters",
            (w as i32 / 2, h as i32 / 2),
            style,
        ))
        .map_err(draw_err)
    }

    pub fn render_category_bar(
        path: &Path,
        totals: &[LabelTotal],
        palette: &Palette,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let area = root.titled("Category wise Sales", (FONT, 24)).map_err(draw_err)?;
        if totals.is_empty() {
            Self::no_data(&area)?;
            return root.present().map_err(draw_err);
        }

        let labels: Vec<String> = totals.iter().map(|t| t.label.clone()).collect();
        let (y_min, y_max) = value_range(totals.iter().map(|t| t.sales));
        let x_max = totals.len() as f64 - 0.5;
        let color = palette.bar_color().to_plotters();

        let mut chart = ChartBuilder::on(&area)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..x_max, y_min..y_max)
            .map_err(draw_err)?;

        let x_labels = |x: &f64| ChartPlotter::label_at(&labels, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(totals.len() * 2 + 1)
            .x_label_formatter(&x_labels)
            .x_desc("Category")
            .y_desc("Sales Amount")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(totals.iter().enumerate().map(|(i, t)| {
                let x = i as f64;
                Rectangle::new([(x - 0.3, 0.0), (x + 0.3, t.sales)], color.filled())
            }))
            .map_err(draw_err)?;

        let label_style = (FONT, 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(totals.iter().enumerate().map(|(i, t)| {
                Text::new(
                    ChartPlotter::currency(t.sales),
                    (i as f64, t.sales),
                    label_style.clone(),
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    pub fn render_country_donut(
        path: &Path,
        totals: &[LabelTotal],
        palette: &Palette,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let area = root.titled("Country wise Sales", (FONT, 24)).map_err(draw_err)?;

        let slices = ChartPlotter::slices(totals);
        if slices.is_empty() {
            Self::no_data(&area)?;
            return root.present().map_err(draw_err);
        }

        let (w, h) = area.dim_in_pixel();
        let center = (w as f64 / 2.0, h as f64 / 2.0);
        let outer = (w.min(h) as f64) * 0.42;
        let inner = outer * 0.5;
        let to_px = |(x, y): (f64, f64)| (x.round() as i32, y.round() as i32);

        for (i, slice) in slices.iter().enumerate() {
            let color = palette.slice_color(i);
            let steps = ((slice.end_angle - slice.start_angle) / 0.02).ceil().max(1.0) as usize;
            let step = (slice.end_angle - slice.start_angle) / steps as f64;

            let mut ring: Vec<(i32, i32)> = (0..=steps)
                .map(|s| {
                    to_px(ChartPlotter::polar(center, outer, slice.start_angle + s as f64 * step))
                })
                .collect();
            ring.extend((0..=steps).rev().map(|s| {
                to_px(ChartPlotter::polar(center, inner, slice.start_angle + s as f64 * step))
            }));
            area.draw(&Polygon::new(ring, color.to_plotters().filled()))
                .map_err(draw_err)?;

            if slice.fraction >= 0.03 {
                let at = to_px(ChartPlotter::polar(
                    center,
                    (outer + inner) / 2.0,
                    slice.mid_angle(),
                ));
                let style = (FONT, 13)
                    .into_font()
                    .color(&color.contrasting_text().to_plotters())
                    .pos(Pos::new(HPos::Center, VPos::Bottom));
                area.draw(&Text::new(slice.label.clone(), at, style))
                    .map_err(draw_err)?;
                let style = (FONT, 13)
                    .into_font()
                    .color(&color.contrasting_text().to_plotters())
                    .pos(Pos::new(HPos::Center, VPos::Top));
                area.draw(&Text::new(
                    format!("{:.1}%", slice.fraction * 100.0),
                    at,
                    style,
                ))
                .map_err(draw_err)?;
            }
        }

        root.present().map_err(draw_err)
    }

    pub fn render_time_series(
        path: &Path,
        monthly: &[MonthlyTotal],
        palette: &Palette,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let area = root
            .titled("Time Series Analysis", (FONT, 24))
            .map_err(draw_err)?;
        if monthly.is_empty() {
            Self::no_data(&area)?;
            return root.present().map_err(draw_err);
        }

        let labels: Vec<String> = monthly.iter().map(|m| m.label()).collect();
        let (y_min, y_max) = value_range(monthly.iter().map(|m| m.sales));
        let x_max = (monthly.len() as f64 - 1.0).max(1.0);
        let color = palette.line_color().to_plotters();

        let mut chart = ChartBuilder::on(&area)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..x_max + 0.5, y_min..y_max)
            .map_err(draw_err)?;

        let x_labels = |x: &f64| ChartPlotter::label_at(&labels, *x);
        chart
            .configure_mesh()
            .x_labels((monthly.len() * 2 + 1).min(50))
            .x_label_formatter(&x_labels)
            .x_desc("month_year")
            .y_desc("Amount")
            .draw()
            .map_err(draw_err)?;

        let points: Vec<(f64, f64)> = monthly
            .iter()
            .enumerate()
            .map(|(i, m)| (i as f64, m.sales))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(draw_err)?;
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    pub fn render_treemap(
        path: &Path,
        hierarchy: &[HierarchyTotal],
        palette: &Palette,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let area = root
            .titled("Hierarchical view of Sales using TreeMap", (FONT, 24))
            .map_err(draw_err)?;

        let tiles = treemap::layout(hierarchy);
        if tiles.is_empty() {
            Self::no_data(&area)?;
            return root.present().map_err(draw_err);
        }

        let area = area.margin(10, 10, 10, 10);
        let (w, h) = area.dim_in_pixel();
        let corners = |t: &treemap::TileRect| {
            let x0 = (t.x * w as f64).round() as i32;
            let y0 = (t.y * h as f64).round() as i32;
            let x1 = ((t.x + t.w) * w as f64).round() as i32;
            let y1 = ((t.y + t.h) * h as f64).round() as i32;
            ((x0, y0), (x1, y1))
        };

        for tile in tiles.iter().filter(|t| t.depth == 2) {
            let (top_left, bottom_right) = corners(&tile.rect);
            let color = palette.treemap_color(tile.color_index.unwrap_or(0));
            area.draw(&Rectangle::new([top_left, bottom_right], color.to_plotters().filled()))
                .map_err(draw_err)?;
            area.draw(&Rectangle::new([top_left, bottom_right], WHITE.stroke_width(1)))
                .map_err(draw_err)?;

            if bottom_right.0 - top_left.0 > 80 && bottom_right.1 - top_left.1 > 36 {
                let center = (
                    (top_left.0 + bottom_right.0) / 2,
                    (top_left.1 + bottom_right.1) / 2,
                );
                let text = color.contrasting_text().to_plotters();
                area.draw(&Text::new(
                    tile.label.clone(),
                    center,
                    (FONT, 13).into_font().color(&text).pos(Pos::new(HPos::Center, VPos::Bottom)),
                ))
                .map_err(draw_err)?;
                area.draw(&Text::new(
                    ChartPlotter::currency(tile.sales),
                    center,
                    (FONT, 12).into_font().color(&text).pos(Pos::new(HPos::Center, VPos::Top)),
                ))
                .map_err(draw_err)?;
            }
        }

        let border = RGBColor(40, 40, 40);
        for tile in tiles.iter().filter(|t| t.depth < 2) {
            let (top_left, bottom_right) = corners(&tile.rect);
            let width = if tile.depth == 0 { 3 } else { 1 };
            area.draw(&Rectangle::new([top_left, bottom_right], border.stroke_width(width)))
                .map_err(draw_err)?;
            if tile.depth == 0 && bottom_right.0 - top_left.0 > 50 {
                area.draw(&Text::new(
                    tile.label.clone(),
                    (top_left.0 + 5, top_left.1 + 4),
                    (FONT, 16).into_font().color(&BLACK),
                ))
                .map_err(draw_err)?;
            }
        }

        root.present().map_err(draw_err)
    }

    pub fn render_scatter(
        path: &Path,
        points: &[ScatterPoint],
        palette: &Palette,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let area = root
            .titled("Relationship between Sales and Profits using Scatter Plot", (FONT, 22))
            .map_err(draw_err)?;
        if points.is_empty() {
            Self::no_data(&area)?;
            return root.present().map_err(draw_err);
        }

        let (x_min, x_max) = value_range(points.iter().map(|p| p.sales));
        let (y_min, y_max) = value_range(points.iter().map(|p| p.profit));
        let max_quantity = points.iter().map(|p| p.quantity).fold(0.0, f64::max);
        let color = palette.scatter_color().to_plotters();

        let mut chart = ChartBuilder::on(&area)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Sales")
            .y_desc("Profit")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(points.iter().map(|p| {
                let radius = ChartPlotter::marker_radius(p.quantity, max_quantity).round() as u32;
                Circle::new((p.sales, p.profit), radius, color.mix(0.6).filled())
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_always_includes_zero() {
        assert_eq!(value_range([10.0, 40.0]), (0.0, 44.0));

        let (lo, hi) = value_range([-20.0, 30.0]);
        assert_eq!(lo, -25.0);
        assert_eq!(hi, 35.0);
    }

    #[test]
    fn range_is_never_empty() {
        assert_eq!(value_range(std::iter::empty()), (0.0, 1.0));
        assert_eq!(value_range([0.0, f64::NAN]), (0.0, 1.0));
    }

    #[test]
    fn unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let totals = vec![LabelTotal {
            label: "Furniture".to_string(),
            sales: 10.0,
        }];
        let result = StaticChartRenderer::render_category_bar(
            &blocker.join("nested").join(CATEGORY_CHART_FILE),
            &totals,
            &Palette::default(),
            (320, 240),
        );
        assert!(result.is_err());
    }
}
