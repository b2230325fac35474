//! Chart Plotter Module
//! Draws the interactive dashboard charts with egui_plot and the egui painter.

use crate::charts::treemap::{self, TileRect};
use crate::charts::Palette;
use crate::data::{HierarchyTotal, LabelTotal, MonthlyTotal, ScatterPoint};
use egui::{Align2, Color32, FontId, Pos2, RichText, Sense, Shape, Stroke};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoint, PlotPoints, Points, Text};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

const CHART_HEIGHT: f32 = 320.0;
const DONUT_HOLE: f64 = 0.5;
const MIN_MARKER: f64 = 3.0;
const MAX_MARKER: f64 = 15.0;

/// One slice of the country donut; angles in radians, clockwise from 12 o'clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub sales: f64,
    pub fraction: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Slice {
    pub fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }

    /// "percent+label" text.
    pub fn caption(&self) -> String {
        format!("{}\n{:.1}%", self.label, self.fraction * 100.0)
    }
}

/// Creates the dashboard visualizations.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Split positive totals into donut slices. Empty when nothing is positive.
    pub fn slices(totals: &[LabelTotal]) -> Vec<Slice> {
        let total: f64 = totals.iter().filter(|t| t.sales > 0.0).map(|t| t.sales).sum();
        if total <= 0.0 {
            return Vec::new();
        }

        let mut angle = 0.0;
        totals
            .iter()
            .filter(|t| t.sales > 0.0)
            .map(|t| {
                let fraction = t.sales / total;
                let start_angle = angle;
                angle += fraction * TAU;
                Slice {
                    label: t.label.clone(),
                    sales: t.sales,
                    fraction,
                    start_angle,
                    end_angle: angle,
                }
            })
            .collect()
    }

    /// Point on a circle for a clockwise-from-top angle, in screen coordinates (y down).
    pub fn polar(center: (f64, f64), radius: f64, angle: f64) -> (f64, f64) {
        let theta = angle - FRAC_PI_2;
        (center.0 + radius * theta.cos(), center.1 + radius * theta.sin())
    }

    /// Scatter marker radius: quantity scaled linearly into the marker range.
    pub fn marker_radius(quantity: f64, max_quantity: f64) -> f64 {
        if max_quantity <= 0.0 || quantity <= 0.0 {
            return MIN_MARKER;
        }
        MIN_MARKER + (quantity / max_quantity).min(1.0) * (MAX_MARKER - MIN_MARKER)
    }

    /// "$1,234.56"
    pub fn currency(value: f64) -> String {
        let formatted = format!("{:.2}", value.abs());
        let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if value < 0.0 { "-" } else { "" };
        format!("{}${}.{}", sign, grouped, cents)
    }

    /// Axis label for an integer tick, empty between ticks.
    pub fn label_at(labels: &[String], value: f64) -> String {
        let index = value.round();
        if (value - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        labels.get(index as usize).cloned().unwrap_or_default()
    }

    fn no_data(ui: &mut egui::Ui) {
        ui.add_sized(
            [ui.available_width(), 60.0],
            egui::Label::new(RichText::new("No data for the current filters").color(Color32::GRAY)),
        );
    }

    /// Category bar chart with dollar labels above each bar.
    pub fn draw_category_bar(ui: &mut egui::Ui, totals: &[LabelTotal], palette: &Palette) {
        if totals.is_empty() {
            Self::no_data(ui);
            return;
        }

        let labels: Vec<String> = totals.iter().map(|t| t.label.clone()).collect();
        let bars: Vec<Bar> = totals
            .iter()
            .enumerate()
            .map(|(i, t)| Bar::new(i as f64, t.sales).width(0.6).name(&t.label))
            .collect();
        let color = palette.bar_color().to_color32();

        Plot::new("category_sales")
            .height(CHART_HEIGHT)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label("Category")
            .y_axis_label("Sales Amount")
            .include_y(0.0)
            .x_axis_formatter(move |mark, _range| Self::label_at(&labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(color));
                for (i, t) in totals.iter().enumerate() {
                    plot_ui.text(
                        Text::new(PlotPoint::new(i as f64, t.sales), Self::currency(t.sales))
                            .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            });
    }

    /// Country donut chart, labelled with percent and name.
    pub fn draw_country_donut(ui: &mut egui::Ui, totals: &[LabelTotal], palette: &Palette) {
        let slices = Self::slices(totals);
        if slices.is_empty() {
            Self::no_data(ui);
            return;
        }

        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), CHART_HEIGHT),
            Sense::hover(),
        );
        let painter = ui.painter_at(rect);
        let center = (rect.center().x as f64, rect.center().y as f64);
        let outer = (rect.width().min(rect.height()) as f64) * 0.45;
        let inner = outer * DONUT_HOLE;

        let to_pos = |(x, y): (f64, f64)| Pos2::new(x as f32, y as f32);

        for (i, slice) in slices.iter().enumerate() {
            let color = palette.slice_color(i);
            // Ring sectors are concave; fill them as thin convex quads.
            let steps = ((slice.end_angle - slice.start_angle) / 0.05).ceil().max(1.0) as usize;
            let step = (slice.end_angle - slice.start_angle) / steps as f64;
            for s in 0..steps {
                let a0 = slice.start_angle + s as f64 * step;
                let a1 = a0 + step;
                painter.add(Shape::convex_polygon(
                    vec![
                        to_pos(Self::polar(center, outer, a0)),
                        to_pos(Self::polar(center, outer, a1)),
                        to_pos(Self::polar(center, inner, a1)),
                        to_pos(Self::polar(center, inner, a0)),
                    ],
                    color.to_color32(),
                    Stroke::NONE,
                ));
            }

            if slice.fraction >= 0.03 {
                painter.text(
                    to_pos(Self::polar(center, (outer + inner) / 2.0, slice.mid_angle())),
                    Align2::CENTER_CENTER,
                    slice.caption(),
                    FontId::proportional(11.0),
                    color.contrasting_text().to_color32(),
                );
            }
        }

        if let Some(pointer) = response.hover_pos() {
            let dx = (pointer.x as f64) - center.0;
            let dy = (pointer.y as f64) - center.1;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance >= inner && distance <= outer {
                let angle = (dy.atan2(dx) + FRAC_PI_2).rem_euclid(TAU);
                if let Some(slice) = slices
                    .iter()
                    .find(|s| angle >= s.start_angle && angle < s.end_angle)
                {
                    response.on_hover_text(format!(
                        "{}: {} ({:.1}%)",
                        slice.label,
                        Self::currency(slice.sales),
                        slice.fraction * 100.0
                    ));
                }
            }
        }
    }

    /// Monthly sales line.
    pub fn draw_time_series(ui: &mut egui::Ui, monthly: &[MonthlyTotal], palette: &Palette) {
        if monthly.is_empty() {
            Self::no_data(ui);
            return;
        }

        let labels: Vec<String> = monthly.iter().map(|m| m.label()).collect();
        let points: Vec<[f64; 2]> = monthly
            .iter()
            .enumerate()
            .map(|(i, m)| [i as f64, m.sales])
            .collect();
        let color = palette.line_color().to_color32();

        Plot::new("time_series")
            .height(CHART_HEIGHT + 80.0)
            .allow_scroll(false)
            .x_axis_label("month_year")
            .y_axis_label("Amount")
            .x_axis_formatter(move |mark, _range| Self::label_at(&labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(color)
                        .width(2.0)
                        .name("Sales"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(2.5)
                        .color(color),
                );
            });
    }

    /// Month labels across, sales beneath: the series laid out as a wide table.
    pub fn draw_time_series_table(ui: &mut egui::Ui, monthly: &[MonthlyTotal]) {
        let max = monthly.iter().map(|m| m.sales).fold(0.0, f64::max);

        egui::ScrollArea::horizontal()
            .id_salt("time_series_table")
            .show(ui, |ui| {
                egui::Grid::new("time_series_grid")
                    .striped(true)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("month_year").strong());
                        for m in monthly {
                            ui.label(RichText::new(m.label()).strong().size(11.0));
                        }
                        ui.end_row();

                        ui.label(RichText::new("Sales").strong());
                        for m in monthly {
                            // Light-to-dark blue with the value.
                            let t = if max > 0.0 { (m.sales / max).clamp(0.0, 1.0) } else { 0.0 };
                            let shade = (235.0 - t * 160.0) as u8;
                            ui.label(
                                RichText::new(format!("{:.2}", m.sales))
                                    .size(11.0)
                                    .background_color(Color32::from_rgb(shade, shade, 255)),
                            );
                        }
                        ui.end_row();
                    });
            });
    }

    /// Region -> Category -> Sub-Category treemap, coloured by sub-category.
    pub fn draw_treemap(ui: &mut egui::Ui, hierarchy: &[HierarchyTotal], palette: &Palette) {
        let tiles = treemap::layout(hierarchy);
        if tiles.is_empty() {
            Self::no_data(ui);
            return;
        }

        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), CHART_HEIGHT * 2.0),
            Sense::hover(),
        );
        let painter = ui.painter_at(rect);
        let to_rect = |t: &TileRect| {
            egui::Rect::from_min_size(
                Pos2::new(
                    rect.min.x + (t.x as f32) * rect.width(),
                    rect.min.y + (t.y as f32) * rect.height(),
                ),
                egui::vec2((t.w as f32) * rect.width(), (t.h as f32) * rect.height()),
            )
        };

        for tile in tiles.iter().filter(|t| t.depth == 2) {
            let area = to_rect(&tile.rect);
            let color = palette.treemap_color(tile.color_index.unwrap_or(0));
            painter.rect_filled(area, 0.0, color.to_color32());
            painter.rect_stroke(area, 0.0, Stroke::new(1.0, Color32::WHITE));
            if area.width() > 60.0 && area.height() > 30.0 {
                painter.with_clip_rect(area).text(
                    area.center(),
                    Align2::CENTER_CENTER,
                    format!("{}\n{}", tile.label, Self::currency(tile.sales)),
                    FontId::proportional(11.0),
                    color.contrasting_text().to_color32(),
                );
            }
        }

        for tile in tiles.iter().filter(|t| t.depth < 2) {
            let area = to_rect(&tile.rect);
            let width = if tile.depth == 0 { 3.0 } else { 1.5 };
            painter.rect_stroke(area, 0.0, Stroke::new(width, Color32::from_gray(40)));
            if tile.depth == 0 && area.width() > 40.0 {
                painter.with_clip_rect(area).text(
                    area.left_top() + egui::vec2(4.0, 2.0),
                    Align2::LEFT_TOP,
                    &tile.label,
                    FontId::proportional(13.0),
                    Color32::BLACK,
                );
            }
        }

        if let Some(pointer) = response.hover_pos() {
            let hovered: Vec<String> = tiles
                .iter()
                .filter(|t| to_rect(&t.rect).contains(pointer))
                .map(|t| t.label.clone())
                .collect();
            if let Some(leaf) = tiles
                .iter()
                .rev()
                .find(|t| to_rect(&t.rect).contains(pointer))
            {
                response.on_hover_text(format!(
                    "{}\nSales: {}",
                    hovered.join(" / "),
                    Self::currency(leaf.sales)
                ));
            }
        }
    }

    /// Sales vs Profit, marker size by Quantity.
    pub fn draw_scatter(ui: &mut egui::Ui, points: &[ScatterPoint], palette: &Palette) {
        if points.is_empty() {
            Self::no_data(ui);
            return;
        }

        let max_quantity = points.iter().map(|p| p.quantity).fold(0.0, f64::max);
        // One Points item per marker size keeps the plot item count small.
        let mut by_radius: BTreeMap<u32, Vec<[f64; 2]>> = BTreeMap::new();
        for p in points {
            let radius = Self::marker_radius(p.quantity, max_quantity).round() as u32;
            by_radius.entry(radius).or_default().push([p.sales, p.profit]);
        }
        let color = palette.scatter_color().to_color32().gamma_multiply(0.6);

        Plot::new("sales_vs_profit")
            .height(CHART_HEIGHT + 80.0)
            .allow_scroll(false)
            .x_axis_label("Sales")
            .y_axis_label("Profit")
            .show(ui, |plot_ui| {
                for (radius, series) in by_radius {
                    plot_ui.points(
                        Points::new(PlotPoints::from(series))
                            .radius(radius as f32)
                            .color(color),
                    );
                }
            });
    }
}
