//! Charts module - Chart rendering

mod palette;
mod plotter;
mod renderer;
pub mod treemap;

pub use palette::{Palette, Rgb};
pub use plotter::{ChartPlotter, Slice};
pub use renderer::{
    value_range, RenderError, StaticChartRenderer, CATEGORY_CHART_FILE, COUNTRY_CHART_FILE,
    SCATTER_CHART_FILE, TIME_SERIES_CHART_FILE, TREEMAP_CHART_FILE,
};
