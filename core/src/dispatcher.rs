// Dataset dispatcher
//
// Pure mapping from a SelectionKey to the description and chart shown for it.
// Each branch is a fixed table entry; there is no fallback branch.

use crate::chart::{BarMode, Channel, ChartKind, ChartSpec, DisplayParams, Marginal};
use crate::dataset::SelectionKey;
use crate::palette;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What the page shows for one selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetView {
    pub key: SelectionKey,
    /// Markdown
    pub description: String,
    pub chart: ChartSpec,
}

/// Build the view for a known key
pub fn dispatch(key: SelectionKey) -> DatasetView {
    let chart = match key {
        SelectionKey::Gapminder => gapminder(),
        SelectionKey::Iris => iris(),
        SelectionKey::Tips => tips(),
        SelectionKey::Election => election(),
        SelectionKey::Wind => wind(),
        SelectionKey::Carshare => carshare(),
    };
    debug!(target: "dispatcher", key = %key, kind = chart.kind.as_str(), "Dispatched selection");

    DatasetView {
        key,
        description: key.info().description(),
        chart: with_common(chart),
    }
}

/// Chart kind drawn for a key, without building the view
pub fn chart_kind(key: SelectionKey) -> ChartKind {
    match key {
        SelectionKey::Gapminder => ChartKind::Scatter,
        SelectionKey::Iris => ChartKind::DensityContour,
        SelectionKey::Tips => ChartKind::GroupedBar,
        SelectionKey::Election => ChartKind::TernaryScatter,
        SelectionKey::Wind => ChartKind::PolarScatter,
        SelectionKey::Carshare => ChartKind::GeoScatter,
    }
}

/// Validate a raw selection value and build its view.
///
/// Unknown values are refused with `DashError::UnknownSelection`; no chart is
/// produced for them.
pub fn dispatch_str(raw: &str) -> Result<DatasetView> {
    match raw.parse::<SelectionKey>() {
        Ok(key) => Ok(dispatch(key)),
        Err(e) => {
            warn!(target: "dispatcher", value = %raw, "Refusing unknown selection");
            Err(e)
        }
    }
}

// Applied to every chart
fn with_common(mut chart: ChartSpec) -> ChartSpec {
    chart.params.y_automargin = true;
    chart
}

fn gapminder() -> ChartSpec {
    ChartSpec::new(ChartKind::Scatter)
        .bind(Channel::X, "gdpPercap")
        .bind(Channel::Y, "lifeExp")
        .bind(Channel::AnimationFrame, "year")
        .bind(Channel::AnimationGroup, "country")
        .bind(Channel::Size, "pop")
        .bind(Channel::Color, "continent")
        .bind(Channel::HoverName, "country")
        .bind(Channel::FacetCol, "continent")
        .title("gdp per cap vs life expectancy over time")
        .with_params(DisplayParams {
            log_x: true,
            size_max: Some(45),
            range_x: Some([100.0, 100_000.0]),
            range_y: Some([25.0, 90.0]),
            ..Default::default()
        })
}

fn iris() -> ChartSpec {
    ChartSpec::new(ChartKind::DensityContour)
        .bind(Channel::X, "sepal_width")
        .bind(Channel::Y, "sepal_length")
        .bind(Channel::Color, "species")
        .with_params(DisplayParams {
            marginal_x: Some(Marginal::Rug),
            marginal_y: Some(Marginal::Histogram),
            ..Default::default()
        })
}

fn tips() -> ChartSpec {
    let category_orders = BTreeMap::from([
        ("day".to_string(), strings(&["Thur", "Fri", "Sat", "Sun"])),
        ("time".to_string(), strings(&["Lunch", "Dinner"])),
    ]);

    ChartSpec::new(ChartKind::GroupedBar)
        .bind(Channel::X, "sex")
        .bind(Channel::Y, "total_bill")
        .bind(Channel::Color, "smoker")
        .bind(Channel::FacetRow, "time")
        .bind(Channel::FacetCol, "day")
        .title("tips by gender, day of week, and mealtime")
        .with_params(DisplayParams {
            barmode: Some(BarMode::Group),
            category_orders,
            ..Default::default()
        })
}

fn election() -> ChartSpec {
    let color_discrete_map = BTreeMap::from([
        ("Joly".to_string(), "blue".to_string()),
        ("Bergeron".to_string(), "green".to_string()),
        ("Coderre".to_string(), "red".to_string()),
    ]);

    ChartSpec::new(ChartKind::TernaryScatter)
        .bind(Channel::A, "Joly")
        .bind(Channel::B, "Coderre")
        .bind(Channel::C, "Bergeron")
        .bind(Channel::Color, "winner")
        .bind(Channel::Size, "total")
        .bind(Channel::HoverName, "district")
        .with_params(DisplayParams {
            size_max: Some(15),
            color_discrete_map,
            ..Default::default()
        })
}

fn wind() -> ChartSpec {
    ChartSpec::new(ChartKind::PolarScatter)
        .bind(Channel::R, "frequency")
        .bind(Channel::Theta, "direction")
        .bind(Channel::Color, "strength")
        .bind(Channel::Symbol, "strength")
        .with_params(DisplayParams {
            color_discrete_sequence: palette::plasma_r(),
            ..Default::default()
        })
}

fn carshare() -> ChartSpec {
    ChartSpec::new(ChartKind::GeoScatter)
        .bind(Channel::Lat, "centroid_lat")
        .bind(Channel::Lon, "centroid_lon")
        .bind(Channel::Color, "peak_hour")
        .bind(Channel::Size, "car_hours")
        .with_params(DisplayParams {
            color_continuous_scale: palette::ice_fire(),
            size_max: Some(15),
            zoom: Some(10),
            map_style: Some("open-street-map".to_string()),
            ..Default::default()
        })
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
