// Declarative chart specifications
//
// A ChartSpec names a chart kind, binds dataset fields to visual channels and
// carries fixed display parameters. Rendering is somebody else's job (see
// `figure` for the Plotly translation).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chart kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Scatter,
    DensityContour,
    GroupedBar,
    TernaryScatter,
    PolarScatter,
    GeoScatter,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::DensityContour => "density-contour",
            ChartKind::GroupedBar => "grouped-bar",
            ChartKind::TernaryScatter => "ternary-scatter",
            ChartKind::PolarScatter => "polar-scatter",
            ChartKind::GeoScatter => "geo-scatter",
        }
    }
}

/// Visual channel a dataset field can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    X,
    Y,
    /// Ternary corners
    A,
    B,
    C,
    /// Polar radius / angle
    R,
    Theta,
    Lat,
    Lon,
    Color,
    Size,
    Symbol,
    HoverName,
    FacetRow,
    FacetCol,
    AnimationFrame,
    AnimationGroup,
}

/// Marginal distribution drawn alongside a 2-D chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marginal {
    Rug,
    Histogram,
    Box,
    Violin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    Group,
    Stack,
    Overlay,
    Relative,
}

/// Fixed display parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_x: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_y: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub log_x: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub log_y: bool,
    /// Largest marker size in pixels when `size` is bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_x: Option<Marginal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_y: Option<Marginal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barmode: Option<BarMode>,
    /// field -> category values in display order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub category_orders: BTreeMap<String, Vec<String>>,
    /// category value -> CSS colour
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub color_discrete_map: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_discrete_sequence: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_continuous_scale: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_style: Option<String>,
    #[serde(default)]
    pub y_automargin: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Chart kind + field bindings + display parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub bindings: BTreeMap<Channel, String>,
    #[serde(default)]
    pub params: DisplayParams,
}

impl ChartSpec {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            title: None,
            bindings: BTreeMap::new(),
            params: DisplayParams::default(),
        }
    }

    /// Bind `field` to `channel`, replacing any previous binding
    pub fn bind(mut self, channel: Channel, field: impl Into<String>) -> Self {
        self.bindings.insert(channel, field.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_params(mut self, params: DisplayParams) -> Self {
        self.params = params;
        self
    }

    pub fn binding(&self, channel: Channel) -> Option<&str> {
        self.bindings.get(&channel).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_value(ChartKind::DensityContour).unwrap();
        assert_eq!(json, "density-contour");
        assert_eq!(ChartKind::GeoScatter.as_str(), "geo-scatter");
    }

    #[test]
    fn test_bind_replaces_existing() {
        let spec = ChartSpec::new(ChartKind::Scatter)
            .bind(Channel::X, "a")
            .bind(Channel::X, "b");
        assert_eq!(spec.binding(Channel::X), Some("b"));
        assert_eq!(spec.bindings.len(), 1);
    }

    #[test]
    fn test_bindings_serialize_as_object() {
        let spec = ChartSpec::new(ChartKind::PolarScatter)
            .bind(Channel::R, "frequency")
            .bind(Channel::HoverName, "direction");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["bindings"]["r"], "frequency");
        assert_eq!(json["bindings"]["hover_name"], "direction");
        assert!(json.get("title").is_none());
        // Unset optional params are omitted
        assert!(json["params"].get("range_x").is_none());
        assert_eq!(json["params"]["y_automargin"], false);
    }
}
