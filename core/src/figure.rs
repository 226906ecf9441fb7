// Plotly figure translation
//
// Turns a ChartSpec and its dataset table into a Plotly.js figure (`data`,
// `layout`, plus `frames` when animated) the page hands straight to
// `Plotly.react`. Rows are split into one trace per colour category and facet
// cell, the way plotly.express does it. Without a table the figure is a
// single empty trace with the full layout.

use crate::chart::{Channel, ChartKind, ChartSpec, Marginal};
use crate::data::{Cell, Table};
use crate::palette;
use serde_json::{json, Map, Value};

const FACET_GAP: f64 = 0.03;
const MARGINAL_SPLIT: f64 = 0.8;
const MARGINAL_START: f64 = 0.82;
const DEFAULT_SIZE_MAX: f64 = 20.0;
const TRANSPARENT: &str = "rgba(255,255,255,0)";

/// Plotly trace type for a chart kind
pub fn trace_type(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Scatter => "scatter",
        ChartKind::DensityContour => "histogram2dcontour",
        ChartKind::GroupedBar => "bar",
        ChartKind::TernaryScatter => "scatterternary",
        ChartKind::PolarScatter => "scatterpolar",
        ChartKind::GeoScatter => "scattermapbox",
    }
}

pub fn to_plotly(spec: &ChartSpec, table: Option<&Table>) -> Value {
    let Some(table) = table else {
        return json!({
            "data": [skeleton_trace(spec)],
            "layout": Value::Object(layout(spec, &Facets::default())),
        });
    };

    let plan = Plan::new(spec, table);
    let frames = plan.frames();
    let mut layout = layout(spec, &plan.facets);
    plan.decorate(&mut layout, &frames);

    let data = frames
        .first()
        .map(|frame| plan.traces(&frame.rows))
        .unwrap_or_default();
    let mut figure = json!({ "data": data, "layout": Value::Object(layout) });
    if plan.animation.is_some() {
        figure["frames"] = Value::Array(
            frames
                .iter()
                .map(|frame| json!({ "name": frame.name, "data": plan.traces(&frame.rows) }))
                .collect(),
        );
    }
    figure
}

fn is_cartesian(kind: ChartKind) -> bool {
    matches!(
        kind,
        ChartKind::Scatter | ChartKind::DensityContour | ChartKind::GroupedBar
    )
}

fn has_markers(kind: ChartKind) -> bool {
    !matches!(kind, ChartKind::DensityContour | ChartKind::GroupedBar)
}

/// Trace attribute fed by each positional channel
fn coordinates(kind: ChartKind) -> &'static [(&'static str, Channel)] {
    match kind {
        ChartKind::Scatter | ChartKind::DensityContour | ChartKind::GroupedBar => {
            &[("x", Channel::X), ("y", Channel::Y)]
        }
        ChartKind::TernaryScatter => &[("a", Channel::A), ("b", Channel::B), ("c", Channel::C)],
        ChartKind::PolarScatter => &[("r", Channel::R), ("theta", Channel::Theta)],
        ChartKind::GeoScatter => &[("lat", Channel::Lat), ("lon", Channel::Lon)],
    }
}

fn category_order<'s>(spec: &'s ChartSpec, field: &str) -> Option<&'s [String]> {
    spec.params.category_orders.get(field).map(Vec::as_slice)
}

fn cell_value(cell: &Cell) -> Value {
    match cell {
        Cell::Number(n) => json!(n),
        Cell::Text(s) => json!(s),
    }
}

fn numbers(table: &Table, field: &str) -> Vec<f64> {
    match table.column_index(field) {
        Some(idx) => table.rows().iter().filter_map(|r| r[idx].as_f64()).collect(),
        None => Vec::new(),
    }
}

/// Subplot reference: `x`, `x2`, ...
fn axis_ref(letter: char, subplot: usize) -> String {
    if subplot == 1 {
        letter.to_string()
    } else {
        format!("{letter}{subplot}")
    }
}

/// Layout key: `xaxis`, `xaxis2`, ...
fn axis_key(letter: char, subplot: usize) -> String {
    if subplot == 1 {
        format!("{letter}axis")
    } else {
        format!("{letter}axis{subplot}")
    }
}

/// Evenly split `[0, end]` into `n` domains separated by the facet gap
fn domains(n: usize, end: f64) -> Vec<[f64; 2]> {
    let n = n.max(1);
    let width = (end - FACET_GAP * (n - 1) as f64) / n as f64;
    (0..n)
        .map(|i| {
            let start = i as f64 * (width + FACET_GAP);
            [start, start + width]
        })
        .collect()
}

fn colorscale(colors: &[String]) -> Vec<Value> {
    let last = (colors.len().max(2) - 1) as f64;
    colors
        .iter()
        .enumerate()
        .map(|(i, c)| json!([i as f64 / last, c]))
        .collect()
}

/// Facet grid; rows listed top to bottom
#[derive(Debug, Default)]
struct Facets {
    row: Option<(String, Vec<String>)>,
    col: Option<(String, Vec<String>)>,
}

impl Facets {
    fn n_rows(&self) -> usize {
        self.row.as_ref().map_or(1, |(_, values)| values.len().max(1))
    }

    fn n_cols(&self) -> usize {
        self.col.as_ref().map_or(1, |(_, values)| values.len().max(1))
    }

    fn is_faceted(&self) -> bool {
        self.n_rows() * self.n_cols() > 1
    }

    fn subplot(&self, (row, col): (usize, usize)) -> usize {
        row * self.n_cols() + col + 1
    }
}

enum Coloring<'a> {
    None,
    Discrete {
        field: &'a str,
        categories: Vec<String>,
    },
    Continuous {
        field: &'a str,
    },
}

/// One trace slot: a colour category in a facet cell
#[derive(Debug, Clone, Copy)]
struct Group {
    color: Option<usize>,
    cell: (usize, usize),
    showlegend: bool,
}

struct Frame {
    name: String,
    rows: Vec<usize>,
}

/// Everything about a figure that depends on the table but not on the frame
struct Plan<'a> {
    spec: &'a ChartSpec,
    table: &'a Table,
    coloring: Coloring<'a>,
    facets: Facets,
    groups: Vec<Group>,
    /// Group index per table row
    row_group: Vec<usize>,
    symbols: Vec<String>,
    sizeref: Option<f64>,
    animation: Option<&'a str>,
}

impl<'a> Plan<'a> {
    fn new(spec: &'a ChartSpec, table: &'a Table) -> Self {
        let p = &spec.params;
        let has_column = |field: &&str| table.column_index(field).is_some();

        let coloring = match spec.binding(Channel::Color).filter(has_column) {
            Some(field) if table.is_numeric(field) && p.color_discrete_map.is_empty() => {
                Coloring::Continuous { field }
            }
            Some(field) => Coloring::Discrete {
                field,
                categories: table.distinct(field, category_order(spec, field)),
            },
            None => Coloring::None,
        };

        let facet = |channel: Channel| {
            if !is_cartesian(spec.kind) {
                return None;
            }
            spec.binding(channel).filter(has_column).map(|field| {
                (
                    field.to_string(),
                    table.distinct(field, category_order(spec, field)),
                )
            })
        };
        let facets = Facets {
            row: facet(Channel::FacetRow),
            col: facet(Channel::FacetCol),
        };

        let index_of = |axis: Option<&(String, Vec<String>)>, row: &[Cell]| -> usize {
            axis.and_then(|(field, values)| {
                let idx = table.column_index(field)?;
                let label = row[idx].label();
                values.iter().position(|v| *v == label)
            })
            .unwrap_or(0)
        };
        let row_keys: Vec<(Option<usize>, usize, usize)> = table
            .rows()
            .iter()
            .map(|row| {
                let color = match &coloring {
                    Coloring::Discrete { field, categories } => {
                        let label = table
                            .column_index(field)
                            .map(|idx| row[idx].label())
                            .unwrap_or_default();
                        Some(categories.iter().position(|c| *c == label).unwrap_or(0))
                    }
                    _ => None,
                };
                (
                    color,
                    index_of(facets.row.as_ref(), row.as_slice()),
                    index_of(facets.col.as_ref(), row.as_slice()),
                )
            })
            .collect();

        let mut keys = row_keys.clone();
        keys.sort_unstable();
        keys.dedup();
        let row_group = row_keys
            .iter()
            .map(|key| keys.binary_search(key).unwrap_or_else(|i| i))
            .collect();

        let mut seen_colors = Vec::new();
        let groups = keys
            .iter()
            .map(|&(color, row, col)| {
                let showlegend = match color {
                    Some(c) if !seen_colors.contains(&c) => {
                        seen_colors.push(c);
                        true
                    }
                    _ => false,
                };
                Group {
                    color,
                    cell: (row, col),
                    showlegend,
                }
            })
            .collect();

        let symbols = spec
            .binding(Channel::Symbol)
            .map(|field| table.distinct(field, category_order(spec, field)))
            .unwrap_or_default();

        let sizeref = spec
            .binding(Channel::Size)
            .filter(|field| table.is_numeric(field))
            .map(|field| {
                let max = numbers(table, field)
                    .into_iter()
                    .fold(0.0_f64, |m, v| m.max(v.abs()));
                let size_max = p.size_max.map_or(DEFAULT_SIZE_MAX, f64::from);
                if max > 0.0 {
                    2.0 * max / (size_max * size_max)
                } else {
                    1.0
                }
            });

        Self {
            spec,
            table,
            coloring,
            facets,
            groups,
            row_group,
            symbols,
            sizeref,
            animation: spec.binding(Channel::AnimationFrame).filter(has_column),
        }
    }

    fn marginals_enabled(&self) -> bool {
        matches!(
            self.spec.kind,
            ChartKind::Scatter | ChartKind::DensityContour
        ) && !self.facets.is_faceted()
    }

    /// Row sets per animation frame; a single unnamed frame when not animated
    fn frames(&self) -> Vec<Frame> {
        let all: Vec<usize> = (0..self.table.len()).collect();
        let Some((field, idx)) = self
            .animation
            .and_then(|field| Some((field, self.table.column_index(field)?)))
        else {
            return vec![Frame {
                name: String::new(),
                rows: all,
            }];
        };

        self.table
            .distinct(field, category_order(self.spec, field))
            .into_iter()
            .map(|name| {
                let rows = all
                    .iter()
                    .copied()
                    .filter(|&i| self.table.rows()[i][idx].label() == name)
                    .collect();
                Frame { name, rows }
            })
            .collect()
    }

    /// Every group gets a trace in every frame so animation matches them by index
    fn traces(&self, rows: &[usize]) -> Vec<Value> {
        let mut by_group: Vec<Vec<usize>> = vec![Vec::new(); self.groups.len()];
        for &i in rows {
            if let Some(bucket) = by_group.get_mut(self.row_group[i]) {
                bucket.push(i);
            }
        }

        let mut traces: Vec<Value> = self
            .groups
            .iter()
            .zip(&by_group)
            .map(|(group, rows)| self.main_trace(group, rows))
            .collect();

        if self.marginals_enabled() {
            let p = &self.spec.params;
            for (side, marginal) in [(Channel::X, p.marginal_x), (Channel::Y, p.marginal_y)] {
                let Some(marginal) = marginal else { continue };
                for (group, rows) in self.groups.iter().zip(&by_group) {
                    traces.push(self.marginal_trace(marginal, side, group, rows));
                }
            }
        }
        traces
    }

    fn group_name(&self, group: &Group) -> String {
        match (&self.coloring, group.color) {
            (Coloring::Discrete { categories, .. }, Some(i)) => {
                categories.get(i).cloned().unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    /// Explicit map first, then the sequence (or Plotly's default) by position
    fn group_color(&self, group: &Group) -> Option<String> {
        let Coloring::Discrete { categories, .. } = &self.coloring else {
            return None;
        };
        let i = group.color?;
        let p = &self.spec.params;
        if let Some(color) = categories.get(i).and_then(|c| p.color_discrete_map.get(c)) {
            return Some(color.clone());
        }
        if p.color_discrete_sequence.is_empty() {
            Some(palette::PLOTLY[i % palette::PLOTLY.len()].to_string())
        } else {
            let seq = &p.color_discrete_sequence;
            Some(seq[i % seq.len()].clone())
        }
    }

    fn column(&self, field: &str, rows: &[usize]) -> Value {
        let Some(idx) = self.table.column_index(field) else {
            return Value::Array(Vec::new());
        };
        Value::Array(
            rows.iter()
                .map(|&i| cell_value(&self.table.rows()[i][idx]))
                .collect(),
        )
    }

    fn labels(&self, field: &str, rows: &[usize]) -> Value {
        let Some(idx) = self.table.column_index(field) else {
            return Value::Array(Vec::new());
        };
        Value::Array(
            rows.iter()
                .map(|&i| json!(self.table.rows()[i][idx].label()))
                .collect(),
        )
    }

    fn main_trace(&self, group: &Group, rows: &[usize]) -> Value {
        let spec = self.spec;
        let name = self.group_name(group);
        let color = self.group_color(group);

        let mut trace = Map::new();
        trace.insert("type".into(), json!(trace_type(spec.kind)));
        trace.insert("name".into(), json!(name));
        trace.insert("legendgroup".into(), json!(name));
        trace.insert("showlegend".into(), json!(group.showlegend));
        if has_markers(spec.kind) {
            trace.insert("mode".into(), json!("markers"));
        }

        for (attr, channel) in coordinates(spec.kind) {
            if let Some(field) = spec.binding(*channel) {
                trace.insert(attr.to_string(), self.column(field, rows));
            }
        }
        if is_cartesian(spec.kind) {
            let subplot = self.facets.subplot(group.cell);
            trace.insert("xaxis".into(), json!(axis_ref('x', subplot)));
            trace.insert("yaxis".into(), json!(axis_ref('y', subplot)));
        }
        if let Some(field) = spec.binding(Channel::HoverName) {
            trace.insert("hovertext".into(), self.labels(field, rows));
        }
        if let Some(field) = spec.binding(Channel::AnimationGroup) {
            trace.insert("ids".into(), self.labels(field, rows));
        }

        match spec.kind {
            ChartKind::DensityContour => {
                trace.insert("contours".into(), json!({ "coloring": "none" }));
                if let Some(color) = color {
                    trace.insert("line".into(), json!({ "color": color }));
                }
            }
            ChartKind::GroupedBar => {
                trace.insert("offsetgroup".into(), json!(name));
                trace.insert("alignmentgroup".into(), json!("True"));
                trace.insert("orientation".into(), json!("v"));
                trace.insert("marker".into(), Value::Object(self.marker(group, color, rows)));
            }
            _ => {
                trace.insert("marker".into(), Value::Object(self.marker(group, color, rows)));
            }
        }
        Value::Object(trace)
    }

    fn marker(&self, group: &Group, color: Option<String>, rows: &[usize]) -> Map<String, Value> {
        let spec = self.spec;
        let mut marker = Map::new();

        match &self.coloring {
            Coloring::Continuous { field } => {
                marker.insert("color".into(), self.column(field, rows));
                marker.insert("coloraxis".into(), json!("coloraxis"));
            }
            _ => {
                if let Some(color) = color {
                    marker.insert("color".into(), json!(color));
                }
            }
        }

        if let (Some(sizeref), Some(field)) = (self.sizeref, spec.binding(Channel::Size)) {
            marker.insert("size".into(), self.column(field, rows));
            marker.insert("sizemode".into(), json!("area"));
            marker.insert("sizeref".into(), json!(sizeref));
        }

        if let Some(symbol) = self.symbol(group, rows) {
            marker.insert("symbol".into(), symbol);
        }
        marker
    }

    /// One symbol per trace when symbol and colour share a field, else per point
    fn symbol(&self, group: &Group, rows: &[usize]) -> Option<Value> {
        let field = self.spec.binding(Channel::Symbol)?;
        let idx = self.table.column_index(field)?;
        let pick = |i: usize| palette::SYMBOLS[i % palette::SYMBOLS.len()];

        if let (Coloring::Discrete { field: color_field, .. }, Some(i)) =
            (&self.coloring, group.color)
        {
            if *color_field == field {
                return Some(json!(pick(i)));
            }
        }

        Some(Value::Array(
            rows.iter()
                .map(|&r| {
                    let label = self.table.rows()[r][idx].label();
                    json!(pick(self.symbols.iter().position(|s| *s == label).unwrap_or(0)))
                })
                .collect(),
        ))
    }

    /// Distribution of one positional channel, drawn in the strip beside the
    /// main plot: x marginals on `y2`, y marginals on `x2`
    fn marginal_trace(
        &self,
        marginal: Marginal,
        side: Channel,
        group: &Group,
        rows: &[usize],
    ) -> Value {
        let name = self.group_name(group);
        let (attr, xref, yref) = if side == Channel::X {
            ("x", "x", "y2")
        } else {
            ("y", "x2", "y")
        };

        let mut trace = Map::new();
        trace.insert("name".into(), json!(name));
        trace.insert("legendgroup".into(), json!(name));
        trace.insert("showlegend".into(), json!(false));
        let values = self
            .spec
            .binding(side)
            .map(|field| self.column(field, rows))
            .unwrap_or_else(|| Value::Array(Vec::new()));
        trace.insert(attr.into(), values);
        trace.insert("xaxis".into(), json!(xref));
        trace.insert("yaxis".into(), json!(yref));

        let mut marker = Map::new();
        if let Some(color) = self.group_color(group) {
            marker.insert("color".into(), json!(color));
        }

        match marginal {
            Marginal::Rug => {
                trace.insert("type".into(), json!("box"));
                trace.insert("boxpoints".into(), json!("all"));
                trace.insert("jitter".into(), json!(0));
                trace.insert("hoveron".into(), json!("points"));
                trace.insert("fillcolor".into(), json!(TRANSPARENT));
                trace.insert("line".into(), json!({ "color": TRANSPARENT }));
                let symbol = if side == Channel::X { "line-ns-open" } else { "line-ew-open" };
                marker.insert("symbol".into(), json!(symbol));
            }
            Marginal::Histogram => {
                trace.insert("type".into(), json!("histogram"));
                trace.insert("opacity".into(), json!(0.5));
            }
            Marginal::Box => {
                trace.insert("type".into(), json!("box"));
            }
            Marginal::Violin => {
                trace.insert("type".into(), json!("violin"));
            }
        }

        trace.insert("marker".into(), Value::Object(marker));
        Value::Object(trace)
    }

    /// Layout settings that need the data
    fn decorate(&self, layout: &mut Map<String, Value>, frames: &[Frame]) {
        let p = &self.spec.params;

        match &self.coloring {
            Coloring::Discrete { field, .. } => {
                layout.insert(
                    "legend".into(),
                    json!({ "title": { "text": field }, "tracegroupgap": 0 }),
                );
            }
            Coloring::Continuous { field } => {
                let scale = if p.color_continuous_scale.is_empty() {
                    palette::PLASMA.iter().map(|c| c.to_string()).collect()
                } else {
                    p.color_continuous_scale.clone()
                };
                layout.insert(
                    "coloraxis".into(),
                    json!({
                        "colorscale": colorscale(&scale),
                        "colorbar": { "title": { "text": field } },
                    }),
                );
            }
            Coloring::None => {}
        }

        if self.spec.kind == ChartKind::GeoScatter {
            if let (Some(lat), Some(lon)) = (self.mean(Channel::Lat), self.mean(Channel::Lon)) {
                if let Some(Value::Object(mapbox)) = layout.get_mut("mapbox") {
                    mapbox.insert("center".into(), json!({ "lat": lat, "lon": lon }));
                }
            }
        }

        let histogram_marginal = [p.marginal_x, p.marginal_y].contains(&Some(Marginal::Histogram));
        if self.marginals_enabled() && histogram_marginal && p.barmode.is_none() {
            layout.insert("barmode".into(), json!("overlay"));
        }

        if let Some(field) = self.animation {
            let (menus, sliders) = animation_controls(field, frames);
            layout.insert("updatemenus".into(), menus);
            layout.insert("sliders".into(), sliders);
        }
    }

    fn mean(&self, channel: Channel) -> Option<f64> {
        let values = numbers(self.table, self.spec.binding(channel)?);
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

/// Play/pause buttons and a frame slider
fn animation_controls(field: &str, frames: &[Frame]) -> (Value, Value) {
    let play = json!({
        "frame": { "duration": 500, "redraw": false },
        "mode": "immediate",
        "fromcurrent": true,
        "transition": { "duration": 500, "easing": "linear" },
    });
    let jump = json!({
        "frame": { "duration": 0, "redraw": false },
        "mode": "immediate",
        "fromcurrent": true,
        "transition": { "duration": 0, "easing": "linear" },
    });

    let menus = json!([{
        "type": "buttons",
        "direction": "left",
        "showactive": false,
        "x": 0.1,
        "xanchor": "right",
        "y": 0,
        "yanchor": "top",
        "pad": { "r": 10, "t": 70 },
        "buttons": [
            { "label": "&#9654;", "method": "animate", "args": [null, play] },
            { "label": "&#9724;", "method": "animate", "args": [[null], jump.clone()] },
        ],
    }]);

    let steps: Vec<Value> = frames
        .iter()
        .map(|frame| {
            json!({
                "label": frame.name,
                "method": "animate",
                "args": [[frame.name], jump.clone()],
            })
        })
        .collect();
    let sliders = json!([{
        "active": 0,
        "currentvalue": { "prefix": format!("{field}=") },
        "x": 0.1,
        "len": 0.9,
        "xanchor": "left",
        "y": 0,
        "yanchor": "top",
        "pad": { "b": 10, "t": 60 },
        "steps": steps,
    }]);

    (menus, sliders)
}

/// Single empty trace used when no table is loaded
fn skeleton_trace(spec: &ChartSpec) -> Value {
    let p = &spec.params;
    let mut trace = Map::new();
    trace.insert("type".into(), json!(trace_type(spec.kind)));
    if has_markers(spec.kind) {
        trace.insert("mode".into(), json!("markers"));
    }
    if spec.kind == ChartKind::DensityContour {
        trace.insert("contours".into(), json!({ "coloring": "none" }));
        return Value::Object(trace);
    }

    let mut marker = Map::new();
    if spec.binding(Channel::Color).is_some() && !p.color_continuous_scale.is_empty() {
        marker.insert("coloraxis".into(), json!("coloraxis"));
    }
    if spec.binding(Channel::Size).is_some() {
        marker.insert("sizemode".into(), json!("area"));
    }
    if !marker.is_empty() {
        trace.insert("marker".into(), Value::Object(marker));
    }
    Value::Object(trace)
}

fn layout(spec: &ChartSpec, facets: &Facets) -> Map<String, Value> {
    let p = &spec.params;
    let mut layout = Map::new();

    if let Some(title) = &spec.title {
        layout.insert("title".into(), json!({ "text": title }));
    }

    match spec.kind {
        ChartKind::Scatter | ChartKind::DensityContour | ChartKind::GroupedBar => {
            cartesian_axes(spec, facets, &mut layout);
        }
        ChartKind::TernaryScatter => {
            layout.insert(
                "ternary".into(),
                json!({
                    "aaxis": { "title": { "text": spec.binding(Channel::A) } },
                    "baxis": { "title": { "text": spec.binding(Channel::B) } },
                    "caxis": { "title": { "text": spec.binding(Channel::C) } },
                }),
            );
        }
        ChartKind::PolarScatter => {
            layout.insert(
                "polar".into(),
                json!({
                    "radialaxis": { "title": { "text": spec.binding(Channel::R) } },
                    "angularaxis": { "direction": "clockwise", "rotation": 90 },
                }),
            );
        }
        ChartKind::GeoScatter => {
            let mut mapbox = Map::new();
            if let Some(style) = &p.map_style {
                mapbox.insert("style".into(), json!(style));
            }
            if let Some(zoom) = p.zoom {
                mapbox.insert("zoom".into(), json!(zoom));
            }
            layout.insert("mapbox".into(), Value::Object(mapbox));
        }
    }

    if let Some(barmode) = p.barmode {
        layout.insert("barmode".into(), json!(barmode));
    }
    if !p.color_discrete_sequence.is_empty() {
        layout.insert("colorway".into(), json!(p.color_discrete_sequence));
    }
    if !p.color_continuous_scale.is_empty() {
        layout.insert(
            "coloraxis".into(),
            json!({ "colorscale": colorscale(&p.color_continuous_scale) }),
        );
    }

    layout
}

/// One x/y axis pair per facet cell, or a main pair plus marginal strips
fn cartesian_axes(spec: &ChartSpec, facets: &Facets, layout: &mut Map<String, Value>) {
    let p = &spec.params;
    let x_field = spec.binding(Channel::X);
    let y_field = spec.binding(Channel::Y);
    let (n_rows, n_cols) = (facets.n_rows(), facets.n_cols());
    // leave room on the right for row labels
    let col_end = if n_rows > 1 { 0.97 } else { 1.0 };
    let x_domains = domains(n_cols, col_end);
    // bottom row first
    let y_domains = domains(n_rows, 1.0);

    for row in 0..n_rows {
        for col in 0..n_cols {
            let subplot = facets.subplot((row, col));
            let bottom = row == n_rows - 1;
            let mut xaxis = axis(x_field.filter(|_| bottom), p.log_x, p.range_x);
            let mut yaxis = axis(y_field.filter(|_| col == 0), p.log_y, p.range_y);

            if let Some(order) = x_field.and_then(|f| p.category_orders.get(f)) {
                xaxis["categoryorder"] = json!("array");
                xaxis["categoryarray"] = json!(order);
            }
            if p.y_automargin {
                yaxis["automargin"] = json!(true);
            }

            if facets.is_faceted() {
                xaxis["domain"] = json!(x_domains[col]);
                yaxis["domain"] = json!(y_domains[n_rows - 1 - row]);
                xaxis["anchor"] = json!(axis_ref('y', subplot));
                yaxis["anchor"] = json!(axis_ref('x', subplot));
                if subplot > 1 {
                    xaxis["matches"] = json!("x");
                    yaxis["matches"] = json!("y");
                }
                if !bottom {
                    xaxis["showticklabels"] = json!(false);
                }
                if col > 0 {
                    yaxis["showticklabels"] = json!(false);
                }
            } else if spec.kind != ChartKind::GroupedBar {
                if p.marginal_x.is_some() {
                    yaxis["domain"] = json!([0.0, MARGINAL_SPLIT]);
                    layout.insert(
                        "yaxis2".into(),
                        json!({ "domain": [MARGINAL_START, 1.0], "anchor": "x", "showticklabels": false }),
                    );
                }
                if p.marginal_y.is_some() {
                    xaxis["domain"] = json!([0.0, MARGINAL_SPLIT]);
                    layout.insert(
                        "xaxis2".into(),
                        json!({ "domain": [MARGINAL_START, 1.0], "anchor": "y", "showticklabels": false }),
                    );
                }
            }

            layout.insert(axis_key('x', subplot), xaxis);
            layout.insert(axis_key('y', subplot), yaxis);
        }
    }

    if facets.is_faceted() {
        layout.insert(
            "annotations".into(),
            Value::Array(facet_labels(facets, &x_domains, &y_domains)),
        );
    }
}

/// `field=value` headers above columns and beside rows
fn facet_labels(facets: &Facets, x_domains: &[[f64; 2]], y_domains: &[[f64; 2]]) -> Vec<Value> {
    let mut labels = Vec::new();
    if let Some((field, values)) = &facets.col {
        for (value, [lo, hi]) in values.iter().zip(x_domains) {
            labels.push(json!({
                "text": format!("{field}={value}"),
                "x": (lo + hi) / 2.0,
                "y": 1.0,
                "xref": "paper",
                "yref": "paper",
                "xanchor": "center",
                "yanchor": "bottom",
                "showarrow": false,
            }));
        }
    }
    if let Some((field, values)) = &facets.row {
        for (value, [lo, hi]) in values.iter().zip(y_domains.iter().rev()) {
            labels.push(json!({
                "text": format!("{field}={value}"),
                "x": 0.98,
                "y": (lo + hi) / 2.0,
                "xref": "paper",
                "yref": "paper",
                "xanchor": "left",
                "yanchor": "middle",
                "textangle": 90,
                "showarrow": false,
            }));
        }
    }
    labels
}

fn axis(field: Option<&str>, log: bool, range: Option<[f64; 2]>) -> Value {
    let mut axis = json!({});
    if let Some(field) = field {
        axis["title"] = json!({ "text": field });
    }
    if log {
        axis["type"] = json!("log");
    }
    if let Some([lo, hi]) = range {
        // Plotly expects log axis ranges as exponents
        axis["range"] = if log {
            json!([lo.log10(), hi.log10()])
        } else {
            json!([lo, hi])
        };
    }
    axis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SelectionKey;
    use crate::dispatcher::dispatch;

    fn fixture(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::parse(v)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn figure_for(key: SelectionKey, table: &Table) -> Value {
        to_plotly(&dispatch(key).chart, Some(table))
    }

    fn traces_of<'v>(fig: &'v Value, ty: &str) -> Vec<&'v Value> {
        fig["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|t| t["type"] == ty)
            .collect()
    }

    /// 50 flowers per species
    fn iris_table() -> Table {
        let mut rows = Vec::new();
        for (s, species) in ["setosa", "versicolor", "virginica"].iter().enumerate() {
            for i in 0..50 {
                let width = 2.5 + s as f64 * 0.2 + (i % 10) as f64 * 0.1;
                let length = 4.5 + s as f64 * 1.0 + (i % 7) as f64 * 0.2;
                rows.push(vec![
                    format!("{length:.1}"),
                    format!("{width:.1}"),
                    "1.4".to_string(),
                    "0.2".to_string(),
                    species.to_string(),
                    (s + 1).to_string(),
                ]);
            }
        }
        fixture(
            &["sepal_length", "sepal_width", "petal_length", "petal_width", "species", "species_id"],
            rows,
        )
    }

    #[test]
    fn test_trace_type_per_kind() {
        let expected = [
            (SelectionKey::Gapminder, "scatter"),
            (SelectionKey::Iris, "histogram2dcontour"),
            (SelectionKey::Tips, "bar"),
            (SelectionKey::Election, "scatterternary"),
            (SelectionKey::Wind, "scatterpolar"),
            (SelectionKey::Carshare, "scattermapbox"),
        ];
        for (key, ty) in expected {
            let fig = to_plotly(&dispatch(key).chart, None);
            assert_eq!(fig["data"][0]["type"], ty, "{key}");
        }
    }

    #[test]
    fn test_gapminder_log_range() {
        let fig = to_plotly(&dispatch(SelectionKey::Gapminder).chart, None);
        let xaxis = &fig["layout"]["xaxis"];
        assert_eq!(xaxis["type"], "log");
        let range = xaxis["range"].as_array().unwrap();
        assert!((range[0].as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert!((range[1].as_f64().unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(fig["layout"]["yaxis"]["range"], json!([25.0, 90.0]));
        assert_eq!(fig["layout"]["yaxis"]["automargin"], true);
        assert_eq!(
            fig["layout"]["title"]["text"],
            "gdp per cap vs life expectancy over time"
        );
    }

    #[test]
    fn test_empty_figure_still_references_coloraxis() {
        let fig = to_plotly(&dispatch(SelectionKey::Carshare).chart, None);
        assert_eq!(fig["data"][0]["marker"]["coloraxis"], "coloraxis");
        assert!(fig["layout"]["coloraxis"]["colorscale"].is_array());
        assert!(fig.get("frames").is_none());
    }

    #[test]
    fn test_iris_one_contour_per_species() {
        let fig = figure_for(SelectionKey::Iris, &iris_table());
        let contours = traces_of(&fig, "histogram2dcontour");
        assert_eq!(contours.len(), 3);

        let points: usize = contours
            .iter()
            .map(|t| t["x"].as_array().unwrap().len())
            .sum();
        assert_eq!(points, 150);

        let names: Vec<&str> = contours.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["setosa", "versicolor", "virginica"]);
        for (i, trace) in contours.iter().enumerate() {
            assert_eq!(trace["line"]["color"], palette::PLOTLY[i]);
            assert_eq!(trace["contours"]["coloring"], "none");
            assert_eq!(trace["showlegend"], true);
            assert_eq!(trace["y"].as_array().unwrap().len(), 50);
        }
        assert_eq!(fig["layout"]["legend"]["title"]["text"], "species");
    }

    #[test]
    fn test_iris_marginals_have_traces() {
        let fig = figure_for(SelectionKey::Iris, &iris_table());

        let rugs = traces_of(&fig, "box");
        assert_eq!(rugs.len(), 3);
        for rug in &rugs {
            assert_eq!(rug["xaxis"], "x");
            assert_eq!(rug["yaxis"], "y2");
            assert_eq!(rug["boxpoints"], "all");
            assert_eq!(rug["marker"]["symbol"], "line-ns-open");
            assert_eq!(rug["x"].as_array().unwrap().len(), 50);
            assert_eq!(rug["showlegend"], false);
        }

        let histograms = traces_of(&fig, "histogram");
        assert_eq!(histograms.len(), 3);
        for hist in &histograms {
            assert_eq!(hist["xaxis"], "x2");
            assert_eq!(hist["yaxis"], "y");
            assert_eq!(hist["y"].as_array().unwrap().len(), 50);
        }

        let layout = &fig["layout"];
        assert_eq!(layout["xaxis"]["domain"], json!([0.0, MARGINAL_SPLIT]));
        assert_eq!(layout["yaxis"]["domain"], json!([0.0, MARGINAL_SPLIT]));
        assert_eq!(layout["yaxis2"]["anchor"], "x");
        assert_eq!(layout["xaxis2"]["anchor"], "y");
        assert_eq!(layout["barmode"], "overlay");
    }

    #[test]
    fn test_election_colors_follow_winner_map() {
        let table = fixture(
            &["district", "Coderre", "Bergeron", "Joly", "total", "winner", "result", "district_id"],
            vec![
                row(&["101-Bois-de-Liesse", "2481", "1829", "3024", "7334", "Joly", "plurality", "101"]),
                row(&["102-Cap-Saint-Jacques", "2525", "1163", "2675", "6363", "Joly", "plurality", "102"]),
                row(&["11-Sault-au-Récollet", "3348", "2770", "2532", "8650", "Coderre", "plurality", "11"]),
                row(&["111-Mile-End", "1734", "4782", "2514", "9030", "Bergeron", "majority", "111"]),
            ],
        );
        let fig = figure_for(SelectionKey::Election, &table);
        let traces = traces_of(&fig, "scatterternary");
        assert_eq!(traces.len(), 3);

        for trace in &traces {
            let expected = match trace["name"].as_str().unwrap() {
                "Joly" => "blue",
                "Coderre" => "red",
                "Bergeron" => "green",
                other => panic!("unexpected trace {other}"),
            };
            assert_eq!(trace["marker"]["color"], expected);
            assert_eq!(trace["marker"]["sizemode"], "area");
            let sizeref = trace["marker"]["sizeref"].as_f64().unwrap();
            assert!((sizeref - 2.0 * 9030.0 / 225.0).abs() < 1e-9);
        }

        let joly = traces.iter().find(|t| t["name"] == "Joly").unwrap();
        assert_eq!(joly["a"], json!([3024.0, 2675.0]));
        assert_eq!(joly["hovertext"], json!(["101-Bois-de-Liesse", "102-Cap-Saint-Jacques"]));

        let ternary = &fig["layout"]["ternary"];
        assert_eq!(ternary["aaxis"]["title"]["text"], "Joly");
        assert_eq!(ternary["baxis"]["title"]["text"], "Coderre");
        assert_eq!(ternary["caxis"]["title"]["text"], "Bergeron");
    }

    #[test]
    fn test_wind_symbol_and_color_per_strength() {
        let table = fixture(
            &["direction", "strength", "frequency"],
            vec![
                row(&["N", "0-1", "0.5"]),
                row(&["NNE", "0-1", "0.6"]),
                row(&["N", "1-2", "1.6"]),
                row(&["N", "2-3", "0.9"]),
            ],
        );
        let fig = figure_for(SelectionKey::Wind, &table);
        let traces = traces_of(&fig, "scatterpolar");
        assert_eq!(traces.len(), 3);

        let plasma_r = palette::plasma_r();
        for (i, trace) in traces.iter().enumerate() {
            assert_eq!(trace["marker"]["color"], plasma_r[i].as_str());
            assert_eq!(trace["marker"]["symbol"], palette::SYMBOLS[i]);
        }
        assert_ne!(traces[0]["marker"]["symbol"], traces[1]["marker"]["symbol"]);
        assert_eq!(traces[0]["r"], json!([0.5, 0.6]));
        assert_eq!(traces[0]["theta"], json!(["N", "NNE"]));

        let polar = &fig["layout"]["polar"];
        assert_eq!(polar["radialaxis"]["title"]["text"], "frequency");
        assert_eq!(polar["angularaxis"]["direction"], "clockwise");
    }

    #[test]
    fn test_carshare_continuous_color() {
        let table = fixture(
            &["centroid_lat", "centroid_lon", "car_hours", "peak_hour"],
            vec![
                row(&["45.47", "-73.59", "1772.75", "2"]),
                row(&["45.54", "-73.56", "986.0", "20"]),
                row(&["45.50", "-73.60", "354.75", "11"]),
            ],
        );
        let fig = figure_for(SelectionKey::Carshare, &table);
        let traces = traces_of(&fig, "scattermapbox");
        assert_eq!(traces.len(), 1);

        let marker = &traces[0]["marker"];
        assert_eq!(marker["coloraxis"], "coloraxis");
        assert_eq!(marker["color"], json!([2.0, 20.0, 11.0]));
        assert_eq!(marker["size"].as_array().unwrap().len(), 3);
        assert_eq!(traces[0]["lat"].as_array().unwrap().len(), 3);

        let layout = &fig["layout"];
        let scale = layout["coloraxis"]["colorscale"].as_array().unwrap();
        assert_eq!(scale.len(), palette::ICE_FIRE.len());
        assert_eq!(scale.first().unwrap()[0], 0.0);
        assert_eq!(scale.last().unwrap()[0], 1.0);
        assert_eq!(layout["coloraxis"]["colorbar"]["title"]["text"], "peak_hour");
        assert_eq!(layout["mapbox"]["style"], "open-street-map");
        assert_eq!(layout["mapbox"]["zoom"], 10);
        let lat = layout["mapbox"]["center"]["lat"].as_f64().unwrap();
        assert!((lat - 45.503333).abs() < 1e-4);
    }

    #[test]
    fn test_gapminder_frames_and_facets() {
        let table = fixture(
            &["country", "continent", "year", "lifeExp", "pop", "gdpPercap"],
            vec![
                row(&["Afghanistan", "Asia", "1952", "28.8", "8425333", "779.4"]),
                row(&["Japan", "Asia", "1952", "63.0", "86459025", "3216.9"]),
                row(&["France", "Europe", "1952", "67.4", "42459667", "7029.8"]),
                row(&["Afghanistan", "Asia", "2007", "43.8", "31889923", "974.6"]),
                row(&["Japan", "Asia", "2007", "82.6", "127467972", "31656.1"]),
                row(&["France", "Europe", "2007", "80.7", "61083916", "30470.0"]),
            ],
        );
        let fig = figure_for(SelectionKey::Gapminder, &table);

        let frames = fig["frames"].as_array().unwrap();
        let names: Vec<&str> = frames.iter().map(|f| f["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["1952", "2007"]);
        assert_eq!(fig["data"], frames[0]["data"]);
        for frame in frames {
            assert_eq!(frame["data"].as_array().unwrap().len(), 2);
        }

        let asia = &fig["data"][0];
        assert_eq!(asia["name"], "Asia");
        assert_eq!(asia["xaxis"], "x");
        assert_eq!(asia["ids"], json!(["Afghanistan", "Japan"]));
        assert_eq!(asia["hovertext"], json!(["Afghanistan", "Japan"]));
        let sizeref = asia["marker"]["sizeref"].as_f64().unwrap();
        assert!((sizeref - 2.0 * 127467972.0 / 2025.0).abs() < 1e-6);

        let europe = &fig["data"][1];
        assert_eq!(europe["xaxis"], "x2");
        assert_eq!(europe["yaxis"], "y2");

        let layout = &fig["layout"];
        assert_eq!(layout["xaxis2"]["anchor"], "y2");
        assert_eq!(layout["xaxis2"]["matches"], "x");
        assert_eq!(layout["xaxis2"]["type"], "log");
        assert_eq!(layout["annotations"][0]["text"], "continent=Asia");
        assert_eq!(layout["annotations"][1]["text"], "continent=Europe");
        assert_eq!(layout["sliders"][0]["steps"].as_array().unwrap().len(), 2);
        assert_eq!(layout["sliders"][0]["currentvalue"]["prefix"], "year=");
        assert_eq!(layout["updatemenus"][0]["buttons"][0]["method"], "animate");
    }

    #[test]
    fn test_tips_facet_grid_follows_category_orders() {
        let table = fixture(
            &["total_bill", "tip", "sex", "smoker", "day", "time", "size"],
            vec![
                row(&["16.99", "1.01", "Female", "No", "Sun", "Dinner", "2"]),
                row(&["10.34", "1.66", "Male", "No", "Sun", "Dinner", "3"]),
                row(&["20.65", "3.35", "Male", "Yes", "Sat", "Dinner", "3"]),
                row(&["15.00", "2.00", "Female", "Yes", "Thur", "Lunch", "2"]),
                row(&["8.50", "1.50", "Male", "No", "Fri", "Lunch", "2"]),
            ],
        );
        let fig = figure_for(SelectionKey::Tips, &table);
        let layout = &fig["layout"];

        // 2 rows (time) x 4 columns (day)
        assert!(layout["xaxis8"].is_object());
        assert!(layout["xaxis9"].is_null());

        let labels: Vec<&str> = layout["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["text"].as_str().unwrap())
            .collect();
        assert_eq!(
            labels,
            ["day=Thur", "day=Fri", "day=Sat", "day=Sun", "time=Lunch", "time=Dinner"]
        );

        // Titles only on the outer axes
        assert!(layout["xaxis"]["title"].is_null());
        assert_eq!(layout["xaxis5"]["title"]["text"], "sex");
        assert_eq!(layout["yaxis"]["title"]["text"], "total_bill");
        assert!(layout["yaxis2"]["title"].is_null());

        let bars = traces_of(&fig, "bar");
        assert_eq!(bars.len(), 4);
        let sunday_dinner = bars.iter().find(|t| t["xaxis"] == "x8").unwrap();
        assert_eq!(sunday_dinner["name"], "No");
        assert_eq!(sunday_dinner["x"], json!(["Female", "Male"]));
        assert_eq!(sunday_dinner["offsetgroup"], "No");
        let legend_entries = bars.iter().filter(|t| t["showlegend"] == true).count();
        assert_eq!(legend_entries, 2);
        assert_eq!(layout["barmode"], "group");
    }
}
