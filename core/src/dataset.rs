// Bundled example datasets
//
// The six Plotly Express datasets the dashboard can show. Row/column shapes
// are documentation only; nothing here loads or validates data.

use crate::DashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one bundled example dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKey {
    Gapminder,
    Tips,
    Iris,
    Wind,
    Election,
    Carshare,
}

impl SelectionKey {
    /// All keys in dropdown order. The first one is the default selection.
    pub const ALL: [SelectionKey; 6] = [
        SelectionKey::Gapminder,
        SelectionKey::Tips,
        SelectionKey::Iris,
        SelectionKey::Wind,
        SelectionKey::Election,
        SelectionKey::Carshare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionKey::Gapminder => "gapminder",
            SelectionKey::Tips => "tips",
            SelectionKey::Iris => "iris",
            SelectionKey::Wind => "wind",
            SelectionKey::Election => "election",
            SelectionKey::Carshare => "carshare",
        }
    }

    /// Dropdown label
    pub fn label(&self) -> &'static str {
        self.as_str()
    }

    pub fn info(&self) -> &'static DatasetInfo {
        match self {
            SelectionKey::Gapminder => &GAPMINDER,
            SelectionKey::Tips => &TIPS,
            SelectionKey::Iris => &IRIS,
            SelectionKey::Wind => &WIND,
            SelectionKey::Election => &ELECTION,
            SelectionKey::Carshare => &CARSHARE,
        }
    }
}

impl Default for SelectionKey {
    fn default() -> Self {
        SelectionKey::ALL[0]
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionKey {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SelectionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| DashError::UnknownSelection(s.to_string()))
    }
}

/// Descriptive metadata for a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInfo {
    /// "Each row represents ..." sentence
    pub summary: &'static str,
    pub provenance: Option<&'static str>,
    pub rows: usize,
    pub columns: &'static [&'static str],
}

impl DatasetInfo {
    /// Markdown blurb shown under the dropdown
    pub fn description(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("'{c}'"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = String::from(self.summary);
        if let Some(url) = self.provenance {
            out.push_str("\n\n");
            out.push_str(url);
        }
        out.push_str(&format!(
            "\n\nReturns a table with {} rows and the following columns: `[{}]`.",
            self.rows, columns
        ));
        out
    }
}

static GAPMINDER: DatasetInfo = DatasetInfo {
    summary: "Each row represents a country on a given year.",
    provenance: Some("https://www.gapminder.org/data/"),
    rows: 1704,
    columns: &[
        "country",
        "continent",
        "year",
        "lifeExp",
        "pop",
        "gdpPercap",
        "iso_alpha",
        "iso_num",
    ],
};

static IRIS: DatasetInfo = DatasetInfo {
    summary: "Each row represents a flower.",
    provenance: Some("https://en.wikipedia.org/wiki/Iris_flower_data_set"),
    rows: 150,
    columns: &[
        "sepal_length",
        "sepal_width",
        "petal_length",
        "petal_width",
        "species",
        "species_id",
    ],
};

static TIPS: DatasetInfo = DatasetInfo {
    summary: "Each row represents a restaurant bill.",
    provenance: Some("https://vincentarelbundock.github.io/Rdatasets/doc/reshape2/tips.html"),
    rows: 244,
    columns: &["total_bill", "tip", "sex", "smoker", "day", "time", "size"],
};

static ELECTION: DatasetInfo = DatasetInfo {
    summary: "Each row represents voting results for an electoral district in the 2013 Montreal mayoral election.",
    provenance: None,
    rows: 58,
    columns: &[
        "district", "Coderre", "Bergeron", "Joly", "total", "winner", "result",
    ],
};

static WIND: DatasetInfo = DatasetInfo {
    summary: "Each row represents a level of wind intensity in a cardinal direction, and its frequency.",
    provenance: None,
    rows: 128,
    columns: &["direction", "strength", "frequency"],
};

static CARSHARE: DatasetInfo = DatasetInfo {
    summary: "Each row represents the availability of car-sharing services near the centroid of a zone in Montreal.",
    provenance: None,
    rows: 249,
    columns: &["centroid_lat", "centroid_lon", "car_hours", "peak_hour"],
};
