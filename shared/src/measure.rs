use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Centile labels reported by the global measures endpoint.
pub const CENTILES: [u8; 9] = [10, 20, 30, 40, 50, 60, 70, 80, 90];

/// Body of both the panel and the global measures endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasuresPayload<T> {
    #[serde(default = "Vec::new")]
    pub measures: Vec<T>,
}

impl<T: for<'de> Deserialize<'de>> MeasuresPayload<T> {
    pub fn from_json(text: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(text).map_err(DashboardError::Payload)
    }
}

/// Measure metadata shared by panel and global payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureMeta {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub why_it_matters: Option<String>,
    #[serde(default)]
    pub numerator_short: Option<String>,
    #[serde(default)]
    pub denominator_short: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_cost_based: bool,
    #[serde(default)]
    pub is_percentage: bool,
    /// `None` means the measure has no preferred direction.
    #[serde(default)]
    pub low_is_good: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelMeasure {
    #[serde(flatten)]
    pub meta: MeasureMeta,
    #[serde(default)]
    pub data: Vec<PanelDatum>,
}

/// One period of one organisation's value for a measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelDatum {
    pub date: String,
    #[serde(default)]
    pub numerator: Option<f64>,
    #[serde(default)]
    pub denominator: Option<f64>,
    #[serde(default)]
    pub calc_value: Option<f64>,
    #[serde(default)]
    pub percentile: Option<f64>,
    /// Savings keyed by centile label ("10", "50", ...).
    #[serde(default)]
    pub cost_savings: Option<BTreeMap<String, f64>>,
    /// Organisation id/name under whichever per-type keys the endpoint uses.
    #[serde(flatten)]
    pub org_fields: BTreeMap<String, serde_json::Value>,
}

const ORG_KEY_PREFIXES: [&str; 5] = ["practice", "pct", "pcn", "stp", "regional_team"];

impl PanelDatum {
    pub fn org_id(&self) -> Option<&str> {
        self.org_field("id")
    }

    pub fn org_name(&self) -> Option<&str> {
        self.org_field("name")
    }

    fn org_field(&self, suffix: &str) -> Option<&str> {
        ORG_KEY_PREFIXES.iter().find_map(|prefix| {
            self.org_fields
                .get(&format!("{prefix}_{suffix}"))
                .and_then(|v| v.as_str())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMeasure {
    #[serde(flatten)]
    pub meta: MeasureMeta,
    #[serde(default)]
    pub data: Vec<GlobalDatum>,
}

pub type CentileValues = BTreeMap<String, Option<f64>>;

/// One period of national centiles, keyed by org type then centile label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalDatum {
    pub date: String,
    #[serde(default)]
    pub percentiles: BTreeMap<String, CentileValues>,
    #[serde(default)]
    pub cost_savings: BTreeMap<String, BTreeMap<String, f64>>,
}

/// A plotted period. `x` is milliseconds since the epoch (UTC midnight).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub date: String,
    pub x: i64,
    pub numerator: Option<f64>,
    pub denominator: Option<f64>,
    pub value: Option<f64>,
    pub percentile: Option<f64>,
}

/// One measure's series for one organisation, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureRecord {
    pub measure_id: String,
    pub measure_name: String,
    pub org_id: String,
    pub org_name: String,
    pub points: Vec<Point>,
    pub mean_percentile: Option<f64>,
    pub cost_saving_10th: f64,
    pub cost_saving_50th: f64,
    pub is_cost_saving: bool,
    pub is_cost_based: bool,
    pub is_percentage: bool,
    pub low_is_good: Option<bool>,
    pub chart_id: String,
    pub chart_container_id: String,
    pub chart_title: String,
    pub chart_title_url: Option<String>,
    pub chart_explanation: String,
    pub numerator_short: Option<String>,
    pub denominator_short: Option<String>,
    pub description: Option<String>,
    pub why_it_matters: Option<String>,
    pub tags: Vec<String>,
    pub tags_for_tooltip: String,
}

impl MeasureRecord {
    pub fn has_plottable_values(&self) -> bool {
        self.points.iter().any(|p| p.value.is_some())
    }

    /// Higher is worse, after accounting for the measure's direction.
    pub fn badness(&self) -> Option<f64> {
        let p = self.mean_percentile?;
        Some(match self.low_is_good {
            Some(false) => 100.0 - p,
            _ => p,
        })
    }
}

/// Parse an API period (`YYYY-MM-DD`) into epoch milliseconds at UTC midnight.
pub fn date_to_millis(date: &str) -> Option<i64> {
    let day = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}
