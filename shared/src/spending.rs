use chrono::NaiveDate;
use serde::Deserialize;

use crate::chart_options::{
    AxisTitle, ChartOptions, DataPoint, ESTIMATE_COLOR, Series, Title, TooltipStyle, base_options,
};
use crate::error::DashboardError;
use crate::transform::format_pounds;

pub const MONTHLY_TOTALS_DATA_ID: &str = "monthly-totals-data";
pub const MONTHLY_TOTALS_CHART_ID: &str = "monthly-totals-chart";
pub const BREAKDOWN_DATA_ID: &str = "breakdown-data";
pub const BREAKDOWN_CHART_ID: &str = "breakdown-chart";
pub const SUBMIT_ON_CHANGE_SELECTOR: &str = ".js-submit-on-change";

pub const MONTHLY_TOTALS_TITLE: &str = "Additional cost of price concessions";
pub const BREAKDOWN_TITLE: &str = "Additional cost by presentation";

/// One month of price-concession spending.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingRow {
    pub date: NaiveDate,
    pub tariff_cost: Option<f64>,
    pub additional_cost: Option<f64>,
    pub is_estimate: bool,
}

/// Monthly totals ship as `[date, tariffCost, addCost, isEstimate]`; breakdown rows use names.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRow {
    Positional(String, Option<f64>, Option<f64>, Option<bool>),
    Named {
        date: String,
        #[serde(default, alias = "tariffCost")]
        tariff_cost: Option<f64>,
        #[serde(default, alias = "addCost", alias = "additionalCost")]
        additional_cost: Option<f64>,
        #[serde(default, alias = "isEstimate")]
        is_estimate: bool,
        #[serde(default)]
        is_incomplete_month: bool,
    },
}

impl RawRow {
    fn into_row(self) -> Result<SpendingRow, DashboardError> {
        let (date, tariff_cost, additional_cost, is_estimate) = match self {
            Self::Positional(date, tariff, additional, estimate) => {
                (date, tariff, additional, estimate.unwrap_or(false))
            }
            Self::Named {
                date,
                tariff_cost,
                additional_cost,
                is_estimate,
                is_incomplete_month,
            } => (date, tariff_cost, additional_cost, is_estimate || is_incomplete_month),
        };
        let parsed = date
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .ok_or_else(|| {
                DashboardError::ChartData(serde::de::Error::custom(format!("bad date {date:?}")))
            })?;
        Ok(SpendingRow {
            date: parsed,
            tariff_cost,
            additional_cost,
            is_estimate,
        })
    }
}

pub fn parse_rows(text: &str) -> Result<Vec<SpendingRow>, DashboardError> {
    let raw: Vec<RawRow> = serde_json::from_str(text).map_err(DashboardError::ChartData)?;
    raw.into_iter().map(RawRow::into_row).collect()
}

/// Tooltip markup for one column, linking to that month's breakdown.
pub fn tooltip_html(row: &SpendingRow) -> String {
    let value = format_pounds(row.additional_cost.unwrap_or(0.0));
    let estimated = if row.is_estimate { "estimated" } else { "" };
    format!(
        "<strong>{}</strong><br><strong>£{value}</strong> {estimated} additional cost<br>\
         <a href=\"?breakdown_date={}\">View cost breakdown &rarr;</a>",
        row.date.format("%B %Y"),
        row.date.format("%Y-%m-%d"),
    )
}

pub fn monthly_totals_options(rows: &[SpendingRow]) -> ChartOptions {
    spending_options(MONTHLY_TOTALS_CHART_ID, MONTHLY_TOTALS_TITLE, rows)
}

pub fn breakdown_options(rows: &[SpendingRow]) -> ChartOptions {
    spending_options(BREAKDOWN_CHART_ID, BREAKDOWN_TITLE, rows)
}

/// Stacked columns of additional cost, actual and estimated months as separate series.
pub fn spending_options(render_to: &str, title: &str, rows: &[SpendingRow]) -> ChartOptions {
    let mut chart = base_options(render_to);
    chart.title = Title {
        text: Some(title.to_string()),
    };
    chart.chart.kind = "column";
    chart.chart.margin_bottom = Some(80);

    chart.legend.layout = "horizontal";
    chart.legend.align = "right";
    chart.legend.vertical_align = "bottom";
    chart.legend.x = 0;
    chart.legend.y = 0;
    chart.legend.item_margin_bottom = Some(4);

    chart.plot_options.series.stacking = Some("normal");
    chart.y_axis.title = AxisTitle {
        enabled: true,
        text: Some("Cost (£)".to_string()),
    };

    chart.tooltip.use_html = true;
    chart.tooltip.header_format = String::new();
    chart.tooltip.point_format = "{point.tooltip}".to_string();
    chart.tooltip.value_decimals = 0;
    chart.tooltip.value_prefix = Some("£");
    chart.tooltip.style = Some(TooltipStyle {
        pointer_events: "auto",
    });

    let (estimated, actual): (Vec<&SpendingRow>, Vec<&SpendingRow>) =
        rows.iter().partition(|row| row.is_estimate);
    chart.series = vec![
        column_series("Actual cost", &actual, None),
        column_series("Estimated cost", &estimated, Some(ESTIMATE_COLOR)),
    ];
    chart
}

fn column_series(name: &str, rows: &[&SpendingRow], color: Option<&'static str>) -> Series {
    Series {
        name: name.to_string(),
        data: rows
            .iter()
            .filter_map(|row| {
                let x = row.date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
                Some(DataPoint {
                    x,
                    y: row.additional_cost,
                    tooltip: Some(tooltip_html(row)),
                })
            })
            .collect(),
        color,
        dash_style: None,
        line_width: None,
        z_index: 0,
        enable_mouse_tracking: true,
        show_in_legend: true,
    }
}
