use serde::Serialize;

use crate::measure::MeasureRecord;
use crate::options::{Options, RollUpBy};
use crate::transform::{CentileLine, GlobalCentiles};

pub const ORG_LINE_COLOR: &str = "#e31a1c";
pub const CENTILE_LINE_COLOR: &str = "#1f78b4";
pub const MINOR_CENTILE_COLOR: &str = "#a6cee3";
pub const ESTIMATE_COLOR: &str = "#E97E38";

const FONT_FAMILY: &str = "\"Roboto\", \"Helvetica Neue\", Helvetica, Arial, sans-serif";

/// Highcharts configuration, serialized as-is into `new Highcharts.Chart(...)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub chart: ChartSettings,
    pub title: Title,
    pub credits: Toggle,
    pub legend: Legend,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub tooltip: Tooltip,
    pub plot_options: PlotOptions,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSettings {
    pub render_to: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_bottom: Option<u32>,
    pub style: FontStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontStyle {
    pub font_family: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub enabled: bool,
    pub layout: &'static str,
    pub align: &'static str,
    pub vertical_align: &'static str,
    pub x: i32,
    pub y: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_margin_bottom: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub title: AxisTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<AxisLabels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub enabled: bool,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLabels {
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub use_html: bool,
    pub header_format: String,
    pub point_format: String,
    pub value_decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_prefix: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_suffix: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TooltipStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipStyle {
    pub pointer_events: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotOptions {
    pub series: SeriesDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDefaults {
    pub marker: Toggle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacking: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    pub data: Vec<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_style: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    pub z_index: i32,
    pub enable_mouse_tracking: bool,
    pub show_in_legend: bool,
}

/// A point object; extra fields are readable from tooltip formats as `{point.<field>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub x: i64,
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

/// Shared defaults every chart on the site starts from.
pub fn base_options(render_to: &str) -> ChartOptions {
    ChartOptions {
        chart: ChartSettings {
            render_to: render_to.to_string(),
            kind: "line",
            height: 250,
            margin_bottom: None,
            style: FontStyle {
                font_family: FONT_FAMILY,
            },
        },
        title: Title { text: None },
        credits: Toggle { enabled: false },
        legend: Legend {
            enabled: true,
            layout: "vertical",
            align: "right",
            vertical_align: "top",
            x: 0,
            y: 0,
            item_margin_bottom: None,
        },
        x_axis: Axis {
            kind: Some("datetime"),
            title: AxisTitle {
                enabled: false,
                text: None,
            },
            labels: Some(AxisLabels {
                format: "{value:%b '%y}".to_string(),
            }),
            min: None,
            max: None,
        },
        y_axis: Axis {
            kind: None,
            title: AxisTitle {
                enabled: false,
                text: None,
            },
            labels: None,
            min: Some(0.0),
            max: None,
        },
        tooltip: Tooltip {
            use_html: false,
            header_format: "<span style=\"font-size: 10px\">{point.key:%B %Y}</span><br/>"
                .to_string(),
            point_format: "<b>{series.name}</b>: {point.y}<br/>".to_string(),
            value_decimals: 2,
            value_prefix: None,
            value_suffix: None,
            style: None,
        },
        plot_options: PlotOptions {
            series: SeriesDefaults {
                marker: Toggle { enabled: false },
                stacking: None,
            },
        },
        series: Vec::new(),
    }
}

/// Options for one measure chart, or `None` when there is nothing to plot.
pub fn graph_options(
    record: &MeasureRecord,
    centiles: &GlobalCentiles,
    options: &Options,
) -> Option<ChartOptions> {
    if !record.has_plottable_values() {
        return None;
    }
    let scale = if record.is_percentage { 100.0 } else { 1.0 };
    let mut chart = base_options(&record.chart_id);

    if record.is_percentage {
        chart.y_axis.labels = Some(AxisLabels {
            format: "{value}%".to_string(),
        });
        chart.tooltip.value_suffix = Some("%");
        chart.tooltip.value_decimals = 1;
    } else {
        chart.tooltip.value_decimals = 3;
    }
    if options.roll_up_by == RollUpBy::Org
        && let Some(extent) = centiles.y_extent
    {
        chart.y_axis.min = Some(extent.min * scale);
        chart.y_axis.max = Some(extent.max * scale);
    }

    let org_label = match options.roll_up_by {
        RollUpBy::Measure => format!("This {}", options.org_type.human()),
        RollUpBy::Org => record.org_name.clone(),
    };
    chart.series.push(Series {
        name: org_label,
        data: record
            .points
            .iter()
            .map(|p| DataPoint {
                x: p.x,
                y: p.value.map(|v| v * scale),
                tooltip: None,
            })
            .collect(),
        color: Some(ORG_LINE_COLOR),
        dash_style: None,
        line_width: Some(2.0),
        z_index: 1,
        enable_mouse_tracking: true,
        show_in_legend: true,
    });
    chart
        .series
        .extend(centiles.lines(&record.measure_id).iter().map(|line| centile_series(line, scale)));

    Some(chart)
}

fn centile_series(line: &CentileLine, scale: f64) -> Series {
    let (name, color, dash_style, line_width, show_in_legend) = match line.centile {
        50 => ("Median".to_string(), CENTILE_LINE_COLOR, "LongDash", 1.5, true),
        10 | 90 => (
            format!("{}th percentile", line.centile),
            CENTILE_LINE_COLOR,
            "ShortDash",
            1.0,
            true,
        ),
        c => (format!("{c}th percentile"), MINOR_CENTILE_COLOR, "Dot", 1.0, false),
    };
    Series {
        name,
        data: line
            .points
            .iter()
            .map(|&(x, y)| DataPoint {
                x,
                y: Some(y * scale),
                tooltip: None,
            })
            .collect(),
        color: Some(color),
        dash_style: Some(dash_style),
        line_width: Some(line_width),
        z_index: 0,
        enable_mouse_tracking: false,
        show_in_legend,
    }
}
