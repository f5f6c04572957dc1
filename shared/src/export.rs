use serde::Serialize;

use crate::error::DashboardError;
use crate::measure::MeasureRecord;
use crate::transform::CentileLine;

pub const UNSUPPORTED_BROWSER_MESSAGE: &str =
    "Sorry, you must use a newer web browser to download data";
pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";

const ANALYTICS_CATEGORY: &str = "measure_data";

/// One `ga('send', ...)` hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub hit_type: &'static str,
    pub event_category: &'static str,
    pub event_action: &'static str,
    pub event_label: String,
}

impl AnalyticsEvent {
    fn download(chart_id: &str, supported: bool) -> Self {
        Self {
            hit_type: "event",
            event_category: ANALYTICS_CATEGORY,
            event_action: if supported { "download" } else { "failed_download" },
            event_label: chart_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadAction {
    Save { filename: String, csv: String },
    Alert(&'static str),
    /// The link names a chart with no record behind it.
    Missing,
}

/// Everything a download click does, in order: report `event`, then perform `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub event: AnalyticsEvent,
    pub action: DownloadAction,
}

pub fn plan_download(
    records: &[MeasureRecord],
    chart_id: &str,
    centiles: &[CentileLine],
    supported: bool,
) -> Result<DownloadPlan, DashboardError> {
    let event = AnalyticsEvent::download(chart_id, supported);
    if !supported {
        return Ok(DownloadPlan {
            event,
            action: DownloadAction::Alert(UNSUPPORTED_BROWSER_MESSAGE),
        });
    }
    let Some(record) = records.iter().find(|r| r.chart_id == chart_id) else {
        return Ok(DownloadPlan {
            event,
            action: DownloadAction::Missing,
        });
    };
    Ok(DownloadPlan {
        event,
        action: DownloadAction::Save {
            filename: download_filename(record),
            csv: record_csv(record, centiles)?,
        },
    })
}

/// `<measure>-<org>.csv`, lowercased, with anything outside `[a-z0-9_]` folded to `-`.
pub fn download_filename(record: &MeasureRecord) -> String {
    let stem = if record.org_id.is_empty() {
        record.chart_id.clone()
    } else {
        format!("{}-{}", record.measure_id, record.org_id)
    };
    let mut name = String::with_capacity(stem.len() + 4);
    let mut last_dash = false;
    for ch in stem.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            name.push(ch);
            last_dash = false;
        } else if !last_dash {
            name.push('-');
            last_dash = true;
        }
    }
    let name = name.trim_matches('-');
    if name.is_empty() {
        return "measure-data.csv".to_string();
    }
    format!("{name}.csv")
}

/// One row per period; national centile columns follow the organisation's own values.
pub fn record_csv(record: &MeasureRecord, centiles: &[CentileLine]) -> Result<String, DashboardError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![
        "date".to_string(),
        "org_id".to_string(),
        "org_name".to_string(),
        "numerator".to_string(),
        "denominator".to_string(),
        "ratio".to_string(),
        "percentile".to_string(),
    ];
    header.extend(centiles.iter().map(|line| format!("{}th_centile", line.centile)));
    writer.write_record(&header)?;

    for point in &record.points {
        let mut row = vec![
            point.date.clone(),
            record.org_id.clone(),
            record.org_name.clone(),
            cell(point.numerator),
            cell(point.denominator),
            cell(point.value),
            cell(point.percentile),
        ];
        row.extend(centiles.iter().map(|line| {
            cell(line.points.iter().find(|(x, _)| *x == point.x).map(|(_, y)| *y))
        }));
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Export(e.to_string()))
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Point;

    fn record(chart_id: &str) -> MeasureRecord {
        MeasureRecord {
            measure_id: "ace".to_string(),
            measure_name: "ACE inhibitors".to_string(),
            org_id: "A81001".to_string(),
            org_name: "Ashby, Surgery".to_string(),
            points: vec![
                Point {
                    date: "2024-01-01".to_string(),
                    x: 1_704_067_200_000,
                    numerator: Some(12.0),
                    denominator: Some(48.0),
                    value: Some(0.25),
                    percentile: Some(61.5),
                },
                Point {
                    date: "2024-02-01".to_string(),
                    x: 1_706_745_600_000,
                    numerator: None,
                    denominator: None,
                    value: None,
                    percentile: None,
                },
            ],
            mean_percentile: Some(61.5),
            cost_saving_10th: 0.0,
            cost_saving_50th: 0.0,
            is_cost_saving: false,
            is_cost_based: false,
            is_percentage: true,
            low_is_good: Some(true),
            chart_id: chart_id.to_string(),
            chart_container_id: "charts".to_string(),
            chart_title: "ACE inhibitors".to_string(),
            chart_title_url: None,
            chart_explanation: String::new(),
            numerator_short: None,
            denominator_short: None,
            description: None,
            why_it_matters: None,
            tags: Vec::new(),
            tags_for_tooltip: String::new(),
        }
    }

    #[test]
    fn supported_download_saves_one_file_and_reports_once() {
        let records = vec![record("chart_1"), record("chart_42")];
        let plan = plan_download(&records, "chart_42", &[], true).expect("plan");
        assert_eq!(plan.event.event_category, "measure_data");
        assert_eq!(plan.event.event_action, "download");
        assert_eq!(plan.event.event_label, "chart_42");
        match plan.action {
            DownloadAction::Save { filename, csv } => {
                assert_eq!(filename, "ace-a81001.csv");
                assert_eq!(filename, download_filename(&records[1]));
                assert!(csv.starts_with("date,org_id,org_name,numerator,denominator,ratio,percentile\n"));
            }
            other => panic!("expected a save, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_browser_alerts_instead() {
        let plan = plan_download(&[record("chart_42")], "chart_42", &[], false).expect("plan");
        assert_eq!(plan.event.event_action, "failed_download");
        assert_eq!(plan.action, DownloadAction::Alert(UNSUPPORTED_BROWSER_MESSAGE));
    }

    #[test]
    fn unknown_chart_still_reports_but_saves_nothing() {
        let plan = plan_download(&[record("chart_1")], "chart_9", &[], true).expect("plan");
        assert_eq!(plan.event.event_label, "chart_9");
        assert_eq!(plan.action, DownloadAction::Missing);
    }

    #[test]
    fn csv_rows_quote_and_leave_gaps_blank() {
        let centiles = vec![CentileLine {
            centile: 50,
            points: vec![(1_704_067_200_000, 0.3)],
        }];
        let csv = record_csv(&record("chart_42"), &centiles).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,org_id,org_name,numerator,denominator,ratio,percentile,50th_centile");
        assert_eq!(lines[1], r#"2024-01-01,A81001,"Ashby, Surgery",12,48,0.25,61.5,0.3"#);
        assert_eq!(lines[2], r#"2024-02-01,A81001,"Ashby, Surgery",,,,,"#);
    }

    #[test]
    fn filename_is_stable_and_safe() {
        let mut r = record("x");
        r.measure_id = "Lp Zoo".to_string();
        r.org_id = "00C/1".to_string();
        assert_eq!(download_filename(&r), "lp-zoo-00c-1.csv");
        r.org_id.clear();
        r.chart_id = "chart_42".to_string();
        assert_eq!(download_filename(&r), "chart_42.csv");
    }

    #[test]
    fn analytics_event_uses_ga_field_names() {
        let plan = plan_download(&[], "chart_42", &[], true).expect("plan");
        let value = serde_json::to_value(&plan.event).expect("json");
        assert_eq!(value["hitType"], "event");
        assert_eq!(value["eventAction"], "download");
        assert_eq!(value["eventLabel"], "chart_42");
    }
}
