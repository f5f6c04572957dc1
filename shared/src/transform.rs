use std::collections::HashMap;

use serde::Serialize;

use crate::measure::{
    CENTILES, GlobalMeasure, MeasureMeta, MeasureRecord, PanelDatum, PanelMeasure, Point,
    date_to_millis,
};
use crate::options::{OrgType, Options, RollUpBy};

/// Number of trailing periods used for ranking and savings.
pub const RANKING_MONTHS: usize = 6;

/// Element every panel fragment is appended to.
pub const CHART_CONTAINER_ID: &str = "charts";

/// One national centile line for one measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentileLine {
    pub centile: u8,
    /// `(epoch millis, value)` pairs, ascending by date.
    pub points: Vec<(i64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YAxisExtent {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalCentiles {
    by_measure: HashMap<String, Vec<CentileLine>>,
    pub y_extent: Option<YAxisExtent>,
}

impl GlobalCentiles {
    pub fn lines(&self, measure_id: &str) -> &[CentileLine] {
        self.by_measure
            .get(measure_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total: usize,
    pub with_data: usize,
    pub worse_than_median: usize,
    pub proportion_worse_than_median: u32,
    pub potential_savings_50th: f64,
    pub potential_savings_10th: f64,
    pub potential_savings_50th_text: String,
    pub org_type_human: String,
    pub performance_description: String,
}

/// Everything the renderers need, computed once per page load.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMeasures {
    pub records: Vec<MeasureRecord>,
    pub summary: PerformanceSummary,
    pub centiles: GlobalCentiles,
}

pub fn prepare(
    panel: &[PanelMeasure],
    global: &[GlobalMeasure],
    options: &Options,
) -> PreparedMeasures {
    let mut centiles = global_centiles(global, options.org_type);
    let mut records = build_records(panel, options);
    sort_records(&mut records);
    centiles.y_extent = widen_extent(centiles.y_extent, &records);
    let summary = performance_summary(&records, options);
    PreparedMeasures {
        records,
        summary,
        centiles,
    }
}

pub fn global_centiles(global: &[GlobalMeasure], org_type: OrgType) -> GlobalCentiles {
    let key = org_type.api_key();
    let mut by_measure = HashMap::new();
    let mut extent: Option<YAxisExtent> = None;

    for measure in global {
        let mut lines: Vec<CentileLine> = CENTILES
            .iter()
            .map(|&centile| CentileLine {
                centile,
                points: Vec::new(),
            })
            .collect();

        for datum in &measure.data {
            let Some(x) = date_to_millis(&datum.date) else {
                continue;
            };
            let Some(values) = datum.percentiles.get(key) else {
                continue;
            };
            for line in &mut lines {
                if let Some(Some(value)) = values.get(&line.centile.to_string()) {
                    line.points.push((x, *value));
                    extent = Some(include(extent, *value));
                }
            }
        }

        for line in &mut lines {
            line.points.sort_by_key(|(x, _)| *x);
        }
        lines.retain(|line| !line.points.is_empty());
        by_measure.insert(measure.meta.id.clone(), lines);
    }

    GlobalCentiles {
        by_measure,
        y_extent: extent,
    }
}

fn include(extent: Option<YAxisExtent>, value: f64) -> YAxisExtent {
    match extent {
        Some(e) => YAxisExtent {
            min: e.min.min(value),
            max: e.max.max(value),
        },
        None => YAxisExtent {
            min: value.min(0.0),
            max: value,
        },
    }
}

fn widen_extent(extent: Option<YAxisExtent>, records: &[MeasureRecord]) -> Option<YAxisExtent> {
    records
        .iter()
        .flat_map(|r| r.points.iter().filter_map(|p| p.value))
        .fold(extent, |acc, value| Some(include(acc, value)))
}

/// Build one record per chart: per measure, or per organisation when rolled up by org.
pub fn build_records(panel: &[PanelMeasure], options: &Options) -> Vec<MeasureRecord> {
    let mut records = Vec::new();
    for measure in panel {
        match options.roll_up_by {
            RollUpBy::Measure => {
                let rows: Vec<&PanelDatum> = measure.data.iter().collect();
                let org_id = rows
                    .iter()
                    .find_map(|d| d.org_id())
                    .map(str::to_string)
                    .or_else(|| options.org_id.clone())
                    .unwrap_or_default();
                records.push(build_record(&measure.meta, &org_id, &rows, options));
            }
            RollUpBy::Org => {
                for (org_id, rows) in group_by_org(&measure.data) {
                    records.push(build_record(&measure.meta, &org_id, &rows, options));
                }
            }
        }
    }
    records
}

fn group_by_org(data: &[PanelDatum]) -> Vec<(String, Vec<&PanelDatum>)> {
    let mut order: Vec<(String, Vec<&PanelDatum>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for datum in data {
        let Some(org_id) = datum.org_id() else {
            continue;
        };
        match index.get(org_id).copied() {
            Some(i) => order[i].1.push(datum),
            None => {
                index.insert(org_id.to_string(), order.len());
                order.push((org_id.to_string(), vec![datum]));
            }
        }
    }
    order
}

fn build_record(
    meta: &MeasureMeta,
    org_id: &str,
    rows: &[&PanelDatum],
    options: &Options,
) -> MeasureRecord {
    let mut dated: Vec<(i64, &PanelDatum)> = rows
        .iter()
        .filter_map(|d| date_to_millis(&d.date).map(|x| (x, *d)))
        .collect();
    dated.sort_by_key(|(x, _)| *x);

    let points: Vec<Point> = dated
        .iter()
        .map(|(x, d)| Point {
            date: d.date.clone(),
            x: *x,
            numerator: d.numerator,
            denominator: d.denominator,
            value: d.calc_value,
            percentile: d.percentile,
        })
        .collect();

    let window = &dated[dated.len().saturating_sub(RANKING_MONTHS)..];
    let mean_percentile = mean(window.iter().filter_map(|(_, d)| d.percentile));
    let (cost_saving_10th, cost_saving_50th) = if meta.is_cost_based {
        (
            window.iter().map(|(_, d)| saving_at(d, "10")).sum::<f64>(),
            window.iter().map(|(_, d)| saving_at(d, "50")).sum::<f64>(),
        )
    } else {
        (0.0, 0.0)
    };

    let org_name = rows
        .iter()
        .find_map(|d| d.org_name())
        .map(str::to_string)
        .or_else(|| options.org_name.clone())
        .unwrap_or_else(|| org_id.to_string());

    let (chart_id, chart_title) = match options.roll_up_by {
        RollUpBy::Measure => (meta.id.clone(), display_name(meta)),
        RollUpBy::Org => (org_id.to_string(), format!("{org_name} ({org_id})")),
    };
    let chart_title_url = options
        .entity_url(org_id, &meta.id)
        .or_else(|| meta.url.clone());

    let mut record = MeasureRecord {
        measure_id: meta.id.clone(),
        measure_name: display_name(meta),
        org_id: org_id.to_string(),
        org_name,
        points,
        mean_percentile,
        cost_saving_10th,
        cost_saving_50th,
        is_cost_saving: meta.is_cost_based && cost_saving_50th > 0.0,
        is_cost_based: meta.is_cost_based,
        is_percentage: meta.is_percentage,
        low_is_good: meta.low_is_good,
        chart_id,
        chart_container_id: CHART_CONTAINER_ID.to_string(),
        chart_title,
        chart_title_url,
        chart_explanation: String::new(),
        numerator_short: meta.numerator_short.clone(),
        denominator_short: meta.denominator_short.clone(),
        description: meta.description.clone(),
        why_it_matters: meta.why_it_matters.clone(),
        tags: meta.tags.clone(),
        tags_for_tooltip: meta.tags.join(", "),
    };
    record.chart_explanation = explanation(&record, options.org_type);
    record
}

fn display_name(meta: &MeasureMeta) -> String {
    if meta.name.is_empty() {
        meta.title.clone().unwrap_or_else(|| meta.id.clone())
    } else {
        meta.name.clone()
    }
}

fn saving_at(datum: &PanelDatum, centile: &str) -> f64 {
    datum
        .cost_savings
        .as_ref()
        .and_then(|s| s.get(centile))
        .copied()
        .unwrap_or(0.0)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn explanation(record: &MeasureRecord, org_type: OrgType) -> String {
    let Some(p) = record.mean_percentile else {
        return "No data available for the past six months.".to_string();
    };
    let human = org_type.human();
    let mut text = format!(
        "This {human} was at the {} percentile on average across the past six months.",
        ordinal(p.round() as u32)
    );
    if let Some(badness) = record.badness()
        && record.low_is_good.is_some()
    {
        if badness > 50.0 {
            text.push_str(" That is worse than the national median.");
        } else {
            text.push_str(" That is better than the national median.");
        }
    }
    if record.is_cost_saving {
        text.push_str(&format!(
            " If it had prescribed in line with the median, this {human} would have spent £{} less over the past six months.",
            format_pounds(record.cost_saving_50th)
        ));
    }
    text
}

/// Worst first; records without a percentile last; ties keep input order.
pub fn sort_records(records: &mut [MeasureRecord]) {
    records.sort_by(|a, b| match (a.badness(), b.badness()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

pub fn performance_summary(records: &[MeasureRecord], options: &Options) -> PerformanceSummary {
    let total = records.len();
    let with_data = records.iter().filter(|r| r.mean_percentile.is_some()).count();
    let worse_than_median = records
        .iter()
        .filter(|r| r.low_is_good.is_some() && r.badness().is_some_and(|b| b > 50.0))
        .count();
    let proportion_worse_than_median = if with_data == 0 {
        0
    } else {
        ((worse_than_median as f64 / with_data as f64) * 100.0).round() as u32
    };
    let positive = |value: f64| value.max(0.0);
    let potential_savings_50th: f64 = records.iter().map(|r| positive(r.cost_saving_50th)).sum();
    let potential_savings_10th: f64 = records.iter().map(|r| positive(r.cost_saving_10th)).sum();
    let human = options.org_type.human();

    let mut performance_description = match options.roll_up_by {
        RollUpBy::Measure => format!(
            "Over the past six months, this {human} was worse than the national median on {worse_than_median} of {with_data} measures."
        ),
        RollUpBy::Org => format!(
            "Over the past six months, {worse_than_median} of {with_data} organisations were worse than the national median."
        ),
    };
    if potential_savings_50th > 0.0 {
        performance_description.push_str(&format!(
            " Prescribing in line with the median would have saved £{}.",
            format_pounds(potential_savings_50th)
        ));
    }

    PerformanceSummary {
        total,
        with_data,
        worse_than_median,
        proportion_worse_than_median,
        potential_savings_50th,
        potential_savings_10th,
        potential_savings_50th_text: format_pounds(potential_savings_50th),
        org_type_human: human.to_string(),
        performance_description,
    }
}

/// Whole pounds with thousands separators ("12,345").
pub fn format_pounds(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MeasuresPayload;
    use serde_json::json;

    fn options(roll_up: &str) -> Options {
        Options::from_json(
            &json!({
                "panelMeasuresUrl": "/panel",
                "globalMeasuresUrl": "/global",
                "orgType": "practice",
                "rollUpBy": roll_up,
                "orgId": "A81001",
                "orgName": "Ashby Surgery"
            })
            .to_string(),
        )
        .expect("options")
    }

    fn row(date: &str, org: &str, value: f64, percentile: Option<f64>, saving_50: f64) -> serde_json::Value {
        json!({
            "date": date,
            "practice_id": org,
            "practice_name": format!("Practice {org}"),
            "numerator": value * 10.0,
            "denominator": 10.0,
            "calc_value": value,
            "percentile": percentile,
            "cost_savings": {"10": saving_50 * 2.0, "50": saving_50}
        })
    }

    fn panel(measures: serde_json::Value) -> Vec<PanelMeasure> {
        MeasuresPayload::<PanelMeasure>::from_json(&json!({ "measures": measures }).to_string())
            .expect("panel")
            .measures
    }

    fn global() -> Vec<GlobalMeasure> {
        MeasuresPayload::<GlobalMeasure>::from_json(
            &json!({"measures": [{
                "id": "ace",
                "data": [
                    {"date": "2024-02-01", "percentiles": {"practice": {"10": 0.2, "50": 0.5, "90": 0.9}}},
                    {"date": "2024-01-01", "percentiles": {"practice": {"10": 0.1, "50": 0.4, "90": 1.4},
                                                           "ccg": {"10": 7.0}}}
                ]
            }]})
            .to_string(),
        )
        .expect("global")
        .measures
    }

    #[test]
    fn centiles_follow_org_type_and_sort_by_date() {
        let centiles = global_centiles(&global(), OrgType::Practice);
        let lines = centiles.lines("ace");
        let labels: Vec<u8> = lines.iter().map(|l| l.centile).collect();
        assert_eq!(labels, vec![10, 50, 90]);
        assert_eq!(lines[0].points[0].1, 0.1);
        assert_eq!(lines[0].points[1].1, 0.2);
        let extent = centiles.y_extent.expect("extent");
        assert_eq!(extent.min, 0.0);
        assert_eq!(extent.max, 1.4);
        assert!(centiles.lines("missing").is_empty());
    }

    #[test]
    fn mean_percentile_uses_last_six_periods_only() {
        let dates = [
            "2023-06-01", "2023-07-01", "2023-08-01", "2023-09-01", "2023-10-01", "2023-11-01",
            "2023-12-01",
        ];
        let rows: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| row(d, "A81001", 0.5, Some(if i == 0 { 100.0 } else { 40.0 }), 0.0))
            .collect();
        let records = build_records(
            &panel(json!([{"id": "ace", "name": "ACE", "data": rows}])),
            &options("measure_id"),
        );
        assert_eq!(records[0].mean_percentile, Some(40.0));
    }

    #[test]
    fn null_percentiles_are_skipped_and_all_null_is_none() {
        let records = build_records(
            &panel(json!([
                {"id": "a", "data": [row("2024-01-01", "X", 1.0, None, 0.0), row("2024-02-01", "X", 1.0, Some(30.0), 0.0)]},
                {"id": "b", "data": [row("2024-01-01", "X", 1.0, None, 0.0)]}
            ])),
            &options("measure_id"),
        );
        assert_eq!(records[0].mean_percentile, Some(30.0));
        assert_eq!(records[1].mean_percentile, None);
        assert!(records[1].chart_explanation.starts_with("No data"));
    }

    #[test]
    fn savings_only_count_for_cost_based_measures() {
        let records = build_records(
            &panel(json!([
                {"id": "cost", "is_cost_based": true, "data": [
                    row("2024-01-01", "X", 1.0, Some(80.0), 100.0),
                    row("2024-02-01", "X", 1.0, Some(80.0), 50.0)
                ]},
                {"id": "plain", "data": [row("2024-01-01", "X", 1.0, Some(80.0), 100.0)]}
            ])),
            &options("measure_id"),
        );
        assert_eq!(records[0].cost_saving_50th, 150.0);
        assert_eq!(records[0].cost_saving_10th, 300.0);
        assert!(records[0].is_cost_saving);
        assert_eq!(records[1].cost_saving_50th, 0.0);
        assert!(!records[1].is_cost_saving);
    }

    #[test]
    fn org_roll_up_builds_one_record_per_org_in_first_seen_order() {
        let records = build_records(
            &panel(json!([{"id": "ace", "name": "ACE", "data": [
                row("2024-01-01", "B", 1.0, Some(10.0), 0.0),
                row("2024-01-01", "A", 1.0, Some(20.0), 0.0),
                row("2024-02-01", "B", 2.0, Some(30.0), 0.0)
            ]}])),
            &options("org_id"),
        );
        let ids: Vec<&str> = records.iter().map(|r| r.chart_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(records[0].points.len(), 2);
        assert_eq!(records[0].chart_title, "Practice B (B)");
        assert_eq!(records[0].mean_percentile, Some(20.0));
    }

    #[test]
    fn measure_roll_up_uses_measure_id_as_chart_id() {
        let records = build_records(
            &panel(json!([{"id": "ace", "name": "ACE inhibitors", "tags": ["core", "cost"], "data": [
                row("2024-01-01", "A81001", 1.0, Some(10.0), 0.0)
            ]}])),
            &options("measure_id"),
        );
        assert_eq!(records[0].chart_id, "ace");
        assert_eq!(records[0].chart_container_id, "charts");
        assert_eq!(records[0].chart_title, "ACE inhibitors");
        assert_eq!(records[0].tags_for_tooltip, "core, cost");
    }

    #[test]
    fn sort_puts_worst_first_and_missing_last() {
        let records = build_records(
            &panel(json!([
                {"id": "none", "low_is_good": true, "data": [row("2024-01-01", "X", 1.0, None, 0.0)]},
                {"id": "good", "low_is_good": true, "data": [row("2024-01-01", "X", 1.0, Some(10.0), 0.0)]},
                {"id": "high_good", "low_is_good": false, "data": [row("2024-01-01", "X", 1.0, Some(5.0), 0.0)]},
                {"id": "bad", "low_is_good": true, "data": [row("2024-01-01", "X", 1.0, Some(70.0), 0.0)]}
            ])),
            &options("measure_id"),
        );
        let mut records = records;
        sort_records(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.measure_id.as_str()).collect();
        assert_eq!(ids, vec!["high_good", "bad", "good", "none"]);
    }

    #[test]
    fn summary_counts_worse_than_median_and_savings() {
        let prepared = prepare(
            &panel(json!([
                {"id": "a", "low_is_good": true, "is_cost_based": true, "data": [row("2024-01-01", "X", 1.0, Some(80.0), 1234.4)]},
                {"id": "b", "low_is_good": true, "data": [row("2024-01-01", "X", 1.0, Some(20.0), 0.0)]},
                {"id": "c", "data": [row("2024-01-01", "X", 1.0, None, 0.0)]}
            ])),
            &global(),
            &options("measure_id"),
        );
        let summary = &prepared.summary;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.with_data, 2);
        assert_eq!(summary.worse_than_median, 1);
        assert_eq!(summary.proportion_worse_than_median, 50);
        assert_eq!(summary.potential_savings_50th_text, "1,234");
        assert!(summary.performance_description.contains("1 of 2 measures"));
        assert_eq!(prepared.records[0].measure_id, "a");
    }

    #[test]
    fn formats_pounds_and_ordinals() {
        assert_eq!(format_pounds(0.4), "0");
        assert_eq!(format_pounds(999.6), "1,000");
        assert_eq!(format_pounds(1_234_567.0), "1,234,567");
        assert_eq!(format_pounds(-4_500.0), "-4,500");
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(113), "113th");
    }
}
