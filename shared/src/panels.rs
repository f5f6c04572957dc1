use serde_json::Value;

use crate::measure::MeasureRecord;
use crate::options::Options;
use crate::error::DashboardError;
use crate::template::Templates;
use crate::transform::PerformanceSummary;

pub const SUMMARY_TEMPLATE_ID: &str = "summary-panel";
pub const PANEL_TEMPLATE_ID: &str = "measure-panel";
pub const SUMMARY_TARGET_ID: &str = "perfsummary";

/// Used when the page does not ship its own `#summary-panel` template.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = r#"<p class="perf-summary">{{performanceDescription}}</p>
{{#if potentialSavings50th}}<p class="perf-savings">Potential savings: <strong>£{{potentialSavings50thText}}</strong></p>{{/if}}"#;

/// Used when the page does not ship its own `#measure-panel` template.
pub const DEFAULT_PANEL_TEMPLATE: &str = r##"<div class="chart col-md-6" id="measure_{{chartId}}"{{#if isCostSaving}} data-costsaving="{{costSaving50th}}"{{/if}}>
  <div class="panel panel-default">
    <div class="panel-heading">
      <h4>{{#if chartTitleUrl}}<a href="{{chartTitleUrl}}">{{chartTitle}}</a>{{else}}{{chartTitle}}{{/if}}</h4>
      {{#if tagsForTooltip}}<span class="tags" title="{{tagsForTooltip}}">{{#each tags}}<span class="label label-default">{{this}}</span> {{/each}}</span>{{/if}}
    </div>
    <div class="panel-body">
      <p class="explanation">{{chartExplanation}}</p>
      <div id="{{chartId}}" class="chart-widget"></div>
      <a href="#" data-download-chart-id="{{chartId}}">Download data (CSV)</a>
    </div>
  </div>
</div>"##;

/// A rendered panel, to be appended to `container_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelFragment {
    pub container_id: String,
    pub chart_id: String,
    pub html: String,
}

pub fn render_summary(
    templates: &Templates,
    summary: &PerformanceSummary,
    options: &Options,
) -> Result<String, DashboardError> {
    let mut context = serde_json::to_value(summary).unwrap_or_default();
    if let Value::Object(map) = &mut context {
        map.insert("options".to_string(), serde_json::to_value(options).unwrap_or_default());
    }
    templates.render(SUMMARY_TEMPLATE_ID, &context)
}

/// One fragment per record, in record order. The first render failure aborts the batch.
pub fn render_panels(templates: &Templates, records: &[MeasureRecord]) -> Result<Vec<PanelFragment>, DashboardError> {
    records
        .iter()
        .map(|record| {
            Ok(PanelFragment {
                container_id: record.chart_container_id.clone(),
                chart_id: record.chart_id.clone(),
                html: templates.render(PANEL_TEMPLATE_ID, &serde_json::to_value(record).unwrap_or_default())?,
            })
        })
        .collect()
}
