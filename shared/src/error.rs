use thiserror::Error;

/// Failures raised while preparing dashboard data or markup.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid options: {0}")]
    Options(#[source] serde_json::Error),
    #[error("invalid measure payload: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("invalid chart data: {0}")]
    ChartData(#[source] serde_json::Error),
    #[error("template error at line {line}, column {column}: {message}")]
    Template {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("template render failed: {0}")]
    Render(String),
    #[error("csv export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}
