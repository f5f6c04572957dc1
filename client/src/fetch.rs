use std::fmt;

use measures_shared::geo::FeatureCollection;
use measures_shared::{GlobalMeasure, MeasuresPayload, Options, PanelMeasure};
use serde::de::DeserializeOwned;

/// A failed GET. `status` is set when the server answered with a non-2xx code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub url: String,
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status} from {}: {}", self.url, self.message),
            None => write!(f, "{} ({})", self.message, self.url),
        }
    }
}

/// Both measure payloads for the page.
pub struct LoadedMeasures {
    pub panel: Vec<PanelMeasure>,
    pub global: Vec<GlobalMeasure>,
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let fail = |status: Option<u16>, message: String| FetchError {
        url: url.to_string(),
        status,
        message,
    };
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| fail(None, format!("fetch error: {e}")))?;

    if !resp.ok() {
        return Err(fail(Some(resp.status()), resp.status_text()));
    }

    resp.json::<T>()
        .await
        .map_err(|e| fail(None, format!("parse error: {e}")))
}

/// Request the panel and global measures together; either failure fails the pair.
pub async fn load_measures(options: &Options) -> Result<LoadedMeasures, FetchError> {
    join_payloads(
        get_json::<MeasuresPayload<PanelMeasure>>(&options.panel_measures_url),
        get_json::<MeasuresPayload<GlobalMeasure>>(&options.global_measures_url),
    )
    .await
}

/// The first error wins without waiting on the other request.
async fn join_payloads<P, G>(panel: P, global: G) -> Result<LoadedMeasures, FetchError>
where
    P: Future<Output = Result<MeasuresPayload<PanelMeasure>, FetchError>>,
    G: Future<Output = Result<MeasuresPayload<GlobalMeasure>, FetchError>>,
{
    let (panel, global) = futures::try_join!(panel, global)?;
    Ok(LoadedMeasures {
        panel: panel.measures,
        global: global.measures,
    })
}

pub async fn load_features(url: &str) -> Result<FeatureCollection, FetchError> {
    get_json::<FeatureCollection>(url).await
}

#[cfg(test)]
mod tests {
    use super::{FetchError, join_payloads};
    use futures::executor::block_on;
    use futures::future::{pending, ready};
    use measures_shared::{GlobalMeasure, MeasuresPayload, PanelMeasure};

    fn unavailable(url: &str) -> FetchError {
        FetchError {
            url: url.to_string(),
            status: Some(503),
            message: "Service Unavailable".to_string(),
        }
    }

    fn panel_payload() -> MeasuresPayload<PanelMeasure> {
        MeasuresPayload::from_json(r#"{"measures":[{"id":"ace","data":[]}]}"#).expect("panel")
    }

    #[test]
    fn joined_payloads_keep_both_halves() {
        let global = MeasuresPayload::<GlobalMeasure>::from_json(r#"{"measures":[]}"#).expect("global");
        let loaded = block_on(join_payloads(ready(Ok(panel_payload())), ready(Ok(global)))).expect("loaded");
        assert_eq!(loaded.panel.len(), 1);
        assert!(loaded.global.is_empty());
    }

    #[test]
    fn one_failure_fails_the_pair() {
        let result = block_on(join_payloads(
            ready(Ok(panel_payload())),
            ready(Err::<MeasuresPayload<GlobalMeasure>, _>(unavailable("/global"))),
        ));
        assert_eq!(result.err(), Some(unavailable("/global")));
    }

    #[test]
    fn failure_does_not_wait_for_the_slower_request() {
        let result = block_on(join_payloads(
            ready(Err(unavailable("/panel"))),
            pending::<Result<MeasuresPayload<GlobalMeasure>, FetchError>>(),
        ));
        assert_eq!(result.err(), Some(unavailable("/panel")));
    }

    #[test]
    fn display_includes_status_when_present() {
        let err = FetchError {
            url: "/api/measure_by_practice".to_string(),
            status: Some(503),
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 503 from /api/measure_by_practice: Service Unavailable"
        );

        let err = FetchError {
            status: None,
            message: "fetch error: offline".to_string(),
            ..err
        };
        assert_eq!(err.to_string(), "fetch error: offline (/api/measure_by_practice)");
    }
}
