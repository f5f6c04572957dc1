use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use measures_shared::export::{AnalyticsEvent, CSV_MIME_TYPE, DownloadAction, plan_download};
use measures_shared::{GlobalCentiles, MeasureRecord};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, MouseEvent, Url};

use crate::dom;

pub const DOWNLOAD_LINK_SELECTOR: &str = "#charts a[data-download-chart-id]";
const CHART_ID_ATTR: &str = "data-download-chart-id";

/// Whether the browser can save a generated file through an `<a download>` link.
fn download_supported() -> bool {
    dom::document()
        .and_then(|doc| doc.create_element("a").ok())
        .is_some_and(|anchor| Reflect::has(&anchor, &JsValue::from_str("download")).unwrap_or(false))
}

/// `ga('send', event)` when analytics is loaded on the page.
fn send_analytics(event: &AnalyticsEvent) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(ga) = Reflect::get(window.as_ref(), &JsValue::from_str("ga")) else {
        return;
    };
    let Ok(ga) = ga.dyn_into::<Function>() else {
        return;
    };
    let Ok(payload) = event.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) else {
        return;
    };
    if let Err(err) = ga.call2(&JsValue::NULL, &JsValue::from_str("send"), &payload) {
        web_sys::console::warn_1(&format!("analytics: {err:?}").into());
    }
}

fn save_file(filename: &str, contents: &str) -> Result<(), JsValue> {
    let document = dom::document().ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

    let props = BlobPropertyBag::new();
    props.set_type(CSV_MIME_TYPE);
    let blob = Blob::new_with_str_sequence_and_options(&Array::of1(&JsValue::from_str(contents)), &props)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor = document.create_element("a")?.dyn_into::<HtmlAnchorElement>()?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    dom::hide(&anchor);
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();
    Url::revoke_object_url(&url)
}

fn handle_click(records: &[MeasureRecord], centiles: &GlobalCentiles, chart_id: &str) {
    let lines = records
        .iter()
        .find(|r| r.chart_id == chart_id)
        .map(|r| centiles.lines(&r.measure_id))
        .unwrap_or(&[]);
    let plan = match plan_download(records, chart_id, lines, download_supported()) {
        Ok(plan) => plan,
        Err(err) => {
            dom::log_error("download", err);
            return;
        }
    };
    send_analytics(&plan.event);
    match plan.action {
        DownloadAction::Save { filename, csv } => {
            if let Err(err) = save_file(&filename, &csv) {
                web_sys::console::warn_1(&format!("download {filename}: {err:?}").into());
            }
        }
        DownloadAction::Alert(message) => {
            if let Some(window) = web_sys::window() {
                window.alert_with_message(message).ok();
            }
        }
        DownloadAction::Missing => {
            web_sys::console::warn_1(&format!("no data for chart {chart_id}").into());
        }
    }
}

/// Wire every rendered download link to its chart's data.
pub fn setup(records: Rc<[MeasureRecord]>, centiles: Rc<GlobalCentiles>) {
    for link in dom::query_all(DOWNLOAD_LINK_SELECTOR) {
        let Some(chart_id) = link.get_attribute(CHART_ID_ATTR) else {
            continue;
        };
        let records = records.clone();
        let centiles = centiles.clone();
        let handler = Closure::<dyn Fn(MouseEvent)>::new(move |e: MouseEvent| {
            e.prevent_default();
            handle_click(&records, &centiles, &chart_id);
        });
        link.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
            .ok();
        // Links live as long as the page.
        handler.forget();
    }
}
