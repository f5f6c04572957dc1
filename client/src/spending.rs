use measures_shared::spending::{
    BREAKDOWN_CHART_ID, BREAKDOWN_DATA_ID, MONTHLY_TOTALS_CHART_ID, MONTHLY_TOTALS_DATA_ID,
    SUBMIT_ON_CHANGE_SELECTOR, breakdown_options, monthly_totals_options, parse_rows,
};
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlFormElement};

use crate::{charts, dom};

/// Price-concession pages: monthly totals, the optional breakdown, and auto-submitting filters.
pub fn setup() {
    setup_submit_on_change();

    let Some(text) = dom::by_id(MONTHLY_TOTALS_DATA_ID).and_then(|el| el.text_content()) else {
        return;
    };
    match parse_rows(&text) {
        Ok(rows) if dom::by_id(MONTHLY_TOTALS_CHART_ID).is_some() => {
            if let Err(err) = charts::draw(&monthly_totals_options(&rows)) {
                web_sys::console::warn_1(&format!("monthly totals chart: {err:?}").into());
            }
        }
        Ok(_) => {}
        Err(err) => dom::log_error("monthly totals", err),
    }

    let Some(text) = dom::by_id(BREAKDOWN_DATA_ID).and_then(|el| el.text_content()) else {
        return;
    };
    if dom::by_id(BREAKDOWN_CHART_ID).is_none() {
        return;
    }
    match parse_rows(&text) {
        Ok(rows) => {
            if let Err(err) = charts::draw(&breakdown_options(&rows)) {
                web_sys::console::warn_1(&format!("breakdown chart: {err:?}").into());
            }
        }
        Err(err) => dom::log_error("breakdown", err),
    }
}

fn setup_submit_on_change() {
    for control in dom::query_all(SUBMIT_ON_CHANGE_SELECTOR) {
        let handler = Closure::<dyn Fn(Event)>::new(|e: Event| {
            let Some(form) = e
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest("form").ok().flatten())
                .and_then(|form| form.dyn_into::<HtmlFormElement>().ok())
            else {
                return;
            };
            form.submit().ok();
        });
        control
            .add_event_listener_with_callback("change", handler.as_ref().unchecked_ref())
            .ok();
        handler.forget();
    }
}
