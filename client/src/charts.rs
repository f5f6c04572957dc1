use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use measures_shared::{ChartOptions, ChartState, GlobalCentiles, MeasureRecord, Options, graph_options};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_namespace = Highcharts)]
extern "C" {
    type Chart;

    #[wasm_bindgen(constructor, catch)]
    fn new(options: &JsValue) -> Result<Chart, JsValue>;
}

struct ScrollBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

thread_local! {
    static SCROLL_BINDING: RefCell<Option<ScrollBinding>> = const { RefCell::new(None) };
}

/// Everything a chart needs after the data has been prepared.
pub struct ChartContext {
    pub records: Rc<[MeasureRecord]>,
    pub centiles: Rc<GlobalCentiles>,
    pub options: Rc<Options>,
}

pub fn draw(options: &ChartOptions) -> Result<(), JsValue> {
    let js = options
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)?;
    Chart::new(&js).map(|_| ())
}

fn render_range(ctx: &ChartContext, range: Range<usize>) {
    for record in &ctx.records[range] {
        let Some(chart) = graph_options(record, &ctx.centiles, &ctx.options) else {
            continue;
        };
        if let Err(err) = draw(&chart) {
            web_sys::console::warn_1(&format!("chart {} failed: {err:?}", record.chart_id).into());
        }
    }
}

/// Draw the first batch now and the rest on the first scroll.
pub fn render_all(ctx: ChartContext, state: Rc<RefCell<ChartState>>) {
    let total = ctx.records.len();
    let eager = state.borrow().eager_range(total);
    render_range(&ctx, eager);

    if total <= state.borrow().eager_count {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };

    SCROLL_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.window
                .remove_event_listener_with_callback("scroll", old.handler.as_ref().unchecked_ref())
                .ok();
        }
    });

    let handler = Closure::<dyn Fn()>::new(move || {
        let deferred = state.borrow_mut().take_deferred(total);
        if let Some(range) = deferred {
            render_range(&ctx, range);
        }
    });
    if window
        .add_event_listener_with_callback("scroll", handler.as_ref().unchecked_ref())
        .is_err()
    {
        return;
    }
    SCROLL_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(ScrollBinding {
            window: window.clone(),
            handler,
        });
    });
}
