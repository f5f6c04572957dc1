use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use measures_shared::options::OPTIONS_ELEMENT_ID;
use measures_shared::panels::{
    DEFAULT_PANEL_TEMPLATE, DEFAULT_SUMMARY_TEMPLATE, PANEL_TEMPLATE_ID, SUMMARY_TARGET_ID,
    SUMMARY_TEMPLATE_ID, render_panels, render_summary,
};
use measures_shared::template::Templates;
use measures_shared::{ChartState, Options, PreparedMeasures, prepare};

use crate::charts::{self, ChartContext};
use crate::fetch::{self, LoadedMeasures};
use crate::{dom, download, interactions, map, spending};

const PAGE_LOADING_SELECTOR: &str = ".loading-wrapper:not(.measures-loading)";

/// Where the dashboard is in its single load-and-render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DashboardStatus {
    /// No measure options on the page; nothing to load.
    Idle,
    Loading,
    Ready,
    Failed,
}

impl DashboardStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// The spinner stays up on failure; a page without measures never shows one.
    fn shows_spinner(self) -> bool {
        matches!(self, Self::Loading | Self::Failed)
    }
}

fn read_options() -> Option<Result<Options, measures_shared::DashboardError>> {
    let text = dom::by_id(OPTIONS_ELEMENT_ID)?.text_content()?;
    Some(Options::from_json(&text))
}

/// Page templates where present, otherwise the built-in defaults. A broken template is left out.
fn load_templates() -> Templates {
    let mut templates = Templates::new();
    for (id, fallback) in [
        (SUMMARY_TEMPLATE_ID, DEFAULT_SUMMARY_TEMPLATE),
        (PANEL_TEMPLATE_ID, DEFAULT_PANEL_TEMPLATE),
    ] {
        let source = dom::inner_html(id).unwrap_or_else(|| fallback.to_string());
        if let Err(err) = templates.register(id, &source) {
            dom::log_error(&format!("template #{id}"), err);
        }
    }
    templates
}

fn render_markup(prepared: &PreparedMeasures, options: &Options) {
    let templates = load_templates();
    if templates.has(SUMMARY_TEMPLATE_ID)
        && let Some(target) = dom::by_id(SUMMARY_TARGET_ID)
    {
        match render_summary(&templates, &prepared.summary, options) {
            Ok(html) => target.set_inner_html(&html),
            Err(err) => dom::log_error("summary panel", err),
        }
    }

    if !templates.has(PANEL_TEMPLATE_ID) {
        return;
    }
    match render_panels(&templates, &prepared.records) {
        Ok(fragments) => {
            for fragment in fragments {
                if let Some(container) = dom::by_id(&fragment.container_id) {
                    dom::append_html(&container, &fragment.html);
                }
            }
        }
        Err(err) => dom::log_error("measure panels", err),
    }
}

/// Transform, write markup, draw charts, then wire the page controls. Runs once.
fn render_dashboard(loaded: LoadedMeasures, options: Rc<Options>) {
    let prepared = prepare(&loaded.panel, &loaded.global, &options);
    render_markup(&prepared, &options);

    let records: Rc<[_]> = prepared.records.into();
    let centiles = Rc::new(prepared.centiles);
    charts::render_all(
        ChartContext {
            records: records.clone(),
            centiles: centiles.clone(),
            options: options.clone(),
        },
        Rc::new(RefCell::new(ChartState::default())),
    );
    download::setup(records, centiles);

    if options.sort_toggle_enabled() {
        interactions::setup_sort();
    }
    interactions::highlight_selected();
}

#[component]
pub fn App() -> impl IntoView {
    let status: RwSignal<DashboardStatus> = RwSignal::new(DashboardStatus::Idle);

    // Page setup: independent widgets first, then the measure data.
    Effect::new(move || {
        spending::setup();
        interactions::setup_show_all();

        let options = match read_options() {
            None => return,
            Some(Err(err)) => {
                dom::log_error("measure options", err);
                status.set(DashboardStatus::Failed);
                return;
            }
            Some(Ok(options)) => Rc::new(options),
        };
        map::setup(&options);
        status.set(DashboardStatus::Loading);

        wasm_bindgen_futures::spawn_local(async move {
            match fetch::load_measures(&options).await {
                Ok(loaded) => {
                    render_dashboard(loaded, options);
                    status.set(DashboardStatus::Ready);
                }
                Err(err) => {
                    dom::log_error("measure data", err);
                    status.set(DashboardStatus::Failed);
                }
            }
        });
    });

    // Spinners shipped in the page markup sit outside the mount; clear them once.
    Effect::new(move || {
        if status.get() == DashboardStatus::Ready {
            for el in dom::query_all(PAGE_LOADING_SELECTOR) {
                dom::hide(&el);
            }
        }
    });

    let spinner_display = move || if status.get().shows_spinner() { "block" } else { "none" };

    view! {
        <div id="measures-status" style="display: none;" data-status=move || status.get().as_str() />
        <div class="loading-wrapper measures-loading" style:display=spinner_display>
            <span class="loading-spinner">"Loading measures…"</span>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::DashboardStatus;

    #[test]
    fn spinner_stays_up_until_ready_and_on_failure() {
        assert!(!DashboardStatus::Idle.shows_spinner());
        assert!(DashboardStatus::Loading.shows_spinner());
        assert!(DashboardStatus::Failed.shows_spinner());
        assert!(!DashboardStatus::Ready.shows_spinner());
    }
}
