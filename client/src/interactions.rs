use std::cell::{Cell, RefCell};
use std::rc::Rc;

use measures_shared::fragment::plan_highlight;
use measures_shared::ordering::{
    SWAP_FADE_MS, Slot, SortOrder, SortOrderings, parse_cost_saving, sort_by_savings_requested,
};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, MouseEvent};

use crate::animation::{self, Tween};
use crate::dom;

const SHOW_ALL_ID: &str = "showall";
const HIDDEN_CHILD_ENTITIES: &str = "#child-entities li.hidden";
const CHARTS_ID: &str = "charts";
const CHART_SELECTOR: &str = "#charts .chart";
const SORT_BUTTON_SELECTOR: &str = ".btn-group > .btn";
const NO_COST_SAVING_WARNING_ID: &str = "no-cost-saving-warning";
const OVERLAY_ID: &str = "overlay";

fn on_click(el: &Element, f: impl Fn(MouseEvent) + 'static) {
    let handler = Closure::<dyn Fn(MouseEvent)>::new(f);
    el.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
        .ok();
    handler.forget();
}

/// Latches on the first call.
#[derive(Default)]
struct Latch {
    fired: Cell<bool>,
}

impl Latch {
    fn first(&self) -> bool {
        !self.fired.replace(true)
    }
}

/// `#showall` reveals every hidden child entity, then hides itself. Later clicks do nothing.
pub fn setup_show_all() {
    let Some(trigger) = dom::by_id(SHOW_ALL_ID) else {
        return;
    };
    let target = trigger.clone();
    let revealed = Latch::default();
    on_click(&trigger, move |e| {
        e.prevent_default();
        if !revealed.first() {
            return;
        }
        for item in dom::query_all(HIDDEN_CHILD_ENTITIES) {
            item.class_list().remove_1("hidden").ok();
        }
        dom::hide(&target);
    });
}

struct SortView {
    container: Element,
    charts: Vec<Element>,
    placeholder: Option<Element>,
    orderings: SortOrderings,
    fade: Option<Tween>,
}

impl SortView {
    fn capture() -> Option<Self> {
        let container = dom::by_id(CHARTS_ID)?;
        let charts = dom::query_all(CHART_SELECTOR);
        let savings: Vec<Option<f64>> = charts
            .iter()
            .map(|el| parse_cost_saving(el.get_attribute("data-costsaving").as_deref()))
            .collect();
        let orderings = SortOrderings::from_savings(&savings);
        let placeholder = orderings
            .by_savings
            .contains(&Slot::Placeholder)
            .then(placeholder_element)
            .flatten();
        Some(Self {
            container,
            charts,
            placeholder,
            orderings,
            fade: None,
        })
    }

    fn apply(&self, order: SortOrder) {
        for &i in &self.orderings.non_cost_saving {
            if order.hides_non_cost_saving() {
                dom::hide(&self.charts[i]);
            } else {
                dom::show(&self.charts[i]);
            }
        }
        self.container.set_inner_html("");
        for slot in self.orderings.slots(order) {
            let el = match slot {
                Slot::Chart(i) => Some(&self.charts[*i]),
                Slot::Placeholder => self.placeholder.as_ref(),
            };
            if let Some(el) = el {
                self.container.append_child(el).ok();
            }
        }
    }
}

fn placeholder_element() -> Option<Element> {
    let warning = dom::by_id(NO_COST_SAVING_WARNING_ID)?;
    let copy = warning.clone_node_with_deep(true).ok()?.dyn_into::<Element>().ok()?;
    copy.class_list().remove_1("hidden").ok();
    copy.remove_attribute("id").ok();
    Some(copy)
}

fn mark_active(button: &Element) {
    if let Some(parent) = button.parent_element() {
        let siblings = parent.children();
        for i in 0..siblings.length() {
            if let Some(sibling) = siblings.item(i) {
                sibling.class_list().remove_1("active").ok();
            }
        }
    }
    button.class_list().add_1("active").ok();
}

/// Percentile/savings toggle over the rendered chart panels.
pub fn setup_sort() {
    let Some(view) = SortView::capture() else {
        return;
    };
    let view = Rc::new(RefCell::new(view));

    for button in dom::query_all(SORT_BUTTON_SELECTOR) {
        let view = view.clone();
        let this = button.clone();
        on_click(&button, move |_| {
            mark_active(&this);
            let order = SortOrder::from_button(this.get_attribute("data-orderby").as_deref());
            swap(&view, order);
        });
    }

    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    if sort_by_savings_requested(&search)
        && let Some(button) = dom::query_all(SORT_BUTTON_SELECTOR)
            .into_iter()
            .find(|b| b.get_attribute("data-orderby").as_deref() == Some("savings"))
        && let Some(button) = button.dyn_ref::<HtmlElement>()
    {
        button.click();
    }
}

fn swap(view: &Rc<RefCell<SortView>>, order: SortOrder) {
    let container = {
        let mut current = view.borrow_mut();
        if let Some(fade) = current.fade.take() {
            fade.cancel();
        }
        current.container.clone()
    };
    let after = view.clone();
    let fade = animation::fade_out(&container, SWAP_FADE_MS, move || {
        let container = {
            let current = after.borrow();
            current.apply(order);
            current.container.clone()
        };
        let fade_in = animation::fade_in(&container, "", SWAP_FADE_MS, || {});
        after.borrow_mut().fade = fade_in;
    });
    view.borrow_mut().fade = fade;
}

/// Raise the panel named by the location fragment above a dimmed overlay and scroll to it.
pub fn highlight_selected() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let hash = window.location().hash().unwrap_or_default();
    let Some(plan) = plan_highlight(&hash, |id| dom::by_id(id).is_some()) else {
        return;
    };
    let Some(target) = dom::html_by_id(&plan.element_id) else {
        return;
    };
    let Some(overlay) = dom::by_id(OVERLAY_ID) else {
        return;
    };

    let fade: Rc<RefCell<Option<Tween>>> = Rc::new(RefCell::new(None));
    *fade.borrow_mut() = animation::fade_in(&overlay, "block", plan.overlay_fade_ms, || {});
    target.style().set_property("z-index", plan.z_index).ok();
    animation::scroll_to_element(&target, plan.scroll_ms);

    let dismiss = overlay.clone();
    let fade_ms = plan.overlay_fade_ms;
    on_click(&overlay, move |_| {
        if let Some(running) = fade.borrow_mut().take() {
            running.cancel();
        }
        *fade.borrow_mut() = animation::fade_out(&dismiss, fade_ms, || {});
    });
}
