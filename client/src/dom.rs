use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

pub(crate) fn document() -> Option<Document> {
    web_sys::window()?.document()
}

pub(crate) fn by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub(crate) fn html_by_id(id: &str) -> Option<HtmlElement> {
    by_id(id)?.dyn_into::<HtmlElement>().ok()
}

/// Raw contents of an embedded `<script>` or template element.
pub(crate) fn inner_html(id: &str) -> Option<String> {
    by_id(id).map(|el| el.inner_html())
}

pub(crate) fn query_all(selector: &str) -> Vec<Element> {
    let Some(document) = document() else {
        return Vec::new();
    };
    let Ok(nodes) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub(crate) fn append_html(container: &Element, html: &str) {
    if container.insert_adjacent_html("beforeend", html).is_err() {
        web_sys::console::warn_1(&format!("could not append to #{}", container.id()).into());
    }
}

pub(crate) fn set_display(el: &Element, display: &str) {
    if let Some(el) = el.dyn_ref::<HtmlElement>() {
        el.style().set_property("display", display).ok();
    }
}

pub(crate) fn hide(el: &Element) {
    set_display(el, "none");
}

pub(crate) fn show(el: &Element) {
    if let Some(el) = el.dyn_ref::<HtmlElement>() {
        el.style().remove_property("display").ok();
    }
}

pub(crate) fn log_error(context: &str, err: impl std::fmt::Display) {
    web_sys::console::error_1(&format!("{context}: {err}").into());
}
