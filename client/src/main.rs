mod animation;
mod app;
mod charts;
mod dom;
mod download;
mod fetch;
mod interactions;
mod map;
mod spending;

use leptos::mount::mount_to;
use web_sys::HtmlElement;

const APP_ROOT_ID: &str = "measures-app";

/// `#measures-app` when the page provides one, otherwise `<body>`.
fn mount_target() -> Option<HtmlElement> {
    dom::html_by_id(APP_ROOT_ID).or_else(|| dom::document()?.body())
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(target) = mount_target() else {
        return;
    };
    // The dashboard lives as long as the page.
    mount_to(target, app::App).forget();
}
