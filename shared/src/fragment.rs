/// Raised stacking order for the highlighted panel.
pub const HIGHLIGHT_Z_INDEX: &str = "99999";
pub const OVERLAY_FADE_MS: u32 = 300;
pub const HIGHLIGHT_SCROLL_MS: u32 = 1000;

/// Element id a location fragment asks to highlight: `#ace` -> `measure_ace`.
/// A fragment that already names the element (`#measure_ace`) is used as is.
///
/// Returns `None` for an empty fragment, so the caller leaves the page untouched.
pub fn highlight_target(hash: &str) -> Option<String> {
    let name = match hash.find('#') {
        Some(at) => &hash[at + 1..],
        None => hash,
    };
    if name.is_empty() {
        return None;
    }
    if name.starts_with("measure_") {
        return Some(name.to_string());
    }
    Some(format!("measure_{name}"))
}

/// What the page does to draw attention to one panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightPlan {
    pub element_id: String,
    pub z_index: &'static str,
    pub overlay_fade_ms: u32,
    pub scroll_ms: u32,
}

/// `None` when the fragment is empty or names no element on the page.
pub fn plan_highlight(hash: &str, element_exists: impl Fn(&str) -> bool) -> Option<HighlightPlan> {
    let element_id = highlight_target(hash)?;
    if !element_exists(&element_id) {
        return None;
    }
    Some(HighlightPlan {
        element_id,
        z_index: HIGHLIGHT_Z_INDEX,
        overlay_fade_ms: OVERLAY_FADE_MS,
        scroll_ms: HIGHLIGHT_SCROLL_MS,
    })
}

#[cfg(test)]
mod tests {
    use super::{highlight_target, plan_highlight};

    #[test]
    fn maps_fragment_to_measure_element() {
        assert_eq!(highlight_target("#ace").as_deref(), Some("measure_ace"));
        assert_eq!(highlight_target("ace").as_deref(), Some("measure_ace"));
        assert_eq!(highlight_target("#measure_ace").as_deref(), Some("measure_ace"));
    }

    #[test]
    fn empty_fragment_is_no_op() {
        assert_eq!(highlight_target(""), None);
        assert_eq!(highlight_target("#"), None);
    }

    #[test]
    fn plan_requires_a_matching_element() {
        let page = ["measure_ace", "measure_statins"];
        let exists = |id: &str| page.contains(&id);

        let plan = plan_highlight("#ace", exists).expect("plan");
        assert_eq!(plan.element_id, "measure_ace");
        assert_eq!(plan.z_index, "99999");
        assert_eq!(plan.scroll_ms, 1000);
        assert_eq!(plan.overlay_fade_ms, 300);

        assert_eq!(plan_highlight("#measure_ace", exists).map(|p| p.element_id).as_deref(), Some("measure_ace"));
        assert_eq!(plan_highlight("#unknown", exists), None);
        assert_eq!(plan_highlight("", exists), None);
    }
}
