//! In-page locator resolution
//!
//! Locators resolve by evaluating generated JavaScript in the page: query
//! all selector matches, apply the text filter, index with `nth`, and
//! report visibility, center coordinates, and trimmed text. Selector and
//! filter strings are embedded JSON-encoded so arbitrary quoting in
//! scenario data cannot break out of the script.

use serde::Deserialize;
use serde_json::Value;

use crate::scenario::Locator;

/// What a resolved locator looks like from the page's side.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedElement {
    pub visible: bool,
    #[serde(rename = "centerX")]
    pub center_x: f64,
    #[serde(rename = "centerY")]
    pub center_y: f64,
    #[serde(default)]
    pub text: String,
}

/// JS prelude that leaves the matched element in `el` (possibly undefined).
fn select_js(locator: &Locator) -> String {
    let css = serde_json::to_string(&locator.css).unwrap_or_else(|_| "\"\"".into());
    let filter = match &locator.has_text {
        Some(text) => serde_json::to_string(text).unwrap_or_else(|_| "null".into()),
        None => "null".into(),
    };
    let nth = locator.nth;

    format!(
        r#"const filter = {filter};
    let els = Array.from(document.querySelectorAll({css}));
    if (filter) {{
        const needle = filter.toLowerCase();
        els = els.filter(el =>
            (el.textContent || '').toLowerCase().includes(needle) ||
            (el.getAttribute('aria-label') || '').toLowerCase().includes(needle) ||
            (el.getAttribute('placeholder') || '').toLowerCase().includes(needle));
    }}
    const el = els[{nth}];"#
    )
}

/// JavaScript that resolves `locator` to a `ResolvedElement` object, or
/// `null` when nothing matches.
pub fn resolution_js(locator: &Locator) -> String {
    format!(
        r#"(() => {{
    {select}
    if (!el) return null;
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const visible = rect.width > 0 && rect.height > 0 &&
        style.display !== 'none' && style.visibility !== 'hidden' &&
        parseFloat(style.opacity || '1') > 0.05;
    return {{
        visible,
        centerX: rect.x + rect.width / 2,
        centerY: rect.y + rect.height / 2,
        text: (el.textContent || '').trim().slice(0, 200)
    }};
}})()"#,
        select = select_js(locator)
    )
}

/// JavaScript reading one attribute off the resolved element. Evaluates to
/// the attribute value, or `null` when the element or attribute is absent.
pub fn attribute_js(locator: &Locator, attribute: &str) -> String {
    let attr = serde_json::to_string(attribute).unwrap_or_else(|_| "\"\"".into());
    format!(
        r#"(() => {{
    {select}
    return el ? el.getAttribute({attr}) : null;
}})()"#,
        select = select_js(locator)
    )
}

/// Parses the evaluation result of [`resolution_js`]. `None` means no
/// element matched.
pub fn parse_resolution(value: &Value) -> Option<ResolvedElement> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}
