//! Server-rendered markup helpers.

/// Tailwind classes of the centered page column.
pub const CONTAINER_CLASS: &str = "w-full max-w-7xl mx-auto";

/// Wrap `children` in the fixed-width, horizontally centered column.
/// `children` is trusted markup and is inserted verbatim.
pub fn container(children: &str) -> String {
    format!(r#"<div class="{CONTAINER_CLASS}">{children}</div>"#)
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full document with `body` placed inside the container.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>",
        escape_html(title),
        container(body)
    )
}
