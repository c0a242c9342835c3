// src/core/html.rs
//! Small helpers over `scraper` element refs: attributes, visible text, links.
//! Everything markup-specific the table parser needs goes through here.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::core::sanitize::normalize_ws;

/// Attribute name → value. Ordered so merged maps print deterministically.
pub type Attrs = BTreeMap<String, String>;

pub fn parse_selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("{css:?}: {e}"))
}

pub fn element_attrs(el: &ElementRef<'_>) -> Attrs {
    el.value()
        .attrs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect()
}

/// Visible text, whitespace-normalized.
pub fn element_text(el: &ElementRef<'_>) -> String {
    let raw: String = el.text().collect::<Vec<_>>().join(" ");
    normalize_ws(&raw)
}

/// `href` of every descendant anchor, in document order.
pub fn element_links(el: &ElementRef<'_>) -> Vec<String> {
    let Ok(sel) = Selector::parse("a[href]") else { return Vec::new() };
    el.select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

/// `href` of the first element in the document matching `sel`.
pub fn find_link(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|h| !h.is_empty() && !h.starts_with('#') && !h.starts_with("javascript:"))
        .map(str::to_string)
}

/// Positive integer span attribute (`rowspan`/`colspan`); `None` if absent or junk.
pub fn span_attr(attrs: &Attrs, name: &str) -> Option<usize> {
    attrs
        .get(name)
        .and_then(|v| v.trim().trim_matches('"').parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Inline `style` hides the element.
pub fn is_display_none(attrs: &Attrs) -> bool {
    attrs.get("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.split(';').any(|decl| decl == "display:none")
    })
}

pub fn class_tokens(attrs: &Attrs) -> impl Iterator<Item = &str> {
    attrs
        .get("class")
        .map(|c| c.split_whitespace())
        .into_iter()
        .flatten()
}

/// Merge attribute layers in order, concatenating values of repeated keys
/// token-wise (space separated, empty values skipped).
pub fn merge_attrs<'a>(layers: impl IntoIterator<Item = &'a Attrs>) -> Attrs {
    let mut out = Attrs::new();
    for layer in layers {
        for (k, v) in layer {
            let v = v.trim();
            match out.get_mut(k) {
                Some(prev) if !v.is_empty() => {
                    if !prev.is_empty() { prev.push(' '); }
                    prev.push_str(v);
                }
                Some(_) => {}
                None => { out.insert(k.clone(), v.to_string()); }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_none_detection_is_whitespace_and_case_tolerant() {
        assert!(is_display_none(&attrs! { "style" => "color: red; DISPLAY : none" }));
        assert!(!is_display_none(&attrs! { "style" => "display: block" }));
        assert!(!is_display_none(&attrs! {}));
    }

    #[test]
    fn merge_attrs_concatenates_tokens_in_layer_order() {
        let header = attrs! { "class" => "problem" };
        let row = attrs! { "class" => "odd", "id" => "r1" };
        let col = attrs! { "class" => "first-solved", "title" => "" };
        let merged = merge_attrs([&header, &row, &col]);
        assert_eq!(merged["class"], "problem odd first-solved");
        assert_eq!(merged["id"], "r1");
        assert_eq!(merged["title"], "");
    }

    #[test]
    fn element_helpers_read_text_links_and_spans() {
        let doc = Html::parse_fragment(
            r#"<table><tr><td rowspan="2" class="a  b"> <a href="/u/1">tourist</a>&nbsp;(RU) </td></tr></table>"#,
        );
        let sel = parse_selector("td").unwrap();
        let td = doc.select(&sel).next().unwrap();
        let attrs = element_attrs(&td);
        assert_eq!(element_text(&td), "tourist (RU)");
        assert_eq!(element_links(&td), vec!["/u/1"]);
        assert_eq!(span_attr(&attrs, "rowspan"), Some(2));
        assert_eq!(span_attr(&attrs, "colspan"), None);
        assert_eq!(class_tokens(&attrs).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn find_link_skips_anchors_and_script_links() {
        let doc = Html::parse_document(
            r##"<div class="pager"><a rel="next" href="#">x</a><a rel="next" href=" ?page=2 ">next</a></div>"##,
        );
        let sel = parse_selector("a[rel=next]").unwrap();
        assert_eq!(find_link(&doc, &sel).as_deref(), Some("?page=2"));
        assert_eq!(find_link(&Html::parse_document("<p></p>"), &sel), None);
    }

    #[test]
    fn bad_selector_is_an_error() {
        assert!(parse_selector("tr[").is_err());
    }
}
