//! "Is there another page?" for each result format.
//!
//! - HTML form results: an enabled next-page control exists.
//! - JSON results: a page shorter than [`JSON_PAGE_SIZE`] is the last one.
//! - Legacy search pages: a next link resolving to a new URL exists.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::extract::html::element_text;
use crate::fallback::split_alternatives;
use crate::origin::PortalBase;

/// Page size the portal's JSON search uses. Also drives the `offset`
/// payload field.
pub const JSON_PAGE_SIZE: usize = 20;

const NEXT_CONTROL_SELECTORS: &[&str] = &[
    "a.next",
    "a[rel=\"next\"]",
    "button.next",
    "li.next a",
    ".pagination .next",
];

const NEXT_LABELS: &[&str] = &["next", "next page", "next >", "next ›", "next »", "›", "→", "»"];

static NEXT_CONTROLS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    NEXT_CONTROL_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static next-control selector"))
        .collect()
});

static CLICKABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a, button").expect("static selector"));

/// Every element that looks like a next-page control, by class/rel first
/// and then by visible label.
fn next_controls(document: &Html) -> Vec<ElementRef<'_>> {
    let mut controls: Vec<ElementRef<'_>> = NEXT_CONTROLS
        .iter()
        .flat_map(|sel| document.select(sel))
        .collect();
    controls.extend(document.select(&CLICKABLE).filter(|el| {
        let label = element_text(*el).to_lowercase();
        NEXT_LABELS.contains(&label.as_str())
    }));
    controls
}

/// A control is disabled by class, attribute, ARIA state, or a disabled
/// parent list item.
#[must_use]
pub fn is_disabled(control: ElementRef<'_>) -> bool {
    let el = control.value();
    if el.classes().any(|c| c.contains("disabled"))
        || el.attr("disabled").is_some()
        || el
            .attr("aria-disabled")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return true;
    }
    control
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|parent| parent.value().name() == "li")
        .is_some_and(|li| li.value().classes().any(|c| c.contains("disabled")))
}

/// `true` when the page carries an enabled next-page control.
#[must_use]
pub fn has_next_page(document: &Html) -> bool {
    next_controls(document).into_iter().any(|el| !is_disabled(el))
}

/// `true` when a JSON page was full, so another may follow.
#[must_use]
pub fn json_has_more(items_on_page: usize) -> bool {
    items_on_page >= JSON_PAGE_SIZE
}

/// Resolves the next page URL on a legacy search page.
///
/// `next_selector` (comma-separated alternatives) replaces the built-in
/// next-control detection when given. Returns `None` when no enabled
/// control has a usable `href`, or when it resolves back to `current_url`.
#[must_use]
pub fn next_page_url(
    document: &Html,
    current_url: &str,
    next_selector: Option<&str>,
) -> Option<String> {
    let page = PortalBase::parse(current_url).ok()?;

    let controls: Vec<ElementRef<'_>> = match next_selector {
        Some(spec) => split_alternatives(spec)
            .into_iter()
            .filter_map(|s| Selector::parse(s).ok())
            .flat_map(|sel| document.select(&sel).collect::<Vec<_>>())
            .collect(),
        None => next_controls(document),
    };

    controls
        .into_iter()
        .filter(|el| !is_disabled(*el))
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|href| {
            let lower = href.to_ascii_lowercase();
            !href.is_empty() && !href.starts_with('#') && !lower.starts_with("javascript:")
        })
        .map(|href| page.resolve(href))
        .filter(|next| next != current_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn next_class_means_more_pages() {
        assert!(has_next_page(&doc(r#"<a class="next" href="?page=2">Next</a>"#)));
        assert!(has_next_page(&doc(r#"<a rel="next" href="?page=2">2</a>"#)));
        assert!(has_next_page(&doc(r#"<button class="next">More</button>"#)));
    }

    #[test]
    fn next_label_means_more_pages() {
        assert!(has_next_page(&doc(r#"<a href="?page=2"> Next </a>"#)));
        assert!(has_next_page(&doc(r#"<a href="?page=2">›</a>"#)));
        assert!(has_next_page(&doc(r#"<button type="button">→</button>"#)));
    }

    #[test]
    fn disabled_controls_do_not_count() {
        assert!(!has_next_page(&doc(r#"<a class="next disabled">Next</a>"#)));
        assert!(!has_next_page(&doc(r#"<button class="next" disabled>Next</button>"#)));
        assert!(!has_next_page(&doc(r#"<a class="next" aria-disabled="true">Next</a>"#)));
        assert!(!has_next_page(&doc(
            r#"<ul><li class="page-item disabled"><a class="next">Next</a></li></ul>"#
        )));
    }

    #[test]
    fn no_control_means_last_page() {
        assert!(!has_next_page(&doc(r#"<a href="?page=1">Previous</a>"#)));
        assert!(!has_next_page(&doc("<table></table>")));
    }

    #[test]
    fn one_enabled_control_is_enough() {
        let html = r#"<a class="next disabled">Next</a><a href="?page=3">Next</a>"#;
        assert!(has_next_page(&doc(html)));
    }

    #[test]
    fn json_page_size_threshold() {
        assert!(!json_has_more(0));
        assert!(!json_has_more(19));
        assert!(json_has_more(20));
    }

    #[test]
    fn legacy_next_link_is_resolved_against_current_page() {
        let html = r#"<a href="pgeSearchResults.asp?page=2">Next</a>"#;
        let next = next_page_url(
            &doc(html),
            "http://www.swordsolutions.com/inspections/pgeSearchResults.asp?County=81",
            None,
        );
        assert_eq!(
            next.as_deref(),
            Some("http://www.swordsolutions.com/inspections/pgeSearchResults.asp?page=2")
        );
    }

    #[test]
    fn legacy_next_link_to_same_url_stops() {
        let current = "http://www.swordsolutions.com/inspections/results.asp?page=4";
        let html = r#"<a class="next" href="results.asp?page=4">Next</a>"#;
        assert_eq!(next_page_url(&doc(html), current, None), None);
    }

    #[test]
    fn legacy_configured_selector_overrides_detection() {
        let html = r#"
            <a class="next" href="wrong.asp">Next</a>
            <span class="pager"><a id="fwd" href="/inspections/results.asp?p=2">&gt;&gt;</a></span>"#;
        let next = next_page_url(
            &doc(html),
            "http://www.swordsolutions.com/inspections/results.asp",
            Some("a#missing, .pager a#fwd"),
        );
        assert_eq!(
            next.as_deref(),
            Some("http://www.swordsolutions.com/inspections/results.asp?p=2")
        );
    }

    #[test]
    fn legacy_placeholder_hrefs_are_ignored() {
        let html = r##"<a class="next" href="#">Next</a><a class="next" href="javascript:go(2)">Next</a>"##;
        assert_eq!(
            next_page_url(&doc(html), "http://www.swordsolutions.com/inspections/r.asp", None),
            None
        );
    }
}
