//! Landing-page analysis.
//!
//! The portal's search form is discovered rather than hard-coded: which
//! `<select>` carries the county, where the form posts, which hidden tokens
//! must ride along, and whether the page loads results by script. None of
//! it is mandatory. When the landing page cannot be fetched the scrape
//! proceeds with [`SiteStructure::fallback`].

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::client::PortalClient;
use crate::extract::html::{element_text, RESULT_ROW_CANDIDATES, ROW_COUNT_THRESHOLD};
use crate::origin::PortalBase;
use crate::pagination::has_next_page;

/// Field name assumed when no county selector is found.
pub const DEFAULT_REGION_FIELD: &str = "county";

/// Script substrings that indicate results are fetched client-side.
const AJAX_MARKERS: &[&str] = &[
    "fetch(",
    "XMLHttpRequest",
    "$.ajax",
    "$.post",
    "$.getJSON",
    "axios",
    "application/json",
];

static REGION_FIELD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)county|state|location").expect("static region field pattern")
});

macro_rules! static_selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect("static selector"));
    };
}

static_selector!(FORM, "form");
static_selector!(SELECT, "select");
static_selector!(OPTION, "option");
static_selector!(HIDDEN_INPUT, "input[type=\"hidden\"]");
static_selector!(SCRIPT, "script");
static_selector!(PAGE_LINK, "a[href*=\"page=\"]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    fn from_attr(method: Option<&str>) -> Self {
        match method.map(str::trim) {
            Some(m) if m.eq_ignore_ascii_case("get") => FormMethod::Get,
            _ => FormMethod::Post,
        }
    }
}

impl std::fmt::Display for FormMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormMethod::Get => write!(f, "GET"),
            FormMethod::Post => write!(f, "POST"),
        }
    }
}

/// How the landing page appears to paginate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationHint {
    /// A "next" link or button.
    NextControl,
    /// Numbered links carrying a `page=` parameter.
    PageNumbers,
    #[default]
    Unknown,
}

/// One `<option>` of the region selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOption {
    pub value: String,
    pub label: String,
}

/// What the landing page revealed about the search form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteStructure {
    pub has_form: bool,
    /// Absolute URL the search form submits to.
    pub form_action: String,
    pub form_method: FormMethod,
    /// Name of the field that takes the region search value.
    pub region_field: String,
    /// Row selectors that matched more than two elements on the landing page.
    pub result_selectors: Vec<String>,
    pub pagination: PaginationHint,
    /// Page scripts look like they fetch results themselves.
    pub ajax_hint: bool,
    /// Hidden inputs of the region search form, in document order. Empty
    /// when no such form exists.
    pub hidden_fields: Vec<(String, String)>,
    pub region_options: Vec<RegionOption>,
    /// `false` when this is the fallback rather than a parsed page.
    pub detected: bool,
}

impl SiteStructure {
    /// Assumed structure when the landing page is unreachable: a POST form
    /// at the landing URL with a `county` field and generic table rows.
    #[must_use]
    pub fn fallback(landing_url: &str) -> Self {
        Self {
            has_form: true,
            form_action: landing_url.to_owned(),
            form_method: FormMethod::Post,
            region_field: DEFAULT_REGION_FIELD.to_owned(),
            result_selectors: vec!["table tbody tr".to_owned()],
            pagination: PaginationHint::Unknown,
            ajax_hint: false,
            hidden_fields: Vec::new(),
            region_options: Vec::new(),
            detected: false,
        }
    }
}

/// Fetches the landing page once and analyzes it. Never fails.
pub async fn detect(client: &PortalClient, landing_url: &str) -> SiteStructure {
    match client.get(landing_url).await {
        Ok(response) => {
            let structure = analyze_landing_page(&response.body, landing_url);
            tracing::info!(
                has_form = structure.has_form,
                form_action = %structure.form_action,
                form_method = %structure.form_method,
                region_field = %structure.region_field,
                result_selectors = structure.result_selectors.len(),
                hidden_fields = structure.hidden_fields.len(),
                ajax_hint = structure.ajax_hint,
                "analyzed portal landing page"
            );
            structure
        }
        Err(e) => {
            tracing::warn!(
                url = landing_url,
                error = %e,
                "landing page unavailable, using default site structure"
            );
            SiteStructure::fallback(landing_url)
        }
    }
}

/// Analyzes landing-page HTML. Relative form actions are resolved against
/// `landing_url`.
#[must_use]
pub fn analyze_landing_page(html: &str, landing_url: &str) -> SiteStructure {
    let document = Html::parse_document(html);
    let base = PortalBase::parse(landing_url).ok();
    let resolve = |action: &str| match &base {
        Some(base) => base.resolve(action),
        None => landing_url.to_owned(),
    };

    let region_form = document
        .select(&FORM)
        .find_map(|form| region_select(form).map(|select| (form, select)));

    let mut structure = SiteStructure {
        has_form: region_form.is_some(),
        form_action: landing_url.to_owned(),
        form_method: FormMethod::Post,
        region_field: DEFAULT_REGION_FIELD.to_owned(),
        result_selectors: result_selectors(&document),
        pagination: pagination_hint(&document),
        ajax_hint: has_ajax_markers(&document),
        hidden_fields: Vec::new(),
        region_options: Vec::new(),
        detected: true,
    };

    if let Some((form, select)) = region_form {
        if let Some(action) = form.value().attr("action") {
            structure.form_action = resolve(action);
        }
        structure.form_method = FormMethod::from_attr(form.value().attr("method"));
        if let Some(name) = select.value().attr("name") {
            structure.region_field = name.to_owned();
        }
        structure.region_options = region_options(select);
        structure.hidden_fields = hidden_fields(form);
    }

    structure
}

fn region_select(form: ElementRef<'_>) -> Option<ElementRef<'_>> {
    form.select(&SELECT).find(|select| {
        select
            .value()
            .attr("name")
            .is_some_and(|name| REGION_FIELD_NAME.is_match(name))
    })
}

fn region_options(select: ElementRef<'_>) -> Vec<RegionOption> {
    select
        .select(&OPTION)
        .filter_map(|option| {
            let label = element_text(option);
            let value = option
                .value()
                .attr("value")
                .map_or_else(|| label.clone(), |v| v.trim().to_owned());
            (!value.is_empty()).then_some(RegionOption { value, label })
        })
        .collect()
}

fn hidden_fields(form: ElementRef<'_>) -> Vec<(String, String)> {
    form.select(&HIDDEN_INPUT)
        .filter_map(|input| {
            let name = input.value().attr("name")?.trim();
            if name.is_empty() {
                return None;
            }
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_owned(), value.to_owned()))
        })
        .collect()
}

fn result_selectors(document: &Html) -> Vec<String> {
    RESULT_ROW_CANDIDATES
        .iter()
        .filter(|css| {
            Selector::parse(css)
                .is_ok_and(|sel| document.select(&sel).count() > ROW_COUNT_THRESHOLD)
        })
        .map(|css| (*css).to_owned())
        .collect()
}

fn pagination_hint(document: &Html) -> PaginationHint {
    if has_next_page(document) {
        PaginationHint::NextControl
    } else if document.select(&PAGE_LINK).next().is_some() {
        PaginationHint::PageNumbers
    } else {
        PaginationHint::Unknown
    }
}

fn has_ajax_markers(document: &Html) -> bool {
    document.select(&SCRIPT).any(|script| {
        let body: String = script.text().collect();
        AJAX_MARKERS.iter().any(|marker| body.contains(marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = "https://swordsolutions.com/inspections/";

    const SEARCH_PAGE: &str = r#"
        <html><head>
          <script src="/js/jquery.js"></script>
          <script>
            $('#search').on('submit', function (e) {
              e.preventDefault();
              $.ajax({ url: 'api/search', type: 'POST', data: $(this).serialize() });
            });
          </script>
        </head><body>
          <form id="login" action="/login" method="post">
            <input type="hidden" name="login_token" value="nope">
            <input name="user">
          </form>
          <form id="search" action="search.asp" method="get">
            <input type="hidden" name="__VIEWSTATE" value="dDwtMTA4">
            <input type="hidden" name="csrf" value="abc123">
            <input type="hidden" value="orphan">
            <select name="ddlCounty">
              <option value="">-- Select County --</option>
              <option value="MI - Washtenaw">Washtenaw</option>
              <option value="MI - Livingston">Livingston</option>
            </select>
            <select name="type"><option>Restaurant</option></select>
          </form>
          <ul class="pagination"><li><a href="?page=2">2</a></li></ul>
        </body></html>"#;

    #[test]
    fn finds_region_form_and_resolves_action() {
        let structure = analyze_landing_page(SEARCH_PAGE, LANDING);
        assert!(structure.has_form);
        assert!(structure.detected);
        assert_eq!(structure.region_field, "ddlCounty");
        assert_eq!(
            structure.form_action,
            "https://swordsolutions.com/inspections/search.asp"
        );
        assert_eq!(structure.form_method, FormMethod::Get);
    }

    #[test]
    fn hidden_fields_come_from_the_region_form() {
        let structure = analyze_landing_page(SEARCH_PAGE, LANDING);
        assert_eq!(
            structure.hidden_fields,
            vec![
                ("__VIEWSTATE".to_owned(), "dDwtMTA4".to_owned()),
                ("csrf".to_owned(), "abc123".to_owned()),
            ]
        );
    }

    #[test]
    fn region_options_skip_placeholder() {
        let structure = analyze_landing_page(SEARCH_PAGE, LANDING);
        assert_eq!(structure.region_options.len(), 2);
        assert_eq!(structure.region_options[0].value, "MI - Washtenaw");
        assert_eq!(structure.region_options[0].label, "Washtenaw");
    }

    #[test]
    fn script_markers_set_ajax_hint() {
        assert!(analyze_landing_page(SEARCH_PAGE, LANDING).ajax_hint);
        let plain = "<form><select name='county'></select></form><script>var x = 1;</script>";
        assert!(!analyze_landing_page(plain, LANDING).ajax_hint);
    }

    #[test]
    fn numbered_page_links_give_page_number_hint() {
        let structure = analyze_landing_page(SEARCH_PAGE, LANDING);
        assert_eq!(structure.pagination, PaginationHint::PageNumbers);
    }

    #[test]
    fn form_without_action_posts_to_landing_url() {
        let html = r#"<form><select name="State_County"><option value="81">x</option></select></form>"#;
        let structure = analyze_landing_page(html, LANDING);
        assert!(structure.has_form);
        assert_eq!(structure.form_action, LANDING);
        assert_eq!(structure.form_method, FormMethod::Post);
        assert_eq!(structure.region_field, "State_County");
    }

    #[test]
    fn page_without_region_select_reports_no_form_and_no_tokens() {
        let html = r#"
            <form action="/subscribe"><input type="hidden" name="list" value="news"></form>
            <table><tbody><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></tbody></table>"#;
        let structure = analyze_landing_page(html, LANDING);
        assert!(!structure.has_form);
        assert_eq!(structure.region_field, DEFAULT_REGION_FIELD);
        assert_eq!(structure.form_action, LANDING);
        assert!(structure.hidden_fields.is_empty());
        assert_eq!(structure.result_selectors, vec!["table tbody tr".to_owned()]);
    }

    #[test]
    fn fallback_assumes_generic_post_form() {
        let structure = SiteStructure::fallback(LANDING);
        assert!(structure.has_form);
        assert!(!structure.detected);
        assert_eq!(structure.form_method, FormMethod::Post);
        assert_eq!(structure.region_field, "county");
        assert_eq!(structure.result_selectors, vec!["table tbody tr".to_owned()]);
    }
}
