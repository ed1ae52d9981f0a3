//! `--analyze`: landing-page diagnostics.
//!
//! Only the landing page is fetched. Nothing is submitted and nothing is
//! written to disk.

use inspdb_core::AppConfig;
use inspdb_scraper::{detect, PortalClient, SiteStructure};

pub(crate) async fn run(
    config: &AppConfig,
    client: &PortalClient,
    county: Option<&str>,
) -> anyhow::Result<()> {
    let landing_url = landing_url(config, county)?;
    tracing::info!(url = %landing_url, "analyzing portal landing page");

    let structure = detect(client, &landing_url).await;
    print!("{}", render_report(&landing_url, &structure));
    Ok(())
}

/// The portal landing page, or the named region's own `url` when it has one.
fn landing_url(config: &AppConfig, county: Option<&str>) -> anyhow::Result<String> {
    let Some(name) = county else {
        return Ok(config.portal_url.clone());
    };

    let file = inspdb_core::load_regions(&config.regions_path)?;
    let selection = inspdb_core::select_regions(&file, Some(name));
    if let Some((_, err)) = selection.errors.into_iter().next() {
        return Err(err.into());
    }
    Ok(selection
        .targets
        .into_iter()
        .next()
        .and_then(|target| target.url)
        .unwrap_or_else(|| config.portal_url.clone()))
}

pub(crate) fn render_report(landing_url: &str, structure: &SiteStructure) -> String {
    let mut out = String::new();
    out.push_str(&format!("Portal structure for {landing_url}\n"));
    if !structure.detected {
        out.push_str("  (landing page unavailable, showing defaults)\n");
    }
    out.push_str(&format!("  search form:      {}\n", yes_no(structure.has_form)));
    out.push_str(&format!(
        "  form submits to:  {} {}\n",
        structure.form_method, structure.form_action
    ));
    out.push_str(&format!("  region field:     {}\n", structure.region_field));
    out.push_str(&format!("  script-loaded:    {}\n", yes_no(structure.ajax_hint)));
    out.push_str(&format!("  pagination:       {:?}\n", structure.pagination));

    if structure.result_selectors.is_empty() {
        out.push_str("  result rows:      none on landing page\n");
    } else {
        out.push_str("  result rows:\n");
        for selector in &structure.result_selectors {
            out.push_str(&format!("    {selector}\n"));
        }
    }

    if !structure.hidden_fields.is_empty() {
        out.push_str("  hidden fields:\n");
        for (name, value) in &structure.hidden_fields {
            out.push_str(&format!("    {name} = {value:?}\n"));
        }
    }

    if !structure.region_options.is_empty() {
        out.push_str(&format!(
            "  region options ({}), use the value as county_value:\n",
            structure.region_options.len()
        ));
        for option in &structure.region_options {
            out.push_str(&format!("    {:<24} {}\n", option.value, option.label));
        }
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
