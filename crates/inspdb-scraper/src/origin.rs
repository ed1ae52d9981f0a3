//! Portal URL handling: origin, base path, and link absolutization.

use url::Url;

use crate::error::ScraperError;

/// Scheme+host and directory of a portal landing page.
///
/// Given `https://swordsolutions.com/inspections/search.asp`, the origin is
/// `https://swordsolutions.com` and the base path is
/// `https://swordsolutions.com/inspections/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalBase {
    url: Url,
    origin: String,
    base_path: String,
}

impl PortalBase {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `landing_url` is not an
    /// absolute http(s) URL.
    pub fn parse(landing_url: &str) -> Result<Self, ScraperError> {
        let url = Url::parse(landing_url).map_err(|e| ScraperError::InvalidUrl {
            url: landing_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidUrl {
                url: landing_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", url.scheme()),
            });
        }

        let origin = url.origin().ascii_serialization();
        let path = url.path();
        let dir = &path[..=path.rfind('/').unwrap_or(0)];
        let dir = if dir.is_empty() { "/" } else { dir };
        let base_path = format!("{origin}{dir}");

        Ok(Self {
            url,
            origin,
            base_path,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Host name for log fields and error messages.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.url.host_str().unwrap_or(self.origin.as_str())
    }

    /// Turns a report `href` into an absolute URL.
    ///
    /// - already absolute: unchanged
    /// - leading `/`: appended to the origin
    /// - anything else: appended to the base path
    ///
    /// Fragment-only and `javascript:`/`mailto:` links carry no report and
    /// yield an empty string.
    #[must_use]
    pub fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        let lower = href.to_ascii_lowercase();
        if href.is_empty()
            || href.starts_with('#')
            || lower.starts_with("javascript:")
            || lower.starts_with("mailto:")
        {
            return String::new();
        }
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return href.to_owned();
        }
        if let Some(rest) = href.strip_prefix("//") {
            return format!("{}://{rest}", self.url.scheme());
        }
        if href.starts_with('/') {
            return format!("{}{href}", self.origin);
        }
        format!("{}{href}", self.base_path)
    }

    /// Resolves a form action or pagination target with full URL-join
    /// semantics (`../`, query-only references, and so on).
    #[must_use]
    pub fn resolve(&self, reference: &str) -> String {
        let reference = reference.trim();
        if reference.is_empty() {
            return self.url.to_string();
        }
        self.url
            .join(reference)
            .map_or_else(|_| self.absolutize(reference), |u| u.to_string())
    }

    /// Joins an API path suffix onto the base path.
    #[must_use]
    pub fn endpoint(&self, suffix: &str) -> String {
        format!("{}{}", self.base_path, suffix.trim_start_matches('/'))
    }
}
