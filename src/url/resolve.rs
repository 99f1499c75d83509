use crate::url::LinkPolicy;
use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves an anchor href against the page it was found on
///
/// # Resolution Steps
///
/// 1. Trim surrounding whitespace
/// 2. Skip empty hrefs and in-page fragment anchors (`#...`)
/// 3. Join against `base` (absolute, scheme-relative and path-relative hrefs)
/// 4. Apply `policy` to results that are not HTTP(S)
///
/// # Arguments
///
/// * `href` - The raw `href` attribute value
/// * `base` - The URL of the page containing the anchor
/// * `policy` - What to do with non-HTTP(S) results
///
/// # Returns
///
/// * `Some(String)` - The absolute URL to record
/// * `None` - The href is skipped
///
/// # Examples
///
/// ```
/// use image_harvester::url::{resolve_href, LinkPolicy};
/// use url::Url;
///
/// let base = Url::parse("https://example.com/gallery/page").unwrap();
/// assert_eq!(
///     resolve_href("next", &base, LinkPolicy::Strict),
///     Some("https://example.com/gallery/next".to_string())
/// );
/// assert_eq!(resolve_href("#top", &base, LinkPolicy::Strict), None);
/// ```
pub fn resolve_href(href: &str, base: &Url, policy: LinkPolicy) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = base.join(href).ok()?;

    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        return Some(resolved.into());
    }

    match policy {
        LinkPolicy::Strict => None,
        LinkPolicy::LegacyRepair => {
            let resolved = resolved.as_str();
            let tail = resolved.get(1..).unwrap_or_default();
            Some(format!("{}{}", base.as_str(), tail))
        }
    }
}

/// Resolves a harvested image source against the page it was harvested from
///
/// Harvested values are kept exactly as written in the HTML; they only become
/// absolute here, right before download.
pub fn resolve_image_src(src: &str, page: &Url) -> UrlResult<Url> {
    let src = src.trim();
    if src.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = page.join(src).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    Ok(url)
}
