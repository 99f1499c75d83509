//! HTML parser for extracting links and lazy-load image sources
//!
//! This module handles parsing HTML content to extract:
//! - Hyperlinks to record and possibly follow (from `<a href>` elements)
//! - Deferred image sources (from `<img>` elements carrying the lazy-load attribute)
//!
//! Neither function touches the network.

use crate::url::{resolve_href, LinkPolicy};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts every hyperlink target from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - Empty hrefs
/// - Fragment-only hrefs (`#section`)
/// - Hrefs that do not resolve to HTTP(S), unless `policy` is
///   [`LinkPolicy::LegacyRepair`]
///
/// Each distinct URL appears once, in the order of its first occurrence.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The page URL used to resolve relative hrefs
/// * `policy` - Treatment of non-HTTP(S) results
///
/// # Example
///
/// ```
/// use image_harvester::crawler::extract_links;
/// use image_harvester::url::LinkPolicy;
/// use url::Url;
///
/// let html = r##"<a href="/a">A</a><a href="#top">Top</a>"##;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base, LinkPolicy::Strict);
/// assert_eq!(links, vec!["https://example.com/a".to_string()]);
/// ```
pub fn extract_links(html: &str, base_url: &Url, policy: LinkPolicy) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if let Some(absolute_url) = resolve_href(href, base_url, policy) {
                if seen.insert(absolute_url.clone()) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Harvests lazy-load image sources from an HTML document
///
/// Every `<img>` carrying `attribute` contributes its value verbatim, in document
/// order. Images with only a regular `src` are skipped, and duplicates are kept.
///
/// # Example
///
/// ```
/// use image_harvester::crawler::harvest_images;
///
/// let html = r#"<img data-src="/x.jpg"><img src="/y.jpg">"#;
/// assert_eq!(harvest_images(html, "data-src"), vec!["/x.jpg".to_string()]);
/// ```
pub fn harvest_images(html: &str, attribute: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(img_selector) = Selector::parse("img") else {
        return Vec::new();
    };

    document
        .select(&img_selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::to_string)
        .collect()
}
