use std::collections::HashSet;

use log::{debug, error};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::http::Fetch;

/// First-class handle on an embedded `<audio>` element of an item page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MediaReference {
    /// Outer markup of the element as it appeared on the page.
    pub(crate) markup: String,
    /// Absolute URL of the playable stream, when the element carries one.
    pub(crate) source: Option<String>,
}

/// Item links on the category page, deduplicated and oldest first.
///
/// A failed fetch is logged and yields no links.
pub(crate) fn discover(fetcher: &dyn Fetch, category_url: &str, item_prefix: &str) -> Vec<String> {
    let html = match fetcher.fetch_text(category_url) {
        Ok(html) => html,
        Err(err) => {
            error!("failed to fetch category page: {err}");
            return Vec::new();
        }
    };
    let links = collect_item_links(&html, category_url, item_prefix);
    debug!("discovered {} item links on {category_url}", links.len());
    links
}

pub(crate) fn collect_item_links(html: &str, page_url: &str, item_prefix: &str) -> Vec<String> {
    let base = Url::parse(page_url).ok();
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_href(base.as_ref(), href))
        .filter(|href| href.starts_with(item_prefix))
        .filter(|href| seen.insert(href.clone()))
        .collect::<Vec<_>>();

    // The site lists newest first.
    links.reverse();
    links
}

/// Every `<audio>` element on the item page in document order.
///
/// A failed fetch is logged and yields an empty list.
pub(crate) fn extract_media(fetcher: &dyn Fetch, item_url: &str) -> Vec<MediaReference> {
    match fetcher.fetch_text(item_url) {
        Ok(html) => collect_media(&html, item_url),
        Err(err) => {
            error!("failed to fetch item page: {err}");
            Vec::new()
        }
    }
}

pub(crate) fn first_media(fetcher: &dyn Fetch, item_url: &str) -> Option<MediaReference> {
    let media = extract_media(fetcher, item_url).into_iter().next();
    if media.is_none() {
        debug!("no audio element on {item_url}");
    }
    media
}

pub(crate) fn collect_media(html: &str, page_url: &str) -> Vec<MediaReference> {
    let base = Url::parse(page_url).ok();
    let document = Html::parse_document(html);
    let (Ok(audio), Ok(source)) = (Selector::parse("audio"), Selector::parse("source[src]"))
    else {
        return Vec::new();
    };

    document
        .select(&audio)
        .map(|element| MediaReference {
            markup: element.html(),
            source: media_source(element, &source)
                .and_then(|src| resolve_href(base.as_ref(), src)),
        })
        .collect()
}

fn media_source<'a>(element: ElementRef<'a>, source: &Selector) -> Option<&'a str> {
    element
        .value()
        .attr("src")
        .or_else(|| {
            element
                .select(source)
                .find_map(|child| child.value().attr("src"))
        })
        .map(str::trim)
        .filter(|src| !src.is_empty())
}

fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    let resolved = match base {
        Some(base) => base.join(href.trim()),
        None => Url::parse(href.trim()),
    };
    resolved.ok().map(String::from)
}
