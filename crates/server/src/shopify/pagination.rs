//! Cursor pagination via the `Link` response header.
//!
//! REST list endpoints return the neighbouring pages as URLs carrying a
//! `page_info` query parameter:
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-10/draft_orders.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-10/draft_orders.json?limit=250&page_info=NEXT>; rel="next"
//! ```

use url::Url;

/// Extract the `page_info` cursor of the next page from a `Link` header.
///
/// Returns `None` when the header is absent, has no `rel="next"` entry, or
/// the next URL carries no cursor.
#[must_use]
pub fn next_page_info(link_header: Option<&str>) -> Option<String> {
    link_header?
        .split(',')
        .map(str::trim)
        .find(|segment| segment.contains(r#"rel="next""#))
        .and_then(link_target)
        .and_then(|target| Url::parse(target).ok())
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, value)| key == "page_info" && !value.is_empty())
                .map(|(_, value)| value.into_owned())
        })
}

/// The URL between `<` and `>` in a link segment.
fn link_target(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    segment.get(start..end).filter(|s| !s.is_empty())
}
