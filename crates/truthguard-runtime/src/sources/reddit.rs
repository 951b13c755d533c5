//! Reddit listing JSON.

use serde::Deserialize;

use super::{FeedItem, SourceError};

/// URL of a subreddit's hot listing.
pub(crate) fn listing_url(base_url: &str, subreddit: &str, limit: u32) -> String {
    format!(
        "{}/r/{}/hot.json?limit={}",
        base_url.trim_end_matches('/'),
        subreddit,
        limit
    )
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    stickied: bool,
}

/// Parse a listing body into feed items; posts without a title are dropped.
pub(crate) fn parse_listing(body: &str, base_url: &str) -> Result<Vec<FeedItem>, SourceError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    Ok(listing
        .data
        .children
        .into_iter()
        .filter_map(|child| {
            let post = child.data;
            let title = post.title.filter(|t| !t.trim().is_empty())?;
            let url = post
                .url
                .or_else(|| {
                    post.permalink
                        .map(|p| format!("{}{}", base_url.trim_end_matches('/'), p))
                })
                .unwrap_or_default();
            Some(FeedItem {
                title,
                url,
                pinned: post.stickied,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url("https://www.reddit.com/", "nepalnews", 10),
            "https://www.reddit.com/r/nepalnews/hot.json?limit=10"
        );
    }

    #[test]
    fn test_parse_listing_keeps_stickied_flag_and_drops_untitled() {
        let body = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    { "data": { "title": "Pinned rules", "url": "https://r/1", "stickied": true } },
                    { "data": { "url": "https://r/2" } },
                    { "data": { "title": "Self post headline", "permalink": "/r/nepal/comments/abc/" } }
                ]
            }
        }"#;

        let items = parse_listing(body, "https://www.reddit.com").unwrap();

        assert_eq!(items.len(), 2);
        assert!(items[0].pinned);
        assert_eq!(items[1].url, "https://www.reddit.com/r/nepal/comments/abc/");
    }

    #[test]
    fn test_html_block_page_is_parse_error() {
        let err = parse_listing("<html>blocked</html>", "https://www.reddit.com").unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
