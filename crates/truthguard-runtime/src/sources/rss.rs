//! RSS 2.0 and Atom feeds.
//!
//! Only titles and links are needed, so items are extracted with a few
//! anchored patterns rather than a full XML parser.

use lazy_static::lazy_static;
use regex::Regex;

use super::{FeedItem, SourceError};

lazy_static! {
    static ref ITEM: Regex = Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>").unwrap();
    static ref ENTRY: Regex = Regex::new(r"(?is)<entry\b[^>]*>(.*?)</entry>").unwrap();
    static ref TITLE: Regex = Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").unwrap();
    static ref RSS_LINK: Regex = Regex::new(r"(?is)<link>(.*?)</link>").unwrap();
    static ref ATOM_LINK: Regex =
        Regex::new(r#"(?is)<link\b[^>]*?href\s*=\s*["']([^"']*)["']"#).unwrap();
    static ref CDATA: Regex = Regex::new(r"(?s)^\s*<!\[CDATA\[(.*?)\]\]>\s*$").unwrap();
    static ref FEED_ROOT: Regex = Regex::new(r"(?i)<(rss|feed|rdf:RDF)\b").unwrap();
    static ref ENTITY: Regex =
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|lt|gt|quot|apos|amp);").unwrap();
}

/// Parse an RSS or Atom document into feed items.
pub(crate) fn parse_feed(body: &str) -> Result<Vec<FeedItem>, SourceError> {
    if !FEED_ROOT.is_match(body) {
        return Err(SourceError::Parse("not an RSS or Atom document".to_string()));
    }

    let blocks: Vec<&str> = ITEM
        .captures_iter(body)
        .chain(ENTRY.captures_iter(body))
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    Ok(blocks
        .into_iter()
        .filter_map(|block| {
            let title = TITLE
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|m| text(m.as_str()))
                .filter(|t| !t.is_empty())?;
            let url = RSS_LINK
                .captures(block)
                .or_else(|| ATOM_LINK.captures(block))
                .and_then(|c| c.get(1))
                .map(|m| text(m.as_str()))
                .unwrap_or_default();
            Some(FeedItem::new(title, url))
        })
        .collect())
}

/// Unwrap CDATA and decode named and numeric character references.
fn text(raw: &str) -> String {
    let inner = CDATA
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    ENTITY
        .replace_all(inner, |caps: &regex::Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .trim()
        .to_string()
}

/// Decode one reference body (the part between `&` and `;`).
fn decode_entity(name: &str) -> Option<String> {
    let decoded = match name {
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "amp" => '&',
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}
