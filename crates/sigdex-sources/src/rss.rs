//! Shared RSS/XML item parsing and HTML stripping.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::SourceError;

/// One `<item>` from an RSS feed. `source` is the optional `<source>`
/// element Google News attaches naming the original publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub source: Option<String>,
}

/// Parse an RSS XML document into its items.
///
/// Pulls `<title>`, `<link>`, `<description>`, and `<source>` from each
/// `<item>`. HTML in descriptions is stripped. Items without a title and
/// link are dropped. Stops after `max_items`.
///
/// # Errors
///
/// Returns [`SourceError::Xml`] if the document is not well-formed XML.
pub fn parse_items(xml: &str, max_items: usize) -> Result<Vec<RssItem>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut in_item = false;
    let mut in_description = false;
    let mut current_tag = String::new();
    let mut item = RssItem::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("").to_string();
                if name == "item" {
                    in_item = true;
                    in_description = false;
                    item = RssItem::default();
                } else if name == "description" && in_item {
                    in_description = true;
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("");
                if name == "description" {
                    in_description = false;
                }
                if name == "item" && in_item {
                    in_item = false;
                    if !item.title.is_empty() && !item.link.is_empty() {
                        items.push(std::mem::take(&mut item));
                        if items.len() >= max_items {
                            break;
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    if in_description {
                        // Accumulate all text nodes inside <description>,
                        // including those emitted after nested tags like <b>.
                        if !item.description.is_empty() {
                            item.description.push(' ');
                        }
                        item.description.push_str(&text);
                    } else {
                        match current_tag.as_str() {
                            "title" => item.title = text,
                            "link" => item.link = text,
                            "source" => item.source = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if in_item && in_description {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    item.description = strip_html(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

/// Strip HTML tags from a string and normalize whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Startups</title>
    <item>
      <title>Stripe raises $100M Series C</title>
      <link>https://example.com/stripe</link>
      <description><![CDATA[<p>Stripe announced a <b>$100M</b> round.</p>]]></description>
      <source url="https://techcrunch.com">TechCrunch</source>
    </item>
    <item>
      <title>Broken entry with no link</title>
    </item>
    <item>
      <title>Vercel launches new platform</title>
      <link>https://example.com/vercel</link>
      <description>Plain text description</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items_and_strips_html() {
        let items = parse_items(FEED, 10).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Stripe raises $100M Series C");
        assert_eq!(items[0].link, "https://example.com/stripe");
        assert_eq!(items[0].description, "Stripe announced a $100M round.");
        assert_eq!(items[0].source.as_deref(), Some("TechCrunch"));
        assert_eq!(items[1].source, None);
    }

    #[test]
    fn respects_max_items() {
        let items = parse_items(FEED, 1).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn mismatched_tags_are_an_error() {
        assert!(parse_items("<rss></item></rss>", 10).is_err());
    }

    #[test]
    fn strip_html_collapses_whitespace() {
        assert_eq!(strip_html("<p>a  b</p>\n<br/>c"), "a b c");
    }
}
