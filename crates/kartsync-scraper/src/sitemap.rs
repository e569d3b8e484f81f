//! Sitemap parsing for product URL discovery.
//!
//! Supports both `<urlset>` documents and `<sitemapindex>` documents. An
//! index is followed one level deep; nested indexes are not expected on
//! storefront sites and are ignored with a warning.

use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::client::{extract_origin, PageSource};
use crate::error::ScraperError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitemap {
    /// A `<urlset>` of page locations.
    Urls(Vec<SitemapEntry>),
    /// A `<sitemapindex>` listing child sitemap locations.
    Index(Vec<String>),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Loc,
    Lastmod,
}

/// The conventional sitemap location for a site: a URL already ending in
/// `.xml` is used as-is, anything else maps to `<origin>/sitemap.xml`.
#[must_use]
pub fn sitemap_url_for(site: &str) -> String {
    let trimmed = site.trim();
    if trimmed.to_ascii_lowercase().ends_with(".xml") {
        trimmed.to_owned()
    } else {
        format!("{}/sitemap.xml", extract_origin(trimmed))
    }
}

/// Parses a sitemap or sitemap index document.
///
/// Only unprefixed `loc`/`lastmod` elements that are direct children of a
/// `url` or `sitemap` entry are read. Extension children such as
/// `<image:image><image:loc>` or `<xhtml:link>` never replace the page
/// location.
///
/// # Errors
///
/// Returns [`ScraperError::Xml`] if the document is not well-formed or its
/// root element is neither `urlset` nor `sitemapindex`.
pub fn parse_sitemap(xml: &str) -> Result<Sitemap, ScraperError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<String> = None;
    // Open elements below the root; `None` marks a namespace-prefixed one.
    let mut open: Vec<Option<String>> = Vec::new();
    let mut entries: Vec<SitemapEntry> = Vec::new();
    let mut children: Vec<String> = Vec::new();
    let mut current: Option<SitemapEntry> = None;
    let mut field = Field::None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let qname = e.name();
                let local = String::from_utf8_lossy(qname.local_name().as_ref()).to_string();
                if root.is_none() {
                    root = Some(local);
                    continue;
                }
                let name = qname.prefix().is_none().then_some(local);
                let parent = open.last().cloned().flatten();
                field = Field::None;
                match (open.len(), parent.as_deref(), name.as_deref()) {
                    (0, _, Some("url" | "sitemap")) => {
                        current = Some(SitemapEntry {
                            loc: String::new(),
                            lastmod: None,
                        });
                    }
                    (1, Some("url" | "sitemap"), Some("loc")) => field = Field::Loc,
                    (1, Some("url" | "sitemap"), Some("lastmod")) => field = Field::Lastmod,
                    _ => {}
                }
                open.push(name);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ScraperError::Xml(e.to_string()))?
                    .trim()
                    .to_string();
                apply_text(current.as_mut(), field, text);
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c.into_inner()).trim().to_string();
                apply_text(current.as_mut(), field, text);
            }
            Ok(Event::End(_)) => {
                field = Field::None;
                let closed = open.pop().flatten();
                if !open.is_empty() {
                    continue;
                }
                match closed.as_deref() {
                    Some("url") => {
                        if let Some(entry) = current.take().filter(|e| !e.loc.is_empty()) {
                            entries.push(entry);
                        }
                    }
                    Some("sitemap") => {
                        if let Some(entry) = current.take().filter(|e| !e.loc.is_empty()) {
                            children.push(entry.loc);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ScraperError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
    }

    match root.as_deref() {
        Some("urlset") => Ok(Sitemap::Urls(entries)),
        Some("sitemapindex") => Ok(Sitemap::Index(children)),
        Some(other) => Err(ScraperError::Xml(format!(
            "unexpected root element <{other}>"
        ))),
        None => Err(ScraperError::Xml("empty document".to_owned())),
    }
}

fn apply_text(current: Option<&mut SitemapEntry>, field: Field, text: String) {
    let Some(entry) = current else {
        return;
    };
    match field {
        Field::Loc => entry.loc = text,
        Field::Lastmod => entry.lastmod = Some(text),
        Field::None => {}
    }
}

/// Fetches `url` and returns every page location containing `filter`
/// (all locations when `filter` is empty), following a sitemap index one
/// level deep. Order is preserved; duplicates are dropped.
///
/// A child sitemap that fails to fetch or parse is logged and skipped.
///
/// # Errors
///
/// Returns the fetch or parse error of the top-level document.
pub async fn collect_product_urls(
    source: &dyn PageSource,
    url: &str,
    filter: &str,
) -> Result<Vec<String>, ScraperError> {
    let page = source.fetch(url).await?;
    let top = parse_sitemap(&page.body)?;

    let mut entries: Vec<SitemapEntry> = Vec::new();
    match top {
        Sitemap::Urls(urls) => entries.extend(urls),
        Sitemap::Index(children) => {
            for child in children {
                let parsed = match source.fetch(&child).await {
                    Ok(page) => parse_sitemap(&page.body),
                    Err(e) => Err(e),
                };
                match parsed {
                    Ok(Sitemap::Urls(urls)) => entries.extend(urls),
                    Ok(Sitemap::Index(_)) => {
                        tracing::warn!(sitemap = %child, "nested sitemap index ignored");
                    }
                    Err(e) => {
                        tracing::warn!(sitemap = %child, error = %e, "skipping child sitemap");
                    }
                }
            }
        }
    }

    let mut seen = HashSet::new();
    Ok(entries
        .into_iter()
        .map(|e| e.loc)
        .filter(|loc| filter.is_empty() || loc.contains(filter))
        .filter(|loc| seen.insert(loc.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urlset_with_lastmod() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://shop.example.com/en/brake-pads-crg.html</loc><lastmod>2024-05-01</lastmod></url>
              <url><loc>https://shop.example.com/en/contact</loc></url>
            </urlset>"#;
        let sitemap = parse_sitemap(xml).unwrap();
        assert_eq!(
            sitemap,
            Sitemap::Urls(vec![
                SitemapEntry {
                    loc: "https://shop.example.com/en/brake-pads-crg.html".to_owned(),
                    lastmod: Some("2024-05-01".to_owned()),
                },
                SitemapEntry {
                    loc: "https://shop.example.com/en/contact".to_owned(),
                    lastmod: None,
                },
            ])
        );
    }

    #[test]
    fn parses_sitemap_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>https://shop.example.com/sitemap-products.xml</loc></sitemap>
              <sitemap><loc>https://shop.example.com/sitemap-pages.xml</loc></sitemap>
            </sitemapindex>"#;
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            Sitemap::Index(vec![
                "https://shop.example.com/sitemap-products.xml".to_owned(),
                "https://shop.example.com/sitemap-pages.xml".to_owned(),
            ])
        );
    }

    #[test]
    fn unescapes_entities_in_loc() {
        let xml = "<urlset><url><loc>https://shop.example.com/?a=1&amp;b=2</loc></url></urlset>";
        let Sitemap::Urls(urls) = parse_sitemap(xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(urls[0].loc, "https://shop.example.com/?a=1&b=2");
    }

    #[test]
    fn image_extension_does_not_replace_page_location() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                    xmlns:image="http://www.google.com/schemas/sitemap-image/1.1"
                    xmlns:xhtml="http://www.w3.org/1999/xhtml">
              <url>
                <loc>https://shop.example.com/p/kart-seat</loc>
                <lastmod>2024-06-02</lastmod>
                <xhtml:link rel="alternate" hreflang="hu" href="https://shop.example.com/hu/p/kart-seat"/>
                <image:image>
                  <image:loc>https://shop.example.com/img/p/1/2/12.jpg</image:loc>
                  <image:caption>Kart seat</image:caption>
                </image:image>
              </url>
              <url>
                <image:image><image:loc>https://shop.example.com/img/p/3.jpg</image:loc></image:image>
                <loc>https://shop.example.com/p/axle-50mm</loc>
              </url>
            </urlset>"#;

        assert_eq!(
            parse_sitemap(xml).unwrap(),
            Sitemap::Urls(vec![
                SitemapEntry {
                    loc: "https://shop.example.com/p/kart-seat".to_owned(),
                    lastmod: Some("2024-06-02".to_owned()),
                },
                SitemapEntry {
                    loc: "https://shop.example.com/p/axle-50mm".to_owned(),
                    lastmod: None,
                },
            ])
        );
    }

    #[test]
    fn entry_with_only_image_location_is_dropped() {
        let xml = r#"<urlset xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
              <url><image:image><image:loc>https://shop.example.com/img/9.jpg</image:loc></image:image></url>
            </urlset>"#;
        assert_eq!(parse_sitemap(xml).unwrap(), Sitemap::Urls(Vec::new()));
    }

    #[test]
    fn rejects_html_document() {
        let err = parse_sitemap("<html><body>nope</body></html>").unwrap_err();
        assert!(matches!(err, ScraperError::Xml(ref m) if m.contains("html")));
    }

    #[test]
    fn rejects_empty_document() {
        assert!(matches!(parse_sitemap(""), Err(ScraperError::Xml(_))));
    }

    #[test]
    fn sitemap_url_for_site_root() {
        assert_eq!(
            sitemap_url_for("https://shop.example.com/en/"),
            "https://shop.example.com/sitemap.xml"
        );
        assert_eq!(
            sitemap_url_for("https://shop.example.com/sitemap_en.xml"),
            "https://shop.example.com/sitemap_en.xml"
        );
    }
}
