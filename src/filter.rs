use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Extensions that mark a URL as a static asset rather than a crawlable page.
/// Matched as lowercased substrings of the full URL.
const STATIC_EXTENSIONS: [&str; 14] = [
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".css", ".js", ".woff", ".woff2", ".ttf",
    ".otf", ".pdf", ".zip",
];

/// Filters hrefs discovered in page markup down to crawlable same-origin URLs
#[derive(Debug)]
pub struct LinkFilter {
    /// Origin of the seed URL, e.g. "https://example.com"
    origin: String,
    anchor_re: Regex,
}

impl LinkFilter {
    /// Create a filter whose crawl boundary is the seed URL's origin
    pub fn new(seed: &Url) -> Result<Self, regex::Error> {
        Ok(Self {
            origin: seed.origin().ascii_serialization(),
            anchor_re: Regex::new(r#"(?i)<a[^>]+href=["']([^"']+)["'][^>]*>"#)?,
        })
    }

    /// Extract every crawlable link from raw page markup.
    ///
    /// Hrefs that are empty, "#", javascript: or mailto: are discarded.
    /// Fragments and query strings are stripped before the href is resolved
    /// against the page URL. Only same-origin, non-asset URLs survive, with
    /// trailing slashes normalized away (except on the origin root). The
    /// result set is deduplicated preserving first-occurrence order.
    pub fn extract_links(&self, html: &str, page_url: &str) -> Vec<String> {
        let base = match Url::parse(page_url) {
            Ok(url) => url,
            Err(_) => return Vec::new(),
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for caps in self.anchor_re.captures_iter(html) {
            let href = &caps[1];
            if href.trim().is_empty()
                || href == "#"
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
            {
                continue;
            }

            // Strip fragment and query string before resolution
            let clean = href.split('#').next().unwrap_or(href);
            let clean = clean.split('?').next().unwrap_or(clean);

            // Invalid URLs are silently dropped
            let resolved = match base.join(clean) {
                Ok(url) => url,
                Err(_) => continue,
            };

            if let Some(normalized) = self.normalize(&resolved) {
                if seen.insert(normalized.clone()) {
                    links.push(normalized);
                }
            }
        }

        links
    }

    /// Check an absolute URL against the boundary rules and return its
    /// normalized form, or None if it must not be crawled.
    fn normalize(&self, url: &Url) -> Option<String> {
        let text = url.as_str();

        // Internal means: same scheme and host as the seed
        let prefix = format!("{}/", self.origin);
        if !text.starts_with(&prefix) {
            return None;
        }

        // Assets are downloaded, not visited
        let lowered = text.to_lowercase();
        if STATIC_EXTENSIONS.iter().any(|ext| lowered.contains(ext)) {
            return None;
        }

        // Trailing slash is dropped unless this is the bare origin root
        if text.ends_with('/') && text != prefix {
            Some(text[..text.len() - 1].to_string())
        } else {
            Some(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_for(seed: &str) -> LinkFilter {
        LinkFilter::new(&Url::parse(seed).unwrap()).unwrap()
    }

    #[test]
    fn test_discards_non_navigable_hrefs() {
        let filter = filter_for("https://example.com/");
        let html = r##"
            <a href="">empty</a>
            <a href="#">hash</a>
            <a href="javascript:void(0)">js</a>
            <a href="mailto:a@b.com">mail</a>
        "##;

        let links = filter.extract_links(html, "https://example.com/");
        assert!(links.is_empty());
    }

    #[test]
    fn test_internal_external_partition() {
        let filter = filter_for("https://example.com/");
        let html = r#"
            <a href="https://example.com/a">internal</a>
            <a href="https://other.com/a">external</a>
            <a href="https://example.com/img.png">asset</a>
        "#;

        let links = filter.extract_links(html, "https://example.com/");
        assert_eq!(links, vec!["https://example.com/a"]);
    }

    #[test]
    fn test_relative_links_resolve_against_page() {
        let filter = filter_for("https://example.com/");
        let html = r#"<a href="/sobre">about</a> <a href="contacto">contact</a>"#;

        let links = filter.extract_links(html, "https://example.com/tienda/");
        assert_eq!(
            links,
            vec![
                "https://example.com/sobre",
                "https://example.com/tienda/contacto"
            ]
        );
    }

    #[test]
    fn test_fragment_and_query_are_stripped_before_resolution() {
        let filter = filter_for("https://example.com/");
        let html = r##"
            <a href="https://example.com/a?utm_source=x">tracked</a>
            <a href="https://example.com/a#section">fragment</a>
        "##;

        let links = filter.extract_links(html, "https://example.com/");
        assert_eq!(links, vec!["https://example.com/a"]);
    }

    #[test]
    fn test_trailing_slash_normalization() {
        let filter = filter_for("https://example.com/");
        let html = r#"
            <a href="https://example.com/">root</a>
            <a href="https://example.com/a/">inner</a>
        "#;

        let links = filter.extract_links(html, "https://example.com/");
        assert_eq!(
            links,
            vec!["https://example.com/", "https://example.com/a"]
        );
    }

    #[test]
    fn test_deduplicates_preserving_order() {
        let filter = filter_for("https://example.com/");
        let html = r#"
            <a href="https://example.com/b">first</a>
            <a href="https://example.com/a">second</a>
            <a href="https://example.com/b">again</a>
        "#;

        let links = filter.extract_links(html, "https://example.com/");
        assert_eq!(
            links,
            vec!["https://example.com/b", "https://example.com/a"]
        );
    }

    #[test]
    fn test_static_extension_matches_anywhere_in_url() {
        // Substring semantics: the extension list is checked against the
        // whole URL, so a path segment containing it is excluded too.
        let filter = filter_for("https://example.com/");
        let html = r#"<a href="https://example.com/downloads/kit.zip">zip</a>"#;

        let links = filter.extract_links(html, "https://example.com/");
        assert!(links.is_empty());
    }
}
