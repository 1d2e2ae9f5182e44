use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Asset references and title pulled out of one rendered page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Contents of the title element, if any
    pub title: Option<String>,
    /// Image references: img src/data-src plus inline background images
    pub images: Vec<String>,
    /// Stylesheet references: link hrefs plus url() refs in style blocks
    pub css: Vec<String>,
    /// Script references: script[src]
    pub scripts: Vec<String>,
}

/// Extracts title and categorized asset references from rendered markup.
///
/// Each category is deduplicated as a set, preserving first-occurrence order.
pub fn extract(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);
    let url_re = Regex::new(r#"url\(['"]?([^'"]+)['"]?\)"#).unwrap();

    let extracted = ExtractedPage {
        title: extract_title(&doc),
        images: extract_images(&doc, &url_re),
        css: extract_stylesheets(&doc, &url_re),
        scripts: extract_scripts(&doc),
    };

    ::log::debug!(
        "Extracted {} images, {} stylesheets, {} scripts",
        extracted.images.len(),
        extracted.css.len(),
        extracted.scripts.len()
    );

    extracted
}

fn extract_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").unwrap();
    doc.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn extract_images(doc: &Html, url_re: &Regex) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    let img_selector = Selector::parse("img").unwrap();
    for img in doc.select(&img_selector) {
        // src wins; data-src covers lazy-loaded images
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"));
        if let Some(src) = src {
            push_unique(&mut images, &mut seen, src);
        }
    }

    let bg_selector = Selector::parse(r#"[style*="background-image"]"#).unwrap();
    for el in doc.select(&bg_selector) {
        if let Some(style) = el.value().attr("style") {
            if let Some(caps) = url_re.captures(style) {
                push_unique(&mut images, &mut seen, &caps[1]);
            }
        }
    }

    images
}

fn extract_stylesheets(doc: &Html, url_re: &Regex) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut css = Vec::new();

    let link_selector = Selector::parse(r#"link[rel="stylesheet"]"#).unwrap();
    for link in doc.select(&link_selector) {
        if let Some(href) = link.value().attr("href") {
            push_unique(&mut css, &mut seen, href);
        }
    }

    // url() and @import references inside inline style blocks
    let style_selector = Selector::parse("style").unwrap();
    for style in doc.select(&style_selector) {
        let content = style.text().collect::<String>();
        for caps in url_re.captures_iter(&content) {
            push_unique(&mut css, &mut seen, &caps[1]);
        }
    }

    css
}

fn extract_scripts(doc: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut scripts = Vec::new();

    let script_selector = Selector::parse("script[src]").unwrap();
    for script in doc.select(&script_selector) {
        if let Some(src) = script.value().attr("src") {
            push_unique(&mut scripts, &mut seen, src);
        }
    }

    scripts
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
    if seen.insert(value.to_string()) {
        out.push(value.to_string());
    }
}
