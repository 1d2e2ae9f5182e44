use crate::cleaner::HtmlCleaner;
use crate::records::MetadataDocument;
use crate::store::{self, PAGES_DIR};
use crate::template::Templates;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Outcome of resolving a request path to page content
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Hand-authored page, served verbatim
    Basic(String),
    /// Scraped page, cleaned and widget-injected
    Scraped(String),
    NotFound,
}

/// Maps request paths to stored page content.
///
/// The hand-authored basic site always wins over the scraped mirror. Scraped
/// lookups go through the metadata index; without metadata they are disabled
/// entirely and only basic pages are served.
pub struct ContentResolver {
    content_dir: PathBuf,
    public_dir: PathBuf,
    metadata: Option<MetadataDocument>,
    cleaner: HtmlCleaner,
    templates: Templates,
}

impl ContentResolver {
    /// Build a resolver over a content directory. The rewrite origin comes
    /// from the metadata's baseUrl when present.
    pub fn new(content_dir: &Path, public_dir: &Path) -> Result<Self> {
        let metadata = store::load_metadata(content_dir);
        let origin = metadata
            .as_ref()
            .map(|m| m.base_url.clone())
            .unwrap_or_else(|| "http://localhost".to_string());

        Ok(Self {
            content_dir: content_dir.to_path_buf(),
            public_dir: public_dir.to_path_buf(),
            metadata,
            cleaner: HtmlCleaner::new(&origin)?,
            templates: Templates::load(public_dir),
        })
    }

    /// Resolve a request path, with any query string already removed
    pub fn resolve(&self, request_path: &str) -> Resolved {
        let path = request_path.split('?').next().unwrap_or(request_path);
        let path = if path.is_empty() { "/" } else { path };

        // Basic site first
        if let Some(html) = self.load_basic_page(path) {
            ::log::info!("Serving basic page: {}", path);
            return Resolved::Basic(html);
        }

        // Scraped content, then the scraped index as a last resort
        if self.metadata.is_some() {
            if let Some(html) = self.load_scraped_page(path) {
                ::log::info!("Serving scraped page: {}", path);
                return Resolved::Scraped(html);
            }
            if let Some(html) = self.load_scraped_file("index.html") {
                ::log::info!("Serving scraped index as fallback for: {}", path);
                return Resolved::Scraped(html);
            }
        }

        Resolved::NotFound
    }

    fn load_basic_page(&self, path: &str) -> Option<String> {
        let name = if path == "/" {
            "index.html".to_string()
        } else {
            format!("{}.html", path.strip_prefix('/').unwrap_or(path))
        };
        fs::read_to_string(self.public_dir.join(name)).ok()
    }

    /// Look the path up in the metadata index and load the stored file
    fn load_scraped_page(&self, path: &str) -> Option<String> {
        let metadata = self.metadata.as_ref()?;

        // A page matches with or without its trailing slash
        let wanted = trim_path(path);
        metadata.pages.iter().find(|page| {
            Url::parse(&page.url)
                .map(|url| trim_path(url.path()) == wanted)
                .unwrap_or(false)
        })?;

        self.load_scraped_file(&store::page_filename(path))
    }

    fn load_scraped_file(&self, filename: &str) -> Option<String> {
        let html = fs::read_to_string(self.content_dir.join(PAGES_DIR).join(filename)).ok()?;
        Some(self.templates.inject_widget(&self.cleaner.clean(&html)))
    }
}

fn trim_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CrawlIndex, PageRecord};
    use std::fs;

    fn page(url: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            html: String::new(),
            title: None,
            images: vec![],
            css: vec![],
            scripts: vec![],
            links: vec![],
        }
    }

    /// Lay out a content directory with metadata for the given URLs
    fn content_dir(urls: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        store::ensure_directories(dir.path()).unwrap();

        let mut index = CrawlIndex::new();
        for url in urls {
            index.insert(page(url));
            let path = Url::parse(url).unwrap().path().to_string();
            store::save_page_html(
                dir.path(),
                &path,
                &format!("<html><body>page {path}</body></html>"),
            )
            .unwrap();
        }
        store::write_metadata(dir.path(), &index.to_metadata("https://example.com/")).unwrap();
        dir
    }

    #[test]
    fn test_resolves_with_or_without_trailing_slash() {
        let content = content_dir(&["https://example.com/a/"]);
        let public = tempfile::tempdir().unwrap();
        let resolver = ContentResolver::new(content.path(), public.path()).unwrap();

        let from_bare = resolver.resolve("/a");
        let from_slashed = resolver.resolve("/a/");
        assert!(matches!(from_bare, Resolved::Scraped(_)));
        assert_eq!(from_bare, from_slashed);
    }

    #[test]
    fn test_scraped_page_is_cleaned_and_injected() {
        let dir = tempfile::tempdir().unwrap();
        store::ensure_directories(dir.path()).unwrap();

        let mut index = CrawlIndex::new();
        index.insert(page("https://example.com/"));
        store::save_page_html(
            dir.path(),
            "/",
            r#"<html><body><a href="https://example.com/sobre">x</a></body></html>"#,
        )
        .unwrap();
        store::write_metadata(dir.path(), &index.to_metadata("https://example.com/")).unwrap();

        let public = tempfile::tempdir().unwrap();
        let resolver = ContentResolver::new(dir.path(), public.path()).unwrap();

        match resolver.resolve("/") {
            Resolved::Scraped(html) => {
                assert!(html.contains(r#"href="/sobre""#));
                assert!(html.contains("/js/chatwoot.js"));
            }
            other => panic!("expected scraped page, got {other:?}"),
        }
    }

    #[test]
    fn test_basic_site_wins_over_scraped() {
        let content = content_dir(&["https://example.com/"]);
        let public = tempfile::tempdir().unwrap();
        fs::write(public.path().join("index.html"), "<html>basic</html>").unwrap();

        let resolver = ContentResolver::new(content.path(), public.path()).unwrap();
        assert_eq!(
            resolver.resolve("/"),
            Resolved::Basic("<html>basic</html>".to_string())
        );
    }

    #[test]
    fn test_unknown_path_falls_back_to_scraped_index() {
        let content = content_dir(&["https://example.com/"]);
        let public = tempfile::tempdir().unwrap();
        let resolver = ContentResolver::new(content.path(), public.path()).unwrap();

        match resolver.resolve("/missing") {
            Resolved::Scraped(html) => assert!(html.contains("page /")),
            other => panic!("expected fallback index, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_metadata_disables_scraped_lookups() {
        let dir = tempfile::tempdir().unwrap();
        store::ensure_directories(dir.path()).unwrap();
        // A stored index page exists, but without metadata it must not serve
        store::save_page_html(dir.path(), "/", "<html>orphan</html>").unwrap();

        let public = tempfile::tempdir().unwrap();
        fs::write(public.path().join("about.html"), "<html>about</html>").unwrap();

        let resolver = ContentResolver::new(dir.path(), public.path()).unwrap();
        assert_eq!(resolver.resolve("/"), Resolved::NotFound);
        assert!(matches!(resolver.resolve("/about"), Resolved::Basic(_)));
    }

    #[test]
    fn test_query_string_is_ignored() {
        let content = content_dir(&["https://example.com/a/"]);
        let public = tempfile::tempdir().unwrap();
        let resolver = ContentResolver::new(content.path(), public.path()).unwrap();

        assert!(matches!(resolver.resolve("/a?page=2"), Resolved::Scraped(_)));
    }
}
