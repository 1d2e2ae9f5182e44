use std::fs;
use std::path::Path;

/// Script tag injected into every served scraped page.
const CHAT_WIDGET_SNIPPET: &str = "\n    <script src=\"/js/chatwoot.js\"></script>\n    ";

/// Substrings that mark the widget as already present.
const WIDGET_SENTINELS: [&str; 2] = ["chatwoot.js", "chatwootSDK"];

/// Header/footer partials for the basic site, loaded once at startup and
/// reused for every render.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    header: String,
    footer: String,
}

impl Templates {
    /// Load the partials from `<public_dir>/partials`; missing files load as
    /// empty strings.
    pub fn load(public_dir: &Path) -> Self {
        Self {
            header: read_partial(public_dir, "header.html"),
            footer: read_partial(public_dir, "footer.html"),
        }
    }

    /// Insert the chat-widget script before the closing body tag.
    ///
    /// Idempotent: input containing a sentinel is returned unchanged. With no
    /// closing body tag the snippet is appended at the end.
    pub fn inject_widget(&self, html: &str) -> String {
        if WIDGET_SENTINELS.iter().any(|s| html.contains(s)) {
            return html.to_string();
        }
        match html.rfind("</body>") {
            Some(idx) => format!("{}{}{}", &html[..idx], CHAT_WIDGET_SNIPPET, &html[idx..]),
            None => format!("{}{}", html, CHAT_WIDGET_SNIPPET),
        }
    }

    /// Build a complete basic-site page around the given content
    pub fn render_page(&self, title: &str, content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/css/style.css">
</head>
<body>
    {header}

    <main class="main-content">
        {content}
    </main>

    {footer}

    <script src="/js/main.js"></script>{widget}
</body>
</html>"#,
            title = title,
            header = self.header,
            content = content,
            footer = self.footer,
            widget = CHAT_WIDGET_SNIPPET,
        )
    }
}

fn read_partial(public_dir: &Path, name: &str) -> String {
    fs::read_to_string(public_dir.join("partials").join(name)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_closing_body() {
        let templates = Templates::default();
        let html = "<html><body><p>hi</p></body></html>";

        let injected = templates.inject_widget(html);
        assert!(injected.contains("/js/chatwoot.js"));
        let script_at = injected.find("chatwoot.js").unwrap();
        let body_at = injected.rfind("</body>").unwrap();
        assert!(script_at < body_at);
    }

    #[test]
    fn test_inject_is_idempotent() {
        let templates = Templates::default();
        let once = templates.inject_widget("<html><body></body></html>");
        assert_eq!(templates.inject_widget(&once), once);
    }

    #[test]
    fn test_inject_respects_existing_sdk_snippet() {
        let templates = Templates::default();
        let html = "<html><body><script>window.chatwootSDK.run()</script></body></html>";
        assert_eq!(templates.inject_widget(html), html);
    }

    #[test]
    fn test_inject_appends_without_body_tag() {
        let templates = Templates::default();
        let injected = templates.inject_widget("<p>fragment</p>");
        assert!(injected.starts_with("<p>fragment</p>"));
        assert!(injected.contains("/js/chatwoot.js"));
    }

    #[test]
    fn test_render_page_wraps_partials() {
        let dir = tempfile::tempdir().unwrap();
        let partials = dir.path().join("partials");
        std::fs::create_dir_all(&partials).unwrap();
        std::fs::write(partials.join("header.html"), "<header>top</header>").unwrap();
        std::fs::write(partials.join("footer.html"), "<footer>bottom</footer>").unwrap();

        let templates = Templates::load(dir.path());
        let page = templates.render_page("Shop", "<p>content</p>");

        assert!(page.contains("<title>Shop</title>"));
        assert!(page.contains("<header>top</header>"));
        assert!(page.contains("<p>content</p>"));
        assert!(page.contains("<footer>bottom</footer>"));
        assert!(page.contains("/js/chatwoot.js"));
    }

    #[test]
    fn test_load_with_missing_partials_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let templates = Templates::load(dir.path());
        let page = templates.render_page("Empty", "<p>x</p>");
        assert!(page.contains("<p>x</p>"));
    }
}
