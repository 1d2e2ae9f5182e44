use regex::{Captures, Regex};

/// Opening-tag markers for script/link elements that belong to the CMS or to
/// known tracking vendors. Any script whose opening tag mentions one of these
/// is removed wholesale.
const SCRIPT_TAG_MARKERS: [&str; 7] = [
    "wp-content",
    "wp-includes",
    "woocommerce",
    "js_composer",
    "woodmart",
    "cdn-cgi",
    r"sac\.c6b0ecb69ff9da03d5a614ca0cf55e04\.com",
];

/// Inline-script body markers identifying CMS bootstrap blobs.
const INLINE_SCRIPT_MARKERS: [&str; 3] = ["var wc_", "woocommerce_params", "wc_add_to_cart_params"];

/// Derive the final path segment of a URL reference, with any query string
/// and fragment removed.
pub fn basename(reference: &str) -> String {
    let trimmed = reference.split('?').next().unwrap_or(reference);
    let trimmed = trimmed.split('#').next().unwrap_or(trimmed);
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

/// Strip the scheme and any trailing slash from an origin, leaving the bare
/// host used inside the rewrite patterns.
pub fn origin_host(origin: &str) -> String {
    let host = origin.trim_end_matches('/');
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    host.to_string()
}

/// Rewrites scraped CMS markup into the local mirror's URL scheme.
///
/// All rules are plain text transformations compiled once at construction;
/// the HTML is never parsed structurally, so attribute order and formatting
/// of untouched markup survive byte for byte. Applying `clean` to its own
/// output is a no-op: every rewritten value is a local path the source
/// patterns no longer match.
#[derive(Debug)]
pub struct HtmlCleaner {
    strip_rules: Vec<Regex>,
    image_src: Regex,
    image_data_src: Regex,
    srcset: Regex,
    style_url: Regex,
    stylesheet_href: Regex,
    font_ref: Regex,
    internal_href: Regex,
    /// Substring identifying upload URLs inside srcset candidates
    uploads_marker: String,
}

impl HtmlCleaner {
    /// Compile the rule set for one source origin (e.g. "https://example.com")
    pub fn new(origin: &str) -> Result<Self, regex::Error> {
        let host = regex::escape(&origin_host(origin));

        let mut strip_rules = Vec::new();
        for marker in SCRIPT_TAG_MARKERS {
            strip_rules.push(Regex::new(&format!(
                r"(?is)<script[^>]*{marker}[^>]*>.*?</script>"
            ))?);
        }
        for marker in ["wp-content", "wp-includes"] {
            strip_rules.push(Regex::new(&format!(
                r"(?i)<link[^>]*{marker}[^>]*\.css[^>]*>"
            ))?);
        }
        for rel in ["pingback", "EditURI", r"https://api\.w\.org/"] {
            strip_rules.push(Regex::new(&format!(
                r#"(?i)<link[^>]*rel=["']{rel}["'][^>]*>"#
            ))?);
        }
        for generator in ["WordPress", "WooCommerce"] {
            strip_rules.push(Regex::new(&format!(
                r"(?i)<meta[^>]*generator[^>]*{generator}[^>]*>"
            ))?);
        }
        for marker in INLINE_SCRIPT_MARKERS {
            strip_rules.push(Regex::new(&format!(
                r"(?is)<script[^>]*>.*?{marker}[^<]*</script>"
            ))?);
        }
        // Admin-bar styles, CMS comments and the admin-bar container itself
        strip_rules.push(Regex::new(r"(?is)<style[^>]*>.*?#wpadminbar[^<]*</style>")?);
        strip_rules.push(Regex::new(r"(?is)<!--.*?wp-[^>]*?-->")?);
        strip_rules.push(Regex::new(
            r#"(?is)<div[^>]*id=["']wpadminbar["'][^>]*>.*?</div>"#,
        )?);

        Ok(Self {
            strip_rules,
            image_src: Regex::new(&format!(
                r#"(?i)src=["'](https?://{host}/wp-content/uploads/[^"']+)["']"#
            ))?,
            image_data_src: Regex::new(&format!(
                r#"(?i)data-src=["'](https?://{host}/wp-content/uploads/[^"']+)["']"#
            ))?,
            srcset: Regex::new(r#"(?i)srcset=["']([^"']+)["']"#)?,
            style_url: Regex::new(&format!(
                r#"(?i)url\(["']?(https?://{host}/wp-content/uploads/[^"')]+)["']?\)"#
            ))?,
            stylesheet_href: Regex::new(&format!(
                r#"(?i)href=["'](https?://{host}/wp-content/themes/[^"']+\.css[^"']*)["']"#
            ))?,
            font_ref: Regex::new(&format!(
                r#"(?i)(href|src)=["'](https?://{host}/wp-content/[^"']+\.(?:woff2?|ttf|otf)[^"']*)["']"#
            ))?,
            internal_href: Regex::new(&format!(
                r#"(?i)href=["'](?:https?://{host})([^"']+)["']"#
            ))?,
            uploads_marker: format!("{}/wp-content/uploads", origin_host(origin)),
        })
    }

    /// Apply the full rule set: strip CMS noise, then remap asset and link
    /// URLs to the local scheme.
    pub fn clean(&self, html: &str) -> String {
        let mut out = html.to_string();

        for rule in &self.strip_rules {
            out = rule.replace_all(&out, "").into_owned();
        }

        out = self.replace_image_urls(&out);
        out = self.replace_stylesheet_urls(&out);
        out = self.replace_font_urls(&out);
        out = self.replace_internal_links(&out);

        out
    }

    fn replace_image_urls(&self, html: &str) -> String {
        let out = self
            .image_src
            .replace_all(html, |caps: &Captures| {
                format!(r#"src="/images/{}""#, basename(&caps[1]))
            })
            .into_owned();

        let out = self
            .srcset
            .replace_all(&out, |caps: &Captures| {
                format!(r#"srcset="{}""#, self.rewrite_srcset(&caps[1]))
            })
            .into_owned();

        let out = self
            .image_data_src
            .replace_all(&out, |caps: &Captures| {
                format!(r#"data-src="/images/{}""#, basename(&caps[1]))
            })
            .into_owned();

        self.style_url
            .replace_all(&out, |caps: &Captures| {
                format!(r#"url("/images/{}")"#, basename(&caps[1]))
            })
            .into_owned()
    }

    /// Rewrite each srcset candidate that points at the source uploads path,
    /// keeping its width/density descriptor intact.
    fn rewrite_srcset(&self, srcset: &str) -> String {
        srcset
            .split(',')
            .map(|candidate| {
                let candidate = candidate.trim();
                let mut parts = candidate.split_whitespace();
                let url = parts.next().unwrap_or("");
                if url.contains(&self.uploads_marker) {
                    match parts.next() {
                        Some(descriptor) => format!("/images/{} {}", basename(url), descriptor),
                        None => format!("/images/{}", basename(url)),
                    }
                } else {
                    candidate.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn replace_stylesheet_urls(&self, html: &str) -> String {
        self.stylesheet_href
            .replace_all(html, |caps: &Captures| {
                format!(r#"href="/css/{}""#, basename(&caps[1]))
            })
            .into_owned()
    }

    fn replace_font_urls(&self, html: &str) -> String {
        self.font_ref
            .replace_all(html, |caps: &Captures| {
                format!(r#"{}="/fonts/{}""#, &caps[1], basename(&caps[2]))
            })
            .into_owned()
    }

    fn replace_internal_links(&self, html: &str) -> String {
        self.internal_href
            .replace_all(html, |caps: &Captures| {
                format!(r#"href="{}""#, &caps[1])
            })
            .into_owned()
    }
}
