use std::sync::LazyLock;

use regex::Regex;

/// `<a ...>inner</a>`; group 1 is the opening tag's attributes, group 2 the inner HTML.
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid regex"));

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:aria-label|title)\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// A link on a page together with the text a visitor sees for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub url: String,
    pub text: String,
}

/// Resolve a raw href against a base URL, returning an absolute URL with fragment stripped.
fn resolve_href(raw: &str, base: Option<&url::Url>) -> Option<String> {
    let raw = raw.trim();
    let mut parsed = if raw.starts_with("http://") || raw.starts_with("https://") {
        url::Url::parse(raw).ok()?
    } else if let Some(rest) = raw.strip_prefix("//") {
        url::Url::parse(&format!("https://{rest}")).ok()?
    } else {
        base?.join(raw).ok()?
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Every `<a href>` in document order, duplicates included so callers can count mentions.
/// Anchor text falls back to `aria-label` / `title` for icon-only links.
pub fn extract_anchors(html: &str, base_url: &str) -> Vec<Anchor> {
    let base = url::Url::parse(base_url).ok();

    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let attrs = &cap[1];
            let href = HREF_RE.captures(attrs)?;
            let url = resolve_href(&decode_entities(&href[1]), base.as_ref())?;
            let mut text = visible_text(&cap[2]);
            if text.is_empty() {
                text = LABEL_RE
                    .captures(attrs)
                    .map(|label| visible_text(&label[1]))
                    .unwrap_or_default();
            }
            Some(Anchor { url, text })
        })
        .collect()
}

fn visible_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_text_is_extracted() {
        let html = r#"<a href="https://facebook.com/acmeroofing">Find us on <b>Facebook</b></a>"#;
        let anchors = extract_anchors(html, "https://acmeroofing.com");
        assert_eq!(
            anchors,
            vec![Anchor {
                url: "https://facebook.com/acmeroofing".into(),
                text: "Find us on Facebook".into(),
            }]
        );
    }

    #[test]
    fn icon_links_fall_back_to_aria_label() {
        let html = r#"<a class="icon" aria-label="Acme on Instagram" href="https://instagram.com/acme"><svg></svg></a>"#;
        let anchors = extract_anchors(html, "https://acme.com");
        assert_eq!(anchors[0].text, "Acme on Instagram");
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let html = r#"
            <a href="https://x.com/acme">X</a>
            <a href="/contact">Contact</a>
            <a href='https://x.com/acme'>Follow</a>
        "#;
        let anchors = extract_anchors(html, "https://acme.com/");
        let urls: Vec<&str> = anchors.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://x.com/acme", "https://acme.com/contact", "https://x.com/acme"]
        );
    }

    #[test]
    fn relative_and_protocol_relative_hrefs_resolve() {
        let html = r#"<a href="//www.youtube.com/@acme#top">YT</a><a href="team">Team</a>"#;
        let anchors = extract_anchors(html, "https://acme.com/about/");
        assert_eq!(anchors[0].url, "https://www.youtube.com/@acme");
        assert_eq!(anchors[1].url, "https://acme.com/about/team");
    }

    #[test]
    fn non_http_schemes_are_skipped() {
        let html = r#"<a href="mailto:hi@acme.com">Mail</a><a href="tel:555">Call</a><a href="javascript:void(0)">x</a>"#;
        assert!(extract_anchors(html, "https://acme.com").is_empty());
    }

    #[test]
    fn entities_in_href_are_decoded() {
        let html = r#"<a href="https://www.facebook.com/pg/acme/?a=1&amp;b=2">Acme &amp; Sons</a>"#;
        let anchors = extract_anchors(html, "https://acme.com");
        assert_eq!(anchors[0].url, "https://www.facebook.com/pg/acme/?a=1&b=2");
        assert_eq!(anchors[0].text, "Acme & Sons");
    }

    #[test]
    fn image_src_is_not_an_anchor() {
        let html = r#"<img src="https://facebook.com/acme"><link href="https://facebook.com/acme">"#;
        assert!(extract_anchors(html, "https://acme.com").is_empty());
    }
}
