//! Content region cleaning.
//!
//! Two passes over a chosen region:
//!
//! 1. a walk over the parsed DOM that measures what a reader would see,
//!    skipping page chrome and active content ([`DROPPED_ELEMENTS`]): visible
//!    text, how much of it sits inside `<p>` elements, media count, and the
//!    top-level paragraphs for the paragraph-only fallback in [`super`]
//! 2. an `ammonia` allow-list pass over the region's markup ([`clean`]), which
//!    removes the dropped elements with their content, keeps only harmless
//!    tags and attributes (no `class`, `id`, `style`, `data-*`, handlers), and
//!    filters URL attributes down to safe schemes
//!
//! Every fragment leaving the extractor goes through [`clean`].

use ammonia::Builder;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Node};

/// Elements removed together with their whole subtree.
pub const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "embed", "form", "button",
    "svg", "nav", "footer", "header", "aside", "link", "meta",
];

const MEDIA_ELEMENTS: &[&str] = &["img", "picture", "video", "audio"];

static CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        // Chrome tags are allowed by default; they must leave the tag list
        // before they can be content-cleaned.
        .rm_tags(["nav", "header", "footer", "aside"])
        .add_tags(["main", "section", "picture", "source", "video", "audio"])
        .add_tag_attributes("source", ["src", "type"])
        .add_tag_attributes("video", ["src", "controls"])
        .add_tag_attributes("audio", ["src", "controls"])
        .add_clean_content_tags(DROPPED_ELEMENTS.iter().copied())
        .link_rel(None)
        .strip_comments(true);
    builder
});

/// Measurements and cleaned markup of one content region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sanitized {
    /// Cleaned inner markup of the region.
    pub html: String,
    /// Non-whitespace characters of visible text.
    pub text_chars: usize,
    /// Non-whitespace characters of visible text inside `<p>` elements.
    pub paragraph_chars: usize,
    /// Raw markup of the top-level `<p>` elements, in document order.
    /// Pass through [`clean`] before use.
    pub paragraphs: Vec<String>,
    /// Number of media elements kept.
    pub media: usize,
}

impl Sanitized {
    /// Whether anything displayable survived cleaning.
    pub fn has_content(&self) -> bool {
        self.text_chars > 0 || self.media > 0
    }
}

/// Measure `region` and clean its inner markup.
pub fn sanitize(region: ElementRef<'_>) -> Sanitized {
    let mut walker = Walker::default();
    walker.children(region);
    Sanitized {
        html: clean(&region.inner_html()),
        ..walker.out
    }
}

/// Run a fragment through the allow-list cleaner.
pub fn clean(fragment: &str) -> String {
    CLEANER.clean(fragment).to_string()
}

/// Whether `element` is, or sits inside, one of the [`DROPPED_ELEMENTS`].
pub fn is_in_chrome(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|e| DROPPED_ELEMENTS.contains(&e.value().name()))
}

#[derive(Default)]
struct Walker {
    out: Sanitized,
    paragraph_depth: usize,
}

impl Walker {
    fn children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn text(&mut self, text: &str) {
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        self.out.text_chars += visible;
        if self.paragraph_depth > 0 {
            self.out.paragraph_chars += visible;
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if DROPPED_ELEMENTS.contains(&name) {
            return;
        }
        if MEDIA_ELEMENTS.contains(&name) {
            self.out.media += 1;
        }

        if name != "p" {
            self.children(element);
            return;
        }
        if self.paragraph_depth == 0 {
            self.out.paragraphs.push(element.html());
        }
        self.paragraph_depth += 1;
        self.children(element);
        self.paragraph_depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());

    fn sanitize_article(html: &str) -> Sanitized {
        let doc = Html::parse_document(html);
        let article = doc.select(&ARTICLE).next().unwrap();
        sanitize(article)
    }

    #[test]
    fn test_drops_chrome_and_active_content() {
        let s = sanitize_article(
            r#"<article>
                <header><h1>Title</h1></header>
                <nav><a href="/">Home</a></nav>
                <script>alert(1)</script>
                <style>p { color: red }</style>
                <p>Kept</p>
                <aside>Related</aside>
                <footer>Footer</footer>
                <form action="/subscribe"><button>Follow</button></form>
            </article>"#,
        );
        assert!(s.html.contains("<p>Kept</p>"));
        for gone in [
            "Title", "Home", "alert", "color", "Related", "Footer", "Follow", "<nav", "<aside",
        ] {
            assert!(!s.html.contains(gone), "{gone} leaked into {}", s.html);
        }
        assert_eq!(s.text_chars, 4);
    }

    #[test]
    fn test_strips_stale_attributes_keeps_structure() {
        let s = sanitize_article(
            r#"<article><div class="a" id="b" style="c" data-x="1" data-track-id="2" onclick="go()"><a href="/x" title="t">link</a><img src="/i.png" alt="pic" data-src="/lazy.png"></div></article>"#,
        );
        assert_eq!(
            s.html,
            r#"<div><a href="/x" title="t">link</a><img alt="pic" src="/i.png"></div>"#
        );
        assert_eq!(s.media, 1);
    }

    #[test]
    fn test_drops_script_urls_in_every_url_attribute() {
        let s = sanitize_article(
            r#"<article><p><a href="java&#9;script:alert(1)">x</a> <a href=" JavaScript:alert(5)">y</a></p><object data="javascript:alert(4)"></object><img src="javascript:alert(6)" alt="i"><form action="javascript:alert(2)"><button formaction="javascript:alert(3)">go</button></form></article>"#,
        );
        assert_eq!(s.html, r#"<p><a>x</a> <a>y</a></p><img alt="i">"#);
        assert!(!s.html.to_lowercase().contains("script"));
    }

    #[test]
    fn test_keeps_safe_links() {
        let s = sanitize_article(
            r#"<article><a href="https://medium.com/p">abs</a><a href="/rel">rel</a><a href="mailto:a@b.test">mail</a></article>"#,
        );
        assert_eq!(
            s.html,
            r#"<a href="https://medium.com/p">abs</a><a href="/rel">rel</a><a href="mailto:a@b.test">mail</a>"#
        );
    }

    #[test]
    fn test_reescapes_text_and_attributes() {
        let s = sanitize_article(
            r#"<article><p title="a &quot;q&quot;">1 &lt; 2 &amp;&amp; &lt;script&gt;</p></article>"#,
        );
        assert_eq!(
            s.html,
            r#"<p title="a &quot;q&quot;">1 &lt; 2 &amp;&amp; &lt;script&gt;</p>"#
        );
    }

    #[test]
    fn test_counts_paragraph_text() {
        let s = sanitize_article(
            "<article><p>abc</p><div>de <span>f</span></div><p>gh <b>i</b></p><!-- note --></article>",
        );
        assert_eq!(s.text_chars, 9);
        assert_eq!(s.paragraph_chars, 6);
        assert_eq!(s.paragraphs, vec!["<p>abc</p>", "<p>gh <b>i</b></p>"]);
        assert!(!s.html.contains("note"));
    }

    #[test]
    fn test_empty_region_has_no_content() {
        let s = sanitize_article("<article>  <script>x()</script> </article>");
        assert!(!s.has_content());
    }

    #[test]
    fn test_is_in_chrome() {
        let doc = Html::parse_document(
            r#"<body><nav><div class="content">a</div></nav><header class="content">b</header><div class="content">c</div></body>"#,
        );
        let selector = Selector::parse(".content").unwrap();
        let flags: Vec<bool> = doc.select(&selector).map(is_in_chrome).collect();
        assert_eq!(flags, vec![true, true, false]);
    }
}
