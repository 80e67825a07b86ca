use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// A snippet filter receives a snippet as text and returns a cleaned version of it.
/// Filters run in order, so later filters see the output of earlier ones.
pub trait SnippetFilter: Send + Sync {
    fn filter(&self, text: String) -> String;
}

/// Parses the snippet as HTML and keeps only its text. Tags such as `<b>`
/// highlighting are dropped, entities (named and numeric) are decoded, and a
/// bare `<` in prose stays as text.
#[derive(Debug, Default)]
pub struct HtmlTextFilter;

impl HtmlTextFilter {
    pub fn get_dom(html: &str) -> std::io::Result<RcDom> {
        parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut std::io::Cursor::new(html))
    }

    fn is_block_like(local: &LocalName) -> bool {
        matches!(
            &**local,
            "p" | "div" | "br" | "li" | "ul" | "ol" | "section" | "article" | "tr" | "td"
        )
    }

    pub fn walk_html(handle: &Handle, out: &mut String) {
        match &handle.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { name, .. } => {
                let local = &name.local;
                if matches!(&**local, "script" | "style" | "noscript") {
                    return;
                }
                // keep "<p>a</p><p>b</p>" from gluing into "ab"
                if Self::is_block_like(local) {
                    out.push(' ');
                }
                for child in handle.children.borrow().iter() {
                    Self::walk_html(child, out);
                }
                if Self::is_block_like(local) {
                    out.push(' ');
                }
            }
            _ => {
                for child in handle.children.borrow().iter() {
                    Self::walk_html(child, out);
                }
            }
        }
    }
}

impl SnippetFilter for HtmlTextFilter {
    fn filter(&self, text: String) -> String {
        let dom = match Self::get_dom(&text) {
            Ok(dom) => dom,
            Err(e) => {
                log::warn!("could not parse snippet as html, keeping it as is: {e}");
                return text;
            }
        };
        let mut out = String::with_capacity(text.len());
        Self::walk_html(&dom.document, &mut out);
        out
    }
}

#[derive(Debug, Default)]
pub struct WhitespaceCollapseFilter;

impl SnippetFilter for WhitespaceCollapseFilter {
    fn filter(&self, text: String) -> String {
        text.split_whitespace().collect::<Vec<&str>>().join(" ")
    }
}

/// Caps a snippet at `max_chars` characters, appending `...` when cut.
pub struct TruncateFilter {
    max_chars: usize,
}

impl TruncateFilter {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for TruncateFilter {
    fn default() -> Self {
        Self { max_chars: 400 }
    }
}

impl SnippetFilter for TruncateFilter {
    fn filter(&self, text: String) -> String {
        match text.char_indices().nth(self.max_chars) {
            Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim_end()),
            None => text,
        }
    }
}

/// Ordered chain of snippet filters.
pub struct SnippetNormalizer {
    filters: Vec<Box<dyn SnippetFilter>>,
}

impl SnippetNormalizer {
    pub fn new(filters: Vec<Box<dyn SnippetFilter>>) -> Self {
        Self { filters }
    }

    pub fn normalize(&self, snippet: &str) -> String {
        let mut content = snippet.to_string();
        for filter in self.filters.iter() {
            content = filter.filter(content);
        }
        content
    }
}

impl Default for SnippetNormalizer {
    fn default() -> Self {
        Self::new(vec![
            Box::new(HtmlTextFilter),
            Box::new(WhitespaceCollapseFilter),
            Box::new(TruncateFilter::default()),
        ])
    }
}

#[test]
fn test_default_normalizer() {
    let normalizer = SnippetNormalizer::default();
    assert_eq!(
        normalizer.normalize("  Rates <b>rise</b>\n again &amp; again  "),
        "Rates rise again & again"
    );
    assert_eq!(normalizer.normalize(""), "");
}

#[test]
fn test_truncate_respects_char_boundaries() {
    let filter = TruncateFilter::new(3);
    assert_eq!(filter.filter("héllo".to_string()), "hél...");
    assert_eq!(filter.filter("hé".to_string()), "hé");
    assert_eq!(filter.filter("abc".to_string()), "abc");
}

#[test]
fn test_bare_angle_bracket_is_kept_as_text() {
    let normalizer = SnippetNormalizer::default();
    assert_eq!(
        normalizer.normalize("Inflation < 3% for the first time since 2021, Fed says"),
        "Inflation < 3% for the first time since 2021, Fed says"
    );
    assert_eq!(
        normalizer.normalize("Yields 4% > 3.5% <i>expected</i>"),
        "Yields 4% > 3.5% expected"
    );
}

#[test]
fn test_named_and_numeric_entities_are_decoded() {
    let normalizer = SnippetNormalizer::default();
    assert_eq!(
        normalizer.normalize("Fed&#8217;s chair says rates &mdash; stay"),
        "Fed\u{2019}s chair says rates \u{2014} stay"
    );
    assert_eq!(normalizer.normalize("AT&amp;T&nbsp;earnings &#x26; more"), "AT&T earnings & more");
    // decoded once, not twice
    assert_eq!(normalizer.normalize("&amp;lt;"), "&lt;");
}

#[test]
fn test_block_elements_and_scripts() {
    let filter = HtmlTextFilter;
    let out = filter.filter("<p>first</p><p>second</p><script>alert(1)</script>".to_string());
    assert_eq!(WhitespaceCollapseFilter.filter(out), "first second");
}
