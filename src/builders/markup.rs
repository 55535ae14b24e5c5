use std::ops::Range;

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text and must not be scanned for tags.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Where an attribute's value sits in the source. Spans never include the
/// surrounding quotes; expression spans include their braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Quoted(Range<usize>),
    Unquoted(Range<usize>),
    Expression(Range<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    pub value: Option<AttributeValue>,
    /// The whole attribute, name through value.
    pub span: Range<usize>,
}

/// One element of the scanned tree. All positions are byte offsets into the
/// source the [`Document`] was parsed from.
#[derive(Debug, Clone)]
pub struct Element {
    /// Lowercased tag name.
    pub name: String,
    pub start_tag: Range<usize>,
    /// `None` for void and self-closing elements, and for elements that were
    /// never closed explicitly.
    pub end_tag: Option<Range<usize>>,
    pub self_closing: bool,
    pub attributes: Vec<Attribute>,
    /// Indexes of direct child elements in [`Document::elements`].
    pub children: Vec<usize>,
}

impl Element {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_closed(&self) -> bool {
        self.end_tag.is_some()
    }

    /// The full element, start tag through end tag.
    pub fn span(&self) -> Range<usize> {
        let end = self
            .end_tag
            .as_ref()
            .map_or(self.start_tag.end, |tag| tag.end);
        self.start_tag.start..end
    }

    /// The text between start and end tag, when the element was closed.
    pub fn inner(&self) -> Option<Range<usize>> {
        self.end_tag
            .as_ref()
            .map(|tag| self.start_tag.end..tag.start)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// A lightweight element tree over markup that is not necessarily valid
/// HTML: component templates with frontmatter, `{...}` expressions and
/// unbalanced tags all scan without error.
#[derive(Debug, Default)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn parse(source: &str) -> Self {
        Scanner::new(source).run()
    }

    /// Elements of kind `name`, in document order of their start tags.
    pub fn elements_named<'d, 'n>(
        &'d self,
        name: &'n str,
    ) -> impl Iterator<Item = &'d Element> + use<'d, 'n> {
        self.elements.iter().filter(move |e| e.is_named(name))
    }

    /// The first element of kind `name` that has an end tag.
    pub fn first_closed(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.is_named(name) && e.is_closed())
    }

    pub fn children<'a>(&'a self, parent: &'a Element) -> impl Iterator<Item = &'a Element> + 'a {
        parent.children.iter().map(move |&i| &self.elements[i])
    }
}

struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    doc: Document,
    stack: Vec<usize>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            doc: Document::default(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Document {
        let mut pos = frontmatter_end(self.source);
        while let Some(found) = self.source[pos..].find('<') {
            pos = self.scan_markup(pos + found);
        }
        self.doc
    }

    /// Scans whatever starts at the `<` at `lt`, returns where to continue.
    fn scan_markup(&mut self, lt: usize) -> usize {
        let rest = &self.source[lt..];

        if rest.starts_with("<!--") {
            return self.find_from(lt + 4, "-->").map_or(self.len(), |i| i + 3);
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            return self.find_from(lt + 2, ">").map_or(self.len(), |i| i + 1);
        }
        if rest.starts_with("</") {
            let Some(name_end) = read_name(self.bytes, lt + 2) else {
                return lt + 2;
            };
            let name = self.source[lt + 2..name_end].to_ascii_lowercase();
            let end = self.find_from(name_end, ">").map_or(self.len(), |i| i + 1);
            self.close(&name, lt..end);
            return end;
        }

        match read_name(self.bytes, lt + 1) {
            Some(name_end) => self.open(lt, name_end),
            // A bare `<` in text, e.g. `a < b` in an expression.
            None => lt + 1,
        }
    }

    fn open(&mut self, lt: usize, name_end: usize) -> usize {
        let name = self.source[lt + 1..name_end].to_ascii_lowercase();
        let (attributes, end, self_closing) = self.read_attributes(name_end);
        let void = VOID_ELEMENTS.contains(&name.as_str());
        let raw_text = RAW_TEXT_ELEMENTS.contains(&name.as_str());

        let index = self.doc.elements.len();
        if let Some(&parent) = self.stack.last() {
            self.doc.elements[parent].children.push(index);
        }

        let mut element = Element {
            name,
            start_tag: lt..end,
            end_tag: None,
            self_closing: self_closing || void,
            attributes,
            children: Vec::new(),
        };

        if element.self_closing {
            self.doc.elements.push(element);
            return end;
        }

        if raw_text {
            let closing = format!("</{}", element.name);
            // ASCII lowercasing keeps byte offsets intact.
            let lowered = self.source[end..].to_ascii_lowercase();
            let resume = match lowered.find(&closing) {
                Some(i) => {
                    let close_start = end + i;
                    let close_end = self
                        .find_from(close_start, ">")
                        .map_or(self.len(), |j| j + 1);
                    element.end_tag = Some(close_start..close_end);
                    close_end
                }
                None => self.len(),
            };
            self.doc.elements.push(element);
            return resume;
        }

        self.doc.elements.push(element);
        self.stack.push(index);
        end
    }

    /// Closes the nearest open element called `name`. Anything opened after
    /// it is closed implicitly. A stray end tag with no open match is ignored.
    fn close(&mut self, name: &str, span: Range<usize>) {
        let Some(depth) = self
            .stack
            .iter()
            .rposition(|&i| self.doc.elements[i].name == name)
        else {
            return;
        };
        let index = self.stack[depth];
        self.stack.truncate(depth);
        self.doc.elements[index].end_tag = Some(span);
    }

    /// Reads attributes up to the end of a start tag. Returns the attributes,
    /// the offset just past the tag, and whether it ended with `/>`.
    fn read_attributes(&self, from: usize) -> (Vec<Attribute>, usize, bool) {
        let bytes = self.bytes;
        let len = bytes.len();
        let mut attributes = Vec::new();
        let mut i = from;

        loop {
            i = skip_whitespace(bytes, i);
            if i >= len {
                return (attributes, len, false);
            }

            match bytes[i] {
                b'>' => return (attributes, i + 1, false),
                b'/' if bytes.get(i + 1) == Some(&b'>') => return (attributes, i + 2, true),
                b'/' => i += 1,
                // `{...spread}` or `{shorthand}`
                b'{' => i = skip_braces(bytes, i),
                b'"' | b'\'' => i = skip_quoted(bytes, i),
                _ => {
                    let name_start = i;
                    while i < len
                        && !bytes[i].is_ascii_whitespace()
                        && !matches!(bytes[i], b'=' | b'>' | b'/' | b'"' | b'\'')
                    {
                        i += 1;
                    }
                    if i == name_start {
                        i += 1;
                        continue;
                    }
                    let name = self.source[name_start..i].to_ascii_lowercase();

                    let j = skip_whitespace(bytes, i);
                    if j >= len || bytes[j] != b'=' {
                        attributes.push(Attribute {
                            name,
                            value: None,
                            span: name_start..i,
                        });
                        continue;
                    }

                    let j = skip_whitespace(bytes, j + 1);
                    let value = if j >= len {
                        i = len;
                        None
                    } else {
                        match bytes[j] {
                            quote @ (b'"' | b'\'') => {
                                let close = bytes[j + 1..]
                                    .iter()
                                    .position(|&b| b == quote)
                                    .map_or(len, |p| j + 1 + p);
                                i = (close + 1).min(len);
                                Some(AttributeValue::Quoted(j + 1..close))
                            }
                            b'{' => {
                                i = skip_braces(bytes, j);
                                Some(AttributeValue::Expression(j..i))
                            }
                            _ => {
                                let mut end = j;
                                while end < len
                                    && !bytes[end].is_ascii_whitespace()
                                    && bytes[end] != b'>'
                                {
                                    end += 1;
                                }
                                i = end;
                                Some(AttributeValue::Unquoted(j..end))
                            }
                        }
                    };
                    attributes.push(Attribute {
                        name,
                        value,
                        span: name_start..i,
                    });
                }
            }
        }
    }

    fn find_from(&self, from: usize, pattern: &str) -> Option<usize> {
        self.source[from..].find(pattern).map(|i| from + i)
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Offset just past a leading `---` fenced frontmatter block, or 0.
pub fn frontmatter_end(source: &str) -> usize {
    let Some(rest) = source.strip_prefix("---") else {
        return 0;
    };
    if !(rest.starts_with('\n') || rest.starts_with("\r\n")) {
        return 0;
    }
    let Some(close) = rest.find("\n---") else {
        return 0;
    };
    let after_fence = 3 + close + 4;
    source[after_fence..]
        .find('\n')
        .map_or(source.len(), |n| after_fence + n + 1)
}

fn read_name(bytes: &[u8], at: usize) -> Option<usize> {
    if at >= bytes.len() || !bytes[at].is_ascii_alphabetic() {
        return None;
    }
    let mut end = at + 1;
    while end < bytes.len()
        && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'-' | b'_' | b':' | b'.'))
    {
        end += 1;
    }
    Some(end)
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn skip_quoted(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    bytes[open + 1..]
        .iter()
        .position(|&b| b == quote)
        .map_or(bytes.len(), |p| open + 1 + p + 1)
}

fn skip_braces(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'"' | b'\'' | b'`' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text<'a>(source: &'a str, range: Range<usize>) -> &'a str {
        &source[range]
    }

    #[test]
    fn test_nested_elements_and_children() {
        let src = "<dl><div><div>inner</div></div>\n<div>b</div></dl>";
        let doc = Document::parse(src);

        let dl = doc.first_closed("dl").unwrap();
        assert_eq!(text(src, dl.span()), src);
        let children: Vec<_> = doc.children(dl).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(text(src, children[0].span()), "<div><div>inner</div></div>");
        assert_eq!(text(src, children[1].span()), "<div>b</div>");
        assert_eq!(doc.elements_named("div").count(), 3);
    }

    #[test]
    fn test_lookup_name_can_be_dropped_before_result() {
        let src = "<dl><div>a</div></dl><dl></dl>";
        let doc = Document::parse(src);

        let name = "DL".to_lowercase();
        let found = doc.first_closed(&name);
        drop(name);
        assert_eq!(found.map(|e| e.span()), Some(0..21));
    }

    #[test]
    fn test_attributes_may_contain_angle_brackets() {
        let src = r#"<DL class="a>b" data-x='1' hidden id=main {...props}><div title="</dl>">x</div></dl>"#;
        let doc = Document::parse(src);

        let dl = doc.first_closed("dl").unwrap();
        assert_eq!(dl.name, "dl");
        assert_eq!(dl.attributes.len(), 4);
        match &dl.attribute("class").unwrap().value {
            Some(AttributeValue::Quoted(r)) => assert_eq!(text(src, r.clone()), "a>b"),
            other => panic!("unexpected class value: {other:?}"),
        }
        assert_eq!(dl.attribute("hidden").unwrap().value, None);
        match &dl.attribute("id").unwrap().value {
            Some(AttributeValue::Unquoted(r)) => assert_eq!(text(src, r.clone()), "main"),
            other => panic!("unexpected id value: {other:?}"),
        }
        assert_eq!(doc.children(dl).count(), 1);
        assert!(text(src, dl.span()).ends_with("</dl>"));
    }

    #[test]
    fn test_comments_void_and_self_closing() {
        let src = "<ul><!-- <li>not me</li> --><li><img src=a.png><br/>x</li><Card /></ul>";
        let doc = Document::parse(src);

        let ul = doc.first_closed("ul").unwrap();
        let names: Vec<_> = doc.children(ul).map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["li", "card"]);
        let li = doc.children(ul).next().unwrap();
        assert_eq!(doc.children(li).count(), 2);
        assert!(doc.elements_named("img").all(|e| e.self_closing));
        assert_eq!(doc.elements_named("li").count(), 1);
    }

    #[test]
    fn test_frontmatter_and_raw_text_are_skipped() {
        let src = "---\nconst items: Array<string> = [];\n---\n<script>if (a<b) {}</script><dl><div>x</div></dl>";
        assert!(src[frontmatter_end(src)..].starts_with("<script>"));

        let doc = Document::parse(src);
        assert_eq!(doc.elements_named("string").count(), 0);
        assert_eq!(doc.elements_named("b").count(), 0);
        let script = doc.first_closed("script").unwrap();
        assert_eq!(text(src, script.inner().unwrap()), "if (a<b) {}");
        assert!(doc.first_closed("dl").is_some());
    }

    #[test]
    fn test_unclosed_elements_are_closed_by_ancestor() {
        let src = "<dl><div><p>open</div><div>b</div></dl>";
        let doc = Document::parse(src);

        let dl = doc.first_closed("dl").unwrap();
        assert_eq!(doc.children(dl).count(), 2);
        let p = doc.elements_named("p").next().unwrap();
        assert!(!p.is_closed());
    }

    #[test]
    fn test_stray_end_tag_is_ignored() {
        let src = "</div><dl><div>a</div></span></dl>";
        let doc = Document::parse(src);
        let dl = doc.first_closed("dl").unwrap();
        assert_eq!(text(src, dl.inner().unwrap()), "<div>a</div></span>");
    }

    #[test]
    fn test_frontmatter_requires_fence_line() {
        assert_eq!(frontmatter_end("---not a fence\n---\n<p>"), 0);
        assert_eq!(frontmatter_end("<p>---\n</p>"), 0);
        assert_eq!(frontmatter_end("---\nunterminated"), 0);
    }
}
