use std::collections::BTreeMap;

use super::*;

const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// Content runs verbatim up to the matching end tag.
const RAW_TEXT_TAGS: [&str; 4] = ["script", "style", "title", "textarea"];

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Parses an HTML fixture into a [`Dom`].
///
/// The parser is forgiving in the places real page markup needs
/// (unmatched end tags, stray `<`, bare attributes) and strict where a
/// fixture is certainly truncated: unclosed comments, tags and raw text
/// elements are [`Error::HtmlParse`].
pub(crate) fn parse_html(source: &str) -> Result<Dom> {
    let mut lexer = Lexer::new(source);
    let mut builder = TreeBuilder::default();
    while let Some(token) = lexer.next_token()? {
        builder.push(token);
    }
    let mut dom = builder.dom;
    dom.initialize_form_control_values()?;
    Ok(dom)
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    StartTag {
        name: String,
        attrs: BTreeMap<String, String>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
}

struct TreeBuilder {
    dom: Dom,
    open: Vec<NodeId>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        let dom = Dom::new();
        let open = vec![dom.root()];
        Self { dom, open }
    }
}

impl TreeBuilder {
    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.dom.root())
    }

    fn push(&mut self, token: Token) {
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                let parent = self.current();
                let node = self.dom.append_element(parent, &name, attrs);
                if !self_closing && !is_void_tag(&name) {
                    self.open.push(node);
                }
            }
            Token::EndTag(name) => {
                // Unmatched end tags are dropped; a match closes everything
                // opened after it.
                let matched = self
                    .open
                    .iter()
                    .rposition(|node| self.dom.is_tag(*node, &name));
                if let Some(depth) = matched.filter(|depth| *depth > 0) {
                    self.open.truncate(depth);
                }
            }
            Token::Text(text) => {
                if !text.is_empty() {
                    let parent = self.current();
                    self.dom.append_text(parent, text);
                }
            }
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    raw_text_end: Option<String>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            raw_text_end: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if let Some(tag) = self.raw_text_end.take() {
                let text = self.raw_text(&tag)?;
                if text.is_empty() {
                    continue;
                }
                return Ok(Some(Token::Text(text)));
            }

            let rest = self.rest();
            if rest.is_empty() {
                return Ok(None);
            }
            if let Some(comment) = rest.strip_prefix("<!--") {
                let end = comment
                    .find("-->")
                    .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
                self.pos += 4 + end + 3;
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| Error::HtmlParse("unclosed markup declaration".into()))?;
                self.pos += end + 1;
                continue;
            }
            if let Some(tail) = rest.strip_prefix("</") {
                let end = tail
                    .find('>')
                    .ok_or_else(|| Error::HtmlParse("unclosed end tag".into()))?;
                let name = tag_name_prefix(tail.trim_start()).to_ascii_lowercase();
                self.pos += 2 + end + 1;
                if name.is_empty() {
                    continue;
                }
                return Ok(Some(Token::EndTag(name)));
            }
            if rest
                .strip_prefix('<')
                .and_then(|tail| tail.chars().next())
                .is_some_and(|ch| ch.is_ascii_alphabetic())
            {
                return self.start_tag().map(Some);
            }

            // Text runs to the next `<`; a stray `<` is kept as text.
            let first = rest.chars().next().map_or(0, char::len_utf8);
            let end = rest[first..].find('<').map_or(rest.len(), |offset| offset + first);
            self.pos += end;
            return Ok(Some(Token::Text(decode_entities(&rest[..end]))));
        }
    }

    fn raw_text(&mut self, tag: &str) -> Result<String> {
        let rest = self.rest();
        let close = find_end_tag(rest, tag)
            .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
        self.pos += close;
        let body = &rest[..close];
        Ok(if tag == "script" || tag == "style" {
            body.to_string()
        } else {
            decode_entities(body)
        })
    }

    fn start_tag(&mut self) -> Result<Token> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut i = self.pos + 1;
        let name = tag_name_prefix(&source[i..]).to_ascii_lowercase();
        i += name.len();

        let unclosed = || Error::HtmlParse(format!("unclosed start tag <{name}"));
        let mut attrs = BTreeMap::new();
        let self_closing = loop {
            while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
                i += 1;
            }
            match bytes.get(i) {
                None => return Err(unclosed()),
                Some(b'>') => {
                    i += 1;
                    break false;
                }
                Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                    i += 2;
                    break true;
                }
                Some(b'/') => {
                    i += 1;
                    continue;
                }
                Some(_) => {}
            }

            let name_start = i;
            while bytes
                .get(i)
                .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'='))
            {
                i += 1;
            }
            let attr_name = source[name_start..i].to_ascii_lowercase();
            while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
                i += 1;
            }

            let mut value = String::new();
            if bytes.get(i) == Some(&b'=') {
                i += 1;
                while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
                    i += 1;
                }
                let raw = match bytes.get(i) {
                    None => return Err(unclosed()),
                    Some(quote @ (b'"' | b'\'')) => {
                        let start = i + 1;
                        let len = source[start..]
                            .find(char::from(*quote))
                            .ok_or_else(unclosed)?;
                        i = start + len + 1;
                        &source[start..start + len]
                    }
                    Some(_) => {
                        let start = i;
                        while bytes
                            .get(i)
                            .is_some_and(|b| !b.is_ascii_whitespace() && *b != b'>')
                        {
                            i += 1;
                        }
                        &source[start..i]
                    }
                };
                value = decode_entities(raw);
            }
            if !attr_name.is_empty() {
                attrs.entry(attr_name).or_insert(value);
            }
        };

        self.pos = i;
        if RAW_TEXT_TAGS.contains(&name.as_str()) && !self_closing {
            self.raw_text_end = Some(name.clone());
        }
        Ok(Token::StartTag {
            name,
            attrs,
            self_closing,
        })
    }
}

fn tag_name_prefix(source: &str) -> &str {
    let end = source
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'))
        .unwrap_or(source.len());
    &source[..end]
}

/// Byte offset of `</tag` in `source`, compared case-insensitively.
fn find_end_tag(source: &str, tag: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let needle = tag.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i..].starts_with(b"</")
            && bytes
                .get(i + 2..i + 2 + needle.len())
                .is_some_and(|name| name.eq_ignore_ascii_case(needle))
            && bytes
                .get(i + 2 + needle.len())
                .is_none_or(|next| !next.is_ascii_alphanumeric())
    })
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_entity(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes the `&...;` reference at the start of `source`, returning the
/// character and the number of bytes consumed.
fn decode_entity(source: &str) -> Option<(char, usize)> {
    let end = source.find(';')?;
    let name = source.get(1..end)?;
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '#') {
        return None;
    }
    let ch = match name.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)?
        }
        None => match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            "copy" => '©',
            "ndash" => '–',
            "mdash" => '—',
            "hellip" => '…',
            "lsquo" => '‘',
            "rsquo" => '’',
            "ldquo" => '“',
            "rdquo" => '”',
            "uarr" => '↑',
            _ => return None,
        },
    };
    Some((ch, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_end_tags_are_ignored() -> Result<()> {
        let dom = parse_html(r#"<div id="a"><p id="b">x</span></p><i id="c"></i></div>"#)?;
        let a = dom.by_id("a").expect("div");
        let c = dom.by_id("c").expect("i");
        assert_eq!(dom.parent(c), Some(a));
        Ok(())
    }

    #[test]
    fn raw_text_elements_keep_markup_as_text() -> Result<()> {
        let dom = parse_html("<textarea id=\"t\">a <b> &amp; c</textarea><script>if (a<b) {}</script>")?;
        let textarea = dom.by_id("t").expect("textarea");
        assert_eq!(dom.value(textarea)?, "a <b> & c");
        let script = dom.query_selector("script")?.expect("script");
        assert_eq!(dom.text_content(script), "if (a<b) {}");
        Ok(())
    }

    #[test]
    fn bare_and_unquoted_attributes() -> Result<()> {
        let dom = parse_html("<input id=x required value=a&amp;b data-x='1'>")?;
        let input = dom.by_id("x").expect("input");
        assert!(dom.required(input));
        assert_eq!(dom.value(input)?, "a&b");
        assert_eq!(dom.attr(input, "data-x").as_deref(), Some("1"));
        Ok(())
    }

    #[test]
    fn stray_angle_brackets_and_unknown_entities_stay_text() -> Result<()> {
        let dom = parse_html("<p id=\"p\">1 < 2 &bogus; &#x2191;</p>")?;
        let p = dom.by_id("p").expect("p");
        assert_eq!(dom.text_content(p), "1 < 2 &bogus; ↑");
        Ok(())
    }

    #[test]
    fn truncated_markup_is_an_error() {
        for source in ["<div", "<p title=\"x>", "<textarea>never closed", "</p"] {
            assert!(
                matches!(parse_html(source), Err(Error::HtmlParse(_))),
                "{source:?} should fail"
            );
        }
    }
}
