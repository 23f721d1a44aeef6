use super::*;

/// Parsed, comma-separated selector list. Matches when any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

/// One selector of a list, stored right to left: the subject compound
/// first, then each combinator with the compound on its left.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    subject: Compound,
    context: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
    states: Vec<ControlState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlState {
    Checked,
    Disabled,
    Enabled,
    Required,
    Optional,
}

impl SelectorList {
    pub(crate) fn parse(source: &str) -> Result<Self> {
        SelectorParser::new(source).parse_list()
    }

    pub(crate) fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| selector.matches(dom, node))
    }
}

impl ComplexSelector {
    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.subject.matches(dom, node) && self.context_matches(dom, node, 0)
    }

    // Backtracks over every candidate for descendant and sibling steps.
    fn context_matches(&self, dom: &Dom, node: NodeId, depth: usize) -> bool {
        let Some((combinator, compound)) = self.context.get(depth) else {
            return true;
        };
        let accept = |candidate: NodeId| {
            compound.matches(dom, candidate) && self.context_matches(dom, candidate, depth + 1)
        };
        match combinator {
            Combinator::Child => dom.parent(node).is_some_and(accept),
            Combinator::Descendant => dom.ancestors(node).any(accept),
            Combinator::NextSibling => dom.previous_element_sibling(node).is_some_and(accept),
            Combinator::SubsequentSibling => dom.preceding_element_siblings(node).any(accept),
        }
    }
}

impl Compound {
    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let Some(element) = dom.element(node) else {
            return false;
        };
        if self
            .tag
            .as_deref()
            .is_some_and(|tag| !element.tag.eq_ignore_ascii_case(tag))
        {
            return false;
        }
        if self
            .id
            .as_deref()
            .is_some_and(|id| element.attr("id") != Some(id))
        {
            return false;
        }
        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }
        if !self.attrs.iter().all(|test| test.matches(element)) {
            return false;
        }
        self.states.iter().all(|state| match state {
            ControlState::Checked => element.checked,
            ControlState::Disabled => element.is_disabled(),
            ControlState::Enabled => !element.is_disabled(),
            ControlState::Required => element.is_required(),
            ControlState::Optional => !element.is_required(),
        })
    }
}

impl AttrTest {
    fn matches(&self, element: &ElementData) -> bool {
        let actual = match element.attr(&self.name) {
            Some(value) => value,
            // An input without a type attribute is a text input.
            None if self.name == "type" && element.tag == "input" => "text",
            None => return false,
        };
        match &self.op {
            AttrOp::Exists => element.attr(&self.name).is_some(),
            AttrOp::Equals(expected) => actual == expected,
            AttrOp::Prefix(expected) => !expected.is_empty() && actual.starts_with(expected.as_str()),
            AttrOp::Suffix(expected) => !expected.is_empty() && actual.ends_with(expected.as_str()),
            AttrOp::Substring(expected) => !expected.is_empty() && actual.contains(expected.as_str()),
        }
    }
}

struct SelectorParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedSelector(self.source.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            _ => Err(self.unsupported()),
        }
    }

    /// Returns whether any whitespace was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn ident(&mut self) -> Result<String> {
        let ident = self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if ident.is_empty() {
            return Err(self.unsupported());
        }
        Ok(ident)
    }

    fn parse_list(mut self) -> Result<SelectorList> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(_) => return Err(self.unsupported()),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if spaced => Combinator::Descendant,
                Some(_) => return Err(self.unsupported()),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        let subject = compounds.pop().ok_or_else(|| self.unsupported())?;
        let context = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
        Ok(ComplexSelector { subject, context })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let start = self.pos;
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => self.pos += 1,
            Some(ch) if ch.is_ascii_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    let id = self.ident()?;
                    if compound.id.replace(id).is_some() {
                        return Err(self.unsupported());
                    }
                }
                Some('.') => {
                    self.pos += 1;
                    let class = self.ident()?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    let test = self.parse_attr()?;
                    compound.attrs.push(test);
                }
                Some(':') => {
                    let state = self.parse_state()?;
                    compound.states.push(state);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unsupported());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrTest> {
        self.expect('[')?;
        self.skip_whitespace();
        let name = self
            .take_while(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':'))
            .to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.unsupported());
        }
        self.skip_whitespace();

        let prefix = match self.bump() {
            Some(']') => {
                return Ok(AttrTest {
                    name,
                    op: AttrOp::Exists,
                });
            }
            Some('=') => None,
            Some(op @ ('^' | '$' | '*')) => {
                self.expect('=')?;
                Some(op)
            }
            _ => return Err(self.unsupported()),
        };

        self.skip_whitespace();
        let value = self.parse_attr_value()?;
        self.skip_whitespace();
        self.expect(']')?;

        let op = match prefix {
            None => AttrOp::Equals(value),
            Some('^') => AttrOp::Prefix(value),
            Some('$') => AttrOp::Suffix(value),
            Some(_) => AttrOp::Substring(value),
        };
        Ok(AttrTest { name, op })
    }

    fn parse_attr_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let value = self.take_while(|ch| ch != quote);
                self.expect(quote)?;
                Ok(value)
            }
            Some(_) => Ok(self.take_while(|ch| !ch.is_whitespace() && ch != ']')),
            None => Err(self.unsupported()),
        }
    }

    // Pseudo-elements (`::before`) fail here because `:` is not an ident.
    fn parse_state(&mut self) -> Result<ControlState> {
        self.expect(':')?;
        let name = self.ident()?;
        match name.to_ascii_lowercase().as_str() {
            "checked" => Ok(ControlState::Checked),
            "disabled" => Ok(ControlState::Disabled),
            "enabled" => Ok(ControlState::Enabled),
            "required" => Ok(ControlState::Required),
            "optional" => Ok(ControlState::Optional),
            _ => Err(self.unsupported()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_and_unsupported_selectors() {
        for source in ["", "div,", ">a", "a >", "[id", "a:hover", "a::before", "#a#b", "a[b~=c]"] {
            assert!(
                matches!(SelectorList::parse(source), Err(Error::UnsupportedSelector(_))),
                "{source:?} should be rejected"
            );
        }
    }

    #[test]
    fn descendant_steps_backtrack_past_the_nearest_candidate() -> Result<()> {
        let dom = Dom::parse(
            r#"<section class="x"><div class="x"><p><span id="t"></span></p></div></section>"#,
        )?;
        let target = dom.by_id("t").expect("span");
        assert!(SelectorList::parse("section > .x span")?.matches(&dom, target));
        assert!(!SelectorList::parse("p > .x span")?.matches(&dom, target));
        Ok(())
    }

    #[test]
    fn quoted_attribute_values_may_contain_spaces_and_commas() -> Result<()> {
        let dom = Dom::parse(r##"<a id="l" title="a, b" href="#top">x</a>"##)?;
        let link = dom.by_id("l").expect("link");
        assert!(SelectorList::parse(r#"a[title="a, b"]"#)?.matches(&dom, link));
        assert!(SelectorList::parse("a[href^='#']")?.matches(&dom, link));
        assert!(!SelectorList::parse("a[href^='']")?.matches(&dom, link));
        Ok(())
    }
}
