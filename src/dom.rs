use std::collections::BTreeMap;
use std::iter;

use super::*;

/// Handle to a node in a [`Dom`] arena. Handles stay valid for the lifetime
/// of the document; detached nodes keep their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Tag, attributes and live form-control state of one element.
///
/// `value` and `checked` are seeded from the markup and then diverge from
/// the attributes as the user edits, the way browser controls do.
#[derive(Debug, Clone, Default)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    attrs: BTreeMap<String, String>,
    pub(crate) value: String,
    pub(crate) checked: bool,
}

impl ElementData {
    fn new(tag: &str, attrs: BTreeMap<String, String>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            value: attrs.get("value").cloned().unwrap_or_default(),
            checked: attrs.contains_key("checked"),
            attrs,
        }
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.classes().any(|token| token == class)
    }

    pub(crate) fn is_disabled(&self) -> bool {
        self.attrs.contains_key("disabled")
    }

    pub(crate) fn is_required(&self) -> bool {
        self.attrs.contains_key("required")
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    fn edit_classes(&mut self, edit: impl FnOnce(&mut Vec<String>)) {
        let mut classes = self.classes().map(str::to_string).collect::<Vec<_>>();
        edit(&mut classes);
        if classes.is_empty() {
            self.attrs.remove("class");
        } else {
            self.attrs.insert("class".into(), classes.join(" "));
        }
    }

    fn style(&self) -> Vec<(String, String)> {
        self.attr("style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim().to_ascii_lowercase();
                (!name.is_empty()).then(|| (name, value.trim().to_string()))
            })
            .fold(Vec::new(), |mut decls, (name, value)| {
                match decls.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = value,
                    None => decls.push((name, value)),
                }
                decls
            })
    }
}

/// Arena-backed document the behaviour units render into.
///
/// Slot 0 is the document node. Removing a node only unlinks it, so a
/// [`NodeId`] never dangles.
#[derive(Debug, Clone)]
pub struct Dom {
    slots: Vec<NodeSlot>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            slots: vec![NodeSlot {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
        }
    }

    pub fn parse(html: &str) -> Result<Self> {
        parse_html(html)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push_slot(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(NodeSlot {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.slots[parent.0].children.push(id);
        }
        id
    }

    /// Appends a new element under `parent`. Used while building from markup.
    pub(crate) fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: BTreeMap<String, String>,
    ) -> NodeId {
        self.push_slot(Some(parent), NodeKind::Element(ElementData::new(tag, attrs)))
    }

    pub(crate) fn append_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_slot(Some(parent), NodeKind::Text(text))
    }

    pub(crate) fn create_detached_element(&mut self, tag: &str) -> NodeId {
        self.push_slot(None, NodeKind::Element(ElementData::new(tag, BTreeMap::new())))
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.slots.get(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId, op: &str) -> Result<&mut ElementData> {
        match self.slots.get_mut(node.0).map(|slot| &mut slot.kind) {
            Some(NodeKind::Element(element)) => Ok(element),
            _ => Err(Error::Dom(format!("{op}: node {} is not an element", node.0))),
        }
    }

    fn element_or_err(&self, node: NodeId, op: &str) -> Result<&ElementData> {
        self.element(node)
            .ok_or_else(|| Error::Dom(format!("{op}: node {} is not an element", node.0)))
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    pub(crate) fn is_tag(&self, node: NodeId, tag: &str) -> bool {
        self.tag_name(node)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slots.get(node.0)?.parent
    }

    fn child_nodes(&self, node: NodeId) -> &[NodeId] {
        self.slots
            .get(node.0)
            .map_or(&[][..], |slot| slot.children.as_slice())
    }

    /// Proper ancestors, nearest first.
    pub(crate) fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.parent(node), move |current| self.parent(*current))
    }

    /// Inclusive containment, matching `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|current| current == ancestor)
    }

    /// Element descendants of `scope` in document order, `scope` excluded.
    fn element_descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.child_nodes(scope).iter().rev().copied().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            stack.extend(self.child_nodes(node).iter().rev().copied());
        }
        out
    }

    /// First connected element whose `id` is `id`.
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.element_descendants(self.root())
            .into_iter()
            .find(|node| self.element(*node).and_then(|e| e.attr("id")) == Some(id))
    }

    pub fn text_content(&self, node: NodeId) -> String {
        match self.slots.get(node.0).map(|slot| &slot.kind) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(_) => self
                .child_nodes(node)
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
            None => String::new(),
        }
    }

    pub(crate) fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.element_or_err(node, "set_text_content")?;
        for child in std::mem::take(&mut self.slots[node.0].children) {
            self.slots[child.0].parent = None;
        }
        if !text.is_empty() {
            self.append_text(node, text.to_string());
        }
        Ok(())
    }

    pub fn value(&self, node: NodeId) -> Result<String> {
        Ok(self.element_or_err(node, "value")?.value.clone())
    }

    pub(crate) fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.element_mut(node, "set_value")?.value = value.to_string();
        Ok(())
    }

    pub fn checked(&self, node: NodeId) -> Result<bool> {
        Ok(self.element_or_err(node, "checked")?.checked)
    }

    pub(crate) fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<()> {
        self.element_mut(node, "set_checked")?.checked = checked;
        Ok(())
    }

    pub fn disabled(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(ElementData::is_disabled)
    }

    pub(crate) fn set_disabled(&mut self, node: NodeId, disabled: bool) -> Result<()> {
        if disabled {
            self.set_attr(node, "disabled", "true")
        } else {
            self.remove_attr(node, "disabled")
        }
    }

    pub fn required(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(ElementData::is_required)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?
            .attr(&name.to_ascii_lowercase())
            .map(str::to_string)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Sets an attribute. `value` and `checked` also update the live control
    /// state, as a fresh default would.
    pub(crate) fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(node, "set_attr")?;
        match name.as_str() {
            "value" => element.value = value.to_string(),
            "checked" => element.checked = true,
            _ => {}
        }
        element.attrs.insert(name, value.to_string());
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.element_mut(node, "remove_attr")?
            .attrs
            .remove(&name.to_ascii_lowercase());
        Ok(())
    }

    pub fn class_contains(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|element| element.has_class(class))
    }

    pub(crate) fn class_add(&mut self, node: NodeId, class: &str) -> Result<()> {
        self.element_mut(node, "class_add")?.edit_classes(|classes| {
            if !classes.iter().any(|existing| existing == class) {
                classes.push(class.to_string());
            }
        });
        Ok(())
    }

    pub(crate) fn class_remove(&mut self, node: NodeId, class: &str) -> Result<()> {
        self.element_mut(node, "class_remove")?
            .edit_classes(|classes| classes.retain(|existing| existing != class));
        Ok(())
    }

    pub(crate) fn class_set(&mut self, node: NodeId, class: &str, on: bool) -> Result<()> {
        if on {
            self.class_add(node, class)
        } else {
            self.class_remove(node, class)
        }
    }

    pub fn style_get(&self, node: NodeId, property: &str) -> Option<String> {
        self.element(node)?
            .style()
            .into_iter()
            .find_map(|(name, value)| (name == property).then_some(value))
    }

    /// Sets one inline style property; an empty value removes it.
    pub(crate) fn style_set(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let element = self.element_mut(node, "style_set")?;
        let property = property.to_ascii_lowercase();
        let mut decls = element.style();
        decls.retain(|(name, _)| *name != property || !value.is_empty());
        match decls.iter_mut().find(|(name, _)| *name == property) {
            Some(slot) => slot.1 = value.to_string(),
            None if !value.is_empty() => decls.push((property, value.to_string())),
            None => {}
        }
        if decls.is_empty() {
            element.attrs.remove("style");
        } else {
            let style = decls
                .iter()
                .map(|(name, value)| format!("{name}: {value};"))
                .collect::<Vec<_>>()
                .join(" ");
            element.attrs.insert("style".into(), style);
        }
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId, op: &str) -> Result<()> {
        let parent_ok = self
            .slots
            .get(parent.0)
            .is_some_and(|slot| !matches!(slot.kind, NodeKind::Text(_)));
        if !parent_ok {
            return Err(Error::Dom(format!("{op}: parent cannot have children")));
        }
        if child == self.root() || child.0 >= self.slots.len() {
            return Err(Error::Dom(format!("{op}: invalid child node")));
        }
        if self.contains(child, parent) {
            return Err(Error::Dom(format!("{op}: would create a cycle")));
        }
        Ok(())
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent) = self.slots[node.0].parent.take() {
            self.slots[parent.0].children.retain(|id| *id != node);
        }
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child, "append_child")?;
        self.unlink(child);
        self.slots[child.0].parent = Some(parent);
        self.slots[parent.0].children.push(child);
        Ok(())
    }

    /// Inserts `child` under `parent` right before `reference`, which must
    /// already be a child of `parent`.
    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<()> {
        self.check_insertable(parent, child, "insert_before")?;
        if self.parent(reference) != Some(parent) {
            return Err(Error::Dom(
                "insert_before: reference is not a child of parent".into(),
            ));
        }
        if child == reference {
            return Ok(());
        }
        self.unlink(child);
        let index = self.slots[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
            .ok_or_else(|| Error::Dom("insert_before: reference is missing".into()))?;
        self.slots[child.0].parent = Some(parent);
        self.slots[parent.0].children.insert(index, child);
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root() {
            return Err(Error::Dom("cannot remove the document node".into()));
        }
        if node.0 < self.slots.len() {
            self.unlink(node);
        }
        Ok(())
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.child_nodes(self.parent(node)?);
        let position = siblings.iter().position(|id| *id == node)?;
        siblings[position + 1..]
            .iter()
            .copied()
            .find(|sibling| self.element(*sibling).is_some())
    }

    pub(crate) fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.preceding_element_siblings(node).next()
    }

    /// Element siblings before `node`, nearest first.
    pub(crate) fn preceding_element_siblings(
        &self,
        node: NodeId,
    ) -> impl Iterator<Item = NodeId> + '_ {
        let siblings = self.parent(node).map_or(&[][..], |parent| self.child_nodes(parent));
        let position = siblings.iter().position(|id| *id == node).unwrap_or(0);
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .filter(move |sibling| self.element(*sibling).is_some())
    }

    pub(crate) fn find_ancestor_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(node).find(|ancestor| self.is_tag(*ancestor, tag))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        self.query_selector_from(self.root(), selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_from(self.root(), selector)
    }

    pub fn query_selector_from(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        Ok(self
            .element_descendants(scope)
            .into_iter()
            .find(|node| selector.matches(self, *node)))
    }

    /// Elements under `scope` (excluding `scope` itself) matching `selector`,
    /// in document order.
    pub fn query_selector_all_from(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        Ok(self
            .element_descendants(scope)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect())
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        Ok(SelectorList::parse(selector)?.matches(self, node))
    }

    /// Nearest inclusive ancestor of `node` matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        Ok(iter::once(node)
            .chain(self.ancestors(node))
            .find(|candidate| selector.matches(self, *candidate)))
    }

    /// Seeds textarea values from their text and select values from the
    /// `selected` option, falling back to the first option.
    pub(crate) fn initialize_form_control_values(&mut self) -> Result<()> {
        for node in self.element_descendants(self.root()) {
            let value = if self.is_tag(node, "textarea") {
                Some(self.text_content(node))
            } else if self.is_tag(node, "select") {
                let options = self.query_selector_all_from(node, "option")?;
                options
                    .iter()
                    .find(|option| self.has_attr(**option, "selected"))
                    .or(options.first())
                    .map(|option| self.option_value(*option))
            } else {
                None
            };
            if let Some(value) = value {
                self.set_value(node, &value)?;
            }
        }
        Ok(())
    }

    pub(crate) fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    /// Serializes a node for diagnostics. Attributes come out in name order,
    /// so snippets are stable across runs.
    pub fn dump_node(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let Some(slot) = self.slots.get(node.0) else {
            return;
        };
        let element = match &slot.kind {
            NodeKind::Text(text) => {
                out.push_str(text);
                return;
            }
            NodeKind::Document => None,
            NodeKind::Element(element) => Some(element),
        };
        if let Some(element) = element {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push_str(&format!(" {name}=\"{value}\""));
            }
            out.push('>');
            if html::is_void_tag(&element.tag) {
                return;
            }
        }
        for child in &slot.children {
            self.write_node(*child, out);
        }
        if let Some(element) = element {
            out.push_str(&format!("</{}>", element.tag));
        }
    }
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
