//! Owned representation of the cleaned document body.
//!
//! The HTML tree handed over by the document converter is flattened into a
//! sequence of top-level [`Block`]s. Each block owns its inline content, so the
//! parsing stages can copy, trim or skip parts of it without touching the
//! original sequence.

use std::fmt::Write as _;

const BOLD_TAGS: [&str; 2] = ["strong", "b"];
const VOID_TAGS: [&str; 4] = ["br", "hr", "img", "col"];
const STRUCTURAL_TAGS: [&str; 6] = ["hr", "table", "tr", "img", "td", "br"];
const LINE_BREAKING_TAGS: [&str; 5] = ["p", "div", "li", "tr", "br"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(element) => element.text_content(),
        }
    }

    /// Whitespace-only text carries no meaning for the structural heuristics.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }

    pub fn is_bold(&self) -> bool {
        self.as_element().is_some_and(Element::is_bold)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub class: Option<String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            class: None,
            children,
        }
    }

    pub fn is_bold(&self) -> bool {
        BOLD_TAGS.contains(&self.name.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Children that are not whitespace-only text.
    pub fn significant_children(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, child)| !child.is_blank_text())
    }

    pub fn has_structural_descendant(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(element) => {
                STRUCTURAL_TAGS.contains(&element.name.as_str())
                    || element.has_structural_descendant()
            }
            Node::Text(_) => false,
        })
    }

    /// All descendant elements with the given tag name, in document order.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if let Node::Element(element) = child {
                if element.name == name {
                    found.push(element);
                }
                element.collect_descendants(name, found);
            }
        }
    }

    /// Direct children with one of the given tag names.
    pub fn child_elements<'a>(&'a self, names: &'a [&str]) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .filter(move |element| names.contains(&element.name.as_str()))
    }

    /// Text split on line breaks and nested paragraphs, trimmed, empty lines
    /// dropped. Table cells produced by the converter put each line of a
    /// title/description pair in its own paragraph or after a `<br>`.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        self.collect_lines(&mut lines, &mut current);
        push_line(&mut lines, &mut current);
        lines
    }

    fn collect_lines(&self, lines: &mut Vec<String>, current: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => current.push_str(text),
                Node::Element(element) => {
                    let breaking = LINE_BREAKING_TAGS.contains(&element.name.as_str());
                    if breaking {
                        push_line(lines, current);
                    }
                    element.collect_lines(lines, current);
                    if breaking {
                        push_line(lines, current);
                    }
                }
            }
        }
    }

    /// Serializes the children as an HTML fragment, leaving out rules.
    pub fn inner_html(&self) -> String {
        let mut html = String::new();
        for child in &self.children {
            write_node(child, &mut html, false);
        }
        html
    }

    pub fn outer_html(&self) -> String {
        let mut html = String::new();
        write_element(self, &mut html, true);
        html
    }

    /// Removes `len` bytes of text from the start of the element, walking
    /// text nodes depth-first. Inline elements left empty are pruned.
    pub fn strip_text_prefix(&mut self, mut len: usize) {
        self.strip_prefix_inner(&mut len);
    }

    fn strip_prefix_inner(&mut self, len: &mut usize) {
        let mut index = 0;
        while *len > 0 && index < self.children.len() {
            match &mut self.children[index] {
                Node::Text(text) => {
                    let cut = (*len).min(text.len());
                    let cut = floor_char_boundary(text, cut);
                    text.drain(..cut);
                    *len -= cut;
                    if cut == 0 {
                        *len = 0;
                    }
                }
                Node::Element(element) => element.strip_prefix_inner(len),
            }
            index += 1;
        }
        self.children.retain(|child| match child {
            Node::Text(text) => !text.is_empty(),
            Node::Element(element) => {
                !element.children.is_empty() || VOID_TAGS.contains(&element.name.as_str())
            }
        });
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn push_line(lines: &mut Vec<String>, current: &mut String) {
    let line = current.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

fn write_node(node: &Node, out: &mut String, keep_rules: bool) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(element) => {
            if keep_rules || element.name != "hr" {
                write_element(element, out, keep_rules);
            }
        }
    }
}

fn write_element(element: &Element, out: &mut String, keep_rules: bool) {
    let _ = write!(out, "<{}", element.name);
    if let Some(class) = &element.class {
        let _ = write!(out, " class=\"{}\"", escape_attribute(class));
    }
    if VOID_TAGS.contains(&element.name.as_str()) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out, keep_rules);
    }
    let _ = write!(out, "</{}>", element.name);
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Merges runs of directly adjacent bold elements into the first of the run.
/// With `allow_blank_gaps`, whitespace-only text between two bold runs is
/// absorbed into the merged span as well.
pub(crate) fn merge_adjacent_bold(children: &mut Vec<Node>, allow_blank_gaps: bool) -> bool {
    let mut merged = Vec::with_capacity(children.len());
    let mut changed = false;
    let mut pending_gap: Vec<Node> = Vec::new();

    for child in children.drain(..) {
        if allow_blank_gaps && child.is_blank_text() && ends_with_bold(&merged) {
            pending_gap.push(child);
            continue;
        }
        match (merged.last_mut(), child) {
            (Some(Node::Element(previous)), Node::Element(next))
                if previous.is_bold() && next.is_bold() =>
            {
                previous.children.append(&mut pending_gap);
                previous.children.extend(next.children);
                changed = true;
            }
            (_, child) => {
                merged.append(&mut pending_gap);
                merged.push(child);
            }
        }
    }
    merged.append(&mut pending_gap);
    *children = merged;
    changed
}

fn ends_with_bold(nodes: &[Node]) -> bool {
    nodes.last().is_some_and(Node::is_bold)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Table,
    Rule,
    Inline,
    Other,
}

/// A top-level element of the document body. `tail` holds loose text that
/// directly followed the element at the top level, which happens when the
/// converter promotes an inline span out of its paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub element: Element,
    pub tail: String,
}

impl Block {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            tail: String::new(),
        }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::new(Element::with_children("p", children))
    }

    pub fn rule() -> Self {
        Self::new(Element::new("hr"))
    }

    pub fn kind(&self) -> BlockKind {
        match self.element.name.as_str() {
            "p" | "div" | "li" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                BlockKind::Paragraph
            }
            "table" => BlockKind::Table,
            "hr" => BlockKind::Rule,
            "strong" | "b" | "em" | "i" | "u" | "span" | "a" | "font" | "sup" | "sub" => {
                BlockKind::Inline
            }
            _ => BlockKind::Other,
        }
    }

    pub fn is_rule(&self) -> bool {
        self.kind() == BlockKind::Rule
    }

    pub fn is_table(&self) -> bool {
        self.kind() == BlockKind::Table
    }

    /// Text of the element, excluding the tail.
    pub fn text(&self) -> String {
        self.element.text_content()
    }

    /// Trimmed text including the tail.
    pub fn full_text(&self) -> String {
        let mut text = self.element.text_content();
        text.push_str(&self.tail);
        text.trim().to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty() && self.tail.trim().is_empty()
    }

    pub fn has_tail(&self) -> bool {
        !self.tail.trim().is_empty()
    }

    /// Rules, tables, images and line breaks, at the top or nested.
    pub fn is_structural(&self) -> bool {
        STRUCTURAL_TAGS.contains(&self.element.name.as_str())
            || self.element.has_structural_descendant()
    }

    /// The bold span this block consists of, if it is nothing but one bold
    /// span: either a top-level bold element without tail, or a paragraph
    /// whose only content is a single bold child.
    pub fn lone_bold(&self) -> Option<&Element> {
        if self.element.is_bold() {
            return (!self.has_tail()).then_some(&self.element);
        }
        if self.kind() != BlockKind::Paragraph || self.has_tail() {
            return None;
        }
        let mut significant = self.element.significant_children();
        match (significant.next(), significant.next()) {
            (Some((_, Node::Element(only))), None) if only.is_bold() => Some(only),
            _ => None,
        }
    }

    /// Index of a bold child opening the block that is followed by more
    /// non-blank content.
    pub fn leading_bold(&self) -> Option<usize> {
        let mut significant = self.element.significant_children();
        let (index, first) = significant.next()?;
        if !first.is_bold() || first.text_content().trim().is_empty() {
            return None;
        }
        let has_trailing = significant.any(|(_, node)| !node.text_content().trim().is_empty());
        has_trailing.then_some(index)
    }

    /// Inline HTML of the block with rules removed; a tail is appended as
    /// escaped text.
    pub fn speech_html(&self) -> String {
        let mut html = if self.element.name == "hr" {
            String::new()
        } else if self.kind() == BlockKind::Inline || self.is_table() {
            let mut html = String::new();
            write_element(&self.element, &mut html, false);
            html
        } else {
            self.element.inner_html()
        };
        if self.has_tail() {
            html.push_str(&escape_text(&self.tail));
        }
        html.trim().to_string()
    }

    pub fn to_html(&self) -> String {
        let mut html = self.element.outer_html();
        html.push_str(&escape_text(&self.tail));
        html
    }
}

/// At least one cased character and no lower case one.
pub fn is_upper(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Node {
        Node::Text(value.to_string())
    }

    fn bold(value: &str) -> Node {
        Node::Element(Element::with_children("strong", vec![text(value)]))
    }

    #[test]
    fn test_lone_bold_paragraph() {
        let block = Block::paragraph(vec![text(" "), bold("BILLS"), text(" ")]);
        assert_eq!(block.lone_bold().map(Element::text_content), Some("BILLS".into()));

        let speech = Block::paragraph(vec![bold("MR LEE"), text(": I agree.")]);
        assert!(speech.lone_bold().is_none());
        assert_eq!(speech.leading_bold(), Some(0));
    }

    #[test]
    fn test_top_level_bold_with_tail_is_not_lone() {
        let mut block = Block::new(Element::with_children("strong", vec![text("MR LEE")]));
        assert!(block.lone_bold().is_some());
        block.tail = ": I agree.".into();
        assert!(block.lone_bold().is_none());
    }

    #[test]
    fn test_merge_adjacent_bold() {
        let mut children = vec![bold("TABLING OF "), bold("PAPERS"), text(" tail")];
        assert!(merge_adjacent_bold(&mut children, false));
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].text_content(), "TABLING OF PAPERS");

        let mut gapped = vec![bold("TABLING OF"), text(" "), bold("PAPERS")];
        assert!(!merge_adjacent_bold(&mut gapped.clone(), false));
        assert!(merge_adjacent_bold(&mut gapped, true));
        assert_eq!(gapped.len(), 1);
        assert_eq!(gapped[0].text_content(), "TABLING OF PAPERS");
    }

    #[test]
    fn test_lines_split_on_breaks_and_paragraphs() {
        let cell = Element::with_children(
            "td",
            vec![
                Node::Element(Element::with_children("p", vec![text("Annual Report")])),
                Node::Element(Element::with_children(
                    "p",
                    vec![text("first"), Node::Element(Element::new("br")), text("second")],
                )),
            ],
        );
        assert_eq!(cell.lines(), vec!["Annual Report", "first", "second"]);
    }

    #[test]
    fn test_strip_text_prefix_across_nodes() {
        let mut element = Element::with_children("p", vec![bold("1"), text(". MR LEE asked")]);
        element.strip_text_prefix(3);
        assert_eq!(element.children.len(), 1);
        assert_eq!(element.text_content(), "MR LEE asked");
    }

    #[test]
    fn test_speech_html_escapes_and_drops_rules() {
        let block = Block::paragraph(vec![
            text("A < B "),
            Node::Element(Element::with_children("em", vec![text("really")])),
            Node::Element(Element::new("hr")),
        ]);
        assert_eq!(block.speech_html(), "A &lt; B <em>really</em>");
    }

    #[test]
    fn test_is_upper() {
        assert!(is_upper("MEMBERS' MOTIONS"));
        assert!(!is_upper("Oral Answers"));
        assert!(!is_upper("提交文件"));
    }
}
