//! Turns the converter's HTML into the cleaned block sequence the parser
//! works on.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node as HtmlNode, Selector};

use crate::block::{Block, BlockKind, Element, Node, merge_adjacent_bold};
use crate::parser::{Context, ParseError};
use crate::types::IssueKind;

/// Heading, content and sidenote are separated by at most two rules.
pub const MAX_SEPARATORS: usize = 2;

const SKIPPED_TAGS: [&str; 5] = ["script", "style", "head", "title", "noscript"];
const TAB_CLASS: &str = "pydocx-tab";
const CAPS_CLASS: &str = "pydocx-caps";

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("invalid selector: body"));

/// Replaces the punctuation variants that break text equality checks and
/// drops the control characters the converter leaves behind.
pub fn canonicalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for c in source.chars() {
        match c {
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{ff1a}' | '\u{fe13}' | '\u{fe30}' => out.push(':'),
            '\u{a0}' => out.push(' '),
            '\n' | '\r' | '\t' | '\u{200d}' => {}
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn normalize(source: &str, cx: &mut Context) -> Result<Vec<Block>, ParseError> {
    let document = Html::parse_document(&canonicalize(source));
    let body = document.select(&BODY).next().ok_or(ParseError::MissingBody)?;

    let mut blocks: Vec<Block> = Vec::new();
    for node in convert_children(body) {
        match node {
            Node::Element(element) => blocks.push(Block::new(element)),
            Node::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                match blocks.last_mut() {
                    Some(previous) => previous.tail.push_str(&text),
                    None => blocks.push(Block::paragraph(vec![Node::Text(text)])),
                }
            }
        }
    }
    log::debug!("Read {} top-level block(s)", blocks.len());

    Ok(normalize_blocks(blocks, cx))
}

fn convert_children(parent: ElementRef) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        match child.value() {
            HtmlNode::Text(text) => push_text(&mut nodes, text),
            HtmlNode::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = element.value().name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let class = element.value().attr("class");
                let has_class =
                    |wanted: &str| class.is_some_and(|c| c.split_whitespace().any(|c| c == wanted));

                if has_class(CAPS_CLASS) {
                    let text: String = element.text().collect();
                    push_text(&mut nodes, &text.to_uppercase());
                } else if has_class(TAB_CLASS) {
                    for node in convert_children(element) {
                        match node {
                            Node::Text(text) => push_text(&mut nodes, &text),
                            node => nodes.push(node),
                        }
                    }
                } else {
                    nodes.push(Node::Element(Element {
                        name: name.to_string(),
                        class: class.map(str::to_string),
                        children: convert_children(element),
                    }));
                }
            }
            _ => {}
        }
    }
    nodes
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    match nodes.last_mut() {
        Some(Node::Text(previous)) => previous.push_str(text),
        _ => nodes.push(Node::Text(text.to_string())),
    }
}

/// The block-level clean-up. Running it on its own output changes nothing.
pub(crate) fn normalize_blocks(blocks: Vec<Block>, cx: &mut Context) -> Vec<Block> {
    let mut cleaned: Vec<Block> = blocks
        .into_iter()
        .filter(|block| block.is_rule() || !block.is_blank() || block.is_structural())
        .collect();

    for block in &mut cleaned {
        if is_bold_run(block) {
            merge_adjacent_bold(&mut block.element.children, true);
        }
    }

    repair_separators(cleaned, cx)
}

/// A paragraph made only of two or more bold spans, e.g. a title the
/// converter broke into several style runs.
fn is_bold_run(block: &Block) -> bool {
    if block.kind() != BlockKind::Paragraph || block.has_tail() {
        return false;
    }
    let mut bold = 0;
    for (_, child) in block.element.significant_children() {
        if !child.is_bold() {
            return false;
        }
        bold += 1;
    }
    bold > 1
}

fn repair_separators(blocks: Vec<Block>, cx: &mut Context) -> Vec<Block> {
    let rules = blocks.iter().filter(|b| b.is_rule()).count();
    if rules <= MAX_SEPARATORS {
        return blocks;
    }

    let Some(anchor) = blocks
        .iter()
        .position(|b| cx.config.is_clerk_anchor(&b.full_text()))
    else {
        cx.record(
            IssueKind::SeparatorCount,
            format!("Found {} separators and no clerks marker to repair them", rules),
        );
        return blocks;
    };

    let spurious = blocks[..anchor].iter().filter(|b| b.is_rule()).count();
    cx.record(
        IssueKind::SeparatorCount,
        format!(
            "Found {} separators; removing {} before the clerks marker",
            rules, spurious
        ),
    );
    blocks
        .into_iter()
        .enumerate()
        .filter(|(index, block)| *index >= anchor || !block.is_rule())
        .map(|(_, block)| block)
        .collect()
}
