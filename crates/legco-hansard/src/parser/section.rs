use crate::block::{Block, is_upper};
use crate::config::LanguageConfig;
use crate::types::{Section, SectionKey};

/// The header a block announces, if any. Only a block that is nothing but one
/// bold span qualifies, and in scripts with letter case the span must be
/// upper case.
fn header_key(block: &Block, config: &LanguageConfig) -> Option<SectionKey> {
    let bold = block.lone_bold()?;
    let text = bold.text_content();
    let text = text.trim();
    if config.has_case && !is_upper(text) {
        return None;
    }
    let kind = config.section_kind(text)?;
    Some(SectionKey::Header {
        text: text.to_string(),
        kind,
    })
}

/// Partitions the content region into sections in the order their headers
/// appear. Every block lands in exactly one section, header blocks included.
pub fn split_sections(blocks: &[Block], config: &LanguageConfig) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        key: SectionKey::BeforeMeeting,
        blocks: Vec::new(),
    };

    for block in blocks {
        if let Some(key) = header_key(block, config) {
            log::debug!("Found section '{}'", key.label());
            let finished = std::mem::replace(
                &mut current,
                Section {
                    key,
                    blocks: Vec::new(),
                },
            );
            sections.push(finished);
        }
        current.blocks.push(block.clone());
    }
    sections.push(current);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Element, Node};
    use crate::types::{Language, SectionKind};

    fn paragraph(text: &str) -> Block {
        Block::paragraph(vec![Node::Text(text.to_string())])
    }

    fn header(text: &str) -> Block {
        Block::paragraph(vec![Node::Element(Element::with_children(
            "strong",
            vec![Node::Text(text.to_string())],
        ))])
    }

    fn english() -> &'static LanguageConfig {
        LanguageConfig::builtin(Language::English).expect("English is supported")
    }

    #[test]
    fn test_sections_in_discovery_order() {
        let blocks = vec![
            paragraph("PRESIDENT: Good morning."),
            header("BILLS"),
            paragraph("first reading"),
            header("TABLING OF PAPERS"),
            paragraph("papers"),
        ];
        let sections = split_sections(&blocks, english());

        let labels: Vec<_> = sections.iter().map(|s| s.key.label()).collect();
        assert_eq!(labels, vec!["BEFORE MEETING", "BILLS", "TABLING OF PAPERS"]);
        assert_eq!(sections[1].kind(), Some(SectionKind::Bills));
        assert_eq!(sections[1].body(), &[paragraph("first reading")]);
    }

    #[test]
    fn test_concatenated_sections_reconstruct_input() {
        let blocks = vec![
            header("ORAL ANSWERS TO QUESTIONS"),
            paragraph("one"),
            header("Bills"),
            header("NOT A HEADER"),
            header("MOTIONS"),
            header("MOTIONS"),
            paragraph("two"),
        ];
        let sections = split_sections(&blocks, english());

        let rebuilt: Vec<Block> = sections.into_iter().flat_map(|s| s.blocks).collect();
        assert_eq!(rebuilt, blocks);
    }

    #[test]
    fn test_mixed_case_and_unknown_headers_are_content() {
        let blocks = vec![header("Bills"), header("NOT A HEADER"), paragraph("x")];
        let sections = split_sections(&blocks, english());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, SectionKey::BeforeMeeting);
        assert_eq!(sections[0].blocks.len(), 3);
    }

    #[test]
    fn test_chinese_headers_ignore_case() {
        let config = LanguageConfig::builtin(Language::Chinese).expect("Chinese is supported");
        let blocks = vec![header("提交文件"), paragraph("文件")];
        let sections = split_sections(&blocks, config);
        assert_eq!(sections.len(), 2);
        assert!(sections[0].blocks.is_empty());
        assert_eq!(sections[1].kind(), Some(SectionKind::TabledPapers));
    }
}
