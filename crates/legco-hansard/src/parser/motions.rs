use crate::block::{Block, is_upper};
use crate::config::LanguageConfig;
use crate::parser::Context;
use crate::parser::dialogue::split_dialogue;
use crate::types::MotionRecord;

fn motion_title(block: &Block, config: &LanguageConfig) -> Option<String> {
    let text = block.lone_bold()?.text_content().trim().to_string();
    if text.is_empty() || text.ends_with(':') {
        return None;
    }
    if config.has_case && !is_upper(&text) {
        return None;
    }
    Some(text)
}

pub(crate) fn parse_motions(blocks: &[Block], cx: &mut Context) -> Vec<MotionRecord> {
    let config = cx.config;
    let mut untitled: Vec<&Block> = Vec::new();
    let mut titled: Vec<(String, Vec<&Block>)> = Vec::new();

    for block in blocks {
        if let Some(title) = motion_title(block, config) {
            titled.push((title, Vec::new()));
            continue;
        }
        match titled.last_mut() {
            Some((_, group)) => group.push(block),
            None => untitled.push(block),
        }
    }

    let mut motions = Vec::with_capacity(titled.len() + 1);
    if !untitled.is_empty() {
        motions.push(MotionRecord {
            title: None,
            turns: split_dialogue(untitled, true, config),
        });
    }
    motions.extend(titled.into_iter().map(|(title, group)| MotionRecord {
        title: Some(title),
        turns: split_dialogue(group, true, config),
    }));
    log::debug!("Found {} motion(s)", motions.len());
    motions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Element, Node};
    use crate::parser::ParseOptions;
    use crate::types::Language;

    fn text(value: &str) -> Node {
        Node::Text(value.to_string())
    }

    fn bold(value: &str) -> Node {
        Node::Element(Element::with_children("strong", vec![text(value)]))
    }

    #[test]
    fn test_split_on_upper_case_titles() {
        let config = LanguageConfig::builtin(Language::English).expect("English is supported");
        let blocks = vec![
            Block::paragraph(vec![bold("PRESIDENT"), text(": Members' motions.")]),
            Block::paragraph(vec![bold("MOTION ON HOUSING POLICY")]),
            Block::paragraph(vec![bold("MR LEE"), text(": I move.")]),
            Block::paragraph(vec![bold("Amendment")]),
            Block::paragraph(vec![bold("MR HO"), text(": I support.")]),
            Block::paragraph(vec![bold("MOTION ON POVERTY")]),
        ];
        let options = ParseOptions::default();
        let mut cx = Context::new(config, &options);
        let motions = parse_motions(&blocks, &mut cx);

        let shape: Vec<_> = motions
            .iter()
            .map(|m| (m.title.as_deref(), m.turns.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (None, 1),
                (Some("MOTION ON HOUSING POLICY"), 3),
                (Some("MOTION ON POVERTY"), 0),
            ]
        );
    }

    #[test]
    fn test_chinese_titles_any_case() {
        let config = LanguageConfig::builtin(Language::Chinese).expect("Chinese is supported");
        let blocks = vec![
            Block::paragraph(vec![bold("房屋政策議案")]),
            Block::paragraph(vec![bold("李議員"), text(":我動議。")]),
        ];
        let options = ParseOptions::default();
        let mut cx = Context::new(config, &options);
        let motions = parse_motions(&blocks, &mut cx);
        assert_eq!(motions.len(), 1);
        assert_eq!(motions[0].title.as_deref(), Some("房屋政策議案"));
    }
}
