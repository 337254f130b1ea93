use crate::block::{Block, is_upper};
use crate::config::LanguageConfig;
use crate::parser::Context;
use crate::parser::dialogue::split_dialogue;
use crate::types::BillRecord;

fn stage_marker(block: &Block, config: &LanguageConfig) -> Option<String> {
    let bold = block.lone_bold()?;
    let text = bold.text_content();
    config.bill_stage(&text).map(str::to_string)
}

/// Bill titles are either matched by the configured pattern (the bracketed
/// Chinese titles) or are lone mixed case bold spans.
fn bill_title(block: &Block, config: &LanguageConfig) -> Option<String> {
    if let Some(pattern) = &config.bill_title {
        let text = block.full_text();
        return pattern.is_match(&text).then_some(text);
    }
    let text = block.lone_bold()?.text_content().trim().to_string();
    let is_title = !text.is_empty()
        && !text.ends_with(':')
        && !(config.has_case && is_upper(&text));
    is_title.then_some(text)
}

struct Stage<'b> {
    name: Option<String>,
    blocks: Vec<&'b Block>,
}

/// Splits the bills section by reading stage, then each stage by bill title.
/// Speech before the first title of a stage is kept as an untitled record.
pub(crate) fn parse_bills(blocks: &[Block], cx: &mut Context) -> Vec<BillRecord> {
    let config = cx.config;
    let mut stages = vec![Stage {
        name: None,
        blocks: Vec::new(),
    }];
    for block in blocks {
        match stage_marker(block, config) {
            Some(name) => stages.push(Stage {
                name: Some(name),
                blocks: Vec::new(),
            }),
            None => {
                if let Some(stage) = stages.last_mut() {
                    stage.blocks.push(block);
                }
            }
        }
    }

    let mut records = Vec::new();
    for stage in stages {
        if stage.name.is_none() && stage.blocks.is_empty() {
            continue;
        }

        let mut untitled: Vec<&Block> = Vec::new();
        let mut titled: Vec<(String, Vec<&Block>)> = Vec::new();
        for block in stage.blocks {
            if let Some(title) = bill_title(block, config) {
                titled.push((title, Vec::new()));
                continue;
            }
            match titled.last_mut() {
                Some((_, group)) => group.push(block),
                None => untitled.push(block),
            }
        }

        if !untitled.is_empty() || titled.is_empty() {
            records.push(BillRecord {
                stage: stage.name.clone(),
                title: None,
                turns: split_dialogue(untitled, true, config),
            });
        }
        for (title, group) in titled {
            records.push(BillRecord {
                stage: stage.name.clone(),
                title: Some(title),
                turns: split_dialogue(group, true, config),
            });
        }
    }
    log::debug!("Found {} bill record(s)", records.len());
    records
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
    fn test_stages_and_titles() {
        let config = LanguageConfig::builtin(Language::English).expect("English is supported");
        let blocks = vec![
            Block::paragraph(vec![bold("First Reading of Bills")]),
            Block::paragraph(vec![bold("Appropriation Bill 2012")]),
            Block::paragraph(vec![bold("CLERK"), text(": Appropriation Bill 2012.")]),
            Block::paragraph(vec![bold("Second Reading of Bills")]),
            Block::paragraph(vec![bold("PRESIDENT"), text(": Second Reading.")]),
            Block::paragraph(vec![bold("Appropriation Bill 2012")]),
            Block::paragraph(vec![bold("FINANCIAL SECRETARY"), text(": I move.")]),
            Block::paragraph(vec![bold("Inland Revenue (Amendment) Bill 2012")]),
            Block::paragraph(vec![bold("SECRETARY FOR FINANCIAL SERVICES"), text(": I move.")]),
        ];
        let options = ParseOptions::default();
        let mut cx = Context::new(config, &options);
        let bills = parse_bills(&blocks, &mut cx);

        let shape: Vec<_> = bills
            .iter()
            .map(|b| (b.stage.as_deref(), b.title.as_deref(), b.turns.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (Some("First Reading of Bills"), Some("Appropriation Bill 2012"), 1),
                (Some("Second Reading of Bills"), None, 1),
                (Some("Second Reading of Bills"), Some("Appropriation Bill 2012"), 1),
                (
                    Some("Second Reading of Bills"),
                    Some("Inland Revenue (Amendment) Bill 2012"),
                    1
                ),
            ]
        );
    }

    #[test]
    fn test_chinese_bracketed_titles() {
        let config = LanguageConfig::builtin(Language::Chinese).expect("Chinese is supported");
        let blocks = vec![
            Block::paragraph(vec![bold("法案首讀")]),
            Block::paragraph(vec![text("《2012年撥款條例草案》")]),
            Block::paragraph(vec![bold("秘書"), text(":《2012年撥款條例草案》。")]),
        ];
        let options = ParseOptions::default();
        let mut cx = Context::new(config, &options);
        let bills = parse_bills(&blocks, &mut cx);

        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].stage.as_deref(), Some("法案首讀"));
        assert_eq!(bills[0].title.as_deref(), Some("《2012年撥款條例草案》"));
        assert_eq!(bills[0].turns[0].speaker.as_deref(), Some("秘書"));
    }
}
