use crate::block::{Block, is_upper};
use crate::config::{LanguageConfig, group};
use crate::parser::Context;
use crate::parser::dialogue::split_dialogue;
use crate::types::{DialogueTurn, IssueKind, Question, QuestionKind};

/// Urgent questions are not numbered in the record.
const URGENT_NUMBER: &str = "0";

pub(crate) struct QuestionSection {
    pub(crate) preamble: Vec<DialogueTurn>,
    pub(crate) questions: Vec<Question>,
}

/// A question title is a lone bold span that is neither a speaker label nor
/// a bare number. Where the script has case, titles are in mixed case; upper
/// case spans are names.
fn question_title(block: &Block, config: &LanguageConfig) -> Option<String> {
    let bold = block.lone_bold()?;
    let text = bold.text_content().trim().to_string();
    let bare_number = text
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c.is_whitespace());
    if bare_number || text.ends_with(':') {
        return None;
    }
    if config.has_case && is_upper(&text) {
        return None;
    }
    Some(text)
}

/// The question number at the start of the first block, and the block with
/// the number removed (`None` when nothing else was in it).
fn take_number(first: &Block, config: &LanguageConfig) -> Option<(String, Option<Block>)> {
    let text = first.text();
    let caps = config.question_number.captures(&text)?;
    let end = caps.get(0)?.end();
    let number = group(&caps, "number")?.to_string();

    let mut stripped = first.clone();
    stripped.element.strip_text_prefix(end);
    let stripped = (!stripped.is_blank()).then_some(stripped);
    Some((number, stripped))
}

fn build_question(
    title: String,
    blocks: &[&Block],
    kind: QuestionKind,
    cx: &mut Context,
) -> Question {
    let events = kind != QuestionKind::Written;
    let numbered = blocks
        .first()
        .and_then(|first| take_number(first, cx.config));

    let (number, turns) = match numbered {
        Some((number, stripped)) => {
            let rest = blocks[1..].iter().copied();
            let turns = split_dialogue(stripped.iter().chain(rest), events, cx.config);
            (Some(number), turns)
        }
        None => {
            let number = match kind {
                QuestionKind::Urgent => Some(URGENT_NUMBER.to_string()),
                QuestionKind::Oral | QuestionKind::Written => {
                    cx.record(
                        IssueKind::MissingNumber,
                        format!("No number for question '{}'", title),
                    );
                    None
                }
            };
            let turns = split_dialogue(blocks.iter().copied(), events, cx.config);
            (number, turns)
        }
    };

    Question {
        kind,
        number,
        title,
        turns,
    }
}

pub(crate) fn parse_questions(
    blocks: &[Block],
    kind: QuestionKind,
    cx: &mut Context,
) -> QuestionSection {
    let mut preamble: Vec<&Block> = Vec::new();
    let mut groups: Vec<(String, Vec<&Block>)> = Vec::new();

    for block in blocks {
        if let Some(title) = question_title(block, cx.config) {
            groups.push((title, Vec::new()));
            continue;
        }
        match groups.last_mut() {
            Some((_, group)) => group.push(block),
            None => preamble.push(block),
        }
    }

    let events = kind != QuestionKind::Written;
    let preamble = split_dialogue(preamble, events, cx.config);
    let questions: Vec<Question> = groups
        .into_iter()
        .map(|(title, group)| build_question(title, &group, kind, cx))
        .collect();
    log::debug!("Found {} {:?} question(s)", questions.len(), kind);

    QuestionSection {
        preamble,
        questions,
    }
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

    fn english() -> &'static LanguageConfig {
        LanguageConfig::builtin(Language::English).expect("English is supported")
    }

    fn oral_section() -> Vec<Block> {
        vec![
            Block::paragraph(vec![text("Questions. First question.")]),
            Block::paragraph(vec![bold("Traffic Congestion")]),
            Block::paragraph(vec![bold("3. MR LEE"), text(" (in Cantonese): President, when?")]),
            Block::paragraph(vec![bold("SECRETARY FOR TRANSPORTATION"), text(": Soon.")]),
            Block::paragraph(vec![bold("Air Quality")]),
            Block::paragraph(vec![bold("MR HO"), text(": President, why?")]),
            Block::paragraph(vec![text("(Laughter)")]),
            Block::paragraph(vec![bold("SECRETARY FOR THE ENVIRONMENT"), text(": Because.")]),
        ]
    }

    #[test]
    fn test_numbered_and_unnumbered_questions() {
        let options = ParseOptions::default();
        let mut cx = Context::new(english(), &options);
        let parsed = parse_questions(&oral_section(), QuestionKind::Oral, &mut cx);

        assert_eq!(parsed.preamble.len(), 1);
        let numbers: Vec<_> = parsed.questions.iter().map(|q| q.number.as_deref()).collect();
        assert_eq!(numbers, vec![Some("3"), None]);

        let first = &parsed.questions[0];
        assert_eq!(first.title, "Traffic Congestion");
        assert_eq!(first.asker(), Some("MR LEE"));
        assert_eq!(first.turns[0].speech, "(in Cantonese): President, when?");

        let second = &parsed.questions[1];
        assert_eq!(second.asker(), Some("MR HO"));
        assert_eq!(second.turns.len(), 3);
        assert_eq!(second.turns[1].speaker, None);

        let issues = cx.into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingNumber);
    }

    #[test]
    fn test_urgent_question_defaults_to_zero() {
        let blocks = vec![
            Block::paragraph(vec![bold("Typhoon Signal")]),
            Block::paragraph(vec![bold("MR LEE"), text(": President, what happened?")]),
        ];
        let options = ParseOptions::default();
        let mut cx = Context::new(english(), &options);
        let parsed = parse_questions(&blocks, QuestionKind::Urgent, &mut cx);

        assert_eq!(parsed.questions[0].number.as_deref(), Some("0"));
        assert!(cx.into_issues().is_empty());
    }

    #[test]
    fn test_written_questions_keep_parentheses() {
        let blocks = vec![
            Block::paragraph(vec![bold("Public Libraries")]),
            Block::paragraph(vec![text("12. MR LEE asked: Will the Government inform:")]),
            Block::paragraph(vec![text("(a) of the number of libraries?")]),
            Block::paragraph(vec![text("(b) of the opening hours?)")]),
        ];
        let options = ParseOptions::default();
        let mut cx = Context::new(english(), &options);
        let parsed = parse_questions(&blocks, QuestionKind::Written, &mut cx);

        let question = &parsed.questions[0];
        assert_eq!(question.number.as_deref(), Some("12"));
        assert_eq!(
            question.turns[0].speech,
            "MR LEE asked: Will the Government inform:\n\n(a) of the number of libraries?\n\n(b) of the opening hours?)"
        );
    }

    #[test]
    fn test_chinese_titles_need_no_case() {
        let config = LanguageConfig::builtin(Language::Chinese).expect("Chinese is supported");
        let blocks = vec![
            Block::paragraph(vec![bold("交通擠塞")]),
            Block::paragraph(vec![bold("1. 李議員"), text(":主席,何時?")]),
        ];
        let options = ParseOptions::default();
        let mut cx = Context::new(config, &options);
        let parsed = parse_questions(&blocks, QuestionKind::Oral, &mut cx);

        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].title, "交通擠塞");
        assert_eq!(parsed.questions[0].number.as_deref(), Some("1"));
        assert_eq!(parsed.questions[0].asker(), Some("李議員"));
    }
}
