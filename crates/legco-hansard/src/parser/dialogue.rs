use std::borrow::Cow;

use crate::block::{Block, Element, Node, escape_text, merge_adjacent_bold};
use crate::config::LanguageConfig;
use crate::types::DialogueTurn;

fn has_adjacent_bold(children: &[Node]) -> bool {
    children.windows(2).any(|pair| pair[0].is_bold() && pair[1].is_bold())
}

/// Speaker labels carry their colon inside or right after the bold span.
fn clean_speaker(text: &str) -> Option<String> {
    let speaker = text.trim().trim_end_matches([':', '：']).trim();
    (!speaker.is_empty()).then(|| speaker.to_string())
}

fn strip_leading_colon(children: &mut Vec<Node>) {
    if let Some(Node::Text(text)) = children.first_mut() {
        let trimmed = text.trim_start();
        *text = trimmed.strip_prefix(':').unwrap_or(trimmed).to_string();
    }
}

/// Splits a speaker label off the block, returning the speaker and the HTML
/// of what follows it.
fn split_speaker(block: &Block) -> Option<(String, String)> {
    if block.element.is_bold() {
        if !block.has_tail() {
            return None;
        }
        let speaker = clean_speaker(&block.element.text_content())?;
        let tail = block.tail.trim_start();
        let speech = tail.strip_prefix(':').unwrap_or(tail).trim();
        return Some((speaker, escape_text(speech)));
    }

    let index = block.leading_bold()?;
    let speaker = clean_speaker(&block.element.children[index].text_content())?;
    let mut rest = Element {
        name: block.element.name.clone(),
        class: block.element.class.clone(),
        children: block.element.children[index + 1..].to_vec(),
    };
    strip_leading_colon(&mut rest.children);
    let rest = Block {
        element: rest,
        tail: block.tail.clone(),
    };
    Some((speaker, rest.speech_html()))
}

/// Blocks before the first speaker label are gathered into one turn.
fn flush_lead_in(lead_in: &mut Vec<String>, turns: &mut Vec<DialogueTurn>) {
    if !lead_in.is_empty() {
        turns.push(DialogueTurn::new(None, lead_in.join("\n\n")));
        lead_in.clear();
    }
}

/// Splits a run of spoken blocks into turns. Each speech block becomes one
/// turn attributed to the speaker last named; a parenthesised block is an
/// event with no speaker when `events` is set. Empty blocks produce nothing.
pub fn split_dialogue<'b>(
    blocks: impl IntoIterator<Item = &'b Block>,
    events: bool,
    config: &LanguageConfig,
) -> Vec<DialogueTurn> {
    let mut turns = Vec::new();
    let mut speaker: Option<String> = None;
    let mut lead_in: Vec<String> = Vec::new();

    for block in blocks {
        if block.is_blank() {
            continue;
        }

        let mut block = Cow::Borrowed(block);
        if has_adjacent_bold(&block.element.children) {
            merge_adjacent_bold(&mut block.to_mut().element.children, false);
        }

        if events
            && let Some(event) = config
                .event
                .captures(&block.full_text())
                .and_then(|c| c.name("event"))
        {
            flush_lead_in(&mut lead_in, &mut turns);
            turns.push(DialogueTurn::new(None, escape_text(event.as_str().trim())));
            continue;
        }

        let speech = match split_speaker(&block) {
            Some((name, speech)) => {
                flush_lead_in(&mut lead_in, &mut turns);
                speaker = Some(name);
                speech
            }
            None => block.speech_html(),
        };
        if speech.is_empty() {
            continue;
        }

        match &speaker {
            Some(name) => turns.push(DialogueTurn::new(Some(name.clone()), speech)),
            None => lead_in.push(speech),
        }
    }
    flush_lead_in(&mut lead_in, &mut turns);
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    fn text(value: &str) -> Node {
        Node::Text(value.to_string())
    }

    fn bold(value: &str) -> Node {
        Node::Element(Element::with_children("strong", vec![text(value)]))
    }

    fn paragraph(children: Vec<Node>) -> Block {
        Block::paragraph(children)
    }

    fn english() -> &'static LanguageConfig {
        LanguageConfig::builtin(Language::English).expect("English is supported")
    }

    fn turn(speaker: Option<&str>, speech: &str) -> DialogueTurn {
        DialogueTurn::new(speaker.map(str::to_string), speech)
    }

    #[test]
    fn test_event_speaker_and_continuation() {
        let blocks = vec![
            paragraph(vec![text("(The meeting was suspended.)")]),
            paragraph(vec![bold("MR LEE"), text(": I agree.")]),
            paragraph(vec![text("I further add this.")]),
        ];
        let turns = split_dialogue(&blocks, true, english());
        assert_eq!(
            turns,
            vec![
                turn(None, "The meeting was suspended."),
                turn(Some("MR LEE"), "I agree."),
                turn(Some("MR LEE"), "I further add this."),
            ]
        );
    }

    #[test]
    fn test_events_can_be_disabled() {
        let blocks = vec![
            paragraph(vec![bold("MR LEE"), text(": asked:")]),
            paragraph(vec![text("(Laughter)")]),
        ];
        let with_events = split_dialogue(&blocks, true, english());
        let without_events = split_dialogue(&blocks, false, english());
        assert_eq!(with_events[1], turn(None, "Laughter"));
        assert_eq!(without_events[1], turn(Some("MR LEE"), "(Laughter)"));
    }

    #[test]
    fn test_bracketed_speech_is_not_an_event() {
        let blocks = vec![
            paragraph(vec![bold("MR LEE"), text(": The figures are as follows:")]),
            paragraph(vec![text("(a) the figures (Annex)")]),
        ];
        let turns = split_dialogue(&blocks, true, english());
        assert_eq!(turns[1], turn(Some("MR LEE"), "(a) the figures (Annex)"));

        let chinese = LanguageConfig::builtin(Language::Chinese).expect("Chinese is supported");
        let blocks = vec![
            paragraph(vec![bold("李卓人議員"), text(":數字如下:")]),
            paragraph(vec![text("（一）有關數字（附件）")]),
            paragraph(vec![text("（笑聲）")]),
        ];
        let turns = split_dialogue(&blocks, true, chinese);
        assert_eq!(turns[1], turn(Some("李卓人議員"), "（一）有關數字（附件）"));
        assert_eq!(turns[2], turn(None, "笑聲"));
    }

    #[test]
    fn test_split_bold_speaker_is_joined() {
        let blocks = vec![paragraph(vec![
            bold("SECRETARY FOR "),
            bold("SECURITY:"),
            text(" President, "),
            Node::Element(Element::with_children("em", vec![text("no")])),
            text("."),
        ])];
        let turns = split_dialogue(&blocks, true, english());
        assert_eq!(
            turns,
            vec![turn(Some("SECRETARY FOR SECURITY"), "President, <em>no</em>.")]
        );
    }

    #[test]
    fn test_top_level_bold_with_tail() {
        let mut label = Block::new(Element::with_children("strong", vec![text("PRESIDENT")]));
        label.tail = ": Please be seated & listen.".to_string();
        let turns = split_dialogue([&label], true, english());
        assert_eq!(
            turns,
            vec![turn(Some("PRESIDENT"), "Please be seated &amp; listen.")]
        );
    }

    #[test]
    fn test_lead_in_blocks_form_one_turn() {
        let blocks = vec![
            paragraph(vec![text("Opening remarks.")]),
            paragraph(vec![text("More remarks.")]),
            paragraph(vec![bold("MR LEE:"), text(" Thanks.")]),
        ];
        let turns = split_dialogue(&blocks, true, english());
        assert_eq!(
            turns,
            vec![
                turn(None, "Opening remarks.\n\nMore remarks."),
                turn(Some("MR LEE"), "Thanks."),
            ]
        );
    }

    #[test]
    fn test_every_block_is_accounted_for() {
        let blocks = vec![
            paragraph(vec![text("Lead in.")]),
            paragraph(vec![bold("MR LEE"), text(": one")]),
            paragraph(vec![text("(Laughter)")]),
            paragraph(vec![text("two")]),
            paragraph(vec![text("   ")]),
            paragraph(vec![bold("MR HO"), text(": three")]),
        ];
        let turns = split_dialogue(&blocks, true, english());

        let attributed_or_events = turns
            .iter()
            .filter(|t| t.speaker.is_some() || t.speech == "Laughter")
            .count();
        assert!(attributed_or_events <= blocks.len());
        for expected in ["Lead in.", "one", "Laughter", "two", "three"] {
            let holders = turns.iter().filter(|t| t.speech.contains(expected)).count();
            assert_eq!(holders, 1, "'{}' should be in exactly one turn", expected);
        }
    }
}
