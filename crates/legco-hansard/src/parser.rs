mod bills;
mod dialogue;
mod heading;
mod motions;
mod papers;
mod questions;
mod section;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::block::Block;
use crate::config::{ConfigError, LanguageConfig};
use crate::index::build_question_map;
use crate::normalize::normalize;
use crate::region::split_regions;
use crate::types::{
    BillRecord, DialogueTurn, Hansard, Issue, IssueKind, Language, MotionRecord, Question,
    QuestionKind, SectionKey, SectionKind, TabledPaper,
};

pub use dialogue::split_dialogue;
pub use section::split_sections;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("The Hansard parser cannot handle {0} records")]
    UnsupportedLanguage(Language),
    #[error("Document has no body")]
    MissingBody,
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What to do with an attendance entry whose bare name cannot be isolated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingNamePolicy {
    #[default]
    KeepFullText,
    Drop,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub missing_name_policy: MissingNamePolicy,
}

const SESSION_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%d.%m.%Y"];

pub(crate) fn parse_session_date(text: &str) -> Option<NaiveDate> {
    SESSION_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
}

/// Per-parse state shared by the stages: the read-only configuration and the
/// issues found so far.
pub(crate) struct Context<'a> {
    pub(crate) config: &'a LanguageConfig,
    pub(crate) options: &'a ParseOptions,
    issues: Vec<Issue>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(config: &'a LanguageConfig, options: &'a ParseOptions) -> Self {
        Self {
            config,
            options,
            issues: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, kind: IssueKind, detail: impl Into<String>) {
        let detail = detail.into();
        log::warn!("{:?}: {}", kind, detail);
        self.issues.push(Issue { kind, detail });
    }

    pub(crate) fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// Results of the section sub-parsers. Several headers may map to the same
/// kind (government and members' bills, say); their results are appended.
#[derive(Debug, Default)]
pub(crate) struct Proceedings {
    before_meeting: Vec<DialogueTurn>,
    question_preamble: Vec<DialogueTurn>,
    tabled_papers: Option<Vec<TabledPaper>>,
    questions: Vec<Question>,
    bills: Option<Vec<BillRecord>>,
    motions: Option<Vec<MotionRecord>>,
    statements: Option<Vec<DialogueTurn>>,
    ending: Option<Vec<DialogueTurn>>,
}

type SectionParser = fn(&[Block], &mut Context, &mut Proceedings);

/// Sub-parser for a section kind; `Other` sections are kept but never parsed.
fn section_parser(kind: SectionKind) -> Option<SectionParser> {
    let parser: SectionParser = match kind {
        SectionKind::TabledPapers => tabled_papers_section,
        SectionKind::OralQuestions => oral_questions_section,
        SectionKind::UrgentQuestions => urgent_questions_section,
        SectionKind::WrittenQuestions => written_questions_section,
        SectionKind::Bills => bills_section,
        SectionKind::Motions => motions_section,
        SectionKind::Statements | SectionKind::Addresses => statements_section,
        SectionKind::Suspension | SectionKind::NextMeeting => ending_section,
        SectionKind::Other => return None,
    };
    Some(parser)
}

fn tabled_papers_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    let papers = papers::parse_tabled_papers(blocks, cx);
    out.tabled_papers.get_or_insert_with(Vec::new).extend(papers);
}

fn oral_questions_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    questions_section(blocks, QuestionKind::Oral, cx, out)
}

fn urgent_questions_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    questions_section(blocks, QuestionKind::Urgent, cx, out)
}

fn written_questions_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    questions_section(blocks, QuestionKind::Written, cx, out)
}

fn questions_section(
    blocks: &[Block],
    kind: QuestionKind,
    cx: &mut Context,
    out: &mut Proceedings,
) {
    let parsed = questions::parse_questions(blocks, kind, cx);
    out.question_preamble.extend(parsed.preamble);
    out.questions.extend(parsed.questions);
}

fn bills_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    let bills = bills::parse_bills(blocks, cx);
    out.bills.get_or_insert_with(Vec::new).extend(bills);
}

fn motions_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    let motions = motions::parse_motions(blocks, cx);
    out.motions.get_or_insert_with(Vec::new).extend(motions);
}

fn statements_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    let turns = split_dialogue(blocks, true, cx.config);
    out.statements.get_or_insert_with(Vec::new).extend(turns);
}

fn ending_section(blocks: &[Block], cx: &mut Context, out: &mut Proceedings) {
    let turns = split_dialogue(blocks, true, cx.config);
    out.ending.get_or_insert_with(Vec::new).extend(turns);
}

impl Hansard {
    /// Parses a cleaned Hansard document with the built-in configuration for
    /// `language`. Floor records are rejected before any work is done.
    pub fn parse(
        uid: &str,
        language: Language,
        session_date: &str,
        source: &str,
    ) -> Result<Self, ParseError> {
        let config = LanguageConfig::builtin(language).inspect_err(|_| {
            log::error!("The Hansard parser cannot handle floor records: {}", uid)
        })?;
        Self::parse_with_config(uid, session_date, source, config, &ParseOptions::default())
    }

    pub fn parse_with_config(
        uid: &str,
        session_date: &str,
        source: &str,
        config: &LanguageConfig,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        if !config.language.is_supported() {
            log::error!("The Hansard parser cannot handle floor records: {}", uid);
            return Err(ParseError::UnsupportedLanguage(config.language));
        }
        log::debug!("Parsing hansard {} ({})", uid, config.language);

        let mut cx = Context::new(config, options);
        let blocks = normalize(source, &mut cx)?;
        let regions = split_regions(&blocks);

        let heading = heading::parse_heading(&regions.heading, &mut cx);
        let mut content = heading.overflow.to_vec();
        content.extend(regions.content);
        let attendance = heading.attendance;

        let sections = split_sections(&content, cx.config);
        let mut latest: HashMap<&SectionKey, usize> = HashMap::new();
        for (index, section) in sections.iter().enumerate() {
            if latest.insert(&section.key, index).is_some() {
                cx.record(
                    IssueKind::RepeatedHeader,
                    format!(
                        "Section '{}' appears more than once; the later one is used",
                        section.key.label()
                    ),
                );
            }
        }

        let mut proceedings = Proceedings::default();
        for (index, section) in sections.iter().enumerate() {
            if latest.get(&section.key) != Some(&index) {
                continue;
            }
            match section.kind() {
                None => {
                    proceedings.before_meeting = split_dialogue(section.body(), true, cx.config)
                }
                Some(kind) => match section_parser(kind) {
                    Some(parser) => parser(section.body(), &mut cx, &mut proceedings),
                    None => log::debug!("Skipping section '{}'", section.key.label()),
                },
            }
        }

        let question_map = build_question_map(&proceedings.questions);
        let sidenote = regions
            .sidenote
            .iter()
            .map(Block::full_text)
            .filter(|text| !text.is_empty())
            .collect();

        let issues = cx.into_issues();
        log::debug!(
            "Parsed hansard {}: {} section(s), {} issue(s)",
            uid,
            sections.len(),
            issues.len()
        );

        Ok(Hansard {
            uid: uid.to_string(),
            language: config.language,
            session_date: session_date.to_string(),
            attendance,
            sections: sections.iter().map(|s| s.key.label().to_string()).collect(),
            before_meeting: proceedings.before_meeting,
            question_preamble: proceedings.question_preamble,
            tabled_papers: proceedings.tabled_papers,
            questions: proceedings.questions,
            question_map,
            bills: proceedings.bills,
            motions: proceedings.motions,
            statements: proceedings.statements,
            ending: proceedings.ending,
            sidenote,
            issues,
            blocks,
        })
    }

    /// Number of structural problems recovered from during the parse.
    pub fn error_count(&self) -> usize {
        self.issues.len()
    }

    /// The session date given at parse time, when it is in a known format.
    pub fn session_day(&self) -> Option<NaiveDate> {
        parse_session_date(&self.session_date)
    }

    /// The normalized document, for inspection.
    pub fn cleaned_html(&self) -> String {
        let mut html = String::from("<html><body>");
        for block in &self.blocks {
            html.push_str(&block.to_html());
        }
        html.push_str("</body></html>");
        html
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::types::QuestionEntry;

    fn english_fixture() -> Hansard {
        let html = fs::read_to_string("fixtures/council_english.html")
            .expect("Failed to read English fixture");
        Hansard::parse("cm20121010", Language::English, "2012-10-10", &html)
            .expect("Failed to parse English fixture")
    }

    fn chinese_fixture() -> Hansard {
        let html = fs::read_to_string("fixtures/council_chinese.html")
            .expect("Failed to read Chinese fixture");
        Hansard::parse("cm20121010", Language::Chinese, "2012-10-10", &html)
            .expect("Failed to parse Chinese fixture")
    }

    #[test]
    fn test_floor_records_are_rejected() {
        let html = "<html><body><p>anything</p></body></html>";
        let result = Hansard::parse("cm20121010", Language::Floor, "2012-10-10", html);
        assert!(matches!(
            result,
            Err(ParseError::UnsupportedLanguage(Language::Floor))
        ));
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(english_fixture(), english_fixture());
        assert_eq!(chinese_fixture(), chinese_fixture());
    }

    #[test]
    fn test_english_attendance() {
        let hansard = english_fixture();
        let attendance = &hansard.attendance;

        assert_eq!(
            attendance.sitting_date,
            NaiveDate::from_ymd_opt(2012, 10, 10)
        );
        assert_eq!(
            attendance.opening.as_deref(),
            Some("The Council met at Eleven o'clock")
        );
        let president = attendance.president.as_ref().expect("President should be set");
        assert_eq!(president.name.as_deref(), Some("JASPER TSANG YOK-SING"));
        let present: Vec<_> = attendance
            .members_present
            .iter()
            .filter_map(|m| m.name.as_deref())
            .collect();
        assert_eq!(present, vec!["ALBERT HO CHUN-YAN", "LEE CHEUK-YAN"]);
        assert_eq!(attendance.members_absent.len(), 1);

        let officers = attendance
            .public_officers
            .as_ref()
            .expect("Officers should be paired");
        assert_eq!(officers.len(), 2);
        assert_eq!(officers[0].name, "THE HONOURABLE CARRIE LAM CHENG YUET-NGOR");
        assert_eq!(officers[0].title, "G.B.S., J.P.");
        assert_eq!(officers[0].position, "THE CHIEF SECRETARY FOR ADMINISTRATION");

        assert_eq!(attendance.clerks.len(), 2);
        assert_eq!(attendance.clerks[0].name, "MR KENNETH CHEN WEI-ON");
        assert_eq!(attendance.clerks[0].title, "SECRETARY GENERAL");
    }

    #[test]
    fn test_english_sections_and_results() {
        let hansard = english_fixture();

        assert_eq!(
            hansard.sections,
            vec![
                "BEFORE MEETING",
                "TABLING OF PAPERS",
                "ORAL ANSWERS TO QUESTIONS",
                "URGENT QUESTION",
                "BILLS",
                "MEMBERS' MOTIONS",
                "NEXT MEETING",
            ]
        );

        let papers = hansard.tabled_papers.as_ref().expect("Papers should be parsed");
        assert_eq!(papers.len(), 3);
        assert_eq!(
            papers[0],
            TabledPaper::Legislation {
                number: "134/2012".into(),
                title: "Dutiable Commodities (Amendment) Regulation 2012".into(),
            }
        );

        let numbers: Vec<_> = hansard
            .questions
            .iter()
            .map(|q| q.number.as_deref())
            .collect();
        assert_eq!(numbers, vec![Some("1"), Some("2"), Some("0")]);
        assert_eq!(hansard.questions[0].asker(), Some("MR ALBERT HO"));
        assert!(matches!(
            hansard.question_map.get("1"),
            Some(QuestionEntry::Single(_))
        ));

        let bills = hansard.bills.as_ref().expect("Bills should be parsed");
        assert_eq!(bills[0].stage.as_deref(), Some("First Reading of Bills"));
        assert_eq!(bills[0].title.as_deref(), Some("Appropriation Bill 2012"));

        let motions = hansard.motions.as_ref().expect("Motions should be parsed");
        assert_eq!(motions.len(), 1);
        assert_eq!(
            motions[0].title.as_deref(),
            Some("MOTION ON HOUSING POLICY")
        );

        let ending = hansard.ending.as_ref().expect("Ending should be parsed");
        assert!(ending.iter().any(|t| t.speaker.is_none()));
        assert_eq!(hansard.sidenote, vec!["Appendix I"]);
        assert_eq!(hansard.error_count(), 0, "Issues: {:?}", hansard.issues);
    }

    #[test]
    fn test_text_output_lists_every_dialogue_part() {
        let mut hansard = english_fixture();
        hansard.statements = Some(vec![DialogueTurn::new(
            Some("SECRETARY FOR SECURITY".to_string()),
            "I now make a statement.",
        )]);
        let text = hansard.to_string();

        let before = text.find("── Before meeting").expect("Before meeting is printed");
        let preamble = text
            .find("── Question preamble")
            .expect("Question preamble is printed");
        let statements = text.find("── Statements").expect("Statements are printed");
        let ending = text.find("── Ending").expect("Ending is printed");
        assert!(before < preamble && preamble < statements && statements < ending);
        assert!(text.contains("▸ PRESIDENT: Good morning. The meeting now begins."));
        assert!(text.contains("▸ PRESIDENT: Questions. First question."));
        assert!(text.contains("▸ SECRETARY FOR SECURITY: I now make a statement."));
    }

    #[test]
    fn test_chinese_document() {
        let hansard = chinese_fixture();
        let attendance = &hansard.attendance;

        assert_eq!(
            attendance.sitting_date,
            NaiveDate::from_ymd_opt(2012, 10, 10)
        );
        let president = attendance.president.as_ref().expect("President should be set");
        assert_eq!(president.name.as_deref(), Some("曾鈺成"));
        assert_eq!(attendance.members_present.len(), 2);
        let officers = attendance
            .public_officers
            .as_ref()
            .expect("Officers should be parsed");
        assert_eq!(officers[0].position, "政務司司長");
        assert_eq!(officers[0].name, "林鄭月娥");
        assert_eq!(attendance.clerks[0].name, "陳維安");

        assert_eq!(
            hansard.sections,
            vec!["BEFORE MEETING", "提交文件", "議員質詢的口頭答覆", "法案"]
        );
        let papers = hansard.tabled_papers.as_ref().expect("Papers should be parsed");
        assert_eq!(papers.len(), 2);
        assert_eq!(hansard.questions.len(), 1);
        assert_eq!(hansard.questions[0].number.as_deref(), Some("1"));
        let bills = hansard.bills.as_ref().expect("Bills should be parsed");
        assert_eq!(bills[0].title.as_deref(), Some("《2012年撥款條例草案》"));
    }

    #[test]
    fn test_repeated_header_uses_later_section() {
        let html = r#"<html><body>
            <p>MEMBERS PRESENT:</p><p>THE PRESIDENT</p>
            <p>THE HONOURABLE JASPER TSANG YOK-SING, G.B.S., J.P.</p>
            <hr/>
            <p><strong>NEXT MEETING</strong></p>
            <p>first</p>
            <p><strong>NEXT MEETING</strong></p>
            <p>second</p>
            </body></html>"#;
        let hansard = Hansard::parse("cm", Language::English, "2012-10-10", html)
            .expect("Failed to parse");

        assert_eq!(
            hansard.sections,
            vec!["BEFORE MEETING", "NEXT MEETING", "NEXT MEETING"]
        );
        let ending = hansard.ending.expect("Ending should be parsed");
        assert_eq!(ending.len(), 1);
        assert_eq!(ending[0].speech, "second");
        assert!(hansard
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::RepeatedHeader));
    }

    #[test]
    fn test_session_day_formats() {
        assert_eq!(
            parse_session_date("20121010"),
            NaiveDate::from_ymd_opt(2012, 10, 10)
        );
        assert_eq!(
            parse_session_date("10.10.2012"),
            NaiveDate::from_ymd_opt(2012, 10, 10)
        );
        assert_eq!(parse_session_date("next week"), None);
    }

    #[test]
    fn test_cleaned_html_round_trips_through_normalizer() {
        let hansard = english_fixture();
        let reparsed = Hansard::parse(
            &hansard.uid,
            hansard.language,
            &hansard.session_date,
            &hansard.cleaned_html(),
        )
        .expect("Failed to reparse cleaned html");
        assert_eq!(reparsed.sections, hansard.sections);
        assert_eq!(reparsed.attendance, hansard.attendance);
    }
}
