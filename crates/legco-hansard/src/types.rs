use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::block::Block;

#[derive(Debug, thiserror::Error)]
#[error("Invalid language '{0}'. Accepted values: 'e', 'en', 'english', 'c', 'zh', 'chinese', 'b', 'ec', 'floor'")]
pub struct LanguageParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Chinese,
    /// Untranslated floor record mixing both languages.
    Floor,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "e",
            Language::Chinese => "c",
            Language::Floor => "b",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Language::Floor)
    }
}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "e" | "en" | "english" => Ok(Language::English),
            "c" | "zh" | "chinese" => Ok(Language::Chinese),
            "b" | "ec" | "floor" => Ok(Language::Floor),
            _ => Err(LanguageParseError(s.to_string())),
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Chinese => write!(f, "Chinese"),
            Language::Floor => write!(f, "Floor"),
        }
    }
}

/// Closed set of section kinds the header vocabulary maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    TabledPapers,
    OralQuestions,
    UrgentQuestions,
    WrittenQuestions,
    Bills,
    Motions,
    Statements,
    Addresses,
    Suspension,
    NextMeeting,
    /// Recognised as a header but never handed to a sub-parser.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKey {
    BeforeMeeting,
    Header { text: String, kind: SectionKind },
}

impl SectionKey {
    pub const BEFORE_MEETING: &'static str = "BEFORE MEETING";

    pub fn label(&self) -> &str {
        match self {
            SectionKey::BeforeMeeting => Self::BEFORE_MEETING,
            SectionKey::Header { text, .. } => text,
        }
    }
}

/// A named run of content blocks between two headers. For header sections
/// the header block itself is the first block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub key: SectionKey,
    pub blocks: Vec<Block>,
}

impl Section {
    /// The blocks after the header.
    pub fn body(&self) -> &[Block] {
        match self.key {
            SectionKey::BeforeMeeting => &self.blocks,
            SectionKey::Header { .. } => self.blocks.get(1..).unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> Option<SectionKind> {
        match &self.key {
            SectionKey::BeforeMeeting => None,
            SectionKey::Header { kind, .. } => Some(*kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DialogueTurn {
    /// `None` for events (stage directions) and unattributed lead-in text.
    pub speaker: Option<String>,
    /// Inline HTML fragment.
    pub speech: String,
}

impl DialogueTurn {
    pub fn new(speaker: Option<String>, speech: impl Into<String>) -> Self {
        Self {
            speaker,
            speech: speech.into(),
        }
    }
}

impl Display for DialogueTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview: String = self.speech.chars().take(120).collect();
        match &self.speaker {
            Some(speaker) => writeln!(f, "  ▸ {}: {}", speaker, preview),
            None => writeln!(f, "    [{}]", preview),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MemberName {
    /// Bare name, when it could be isolated from the titles.
    pub name: Option<String>,
    pub full_text: String,
}

impl Display for MemberName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.full_text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PublicOfficer {
    pub name: String,
    pub title: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Clerk {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttendanceRecord {
    pub sitting_date: Option<NaiveDate>,
    pub sitting_date_text: Option<String>,
    pub opening: Option<String>,
    pub president: Option<MemberName>,
    pub members_present: Vec<MemberName>,
    pub members_absent: Vec<MemberName>,
    /// `None` when the list could not be reconstructed.
    pub public_officers: Option<Vec<PublicOfficer>>,
    pub clerks: Vec<Clerk>,
}

impl Display for AttendanceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(president) = &self.president {
            writeln!(f, "│  President: {}", president)?;
        }
        writeln!(
            f,
            "│  Present: {} · Absent: {} · Officers: {} · Clerks: {}",
            self.members_present.len(),
            self.members_absent.len(),
            self.public_officers
                .as_ref()
                .map(|o| o.len().to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            self.clerks.len()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Oral,
    Urgent,
    Written,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub kind: QuestionKind,
    pub number: Option<String>,
    pub title: String,
    pub turns: Vec<DialogueTurn>,
}

impl Question {
    /// The first attributed speaker, normally the member asking.
    pub fn asker(&self) -> Option<&str> {
        self.turns.iter().find_map(|t| t.speaker.as_deref())
    }
}

impl Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Q{} [{:?}] {}",
            self.number.as_deref().unwrap_or("?"),
            self.kind,
            self.title
        )?;
        if let Some(asker) = self.asker() {
            write!(f, " · {}", asker)?;
        }
        writeln!(f)?;
        for turn in &self.turns {
            write!(f, "{}", turn)?;
        }
        Ok(())
    }
}

/// A question number maps to one question, or to all questions sharing it
/// (urgent questions are numbered in their own namespace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionEntry {
    Single(Question),
    List(Vec<Question>),
}

impl QuestionEntry {
    pub fn questions(&self) -> Vec<&Question> {
        match self {
            QuestionEntry::Single(question) => vec![question],
            QuestionEntry::List(questions) => questions.iter().collect(),
        }
    }

    pub(crate) fn push(&mut self, question: Question) {
        match self {
            QuestionEntry::List(questions) => questions.push(question),
            QuestionEntry::Single(existing) => {
                *self = QuestionEntry::List(vec![existing.clone(), question]);
            }
        }
    }
}

pub type QuestionMap = BTreeMap<String, QuestionEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabledPaper {
    Legislation {
        number: String,
        title: String,
    },
    Other {
        number: Option<String>,
        title: String,
        description: String,
    },
}

impl Display for TabledPaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabledPaper::Legislation { number, title } => write!(f, "  [L.N. {}] {}", number, title),
            TabledPaper::Other {
                number,
                title,
                description,
            } => {
                write!(f, "  [No. {}] {}", number.as_deref().unwrap_or("-"), title)?;
                if !description.is_empty() {
                    write!(f, " ({})", description)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BillRecord {
    pub stage: Option<String>,
    pub title: Option<String>,
    pub turns: Vec<DialogueTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MotionRecord {
    pub title: Option<String>,
    pub turns: Vec<DialogueTurn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingMarker,
    UnexpectedEntry,
    MissingName,
    CountMismatch,
    ColumnCount,
    MissingNumber,
    RepeatedHeader,
    SeparatorCount,
}

/// A structural assumption the document violated. Recorded, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Issue {
    pub kind: IssueKind,
    pub detail: String,
}

impl Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Hansard {
    pub uid: String,
    pub language: Language,
    pub session_date: String,
    pub attendance: AttendanceRecord,
    /// Section keys in discovery order, including repeats.
    pub sections: Vec<String>,
    pub before_meeting: Vec<DialogueTurn>,
    /// Turns in question sections that precede the first question title.
    pub question_preamble: Vec<DialogueTurn>,
    pub tabled_papers: Option<Vec<TabledPaper>>,
    pub questions: Vec<Question>,
    pub question_map: QuestionMap,
    pub bills: Option<Vec<BillRecord>>,
    pub motions: Option<Vec<MotionRecord>>,
    pub statements: Option<Vec<DialogueTurn>>,
    pub ending: Option<Vec<DialogueTurn>>,
    pub sidenote: Vec<String>,
    pub issues: Vec<Issue>,
    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) blocks: Vec<Block>,
}

fn write_turns(
    f: &mut std::fmt::Formatter<'_>,
    heading: &str,
    turns: &[DialogueTurn],
) -> std::fmt::Result {
    writeln!(f, "── {}", heading)?;
    for turn in turns {
        write!(f, "{}", turn)?;
    }
    Ok(())
}

impl Display for Hansard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "┌─ {} ─ {} ─ {}",
            self.uid, self.language, self.session_date
        )?;
        if let Some(date) = &self.attendance.sitting_date {
            writeln!(f, "│  Sitting: {}", date)?;
        }
        write!(f, "{}", self.attendance)?;
        writeln!(f, "│  Sections: {}", self.sections.join(" · "))?;
        writeln!(f, "└─ {} issue(s)", self.issues.len())?;
        writeln!(f)?;

        if !self.before_meeting.is_empty() {
            write_turns(f, "Before meeting", &self.before_meeting)?;
        }
        if let Some(papers) = &self.tabled_papers {
            writeln!(f, "── Tabled papers ({})", papers.len())?;
            for paper in papers {
                writeln!(f, "{}", paper)?;
            }
        }
        if !self.question_preamble.is_empty() {
            write_turns(f, "Question preamble", &self.question_preamble)?;
        }
        if !self.questions.is_empty() {
            writeln!(f, "── Questions ({})", self.questions.len())?;
            for question in &self.questions {
                write!(f, "{}", question)?;
            }
        }
        if let Some(bills) = &self.bills {
            writeln!(f, "── Bills ({})", bills.len())?;
            for bill in bills {
                writeln!(
                    f,
                    "  {} · {} ({} turn(s))",
                    bill.stage.as_deref().unwrap_or("-"),
                    bill.title.as_deref().unwrap_or("-"),
                    bill.turns.len()
                )?;
            }
        }
        if let Some(motions) = &self.motions {
            writeln!(f, "── Motions ({})", motions.len())?;
            for motion in motions {
                writeln!(
                    f,
                    "  {} ({} turn(s))",
                    motion.title.as_deref().unwrap_or("-"),
                    motion.turns.len()
                )?;
            }
        }
        if let Some(statements) = &self.statements {
            write_turns(f, "Statements", statements)?;
        }
        if let Some(ending) = &self.ending {
            write_turns(f, "Ending", ending)?;
        }
        for issue in &self.issues {
            writeln!(f, "  ! {}", issue)?;
        }
        Ok(())
    }
}
