//! Per-language marker vocabulary and patterns.
//!
//! A [`MarkerSet`] is plain data (serializable, so it can be extended from a
//! JSON file without recompiling); [`LanguageConfig::compile`] validates it
//! into the form the parser uses. The built-in English and Chinese sets are
//! compiled once and shared read-only between parses.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::parser::ParseError;
use crate::types::{Language, SectionKind};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern for {field}: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("Pattern for {field} is missing the named group '{group}'")]
    MissingGroup {
        field: &'static str,
        group: &'static str,
    },
    #[error("Failed to read marker set: {0}")]
    Decode(#[from] serde_json::Error),
}

/// How the public officers attending are laid out in the heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfficerLayout {
    /// Name and titles on one entry, position on the next.
    Alternating,
    /// Position, name and titles on a single entry.
    Combined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SectionHeader {
    pub text: String,
    pub kind: SectionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MarkerSet {
    pub language: Language,
    pub hansard_title: Vec<String>,
    pub members_present: Vec<String>,
    pub members_absent: Vec<String>,
    pub public_officers: Vec<String>,
    pub clerks: Vec<String>,
    pub president: String,
    /// Must capture `name`.
    pub member_name_pattern: String,
    /// Must capture `name` and `title`.
    pub clerk_pattern: String,
    pub officer_layout: OfficerLayout,
    /// Must capture `position` and `name`; `title` is optional.
    pub combined_officer_pattern: Option<String>,
    pub sitting_date_formats: Vec<String>,
    /// Must capture `year`, `month` and `day`.
    pub sitting_date_pattern: Option<String>,
    pub opening_pattern: String,
    /// Whether the script has letter case; drives the upper/mixed case tests
    /// on headers and titles.
    pub has_case: bool,
    pub sections: Vec<SectionHeader>,
    /// Must capture `event`.
    pub event_pattern: String,
    /// Must capture `number`.
    pub question_number_pattern: String,
    pub bill_stages: Vec<String>,
    pub bill_title_pattern: Option<String>,
    pub subsidiary_legislation: Vec<String>,
    pub other_papers: Vec<String>,
    /// Must capture `number` and `title`.
    pub paper_number_pattern: String,
    /// Must capture `number` and `title`.
    pub legislation_line_pattern: String,
    pub legislation_number_pattern: String,
    pub paper_closing_suffixes: Vec<String>,
    pub registry_code: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn headers(values: &[(&str, SectionKind)]) -> Vec<SectionHeader> {
    values
        .iter()
        .map(|(text, kind)| SectionHeader {
            text: text.to_string(),
            kind: *kind,
        })
        .collect()
}

impl MarkerSet {
    pub fn english() -> Self {
        Self {
            language: Language::English,
            hansard_title: strings(&["OFFICIAL RECORD OF PROCEEDINGS"]),
            members_present: strings(&["MEMBERS PRESENT:", "MEMBER PRESENT:"]),
            members_absent: strings(&["MEMBERS ABSENT:", "MEMBER ABSENT:"]),
            public_officers: strings(&[
                "PUBLIC OFFICERS ATTENDING:",
                "PUBLIC OFFICER ATTENDING:",
            ]),
            clerks: strings(&["CLERKS IN ATTENDANCE:", "CLERK IN ATTENDANCE:"]),
            president: "THE PRESIDENT".into(),
            member_name_pattern: r"^[A-Z\s.-]*HONOURABLE\s+(?P<name>[A-Z][A-Z\s'-]*)".into(),
            clerk_pattern: r"^(?P<name>.+),\s*(?P<title>[^,]*(?:SECRETARY|CLERK)[^,]*)$".into(),
            officer_layout: OfficerLayout::Alternating,
            combined_officer_pattern: None,
            sitting_date_formats: strings(&["%A, %d %B %Y", "%d %B %Y"]),
            sitting_date_pattern: None,
            opening_pattern: r"(?i)^the council met at".into(),
            has_case: true,
            sections: headers(&[
                ("TABLING OF PAPERS", SectionKind::TabledPapers),
                ("PAPERS", SectionKind::TabledPapers),
                ("ORAL ANSWERS TO QUESTIONS", SectionKind::OralQuestions),
                ("QUESTIONS", SectionKind::OralQuestions),
                ("URGENT QUESTION", SectionKind::UrgentQuestions),
                ("URGENT QUESTIONS", SectionKind::UrgentQuestions),
                ("WRITTEN ANSWERS TO QUESTIONS", SectionKind::WrittenQuestions),
                ("BILLS", SectionKind::Bills),
                ("GOVERNMENT BILLS", SectionKind::Bills),
                ("MEMBERS' BILLS", SectionKind::Bills),
                ("MOTIONS", SectionKind::Motions),
                ("GOVERNMENT MOTIONS", SectionKind::Motions),
                ("MEMBERS' MOTIONS", SectionKind::Motions),
                ("MOTIONS WITH NO LEGISLATIVE EFFECT", SectionKind::Motions),
                ("STATEMENTS", SectionKind::Statements),
                ("STATEMENT", SectionKind::Statements),
                ("ADDRESSES", SectionKind::Addresses),
                ("ADDRESS", SectionKind::Addresses),
                ("SUSPENSION OF MEETING", SectionKind::Suspension),
                ("NEXT MEETING", SectionKind::NextMeeting),
                ("ADJOURNMENT AND NEXT MEETING", SectionKind::NextMeeting),
                ("OATH", SectionKind::Other),
                ("OATHS", SectionKind::Other),
                ("ELECTION OF PRESIDENT", SectionKind::Other),
            ]),
            event_pattern: r"^\((?P<event>[^()]+)\)$".into(),
            question_number_pattern: r"^\s*(?P<number>\d+)\s*\.\s*".into(),
            bill_stages: strings(&[
                "First Reading",
                "Second Reading",
                "Third Reading",
                "Committee Stage",
                "Resumption of Second Reading Debate",
            ]),
            bill_title_pattern: None,
            subsidiary_legislation: strings(&[
                "Subsidiary Legislation / Instruments",
                "Subsidiary Legislation",
            ]),
            other_papers: strings(&["Other Papers", "Sessional Papers"]),
            paper_number_pattern: r"^No\.\s*(?P<number>\d+)\s*[-\x{2013}\x{2014}]?\s*(?P<title>.*)$"
                .into(),
            legislation_line_pattern: r"^(?P<title>.+?)[\s.]+(?P<number>\d+/\d{4})$".into(),
            legislation_number_pattern:
                r"^(?:(?:L\.N\.|G\.N\.(?:\s*\(E\.\))?)\s*(?:No\.)?\s*)?\d+(?:/\d{4}|\s+of\s+\d{4})$"
                    .into(),
            paper_closing_suffixes: strings(&["Report", "Accounts", "Statements"]),
            registry_code: "e".into(),
        }
    }

    pub fn chinese() -> Self {
        Self {
            language: Language::Chinese,
            hansard_title: strings(&["會議過程正式紀錄"]),
            members_present: strings(&["出席議員:", "出席議員"]),
            members_absent: strings(&["缺席議員:", "缺席議員"]),
            public_officers: strings(&["出席政府官員:", "出席政府官員", "出席公職人員:"]),
            clerks: strings(&["列席秘書:", "列席秘書"]),
            president: "主席".into(),
            member_name_pattern: r"^(?P<name>.+?)議員".into(),
            clerk_pattern: r"^(?P<title>[^,，:\s]{0,6}秘書長?)(?P<name>[^,，:]{1,12}?)(?:[,，].*)?$".into(),
            officer_layout: OfficerLayout::Combined,
            combined_officer_pattern: Some(
                r"^(?P<position>.+?(?:司長|局長|秘書長|處長|署長|專員|主任|律政司))(?P<name>[^,，]+?)(?:[,，]\s*(?P<title>.*))?$"
                    .into(),
            ),
            sitting_date_formats: Vec::new(),
            sitting_date_pattern: Some(
                r"(?P<year>\d{4})\s*年\s*(?P<month>\d{1,2})\s*月\s*(?P<day>\d{1,2})\s*日".into(),
            ),
            opening_pattern: r"^立法會.*(?:開始|舉行|開會)".into(),
            has_case: false,
            sections: headers(&[
                ("提交文件", SectionKind::TabledPapers),
                ("文件", SectionKind::TabledPapers),
                ("議員質詢的口頭答覆", SectionKind::OralQuestions),
                ("質詢", SectionKind::OralQuestions),
                ("急切質詢", SectionKind::UrgentQuestions),
                ("議員質詢的書面答覆", SectionKind::WrittenQuestions),
                ("法案", SectionKind::Bills),
                ("政府法案", SectionKind::Bills),
                ("議員法案", SectionKind::Bills),
                ("議案", SectionKind::Motions),
                ("政府議案", SectionKind::Motions),
                ("議員議案", SectionKind::Motions),
                ("無立法效力的議案", SectionKind::Motions),
                ("聲明", SectionKind::Statements),
                ("發言", SectionKind::Addresses),
                ("暫停會議", SectionKind::Suspension),
                ("下次會議", SectionKind::NextMeeting),
                ("休會及下次會議", SectionKind::NextMeeting),
                ("宣誓", SectionKind::Other),
                ("選舉主席", SectionKind::Other),
            ]),
            event_pattern: r"^[(（](?P<event>[^()（）]+)[)）]$".into(),
            question_number_pattern: r"^\s*(?P<number>\d+)\s*[.．]\s*".into(),
            bill_stages: strings(&["首讀", "二讀", "三讀", "全體委員會審議階段", "恢復二讀辯論"]),
            bill_title_pattern: Some(r"^《[^《》]+》$".into()),
            subsidiary_legislation: strings(&["附屬法例／文書", "附屬法例/文書", "附屬法例"]),
            other_papers: strings(&["其他文件"]),
            paper_number_pattern: r"^第\s*(?P<number>\d+)\s*號\s*[-\x{2013}\x{2014}—]*\s*(?P<title>.*)$"
                .into(),
            legislation_line_pattern: r"^(?P<title>.+?)[\s.]+(?P<number>\d+/\d{4})$".into(),
            legislation_number_pattern: r"^(?:法律公告編號\s*)?\d+/\d{4}$".into(),
            paper_closing_suffixes: strings(&["報告", "帳目", "報表"]),
            registry_code: "c".into(),
        }
    }

    pub fn builtin(language: Language) -> Option<Self> {
        match language {
            Language::English => Some(Self::english()),
            Language::Chinese => Some(Self::chinese()),
            Language::Floor => None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The key a heading marker phrase maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingKey {
    Preamble,
    Title,
    MembersPresent,
    MembersAbsent,
    PublicOfficers,
    Clerks,
}

#[derive(Debug, Clone)]
pub struct LanguageConfig {
    pub language: Language,
    pub(crate) heading_markers: HashMap<String, HeadingKey>,
    pub(crate) clerk_anchors: Vec<String>,
    pub(crate) president: String,
    pub(crate) member_name: Regex,
    pub(crate) clerk: Regex,
    pub(crate) officer_layout: OfficerLayout,
    pub(crate) combined_officer: Option<Regex>,
    pub(crate) sitting_date_formats: Vec<String>,
    pub(crate) sitting_date: Option<Regex>,
    pub(crate) opening: Regex,
    pub(crate) has_case: bool,
    pub(crate) vocabulary: HashMap<String, SectionKind>,
    pub(crate) event: Regex,
    pub(crate) question_number: Regex,
    pub(crate) bill_stages: Vec<String>,
    pub(crate) bill_title: Option<Regex>,
    pub(crate) subsidiary_legislation: Vec<String>,
    pub(crate) other_papers: Vec<String>,
    pub(crate) paper_number: Regex,
    pub(crate) legislation_line: Regex,
    pub(crate) legislation_number: Regex,
    pub(crate) paper_closing_suffixes: Vec<String>,
    pub(crate) registry_code: String,
}

/// Text of a named group; `None` when the group took no part in the match.
pub(crate) fn group<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str())
}

fn compile(
    field: &'static str,
    pattern: &str,
    groups: &[&'static str],
) -> Result<Regex, ConfigError> {
    let regex =
        Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { field, source })?;
    for group in groups {
        if !regex.capture_names().flatten().any(|name| name == *group) {
            return Err(ConfigError::MissingGroup { field, group });
        }
    }
    Ok(regex)
}

impl LanguageConfig {
    pub fn compile(markers: &MarkerSet) -> Result<Self, ConfigError> {
        let mut heading_markers = HashMap::new();
        let marker_groups = [
            (&markers.hansard_title, HeadingKey::Title),
            (&markers.members_present, HeadingKey::MembersPresent),
            (&markers.members_absent, HeadingKey::MembersAbsent),
            (&markers.public_officers, HeadingKey::PublicOfficers),
            (&markers.clerks, HeadingKey::Clerks),
        ];
        for (phrases, key) in marker_groups {
            for phrase in phrases {
                heading_markers.insert(phrase.trim().to_string(), key);
            }
        }

        let combined_officer = markers
            .combined_officer_pattern
            .as_deref()
            .map(|p| compile("combined_officer_pattern", p, &["position", "name"]))
            .transpose()?;
        if markers.officer_layout == OfficerLayout::Combined && combined_officer.is_none() {
            log::warn!(
                "Combined officer layout without a pattern; every officer entry will be flagged"
            );
        }

        Ok(Self {
            language: markers.language,
            heading_markers,
            clerk_anchors: markers.clerks.iter().map(|c| c.trim().to_string()).collect(),
            president: markers.president.clone(),
            member_name: compile("member_name_pattern", &markers.member_name_pattern, &["name"])?,
            clerk: compile("clerk_pattern", &markers.clerk_pattern, &["name", "title"])?,
            officer_layout: markers.officer_layout,
            combined_officer,
            sitting_date_formats: markers.sitting_date_formats.clone(),
            sitting_date: markers
                .sitting_date_pattern
                .as_deref()
                .map(|p| compile("sitting_date_pattern", p, &["year", "month", "day"]))
                .transpose()?,
            opening: compile("opening_pattern", &markers.opening_pattern, &[])?,
            has_case: markers.has_case,
            vocabulary: markers
                .sections
                .iter()
                .map(|h| (h.text.trim().to_string(), h.kind))
                .collect(),
            event: compile("event_pattern", &markers.event_pattern, &["event"])?,
            question_number: compile(
                "question_number_pattern",
                &markers.question_number_pattern,
                &["number"],
            )?,
            bill_stages: markers.bill_stages.iter().map(|s| s.to_lowercase()).collect(),
            bill_title: markers
                .bill_title_pattern
                .as_deref()
                .map(|p| compile("bill_title_pattern", p, &[]))
                .transpose()?,
            subsidiary_legislation: markers
                .subsidiary_legislation
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            other_papers: markers.other_papers.iter().map(|s| s.to_lowercase()).collect(),
            paper_number: compile(
                "paper_number_pattern",
                &markers.paper_number_pattern,
                &["number", "title"],
            )?,
            legislation_line: compile(
                "legislation_line_pattern",
                &markers.legislation_line_pattern,
                &["number", "title"],
            )?,
            legislation_number: compile(
                "legislation_number_pattern",
                &markers.legislation_number_pattern,
                &[],
            )?,
            paper_closing_suffixes: markers.paper_closing_suffixes.clone(),
            registry_code: markers.registry_code.clone(),
        })
    }

    /// The shared built-in configuration, or the unsupported-variant error
    /// for floor records.
    pub fn builtin(language: Language) -> Result<&'static LanguageConfig, ParseError> {
        match language {
            Language::English => Ok(&ENGLISH),
            Language::Chinese => Ok(&CHINESE),
            Language::Floor => Err(ParseError::UnsupportedLanguage(language)),
        }
    }

    pub fn heading_key(&self, text: &str) -> Option<HeadingKey> {
        self.heading_markers.get(text.trim()).copied()
    }

    pub fn is_clerk_anchor(&self, text: &str) -> bool {
        let text = text.trim();
        self.clerk_anchors.iter().any(|anchor| anchor == text)
    }

    /// Membership test against the section header vocabulary.
    pub fn section_kind(&self, text: &str) -> Option<SectionKind> {
        self.vocabulary.get(text.trim()).copied()
    }

    pub fn bill_stage<'a>(&self, text: &'a str) -> Option<&'a str> {
        let lowered = text.to_lowercase();
        self.bill_stages
            .iter()
            .any(|stage| lowered.contains(stage.as_str()))
            .then_some(text.trim())
    }

    pub fn registry_code(&self) -> &str {
        &self.registry_code
    }
}

static ENGLISH: LazyLock<LanguageConfig> = LazyLock::new(|| {
    LanguageConfig::compile(&MarkerSet::english()).expect("invalid built-in English marker set")
});

static CHINESE: LazyLock<LanguageConfig> = LazyLock::new(|| {
    LanguageConfig::compile(&MarkerSet::chinese()).expect("invalid built-in Chinese marker set")
});
