use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::ParseError;
use crate::types::{Hansard, IssueKind};

static RE_NAME_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8})").expect("invalid regex: name date"));

/// The `yyyymmdd` session date embedded in a Hansard file name such as
/// `cm20121010-translate-e.htm`.
pub fn session_date_from_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    RE_NAME_DATE
        .captures(stem)
        .map(|caps| caps[1].to_string())
}

#[derive(Debug, Default)]
pub struct ParseStats {
    pub documents: usize,
    pub failures: usize,
    pub clean: usize,
    pub questions: usize,
    pub issues: BTreeMap<IssueKind, usize>,
}

impl ParseStats {
    pub fn record(&mut self, result: &Result<Hansard, ParseError>) {
        self.documents += 1;
        match result {
            Ok(hansard) => {
                if hansard.error_count() == 0 {
                    self.clean += 1;
                }
                self.questions += hansard.questions.len();
                for issue in &hansard.issues {
                    *self.issues.entry(issue.kind).or_default() += 1;
                }
            }
            Err(_) => self.failures += 1,
        }
    }

    pub fn total_issues(&self) -> usize {
        self.issues.values().sum()
    }
}

impl std::fmt::Display for ParseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Documents:        {}", self.documents)?;
        writeln!(f, "  Failed:           {}", self.failures)?;
        writeln!(f, "  Without issues:   {}", self.clean)?;
        writeln!(f, "  Questions:        {}", self.questions)?;
        writeln!(f, "  Issues:           {}", self.total_issues())?;
        for (kind, count) in &self.issues {
            writeln!(f, "    {:<16}{}", format!("{:?}", kind), count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    #[test]
    fn test_session_date_from_name() {
        assert_eq!(
            session_date_from_name(Path::new("hansards/cm20121010-translate-e.htm")),
            Some("20121010".to_string())
        );
        assert_eq!(session_date_from_name(Path::new("notes.htm")), None);
    }

    #[test]
    fn test_stats_count_failures_and_issues() {
        let mut stats = ParseStats::default();
        stats.record(&Hansard::parse(
            "cm",
            Language::Floor,
            "20121010",
            "<p>x</p>",
        ));
        stats.record(&Hansard::parse(
            "cm",
            Language::English,
            "20121010",
            "<p>x</p>",
        ));

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.clean, 0);
        assert_eq!(stats.issues.get(&IssueKind::MissingMarker), Some(&2));
    }
}
