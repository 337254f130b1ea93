//! Question numbers to questions, and questions to an external registry.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::config::LanguageConfig;
use crate::types::{Hansard, Question, QuestionEntry, QuestionKind, QuestionMap};

/// Prefix of the registry keys for questions.
pub const QUESTION_PREFIX: &str = "question";

/// Groups the questions by number. A number shared by several questions (an
/// urgent question numbered like an ordinary one) maps to all of them in
/// document order. Unnumbered questions are left out.
pub fn build_question_map(questions: &[Question]) -> QuestionMap {
    let mut map = QuestionMap::new();
    for question in questions {
        let Some(number) = &question.number else {
            log::debug!("Question '{}' has no number; not indexed", question.title);
            continue;
        };
        match map.get_mut(number) {
            Some(entry) => entry.push(question.clone()),
            None => {
                map.insert(number.clone(), QuestionEntry::Single(question.clone()));
            }
        }
    }
    map
}

/// A store of question records keyed by composite question id.
pub trait QuestionRegistry {
    type Record;

    fn get(&self, uid: &str) -> Option<Self::Record>;
}

impl<R: Clone> QuestionRegistry for HashMap<String, R> {
    type Record = R;

    fn get(&self, uid: &str) -> Option<R> {
        HashMap::get(self, uid).cloned()
    }
}

/// Builds registry keys for the questions of one sitting.
#[derive(Debug, Clone)]
pub struct QuestionIndexer<'a> {
    prefix: &'a str,
    date: NaiveDate,
    code: &'a str,
}

impl<'a> QuestionIndexer<'a> {
    pub fn new(date: NaiveDate, config: &'a LanguageConfig) -> Self {
        Self {
            prefix: QUESTION_PREFIX,
            date,
            code: config.registry_code(),
        }
    }

    /// Indexer for a parsed Hansard, when its session date is in a known
    /// format.
    pub fn for_hansard(hansard: &Hansard, config: &'a LanguageConfig) -> Option<Self> {
        hansard.session_day().map(|date| Self::new(date, config))
    }

    pub fn ordinary_key(&self, number: &str) -> String {
        format!(
            "{}-{}-{}-{}",
            self.prefix,
            self.date.format("%Y%m%d"),
            number,
            self.code
        )
    }

    pub fn urgent_key(&self, number: &str) -> String {
        format!(
            "{}-{}-u{}-{}",
            self.prefix,
            self.date.format("%Y%m%d"),
            number,
            self.code
        )
    }

    /// Looks the number up as an ordinary question, then as an urgent one.
    pub fn lookup<R: QuestionRegistry + ?Sized>(
        &self,
        registry: &R,
        number: &str,
    ) -> Option<R::Record> {
        let ordinary = self.ordinary_key(number);
        if let Some(record) = registry.get(&ordinary) {
            return Some(record);
        }
        let urgent = self.urgent_key(number);
        let found = registry.get(&urgent);
        if found.is_none() {
            log::warn!("No registry record for '{}' or '{}'", ordinary, urgent);
        }
        found
    }

    /// Looks a question up by its number. An urgent question tries its urgent
    /// key before the ordinary one, the reverse of [`Self::lookup`], so an
    /// urgent question sharing a number with an ordinary one finds its own
    /// record. Other questions go through [`Self::lookup`] unchanged.
    pub fn lookup_question<R: QuestionRegistry + ?Sized>(
        &self,
        registry: &R,
        question: &Question,
    ) -> Option<R::Record> {
        let number = question.number.as_deref()?;
        if question.kind == QuestionKind::Urgent
            && let Some(record) = registry.get(&self.urgent_key(number))
        {
            return Some(record);
        }
        self.lookup(registry, number)
    }

    /// One lookup per question of each number, in map order.
    pub fn index<R: QuestionRegistry + ?Sized>(
        &self,
        map: &QuestionMap,
        registry: &R,
    ) -> BTreeMap<String, Vec<Option<R::Record>>> {
        map.iter()
            .map(|(number, entry)| {
                let records = entry
                    .questions()
                    .iter()
                    .map(|question| self.lookup_question(registry, question))
                    .collect();
                (number.clone(), records)
            })
            .collect()
    }
}
