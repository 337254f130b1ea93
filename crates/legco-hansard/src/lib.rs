//! Segmentation and dialogue extraction for Legislative Council Hansards.
//!
//! [`Hansard::parse`] takes the cleaned HTML of a translated (English or
//! Chinese) Hansard and returns the attendance, the sections of the sitting
//! and the spoken turns within them.

pub mod block;
pub mod config;
pub mod index;
mod normalize;
mod parser;
pub mod region;
pub mod types;
pub mod utils;

pub use config::{ConfigError, LanguageConfig, MarkerSet};
pub use index::{QuestionIndexer, QuestionRegistry, build_question_map};
pub use normalize::canonicalize;
pub use parser::{MissingNamePolicy, ParseError, ParseOptions, split_dialogue, split_sections};
pub use types::{Hansard, Language};
