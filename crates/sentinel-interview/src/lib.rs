//! Socratic interview engine: ambiguity detection and clarifying questions.
//!
//! The engine decides whether a node's spec plus free-form description is
//! logically complete enough to generate code, and if not, which high-risk
//! question to ask next. Evaluation is a pure function of node state and the
//! static question library — there is no cached "cleared" flag, so a spec
//! mutation that introduces a new risk trigger re-opens the interview.

mod analyzer;
mod engine;
mod library;
mod question;

pub use analyzer::{analyze_description, DescriptionAnalysis};
pub use engine::{InterviewEngine, InterviewOutcome};
pub use library::QuestionLibrary;
pub use question::{
    Language, PromptText, Question, QuestionCategory, QuestionOption, RiskTrigger,
};
