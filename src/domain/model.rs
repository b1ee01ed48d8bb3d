use serde::{Deserialize, Serialize};

/// One question/answer pair, trimmed at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub question: String,
    pub answer: String,
}

impl Problem {
    pub fn new(question: &str, answer: &str) -> Self {
        Self {
            question: question.trim().to_string(),
            answer: answer.trim().to_string(),
        }
    }

    /// Exact comparison after trimming the submitted answer.
    pub fn is_correct(&self, submitted: &str) -> bool {
        submitted.trim() == self.answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    TimedOut,
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub correct: usize,
    pub total: usize,
    pub end: SessionEnd,
}

impl QuizOutcome {
    pub fn summary(&self) -> String {
        format!("You've got {} right out of {}.", self.correct, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub path: String,
    pub url: String,
}
