pub mod cli;
pub mod server;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "quiz")]
#[command(about = "A timed quiz read from a question,answer CSV file")]
pub struct QuizConfig {
    /// Path to a CSV file of question,answer records
    #[arg(long, default_value = "problems.csv")]
    pub file: String,

    /// Time limit for the whole quiz, in seconds
    #[arg(long, default_value = "10")]
    pub limit: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for QuizConfig {
    fn problems_file(&self) -> &str {
        &self.file
    }

    fn time_limit(&self) -> Duration {
        Duration::from_secs(self.limit)
    }
}

impl Validate for QuizConfig {
    fn validate(&self) -> Result<()> {
        validate_path("file", &self.file)?;
        validate_positive_number("limit", self.limit, 1)?;
        Ok(())
    }
}
