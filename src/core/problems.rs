use crate::core::{Problem, Storage};
use crate::utils::error::{AppError, Result};

/// Parses `question,answer` records. Every record must carry exactly two fields.
pub fn parse_problems(data: &[u8]) -> Result<Vec<Problem>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut problems = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != 2 {
            return Err(AppError::ProblemFormatError {
                record: index + 1,
                message: format!("expected 2 fields, found {}", record.len()),
            });
        }
        problems.push(Problem::new(&record[0], &record[1]));
    }

    tracing::debug!("Parsed {} problems", problems.len());
    Ok(problems)
}

pub async fn load_problems<S: Storage>(storage: &S, path: &str) -> Result<Vec<Problem>> {
    tracing::debug!("Loading problems from: {}", path);
    let data = storage.read_file(path).await?;
    parse_problems(&data)
}
