use clap::Parser;
use small_tools::utils::{logger, validation::Validate};
use small_tools::{AnswerFeed, AppError, LocalStorage, Quiz, QuizConfig, SessionEnd};

#[tokio::main]
async fn main() {
    let config = QuizConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);
    tracing::debug!("Quiz config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let storage = LocalStorage::default();
    let quiz = match Quiz::load(&storage, &config).await {
        Ok(quiz) => quiz,
        Err(e) => {
            tracing::error!("Failed to load problems from {}: {}", config.file, e);
            if let AppError::IoError(_) = e {
                eprintln!("❌ Failed to open file: {}", config.file);
            }
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let mut stdout = tokio::io::stdout();
    match quiz.run(AnswerFeed::stdin(), &mut stdout).await {
        Ok(outcome) => {
            tracing::info!(
                "Quiz finished ({:?}): {}/{}",
                outcome.end,
                outcome.correct,
                outcome.total
            );
            if outcome.end == SessionEnd::InputClosed {
                tracing::warn!("Input closed before the quiz was finished");
            }
        }
        Err(e) => {
            tracing::error!("Quiz aborted: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }

    // The stdin reader thread may still be blocked on a read.
    std::process::exit(0);
}
