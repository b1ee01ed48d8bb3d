use crate::core::answers::AnswerFeed;
use crate::core::problems::load_problems;
use crate::core::{ConfigProvider, Problem, QuizOutcome, SessionEnd, Storage};
use crate::utils::error::{AppError, Result};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

/// A timed quiz. One deadline covers the whole session; it is not reset
/// between problems.
#[derive(Debug, Clone)]
pub struct Quiz {
    problems: Vec<Problem>,
    time_limit: Duration,
}

impl Quiz {
    pub fn new(problems: Vec<Problem>, time_limit: Duration) -> Result<Self> {
        if problems.is_empty() {
            return Err(AppError::ConfigError {
                message: "The problem file contains no problems".to_string(),
            });
        }
        Ok(Self {
            problems,
            time_limit,
        })
    }

    pub async fn load<S: Storage, C: ConfigProvider>(storage: &S, config: &C) -> Result<Self> {
        let problems = load_problems(storage, config.problems_file()).await?;
        tracing::info!(
            "Loaded {} problems from {}",
            problems.len(),
            config.problems_file()
        );
        Self::new(problems, config.time_limit())
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Presents every problem in order and scores answers from `answers`
    /// until the problems run out, the deadline passes, or the input closes.
    pub async fn run<W>(&self, mut answers: AnswerFeed, out: &mut W) -> Result<QuizOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        let total = self.problems.len();
        // `None` when the limit does not fit in an `Instant`: the session never times out.
        let deadline = Instant::now().checked_add(self.time_limit);
        let timer = match deadline {
            Some(at) => tokio::time::sleep_until(at),
            None => tokio::time::sleep(self.time_limit),
        };
        tokio::pin!(timer);
        let expired = || deadline.is_some_and(|at| Instant::now() >= at);

        let mut correct = 0;
        for (index, problem) in self.problems.iter().enumerate() {
            out.write_all(format!("Problem #{} {}=", index, problem.question).as_bytes())
                .await?;
            out.flush().await?;

            // A timer whose instant has passed may still be pending until the
            // driver ticks, so the clock is checked directly as well.
            if expired() {
                tracing::debug!("Deadline reached on problem #{}", index);
                return end_session(out, correct, total, SessionEnd::TimedOut).await;
            }

            let event = tokio::select! {
                biased;

                _ = &mut timer => Event::Deadline,
                answer = answers.next_answer() => Event::Answer(answer),
            };

            match event {
                Event::Deadline => {
                    tracing::debug!("Deadline reached on problem #{}", index);
                    return end_session(out, correct, total, SessionEnd::TimedOut).await;
                }
                // Late answers are discarded, never scored.
                Event::Answer(_) if expired() => {
                    tracing::debug!("Answer to problem #{} arrived after the deadline", index);
                    return end_session(out, correct, total, SessionEnd::TimedOut).await;
                }
                Event::Answer(Some(answer)) => {
                    if problem.is_correct(&answer) {
                        correct += 1;
                    }
                    tracing::debug!(
                        "Problem #{} answered, {} correct so far",
                        index,
                        correct
                    );
                }
                Event::Answer(None) => {
                    tracing::warn!("Input closed while waiting on problem #{}", index);
                    return end_session(out, correct, total, SessionEnd::InputClosed).await;
                }
            }
        }

        end_session(out, correct, total, SessionEnd::Completed).await
    }
}

enum Event {
    Deadline,
    Answer(Option<String>),
}

async fn end_session<W>(
    out: &mut W,
    correct: usize,
    total: usize,
    end: SessionEnd,
) -> Result<QuizOutcome>
where
    W: AsyncWrite + Unpin,
{
    let outcome = QuizOutcome {
        correct,
        total,
        end,
    };
    let notice = match end {
        SessionEnd::Completed => "",
        SessionEnd::TimedOut => "\nTime's up!\n",
        SessionEnd::InputClosed => "\nInput closed.\n",
    };
    finish(out, notice, &outcome).await?;
    Ok(outcome)
}

async fn finish<W>(out: &mut W, notice: &str, outcome: &QuizOutcome) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(format!("{}{}\n", notice, outcome.summary()).as_bytes())
        .await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn arithmetic() -> Vec<Problem> {
        vec![
            Problem::new("5+5", "10"),
            Problem::new("7+3", "10"),
            Problem::new("1+1", "2"),
        ]
    }

    fn feed(input: &'static [u8]) -> AnswerFeed {
        AnswerFeed::spawn(BufReader::new(input))
    }

    #[test]
    fn test_empty_problem_set_is_rejected() {
        assert!(Quiz::new(vec![], Duration::from_secs(10)).is_err());
    }

    #[tokio::test]
    async fn test_all_correct_answers_score_full_marks() {
        let quiz = Quiz::new(arithmetic(), Duration::from_secs(30)).unwrap();
        let mut out = Vec::new();

        let outcome = quiz.run(feed(b"10\n10\n2\n"), &mut out).await.unwrap();

        assert_eq!(outcome.correct, 3);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.end, SessionEnd::Completed);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Problem #0 5+5=Problem #1 7+3=Problem #2 1+1=You've got 3 right out of 3.\n"
        );
    }

    #[tokio::test]
    async fn test_whitespace_around_answers_is_ignored() {
        let quiz = Quiz::new(arithmetic(), Duration::from_secs(30)).unwrap();
        let mut out = Vec::new();

        let outcome = quiz
            .run(feed(b"  10 \r\n\t10\n2   \n"), &mut out)
            .await
            .unwrap();

        assert_eq!(outcome.correct, 3);
    }

    #[tokio::test]
    async fn test_wrong_answers_are_not_counted() {
        let quiz = Quiz::new(arithmetic(), Duration::from_secs(30)).unwrap();
        let mut out = Vec::new();

        let outcome = quiz.run(feed(b"10\nten\n3\n"), &mut out).await.unwrap();

        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.end, SessionEnd::Completed);
    }

    #[tokio::test]
    async fn test_deadline_before_any_input_scores_zero() {
        let quiz = Quiz::new(arithmetic(), Duration::ZERO).unwrap();
        let (_writer, reader) = tokio::io::duplex(64);
        let mut out = Vec::new();

        let outcome = quiz
            .run(AnswerFeed::spawn(BufReader::new(reader)), &mut out)
            .await
            .unwrap();

        assert_eq!(outcome.correct, 0);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.end, SessionEnd::TimedOut);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Problem #0 5+5=\nTime's up!\nYou've got 0 right out of 3.\n"
        );
    }

    #[tokio::test]
    async fn test_deadline_spans_the_whole_session() {
        let quiz = Quiz::new(arithmetic(), Duration::from_millis(300)).unwrap();
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut out = Vec::new();

        let answering = tokio::spawn(async move {
            writer.write_all(b"10\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            writer.write_all(b"10\n").await.unwrap();
            // Never answers the third problem; keep the stream open.
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(writer);
        });

        let outcome = quiz
            .run(AnswerFeed::spawn(BufReader::new(reader)), &mut out)
            .await
            .unwrap();
        answering.abort();

        assert_eq!(outcome.correct, 2);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.end, SessionEnd::TimedOut);
        assert!(String::from_utf8(out)
            .unwrap()
            .ends_with("Problem #2 1+1=\nTime's up!\nYou've got 2 right out of 3.\n"));
    }

    #[tokio::test]
    async fn test_queued_answer_loses_to_elapsed_deadline() {
        let quiz = Quiz::new(vec![Problem::new("1+1", "2")], Duration::ZERO).unwrap();
        let answers = feed(b"2\n");
        // Give the reader time to queue the line before the session starts.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let mut out = Vec::new();

        let outcome = quiz.run(answers, &mut out).await.unwrap();

        assert_eq!(outcome.correct, 0);
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.end, SessionEnd::TimedOut);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Problem #0 1+1=\nTime's up!\nYou've got 0 right out of 1.\n"
        );
    }

    #[tokio::test]
    async fn test_huge_time_limit_does_not_overflow() {
        let quiz = Quiz::new(
            vec![Problem::new("1+1", "2")],
            Duration::from_secs(u64::MAX),
        )
        .unwrap();
        let mut out = Vec::new();

        let outcome = quiz.run(feed(b"2\n"), &mut out).await.unwrap();

        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.end, SessionEnd::Completed);
    }

    #[tokio::test]
    async fn test_closed_input_ends_session_with_partial_tally() {
        let quiz = Quiz::new(arithmetic(), Duration::from_secs(30)).unwrap();
        let mut out = Vec::new();

        let outcome = quiz.run(feed(b"10\n"), &mut out).await.unwrap();

        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.end, SessionEnd::InputClosed);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Problem #0 5+5=Problem #1 7+3=\nInput closed.\nYou've got 1 right out of 3.\n"
        );
    }

    #[tokio::test]
    async fn test_problems_presented_in_file_order() {
        let problems = crate::core::problems::parse_problems(b"b,1\na,2\nc,3\n").unwrap();
        let quiz = Quiz::new(problems, Duration::from_secs(30)).unwrap();
        let mut out = Vec::new();

        quiz.run(feed(b"1\n2\n3\n"), &mut out).await.unwrap();

        let transcript = String::from_utf8(out).unwrap();
        let b = transcript.find("Problem #0 b=").unwrap();
        let a = transcript.find("Problem #1 a=").unwrap();
        let c = transcript.find("Problem #2 c=").unwrap();
        assert!(b < a && a < c);
    }
}
