pub mod answers;
pub mod handlers;
pub mod problems;
pub mod quiz;
pub mod routes;

pub use crate::domain::model::{Problem, QuizOutcome, RouteRecord, SessionEnd};
pub use crate::domain::ports::{ConfigProvider, Handler, Storage};
pub use crate::utils::error::Result;
