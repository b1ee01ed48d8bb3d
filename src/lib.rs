pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use config::{cli::LocalStorage, server::RedirectArgs, server::ServerConfig, QuizConfig};
pub use core::{
    answers::AnswerFeed,
    handlers::{chain_handlers, DefaultHandler, RedirectHandler},
    quiz::Quiz,
    routes::{RouteFormat, RouteTable},
};
pub use domain::model::{Problem, QuizOutcome, RouteRecord, SessionEnd};
pub use domain::ports::Handler;
pub use utils::error::{AppError, Result};
