#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod progress;
pub mod session;
pub mod settings;

pub use error::AppError;
pub use session::Session;
pub use settings::Settings;
