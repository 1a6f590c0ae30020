mod models;
mod open;
mod write;

pub use models::*;
pub use open::{ReportFiles, CSV_LOG, ERROR_LOG, PLAINTEXT_LIST, REDIRECT_LIST, WARNINGS_LOG};
