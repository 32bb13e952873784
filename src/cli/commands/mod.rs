//! CLI command implementations.

mod ask;
mod chapters;
mod config;
mod doctor;
mod quiz;
mod serve;
mod transcript;

pub use ask::run_ask;
pub use chapters::run_chapters;
pub use config::run_config;
pub use doctor::run_doctor;
pub use quiz::run_quiz;
pub use serve::run_serve;
pub use transcript::run_transcript;
