pub mod flags;
pub mod settings;

pub use flags::{run_command, CommandOutcome};
