// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, StrategyType};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Parses the command-line arguments and returns a `CliArgs` struct with the
/// parsed values. If parsing fails (invalid arguments, missing required
/// arguments, or --help flag), clap displays an error message or help text
/// and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
