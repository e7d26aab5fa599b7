//! CLI module.
//!
//! - Argument parsing
//! - Version and help display
//! - Identity key tool commands (read, write, provision)
//!
//! # Usage
//!
//! ```ignore
//! use idkey_auth::cli::{parse_args, run_cli_command, CliCommand};
//!
//! let command = parse_args(std::env::args())?;
//! if let Some(code) = run_cli_command(&command) {
//!     std::process::exit(code);
//! }
//! // CliCommand::Run: start the daemon
//! ```

pub mod args;
pub mod keytool;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use keytool::{provision_command, read_command, write_command, KeyToolError};
pub use version::{handle_version_command, VERSION};

/// Run a one-shot CLI command.
///
/// Returns `None` for [`CliCommand::Run`], otherwise the process exit code.
pub fn run_cli_command(command: &CliCommand) -> Option<i32> {
    match command {
        CliCommand::Run { .. } => None,
        CliCommand::Version => Some(handle_version_command()),
        CliCommand::Help => {
            println!("{}", USAGE);
            Some(keytool::EXIT_SUCCESS)
        }
        CliCommand::Read { device } => Some(keytool::report(read_command(device))),
        CliCommand::Write { device, data } => {
            Some(keytool::report(write_command(device, data).map(|()| "")))
        }
        CliCommand::Provision { device } => Some(keytool::report(provision_command(device))),
    }
}
