//! Version command.

/// Crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line printed by `--version`.
pub fn version_line() -> String {
    format!("idkey-auth {}", VERSION)
}

/// Handle the --version command.
pub fn handle_version_command() -> i32 {
    println!("{}", version_line());
    0
}
