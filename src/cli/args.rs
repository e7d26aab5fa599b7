//! Command-line argument parsing.

use std::path::PathBuf;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Run the authenticator daemon (default)
    Run { config: Option<PathBuf> },
    /// Print the payload of the key on a device
    Read { device: PathBuf },
    /// Write a payload to a device
    Write { device: PathBuf, data: String },
    /// Write a key with a fresh uuid to a device
    Provision { device: PathBuf },
    /// Show version information
    Version,
    /// Show usage
    Help,
}

/// Usage text.
pub const USAGE: &str = "\
Usage:
  idkey-auth [run] [--config <file>]   Run the authenticator
  idkey-auth read <device>             Print the key stored on <device>
  idkey-auth write <device> <data>     Store <data> as the key on <device>
  idkey-auth provision <device>        Store a key with a new uuid on <device>
  idkey-auth --version                 Show version
  idkey-auth --help                    Show this help";

/// Parse command-line arguments (including the program name).
///
/// # Examples
///
/// ```
/// use idkey_auth::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["idkey-auth".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, String>
where
    I: Iterator<Item = String>,
{
    let args: Vec<String> = args.skip(1).collect();
    let Some((first, rest)) = args.split_first() else {
        return Ok(CliCommand::Run { config: None });
    };

    match first.as_str() {
        "--version" | "-V" => Ok(CliCommand::Version),
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "run" => parse_run(rest),
        "--config" | "-c" => parse_run(&args),
        "read" => match rest {
            [device] => Ok(CliCommand::Read {
                device: PathBuf::from(device),
            }),
            [] => Err("too few arguments!".to_string()),
            _ => Err("too many arguments!".to_string()),
        },
        "write" => match rest {
            [device, data] => Ok(CliCommand::Write {
                device: PathBuf::from(device),
                data: data.clone(),
            }),
            [_, _, ..] => Err("too many arguments!".to_string()),
            _ => Err("too few arguments!".to_string()),
        },
        "provision" => match rest {
            [device] => Ok(CliCommand::Provision {
                device: PathBuf::from(device),
            }),
            [] => Err("too few arguments!".to_string()),
            _ => Err("too many arguments!".to_string()),
        },
        other => Err(format!("unknown command '{}'", other)),
    }
}

fn parse_run(args: &[String]) -> Result<CliCommand, String> {
    match args {
        [] => Ok(CliCommand::Run { config: None }),
        [flag, path] if flag == "--config" || flag == "-c" => Ok(CliCommand::Run {
            config: Some(PathBuf::from(path)),
        }),
        [flag] if flag == "--config" || flag == "-c" => {
            Err("--config needs a file argument".to_string())
        }
        _ => Err(format!("unexpected arguments: {}", args.join(" "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, String> {
        let mut full = vec!["idkey-auth".to_string()];
        full.extend(args.iter().map(|s| s.to_string()));
        parse_args(full.into_iter())
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), Ok(CliCommand::Run { config: None }));
    }

    #[test]
    fn test_parse_version_flags() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(parse(&["--help"]), Ok(CliCommand::Help));
        assert_eq!(parse(&["help"]), Ok(CliCommand::Help));
    }

    #[test]
    fn test_parse_run_with_config() {
        let expected = Ok(CliCommand::Run {
            config: Some(PathBuf::from("/etc/idkey.json")),
        });
        assert_eq!(parse(&["run", "--config", "/etc/idkey.json"]), expected);
        assert_eq!(parse(&["-c", "/etc/idkey.json"]), expected);
        assert!(parse(&["run", "--config"]).is_err());
        assert!(parse(&["run", "extra"]).is_err());
    }

    #[test]
    fn test_parse_read() {
        assert_eq!(
            parse(&["read", "/dev/sdb"]),
            Ok(CliCommand::Read {
                device: PathBuf::from("/dev/sdb")
            })
        );
        assert_eq!(parse(&["read"]), Err("too few arguments!".to_string()));
        assert_eq!(
            parse(&["read", "/dev/sdb", "x"]),
            Err("too many arguments!".to_string())
        );
    }

    #[test]
    fn test_parse_write() {
        assert_eq!(
            parse(&["write", "/dev/sdb", r#"{"uuid":"abc"}"#]),
            Ok(CliCommand::Write {
                device: PathBuf::from("/dev/sdb"),
                data: r#"{"uuid":"abc"}"#.to_string()
            })
        );
        assert!(parse(&["write", "/dev/sdb"]).is_err());
        assert!(parse(&["write", "/dev/sdb", "a", "b"]).is_err());
    }

    #[test]
    fn test_parse_provision() {
        assert_eq!(
            parse(&["provision", "/dev/sdb"]),
            Ok(CliCommand::Provision {
                device: PathBuf::from("/dev/sdb")
            })
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!(parse(&["--unknown"]).is_err());
    }
}
