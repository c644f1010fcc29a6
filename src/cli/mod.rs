//! Command-line interface definitions for memedit.
//!
//! Uses `clap` derive macros for the startup arguments and a small
//! hand-written grammar for the interactive commands read from stdin.

use crate::config::DEFAULT_CONFIG_FILE;
use crate::core::types::{parse_address, Address, DataType, MemoryError, MemoryResult, ScanValue};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Scan and edit the memory of a running process.
#[derive(Parser, Debug)]
#[command(name = "memedit")]
#[command(version)]
#[command(about = "Find and change numeric values in a running process", long_about = None)]
pub struct Args {
    /// Id of the process to attach to
    #[arg(value_name = "PID")]
    pub pid: u32,

    /// Name shown for the process (looked up from the system when omitted)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Data type for the first scan (overrides the configured default)
    #[arg(short = 't', long = "type", value_enum)]
    pub data_type: Option<TypeArg>,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log filter, e.g. "debug" or "memedit=trace" (overrides the config)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// Data types selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    /// 4-byte signed integer
    Int,
    /// 4-byte float
    Float,
}

impl From<TypeArg> for DataType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Int => DataType::Int32,
            TypeArg::Float => DataType::Float32,
        }
    }
}

/// Where a `set` command writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetTarget {
    /// Position in the last displayed result list
    Index(usize),
    /// Explicit address
    Address(Address),
}

/// One interactive command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    First(ScanValue),
    Next(ScanValue),
    SetType(DataType),
    Set { target: SetTarget, value: ScanValue },
    List,
    Reset,
    Cancel,
    Help,
    Quit,
}

/// Usage text for the interactive prompt.
pub const HELP: &str = "\
commands:
  first <value>          scan all modules for <value>
  next <value>           keep candidates that now hold <value>
  set #<n> <value>       write <value> to row <n> of the last results
  set <address> <value>  write <value> to <address>
  type int|float         switch data type (resets the scan)
  list                   show the last results again
  reset                  forget all candidates
  cancel                 stop the running scan
  help                   show this text
  quit                   detach and exit";

impl Command {
    /// Parse one input line; values are read as `data_type`.
    ///
    /// Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str, data_type: DataType) -> MemoryResult<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("first" | "f", [value]) => Command::First(ScanValue::parse(value, data_type)?),
            ("next" | "n", [value]) => Command::Next(ScanValue::parse(value, data_type)?),
            ("type" | "t", [name]) => Command::SetType(name.parse()?),
            ("set" | "s", [target, value]) => Command::Set {
                target: parse_target(target)?,
                value: ScanValue::parse(value, data_type)?,
            },
            ("list" | "l", []) => Command::List,
            ("reset", []) => Command::Reset,
            ("cancel" | "c", []) => Command::Cancel,
            ("help" | "h" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            (other, _) => {
                return Err(MemoryError::InvalidValue(format!(
                    "cannot understand '{}' with {} argument(s), try 'help'",
                    other,
                    args.len()
                )))
            }
        };
        Ok(Some(command))
    }
}

fn parse_target(text: &str) -> MemoryResult<SetTarget> {
    match text.strip_prefix('#') {
        Some(index) => index
            .parse()
            .map(SetTarget::Index)
            .map_err(|_| MemoryError::InvalidValue(format!("invalid row number '{}'", index))),
        None => parse_address(text).map(SetTarget::Address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> Command {
        Command::parse(line, DataType::Int32).unwrap().unwrap()
    }

    #[test]
    fn test_parse_scans() {
        assert_eq!(parse("first 100"), Command::First(ScanValue::Int32(100)));
        assert_eq!(parse("  N  -5 "), Command::Next(ScanValue::Int32(-5)));
        assert_eq!(
            Command::parse("first 1.5", DataType::Float32).unwrap(),
            Some(Command::First(ScanValue::Float32(1.5)))
        );
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse("set #3 999"),
            Command::Set {
                target: SetTarget::Index(3),
                value: ScanValue::Int32(999)
            }
        );
        assert_eq!(
            parse("set 0x7FF6A000 1"),
            Command::Set {
                target: SetTarget::Address(Address::new(0x7FF6A000)),
                value: ScanValue::Int32(1)
            }
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("type float"), Command::SetType(DataType::Float32));
        assert_eq!(parse("list"), Command::List);
        assert_eq!(parse("reset"), Command::Reset);
        assert_eq!(parse("cancel"), Command::Cancel);
        assert_eq!(parse("?"), Command::Help);
        assert_eq!(parse("exit"), Command::Quit);
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(Command::parse("   ", DataType::Int32).unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("first", DataType::Int32).is_err());
        assert!(Command::parse("first abc", DataType::Int32).is_err());
        assert!(Command::parse("first 1.5", DataType::Int32).is_err());
        assert!(Command::parse("set #x 1", DataType::Int32).is_err());
        assert!(Command::parse("set 0 1", DataType::Int32).is_err());
        assert!(Command::parse("type double", DataType::Int32).is_err());
        assert!(Command::parse("frobnicate", DataType::Int32).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["memedit", "4242", "--type", "float", "-n", "game"]);
        assert_eq!(args.pid, 4242);
        assert_eq!(args.name.as_deref(), Some("game"));
        assert_eq!(args.data_type.map(DataType::from), Some(DataType::Float32));
        assert_eq!(args.config, PathBuf::from("memedit.toml"));
        assert!(args.log_level.is_none());
    }
}
