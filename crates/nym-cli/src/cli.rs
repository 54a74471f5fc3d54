use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nym",
    about = "NYM ledger: append identity updates and resolve them at any point in history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger WAL file. Overrides `log_path` from the config file.
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Node configuration (TOML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Append a NYM update
    Append(AppendArgs),
    /// Resolve a NYM, optionally as of a seqNo or a timestamp
    Get(GetArgs),
    /// Show every update of a NYM with its effective state
    History(HistoryArgs),
    /// Verify ledger integrity
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct AppendArgs {
    /// Author DID
    #[arg(long)]
    pub identifier: Option<String>,
    /// Subject DID
    #[arg(long)]
    pub dest: Option<String>,
    #[arg(long)]
    pub verkey: Option<String>,
    /// Role name or code
    #[arg(long, conflicts_with = "clear_role")]
    pub role: Option<String>,
    #[arg(long)]
    pub clear_role: bool,
    /// Encoded DID document, stored verbatim
    #[arg(long)]
    pub diddoc: Option<String>,
    #[arg(long)]
    pub nym_version: Option<u8>,
    /// Whole update as JSON instead of the individual flags
    #[arg(long, conflicts_with_all = ["identifier", "dest", "verkey", "role", "clear_role", "diddoc", "nym_version"])]
    pub json: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub dest: String,
    /// Requester DID, defaults to `dest`
    #[arg(long)]
    pub identifier: Option<String>,
    #[arg(long)]
    pub seq_no: Option<u64>,
    /// Unix seconds
    #[arg(long)]
    pub timestamp: Option<u64>,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub dest: String,
}

#[derive(Args)]
pub struct VerifyArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_append_flags() {
        let cli = Cli::try_parse_from([
            "nym", "append", "--identifier", "a", "--dest", "b", "--verkey", "~v", "--role", "endorser",
        ])
        .unwrap();
        if let Command::Append(args) = cli.command {
            assert_eq!(args.dest.as_deref(), Some("b"));
            assert_eq!(args.role.as_deref(), Some("endorser"));
            assert!(!args.clear_role);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn role_conflicts_with_clear_role() {
        assert!(Cli::try_parse_from(["nym", "append", "--role", "0", "--clear-role"]).is_err());
    }

    #[test]
    fn json_conflicts_with_flags() {
        assert!(Cli::try_parse_from(["nym", "append", "--json", "{}", "--dest", "b"]).is_err());
    }

    #[test]
    fn parse_get_accepts_both_bounds() {
        // Rejecting both bounds is the ledger's job, so the CLI lets it through.
        let cli =
            Cli::try_parse_from(["nym", "get", "dest", "--seq-no", "10", "--timestamp", "100"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.seq_no, Some(10));
            assert_eq!(args.timestamp, Some(100));
            assert!(args.identifier.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "nym", "verify", "--log", "/tmp/nym.wal", "--format", "json", "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
        assert_eq!(cli.log, Some(PathBuf::from("/tmp/nym.wal")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_history() {
        let cli = Cli::try_parse_from(["nym", "history", "dest"]).unwrap();
        assert!(matches!(cli.command, Command::History(HistoryArgs { dest }) if dest == "dest"));
    }
}
