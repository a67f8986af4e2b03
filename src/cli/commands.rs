use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tl", about = concat!("tasklink v", env!("CARGO_PKG_VERSION"), " - keep note tasks in sync with your daily note"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different vault directory
    #[arg(short = 'C', long = "vault-dir", global = true)]
    pub vault_dir: Option<String>,

    /// Config file (default: <vault>/.tasklink.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Use this document as the aggregator instead of today's daily note
    #[arg(long, global = true)]
    pub aggregator: Option<String>,

    /// Log more (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .tasklink.toml into the vault
    Init(InitArgs),
    /// List prioritized open tasks that would be aggregated
    Scan(ScanArgs),
    /// Run one full sync pass and exit
    Sync,
    /// Watch the vault and keep tasks in sync until interrupted
    Watch,
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Scan a single document (vault-relative) instead of the whole vault
    #[arg(long)]
    pub file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tl", "sync", "-C", "vault", "--aggregator", "today.md", "--json"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Sync));
        assert_eq!(cli.vault_dir.as_deref(), Some("vault"));
        assert_eq!(cli.aggregator.as_deref(), Some("today.md"));
        assert!(cli.json);
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["tl", "-vv", "watch"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["tl"]).is_err());
    }
}
