use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hashmesh",
    about = "Resolve content-addressed objects across several backends",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, default_value = "hashmesh.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve an object through the cache and the configured backends
    Get(GetArgs),
    /// Create an object on one backend and replicate it to the others
    Create(CreateArgs),
    /// Resolve an object remotely and show which backends are known to hold it
    Sources(SourcesArgs),
    /// List configured backends
    Backends,
}

#[derive(Args)]
pub struct GetArgs {
    pub hash: String,
}

#[derive(Args)]
pub struct CreateArgs {
    /// JSON file holding the payload
    pub file: PathBuf,
    /// Backend that assigns the hash
    #[arg(short, long)]
    pub target: Option<String>,
    /// Seconds to wait for replication reports
    #[arg(long, default_value = "5")]
    pub wait: u64,
}

#[derive(Args)]
pub struct SourcesArgs {
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get() {
        let cli = Cli::try_parse_from(["hashmesh", "get", "abc"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.hash, "abc");
        } else {
            panic!("wrong command");
        }
        assert_eq!(cli.config, PathBuf::from("hashmesh.toml"));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_create_with_target() {
        let cli = Cli::try_parse_from([
            "hashmesh", "create", "node.json", "--target", "local", "--wait", "1",
        ])
        .unwrap();
        if let Command::Create(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("node.json"));
            assert_eq!(args.target.as_deref(), Some("local"));
            assert_eq!(args.wait, 1);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hashmesh", "sources", "h", "-c", "alt.toml", "-v", "--format", "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Command::Sources(_)));
    }

    #[test]
    fn parse_backends() {
        let cli = Cli::try_parse_from(["hashmesh", "backends"]).unwrap();
        assert!(matches!(cli.command, Command::Backends));
    }

    #[test]
    fn missing_hash_is_error() {
        assert!(Cli::try_parse_from(["hashmesh", "get"]).is_err());
    }
}
