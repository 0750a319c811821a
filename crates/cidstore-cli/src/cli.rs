use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cidstore",
    about = "cidstore — write-once key-value store on SQLite",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Database file
    #[arg(long, global = true, default_value = "cidstore.db")]
    pub db: PathBuf,

    /// Collection (table) name
    #[arg(long, global = true, default_value = "keystore")]
    pub collection: String,

    /// TOML store configuration; overrides --db and --collection
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Give up on an operation that has not started within this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database file and collection
    Init(InitArgs),
    /// Check whether a key exists
    Has(HasArgs),
    /// Print the value stored under a key
    Get(GetArgs),
    /// Store a value under a key unless the key exists
    Put(PutArgs),
    /// Store a file under its content-addressed key
    Add(AddArgs),
    /// Check that a content-addressed value matches its key
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct InitArgs {}

#[derive(Args)]
pub struct HasArgs {
    pub key: String,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// Write the value to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["value", "file"])))]
pub struct PutArgs {
    pub key: String,
    pub value: Option<String>,
    /// Read the value from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddArgs {
    /// File to add, or `-` for stdin
    pub path: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init_defaults() {
        let cli = Cli::try_parse_from(["cidstore", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(_)));
        assert_eq!(cli.db, PathBuf::from("cidstore.db"));
        assert_eq!(cli.collection, "keystore");
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cidstore", "has", "abc", "--db", "/tmp/x.db", "--collection", "blocks",
        ])
        .unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/x.db"));
        assert_eq!(cli.collection, "blocks");
        if let Command::Has(args) = cli.command {
            assert_eq!(args.key, "abc");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_get_with_output() {
        let cli = Cli::try_parse_from(["cidstore", "get", "k", "-o", "out.bin"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.output, Some(PathBuf::from("out.bin")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_put_literal() {
        let cli = Cli::try_parse_from(["cidstore", "put", "testkey", "testvalue"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert_eq!(args.value, Some("testvalue".into()));
            assert!(args.file.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_put_file() {
        let cli = Cli::try_parse_from(["cidstore", "put", "k", "--file", "v.bin"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert_eq!(args.file, Some(PathBuf::from("v.bin")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn put_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["cidstore", "put", "k"]).is_err());
        assert!(Cli::try_parse_from(["cidstore", "put", "k", "v", "--file", "f"]).is_err());
    }

    #[test]
    fn parse_add_stdin() {
        let cli = Cli::try_parse_from(["cidstore", "add", "-"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.path, "-");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_json_and_timeout() {
        let cli = Cli::try_parse_from([
            "cidstore", "--format", "json", "--timeout-ms", "250", "verify", "k",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.timeout_ms, Some(250));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["cidstore", "--verbose", "init"]).unwrap();
        assert!(cli.verbose);
    }
}
