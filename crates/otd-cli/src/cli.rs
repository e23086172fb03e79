use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "otd",
    about = "One-time download codes: issue and redeem single-use codes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Issue a new code directly against a filesystem bucket
    Issue(IssueArgs),
    /// Redeem a code directly against a filesystem bucket
    Redeem(RedeemArgs),
    /// Show the code bank of a namespace, or list namespaces when none is given
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Bucket name (overrides the config file and environment)
    #[arg(long)]
    pub bucket: Option<String>,
    /// Store buckets under this directory instead of in memory
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// Location of a filesystem bucket.
#[derive(Args, Clone, Debug)]
pub struct BucketArgs {
    /// Directory holding buckets
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    /// Bucket name
    #[arg(long, env = "download_bucket")]
    pub bucket: String,
}

#[derive(Args)]
pub struct IssueArgs {
    pub namespace: String,
    #[command(flatten)]
    pub bucket: BucketArgs,
}

#[derive(Args)]
pub struct RedeemArgs {
    pub namespace: String,
    pub code: String,
    #[command(flatten)]
    pub bucket: BucketArgs,
}

#[derive(Args)]
pub struct InspectArgs {
    pub namespace: Option<String>,
    #[command(flatten)]
    pub bucket: BucketArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["otd", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.config.is_none());
            assert!(args.bind.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "otd", "serve", "--bind", "0.0.0.0:9000", "--bucket", "downloads", "--root", "/srv",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:9000".parse().unwrap()));
            assert_eq!(args.bucket.as_deref(), Some("downloads"));
            assert_eq!(args.root, Some(PathBuf::from("/srv")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_issue() {
        let cli = Cli::try_parse_from(["otd", "issue", "offline", "--bucket", "b", "--root", "/tmp"])
            .unwrap();
        if let Command::Issue(args) = cli.command {
            assert_eq!(args.namespace, "offline");
            assert_eq!(args.bucket.bucket, "b");
            assert_eq!(args.bucket.root, PathBuf::from("/tmp"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_redeem() {
        let cli = Cli::try_parse_from(["otd", "redeem", "offline", "CODE", "--bucket", "b"]).unwrap();
        if let Command::Redeem(args) = cli.command {
            assert_eq!(args.code, "CODE");
            assert_eq!(args.bucket.root, PathBuf::from("."));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_inspect_json() {
        let cli = Cli::try_parse_from(["otd", "--format", "json", "inspect", "v1", "--bucket", "b"])
            .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Command::Inspect(_)));
    }

    #[test]
    fn parse_inspect_without_namespace() {
        let cli = Cli::try_parse_from(["otd", "inspect", "--bucket", "b"]).unwrap();
        if let Command::Inspect(args) = cli.command {
            assert!(args.namespace.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn bucket_falls_back_to_env() {
        let _guard = crate::ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("download_bucket", "from-env");
        let from_env = Cli::try_parse_from(["otd", "issue", "offline"]);
        let flag_wins = Cli::try_parse_from(["otd", "issue", "offline", "--bucket", "flag"]);
        std::env::remove_var("download_bucket");
        let missing = Cli::try_parse_from(["otd", "issue", "offline"]);

        match from_env.unwrap().command {
            Command::Issue(args) => assert_eq!(args.bucket.bucket, "from-env"),
            _ => panic!("wrong command"),
        }
        match flag_wins.unwrap().command {
            Command::Issue(args) => assert_eq!(args.bucket.bucket, "flag"),
            _ => panic!("wrong command"),
        }
        assert!(missing.is_err());
    }

    #[test]
    fn bad_bind_address_rejected() {
        assert!(Cli::try_parse_from(["otd", "serve", "--bind", "nowhere"]).is_err());
    }
}
