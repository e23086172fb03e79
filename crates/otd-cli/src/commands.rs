use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use otd_bank::{Code, CodeBank, CodeBankRepository, CodeLifecycle, Namespace, Redemption};
use otd_server::{OtdServer, ServerConfig, StoreBackend};
use otd_store::FsBlobStore;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Issue(args) => cmd_issue(args, &cli.format),
        Command::Redeem(args) => cmd_redeem(args, &cli.format),
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = serve_config(args)?;
    let runtime = tokio::runtime::Runtime::new().context("could not start async runtime")?;
    runtime.block_on(OtdServer::new(config).serve())?;
    Ok(())
}

/// Config file, then environment, then flags.
fn serve_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    }
    .with_env_overrides();

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(bucket) = args.bucket {
        config.download_bucket = Some(bucket);
    }
    if let Some(root) = args.root {
        config.backend = StoreBackend::Filesystem { root };
    }
    tracing::debug!(?config, "resolved server configuration");
    Ok(config)
}

fn lifecycle_for(bucket: &BucketArgs, create: bool) -> anyhow::Result<CodeLifecycle> {
    otd_store::validate_key(&bucket.bucket).context("invalid bucket name")?;
    let dir = bucket.root.join(&bucket.bucket);
    let store = if create {
        FsBlobStore::create(&dir)
    } else {
        FsBlobStore::open(&dir)
    }
    .with_context(|| format!("could not open bucket {}", dir.display()))?;
    Ok(CodeLifecycle::new(CodeBankRepository::new(Arc::new(store))))
}

fn issue(args: &IssueArgs) -> anyhow::Result<Code> {
    let namespace = Namespace::parse(&args.namespace)?;
    let lifecycle = lifecycle_for(&args.bucket, true)?;
    Ok(lifecycle.issue_code(&namespace)?)
}

fn redeem(args: &RedeemArgs) -> anyhow::Result<Redemption> {
    let namespace = Namespace::parse(&args.namespace)?;
    let lifecycle = lifecycle_for(&args.bucket, false)?;
    Ok(lifecycle.redeem_code(&namespace, &args.code)?)
}

fn inspect(namespace: &str, bucket: &BucketArgs) -> anyhow::Result<CodeBank> {
    let namespace = Namespace::parse(namespace)?;
    let lifecycle = lifecycle_for(bucket, false)?;
    Ok(lifecycle.inspect(&namespace)?)
}

/// Every namespace in the bucket with its bank.
fn inspect_all(bucket: &BucketArgs) -> anyhow::Result<Vec<(Namespace, CodeBank)>> {
    let lifecycle = lifecycle_for(bucket, false)?;
    lifecycle
        .namespaces()?
        .into_iter()
        .map(|ns| {
            let bank = lifecycle.inspect(&ns)?;
            Ok::<_, anyhow::Error>((ns, bank))
        })
        .collect()
}

fn cmd_issue(args: IssueArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let code = issue(&args)?;
    match format {
        OutputFormat::Text => println!("{}", code.as_str().bold()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "namespace": args.namespace, "code": code })
        ),
    }
    Ok(())
}

fn cmd_redeem(args: RedeemArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let outcome = redeem(&args)?;
    match format {
        OutputFormat::Text => {
            let line = match outcome {
                Redemption::Valid => format!("{} Valid download code.", "✓".green().bold()),
                Redemption::Expired => format!("{} Expired download code.", "✗".yellow().bold()),
                Redemption::Invalid => format!("{} Invalid download code.", "✗".red().bold()),
            };
            println!("{line}");
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "namespace": args.namespace,
                "code": args.code,
                "outcome": outcome.to_string(),
            })
        ),
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let Some(namespace) = args.namespace.as_deref() else {
        return cmd_inspect_all(&args.bucket, format);
    };
    let bank = inspect(namespace, &args.bucket)?;
    match format {
        OutputFormat::Text => print_bank(namespace, &bank),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bank)?),
    }
    Ok(())
}

fn cmd_inspect_all(bucket: &BucketArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let banks = inspect_all(bucket)?;
    match format {
        OutputFormat::Text => {
            if banks.is_empty() {
                println!("{}", "No code banks.".dimmed());
            }
            for (ns, bank) in &banks {
                print_bank(ns.as_str(), bank);
            }
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = banks
                .iter()
                .map(|(ns, bank)| {
                    Ok::<_, serde_json::Error>((ns.to_string(), serde_json::to_value(bank)?))
                })
                .collect::<serde_json::Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
    }
    Ok(())
}

fn print_bank(namespace: &str, bank: &CodeBank) {
    println!("Namespace: {}", namespace.yellow().bold());
    println!("  unused:  {}", bank.unused_count().to_string().green());
    println!("  expired: {}", bank.expired_count().to_string().dimmed());
}
