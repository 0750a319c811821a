use std::fs;
use std::io::{self, Read, Write};
use std::time::Duration;

use anyhow::{bail, Context};
use cidstore_store::{KeyValueStore, SqliteStore, StoreConfig, StoreError};
use cidstore_types::{ContentKey, OpContext};
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &mut out)
}

fn execute(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = store_config(&cli)?;
    let store = SqliteStore::connect(config.clone())
        .with_context(|| format!("opening {}", config.path.display()))?;
    let ctx = match cli.timeout_ms {
        Some(ms) => OpContext::with_timeout(Duration::from_millis(ms)),
        None => OpContext::background(),
    };
    let json = matches!(cli.format, OutputFormat::Json);

    match cli.command {
        Command::Init(_) => cmd_init(&store, json, out),
        Command::Has(args) => cmd_has(&store, &ctx, args, json, out),
        Command::Get(args) => cmd_get(&store, &ctx, args, json, out),
        Command::Put(args) => cmd_put(&store, &ctx, args, json, out),
        Command::Add(args) => cmd_add(&store, &ctx, args, json, out),
        Command::Verify(args) => cmd_verify(&store, &ctx, args, json, out),
    }?;
    store.close()?;
    Ok(())
}

fn store_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(StoreConfig::new(&cli.db, &cli.collection)?),
    }
}

fn cmd_init(store: &SqliteStore, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    if json {
        writeln!(
            out,
            "{}",
            json!({
                "path": store.path().display().to_string(),
                "collection": store.collection().as_str(),
            })
        )?;
    } else {
        writeln!(
            out,
            "{} Initialized store in {}",
            "✓".green().bold(),
            store.path().display().to_string().bold()
        )?;
        writeln!(out, "  Collection: {}", store.collection().as_str().cyan())?;
    }
    Ok(())
}

fn cmd_has(
    store: &dyn KeyValueStore,
    ctx: &OpContext,
    args: HasArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let present = store.has(ctx, &args.key)?;
    if json {
        writeln!(out, "{}", json!({ "key": args.key, "present": present }))?;
    } else {
        writeln!(out, "{present}")?;
    }
    Ok(())
}

fn cmd_get(
    store: &dyn KeyValueStore,
    ctx: &OpContext,
    args: GetArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let value = store.get(ctx, &args.key)?;
    if let Some(path) = &args.output {
        fs::write(path, &value).with_context(|| format!("writing {}", path.display()))?;
        if json {
            let report = json!({
                "key": args.key,
                "size": value.len(),
                "output": path.display().to_string(),
            });
            writeln!(out, "{report}")?;
        } else {
            writeln!(out, "Wrote {} bytes to {}", value.len().to_string().bold(), path.display())?;
        }
    } else if json {
        let report = json!({ "key": args.key, "size": value.len(), "hex": hex::encode(&value) });
        writeln!(out, "{report}")?;
    } else {
        out.write_all(&value)?;
    }
    Ok(())
}

fn cmd_put(
    store: &dyn KeyValueStore,
    ctx: &OpContext,
    args: PutArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let value = match (&args.value, &args.file) {
        (Some(literal), _) => literal.clone().into_bytes(),
        (None, Some(path)) => {
            fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        (None, None) => bail!("a value or --file is required"),
    };
    store.put(ctx, &args.key, &value)?;
    if json {
        writeln!(out, "{}", json!({ "key": args.key, "size": value.len() }))?;
    } else {
        writeln!(out, "{} Stored {}", "✓".green().bold(), args.key.yellow())?;
    }
    Ok(())
}

fn cmd_add(
    store: &dyn KeyValueStore,
    ctx: &OpContext,
    args: AddArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let data = if args.path == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("reading stdin")?;
        buf
    } else {
        fs::read(&args.path).with_context(|| format!("reading {}", args.path))?
    };
    let key = store.put_content(ctx, &data)?;
    if json {
        writeln!(out, "{}", json!({ "key": key, "size": data.len() }))?;
    } else {
        writeln!(out, "{}", key)?;
    }
    Ok(())
}

fn cmd_verify(
    store: &dyn KeyValueStore,
    ctx: &OpContext,
    args: VerifyArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let key = ContentKey::new(args.key)?;
    match store.get_verified(ctx, &key) {
        Ok(data) => {
            if json {
                writeln!(out, "{}", json!({ "key": key, "valid": true, "size": data.len() }))?;
            } else {
                writeln!(
                    out,
                    "{} {} matches its content",
                    "✓".green().bold(),
                    key.short().yellow()
                )?;
            }
            Ok(())
        }
        Err(StoreError::HashMismatch { computed, .. }) => {
            if json {
                writeln!(out, "{}", json!({ "key": key, "valid": false, "computed": computed }))?;
            } else {
                writeln!(
                    out,
                    "{} {} content hashes to {}",
                    "✗".red().bold(),
                    key.short().yellow(),
                    computed.red()
                )?;
            }
            bail!("content of {key} does not match its key")
        }
        Err(err) => Err(err.into()),
    }
}
