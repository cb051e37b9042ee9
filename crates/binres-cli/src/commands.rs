use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use binres_fs::{FileResolver, FileResolverConfig, FILE_SCHEME};
use binres_resolver::Resolver;
use binres_types::{ContentId, PartitionName};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let resolver = open_resolver(&cli.config)?;
    let format = cli.format;
    match cli.command {
        Command::Exists(args) => cmd_exists(&resolver, args, &format),
        Command::Get(args) => cmd_get(&resolver, args),
        Command::Put(args) => cmd_put(&resolver, args, &format),
        Command::Purge(args) => cmd_purge(&resolver, args, &format),
        Command::Schemes => cmd_schemes(&resolver, &format),
        Command::Partitions => cmd_partitions(&resolver, &format),
    }
}

fn open_resolver(config: &Path) -> anyhow::Result<FileResolver> {
    debug!(config = %config.display(), "opening file resolver");
    let config = FileResolverConfig::load(config)
        .with_context(|| format!("loading {}", config.display()))?;
    Ok(FileResolver::from_config(&config)?)
}

fn target(partition: &str, identifier: &str) -> anyhow::Result<(PartitionName, ContentId)> {
    Ok((PartitionName::new(partition)?, ContentId::parse(identifier)?))
}

fn cmd_exists(resolver: &FileResolver, args: TargetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (partition, id) = target(&args.partition, &args.identifier)?;
    let found = resolver.exists(&partition, &id)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "identifier": id.as_str(), "exists": found })),
        OutputFormat::Text if found => println!("{} {}", "✓".green().bold(), id.as_str().cyan()),
        OutputFormat::Text => println!("{} {} not found in {}", "✗".red().bold(), id.as_str().cyan(), partition.as_str().bold()),
    }
    Ok(())
}

fn cmd_get(resolver: &FileResolver, args: GetArgs) -> anyhow::Result<()> {
    let (partition, id) = target(&args.partition, &args.identifier)?;
    let mut content = resolver
        .get_content(&partition, &id)
        .with_context(|| format!("reading {id}"))?
        .with_context(|| format!("{id} not found"))?;
    match args.output {
        Some(path) => {
            let mut out = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            let n = io::copy(&mut content, &mut out)?;
            eprintln!("{} Wrote {} bytes to {}", "✓".green().bold(), n, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            io::copy(&mut content, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn cmd_put(resolver: &FileResolver, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let partition = PartitionName::new(args.partition.as_str())?;
    let id = match &args.identifier {
        Some(raw) => ContentId::parse(raw)?,
        None => ContentId::generate(FILE_SCHEME)?,
    };
    let mut input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path).with_context(|| format!("opening {}", path.display()))?),
        None => Box::new(io::stdin().lock()),
    };
    resolver
        .set_content(&partition, &id, &mut input)
        .with_context(|| format!("writing {id}"))?;
    let path = resolver.path_for(&partition, &id)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "identifier": id.as_str(), "path": path.display().to_string() })),
        OutputFormat::Text => {
            println!("{} Stored {}", "✓".green().bold(), id.as_str().cyan());
            println!("  Path: {}", path.display());
        }
    }
    Ok(())
}

fn cmd_purge(resolver: &FileResolver, args: TargetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (partition, id) = target(&args.partition, &args.identifier)?;
    resolver.purge_content(&partition, &id)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "identifier": id.as_str(), "purged": true })),
        OutputFormat::Text => println!("{} Purged {}", "✓".green().bold(), id.as_str().cyan()),
    }
    Ok(())
}

fn cmd_schemes(resolver: &FileResolver, format: &OutputFormat) -> anyhow::Result<()> {
    let schemes = resolver.uri_schemes();
    match format {
        OutputFormat::Json => println!("{}", json!({
            "schemes": schemes,
            "multipart": resolver.supports_multipart_upload(),
        })),
        OutputFormat::Text => {
            for scheme in &schemes {
                println!("{}", scheme.bold());
            }
            let multipart = if resolver.supports_multipart_upload() { "supported".green() } else { "unsupported".yellow() };
            println!("Multipart upload: {multipart}");
        }
    }
    Ok(())
}

fn cmd_partitions(resolver: &FileResolver, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = resolver
                .partitions()
                .iter()
                .map(|(name, root)| (name.to_string(), json!(root.display().to_string())))
                .collect();
            println!("{}", serde_json::Value::Object(map));
        }
        OutputFormat::Text => {
            if resolver.partitions().is_empty() {
                println!("No partitions configured.");
            }
            for (name, root) in resolver.partitions().iter() {
                println!("{} → {}", name.as_str().bold(), root.display());
            }
        }
    }
    Ok(())
}
