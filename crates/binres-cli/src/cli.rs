use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "binres",
    about = "binres -- binary content stored by partition and URI",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Resolver configuration (TOML with a [partitions] table)
    #[arg(short, long, global = true, default_value = "binres.toml")]
    pub config: PathBuf,

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
    /// Check whether content is stored
    Exists(TargetArgs),
    /// Write stored content to stdout or a file
    Get(GetArgs),
    /// Store content from stdin or a file
    Put(PutArgs),
    /// Remove stored content
    Purge(TargetArgs),
    /// List the URI schemes served
    Schemes,
    /// List configured partitions and their roots
    Partitions,
}

#[derive(Args)]
pub struct TargetArgs {
    pub partition: String,
    pub identifier: String,
}

#[derive(Args)]
pub struct GetArgs {
    pub partition: String,
    pub identifier: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PutArgs {
    pub partition: String,
    /// Target identifier; a fresh `file:` identifier is minted if omitted
    pub identifier: Option<String>,
    /// Read from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}
