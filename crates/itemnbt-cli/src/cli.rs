use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "itemnbt",
    about = "Inspect and edit item stacks and their category data",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Synchronization settings (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an item stack file with no data
    New(NewArgs),
    /// Print a stack and its data tree
    Show(InspectArgs),
    /// List the category sub-trees on a stack
    Categories(InspectArgs),
    /// Remove one category from a stack
    Clear(ClearArgs),
    /// Run the counter walkthrough against a stack file
    Demo(DemoArgs),
}

#[derive(Args)]
pub struct NewArgs {
    pub file: PathBuf,
    /// Item id, e.g. minecraft:stick
    #[arg(long)]
    pub item: String,
    #[arg(long, default_value_t = 1)]
    pub count: u32,
    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}

/// Read-only commands that can print JSON.
#[derive(Args)]
pub struct InspectArgs {
    pub file: PathBuf,
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct ClearArgs {
    pub file: PathBuf,
    pub category: String,
}

#[derive(Args)]
pub struct DemoArgs {
    pub file: PathBuf,
    /// Value to set on the counter
    #[arg(long, default_value_t = 5)]
    pub count: i32,
    #[arg(long, default_value = "x")]
    pub label: String,
}
