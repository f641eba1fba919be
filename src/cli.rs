use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hardbound",
    version,
    about = "Hardlink audiobooks into tracker-compliant folder and file names.",
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "FILE", help = "Configuration file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More logging (-v debug, -vv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link one or more source directories under a destination root.
    Link(LinkArgs),
    /// Link every `SOURCE|DESTINATION` pair listed in a manifest.
    Batch(BatchArgs),
    /// Show how a name is parsed and shortened, without touching any files.
    Preview(PreviewArgs),
}

/// Options shared by the commands that materialize files.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long, help = "Resolve and report only; create nothing")]
    pub dry_run: bool,

    #[arg(long, help = "Replace destination files that are not already linked to the source")]
    pub force: bool,

    #[arg(long, value_name = "FILE", help = "Append one JSON audit record per item to this file")]
    pub audit: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    #[arg(value_name = "SOURCE_DIR", required = true)]
    pub sources: Vec<PathBuf>,

    #[arg(long, value_name = "ROOT", help = "Destination root the folders are created under")]
    pub dst: PathBuf,

    #[arg(long, value_name = "EXT", help = "Audio extension to link instead of detecting one")]
    pub ext: Option<String>,

    #[arg(long, value_name = "N", help = "Override the path length cap")]
    pub cap: Option<usize>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[arg(value_name = "NAME")]
    pub name: String,

    #[arg(long, value_name = "EXT", help = "Extension of the file name (default: the configured fallback)")]
    pub ext: Option<String>,

    #[arg(long, value_name = "N", help = "Override the path length cap")]
    pub cap: Option<usize>,
}
