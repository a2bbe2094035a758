use std::net::SocketAddr;
use std::path::PathBuf;

use cid::Cid;
use clap::{Args, Parser, Subcommand};
use dagex_retrieval::PriceCeiling;

#[derive(Parser)]
#[command(
    name = "dagex",
    about = "dagex -- browse and export DAGs held by storage providers",
    version
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
    /// Start the explorer server
    Run(RunArgs),
    /// Compile a path into a traversal selector
    Selector(SelectorArgs),
    /// Show the roots and blocks of a CAR archive
    Inspect(InspectArgs),
    /// Import local files into a pieces directory
    Pack(PackArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long)]
    pub pieces_dir: Option<PathBuf>,
    /// Highest price accepted, in attoFIL, or `any`
    #[arg(long)]
    pub max_price: Option<PriceCeiling>,
    /// Deal timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct SelectorArgs {
    pub path: String,
    /// Select everything under the path instead of the target node
    #[arg(long)]
    pub export: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct PackArgs {
    pub input: PathBuf,
    #[arg(long, default_value = "pieces")]
    pub out: PathBuf,
    /// Piece CID to file the archive under
    #[arg(long)]
    pub piece: Option<Cid>,
}
