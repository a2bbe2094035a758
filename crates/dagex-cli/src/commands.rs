use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use dagex_retrieval::PriceCeiling;
use dagex_selector::{compile_path, presets};
use dagex_server::{ExplorerConfig, ExplorerServer};
use dagex_store::CarBlockStore;
use dagex_types::size_str;
use tracing::warn;

use crate::cli::*;
use crate::pack::pack;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Run(args) => cmd_run(args),
        Command::Selector(args) => cmd_selector(args),
        Command::Inspect(args) => cmd_inspect(args, format),
        Command::Pack(args) => cmd_pack(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config = explorer_config(&args)?;
    if config.retrieval.price_ceiling == PriceCeiling::Unlimited {
        warn!("no price ceiling set, paid retrievals will be accepted");
    }
    println!(
        "{} dagex explorer on {} (pieces: {})",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        config.provider.pieces_dir.display()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { ExplorerServer::local(config)?.serve().await })?;
    Ok(())
}

/// Configuration file (or defaults) with command-line overrides applied.
fn explorer_config(args: &RunArgs) -> anyhow::Result<ExplorerConfig> {
    let mut config = match &args.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = &args.pieces_dir {
        config.provider.pieces_dir = dir.clone();
    }
    if let Some(ceiling) = &args.max_price {
        config.retrieval.price_ceiling = ceiling.clone();
    }
    if let Some(secs) = args.timeout {
        config.retrieval.timeout_secs = secs;
    }
    Ok(config)
}

fn cmd_selector(args: SelectorArgs) -> anyhow::Result<()> {
    let target = if args.export {
        presets::full_export()
    } else {
        presets::head()
    };
    let selector = compile_path(&args.path, target)?;
    println!("{}", serde_json::to_string_pretty(&selector.to_json())?);
    Ok(())
}

struct Inspection {
    roots: Vec<String>,
    blocks: usize,
    bytes: u64,
}

/// Read an archive and check every block against its CID.
fn inspect(path: &Path) -> anyhow::Result<Inspection> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let car = CarBlockStore::open(data)?;
    let mut bytes = 0u64;
    for block in car.blocks() {
        bytes += block?.len() as u64;
    }
    Ok(Inspection {
        roots: car.roots().iter().map(ToString::to_string).collect(),
        blocks: car.len(),
        bytes,
    })
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let summary = inspect(&args.file)?;
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "roots": summary.roots,
                "blocks": summary.blocks,
                "bytes": summary.bytes,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            for root in &summary.roots {
                println!("root: {}", root.cyan());
            }
            println!(
                "{} {} blocks, {} verified",
                "✓".green().bold(),
                summary.blocks.to_string().bold(),
                size_str(summary.bytes)
            );
        }
    }
    Ok(())
}

fn cmd_pack(args: PackArgs) -> anyhow::Result<()> {
    let packed = pack(&args.input, &args.out, args.piece)?;
    println!("{} Packed {} blocks", "✓".green().bold(), packed.blocks);
    println!("  Root:  {}", packed.root.to_string().cyan());
    println!("  Piece: {}", packed.piece.to_string().yellow());
    println!("  File:  {}", packed.path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run_args() -> RunArgs {
        RunArgs {
            config: None,
            bind: None,
            pieces_dir: None,
            max_price: None,
            timeout: None,
        }
    }

    #[test]
    fn defaults_without_file() {
        let config = explorer_config(&run_args()).unwrap();
        assert_eq!(config, ExplorerConfig::default());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dagex.toml");
        std::fs::write(
            &path,
            "bind_addr = \"0.0.0.0:9000\"\n[retrieval]\ntimeout_secs = 5\n[provider]\npieces_dir = \"/from/file\"\n",
        )
        .unwrap();

        let args = RunArgs {
            config: Some(path),
            pieces_dir: Some(PathBuf::from("/from/flag")),
            max_price: Some(PriceCeiling::Unlimited),
            ..run_args()
        };
        let config = explorer_config(&args).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.retrieval.timeout_secs, 5);
        assert_eq!(config.provider.pieces_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.retrieval.price_ceiling, PriceCeiling::Unlimited);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = RunArgs {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            ..run_args()
        };
        assert!(explorer_config(&args).is_err());
    }

    #[test]
    fn inspect_packed_archive() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, "hello").unwrap();
        let packed = pack(&file, dir.path(), None).unwrap();

        let summary = inspect(&packed.path).unwrap();
        assert_eq!(summary.roots, vec![packed.root.to_string()]);
        assert_eq!(summary.blocks, 1);
        assert!(summary.bytes >= 5);
    }

    #[test]
    fn inspect_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.car");
        std::fs::write(&path, b"not an archive").unwrap();
        assert!(inspect(&path).is_err());
    }
}
