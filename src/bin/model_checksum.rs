//! Prints the SHA-256 of a model file, for use as `MODEL_SHA256`.
//!
//! Also validates the file, so a digest is never produced for a model the
//! server would refuse to load.

use clap::Parser;
use std::path::PathBuf;

use nutriscore_api::config::DEFAULT_MODEL_PATH;
use nutriscore_api::forest::{load_model, sha256_hex};

#[derive(Debug, Parser)]
#[command(about = "Validate a model file and print its SHA-256")]
struct Args {
    /// Model JSON file.
    #[arg(env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let package = load_model(&args.path, None)
        .map_err(|e| anyhow::anyhow!("{}: {}", args.path.display(), e))?;
    let digest = sha256_hex(&std::fs::read(&args.path)?);

    eprintln!(
        "Model {} trained {} ({} trees)",
        package.metadata.version,
        package.metadata.training_date,
        package.model.trees.len()
    );
    println!("{}", digest);
    Ok(())
}
