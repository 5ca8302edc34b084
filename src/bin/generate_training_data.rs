//! Writes the labeled training dataset (sample users × sample catalog) as CSV.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use nutriscore_api::labeling::{build_dataset, sample_products, sample_users, TrainingRow};

#[derive(Debug, Parser)]
#[command(about = "Generate the labeled health-score training dataset")]
struct Args {
    /// Output CSV path; `-` writes to stdout.
    #[arg(short, long, env = "DATASET_OUTPUT", default_value = "data/merged_dataset.csv")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let rows = build_dataset(&sample_users(), &sample_products());

    let mut out: Box<dyn Write> = if args.output.as_os_str() == "-" {
        Box::new(std::io::stdout().lock())
    } else {
        if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Box::new(std::io::BufWriter::new(std::fs::File::create(&args.output)?))
    };

    writeln!(out, "{}", TrainingRow::HEADER.join(","))?;
    for row in &rows {
        writeln!(out, "{}", row.to_csv_record())?;
    }
    out.flush()?;

    if args.output.as_os_str() != "-" {
        eprintln!("Wrote {} rows to {}", rows.len(), args.output.display());
    }
    Ok(())
}
