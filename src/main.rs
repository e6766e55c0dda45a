use std::{io::Read, path::PathBuf};

use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
#[command(version, about = "Convert markdown-styled text into LaTeX")]
struct Args {
    /// Path to the input document. Standard input is read if omitted.
    path: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let input = match &args.path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read standard input")?;
            input
        }
    };
    let output = marktex::convert(&input).context("conversion failed")?;
    println!("{output}");
    Ok(())
}
