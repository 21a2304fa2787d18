use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lexcheck_core::{
    assemble_corpus, join_for_prompt, LopdfDecoder, TextChunker, TextExtractor,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "lexcheck-extract",
    version,
    about = "Extract body text from regulatory PDFs and split it into prompt chunks"
)]
struct Args {
    /// PDF files to extract, in corpus order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Maximum characters per chunk
    #[arg(long, default_value_t = 2000)]
    chunk_size: usize,

    /// Characters shared between consecutive windows of a long paragraph
    #[arg(long, default_value_t = 200)]
    overlap: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the extracted text of each file instead of chunks
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let chunker = TextChunker::new(args.chunk_size, args.overlap)?;

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push((name, bytes));
    }

    let extractor = TextExtractor::new(LopdfDecoder);
    let documents = extractor.extract_batch(files).await?;

    if args.raw {
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&documents)?),
            OutputFormat::Text => {
                for document in &documents {
                    println!("--- {} ---\n{}", document.name, document.text);
                }
            }
        }
        return Ok(());
    }

    let corpus = assemble_corpus(&documents, &chunker)?;
    info!("Produced {} chunks", corpus.len());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&corpus)?),
        OutputFormat::Text => println!("{}", join_for_prompt(&corpus)),
    }

    Ok(())
}
