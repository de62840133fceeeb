use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pdf_merge::{BoardSettings, OrderingStore, SourceFile, inspect_pdf, validate_source};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pdft", about = "PDF tools CLI", version)]
struct Cli {
    /// Settings file (JSON); defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge PDF files in the order given
    Merge {
        /// Input PDF files - pages are concatenated in this order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output PDF file (a directory gets merged.pdf inside it)
        #[arg(short, long, default_value = pdf_merge::MERGED_FILE_NAME)]
        output: PathBuf,

        /// Overwrite the output file if it exists
        #[arg(long)]
        force: bool,
    },

    /// Show page count, version and encryption of PDF files
    Info {
        /// Input PDF files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
}

async fn load_settings(path: Option<&Path>) -> Result<BoardSettings> {
    match path {
        Some(path) => BoardSettings::load(path)
            .await
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(BoardSettings::default()),
    }
}

async fn read_inputs(paths: &[PathBuf], max_bytes: u64) -> Result<Vec<SourceFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = SourceFile::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        validate_source(&file, max_bytes)?;
        files.push(file);
    }
    Ok(files)
}

fn resolve_output(output: PathBuf) -> PathBuf {
    if output.is_dir() {
        output.join(pdf_merge::MERGED_FILE_NAME)
    } else {
        output
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Merge {
            input,
            output,
            force,
        } => {
            let output = resolve_output(output);
            if output.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                );
            }

            let files = read_inputs(&input, settings.max_file_bytes).await?;
            let mut store = OrderingStore::local();
            store.add_files(files);

            let merged = pdf_merge::merge_items(store.items(), |progress| {
                println!(
                    "  [{}/{}] {}",
                    progress.current, progress.total, progress.name
                );
            })
            .await?;

            merged.write_to(&output).await?;
            println!(
                "Merged {} files ({} pages) → {}",
                store.len(),
                merged.page_count,
                output.display()
            );
        }

        Commands::Info { input } => {
            let files = read_inputs(&input, settings.max_file_bytes).await?;
            for file in &files {
                let info = inspect_pdf(file)?;
                println!("{}:", file.name);
                if info.encrypted {
                    println!("  Encrypted: yes (password required)");
                    continue;
                }
                println!("  Pages: {}", info.page_count);
                println!("  Version: {}", info.version);
                println!("  Size: {} bytes", info.size_bytes);
            }
        }
    }

    Ok(())
}
