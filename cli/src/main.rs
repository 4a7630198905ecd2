//! docalign CLI - document decomposition and summary alignment tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use docalign::render::{entries_to_json, to_json, to_text};
use docalign::service::{GeminiClient, ServiceConfig};
use docalign::{
    align_summary, decompose_file, detect_format_from_path, AlignedEntry, DocumentKind,
    ExtractOptions, JobContext, JsonFormat, Pipeline,
};

#[derive(Parser)]
#[command(name = "docalign")]
#[command(author = "docalign contributors")]
#[command(version)]
#[command(about = "Decompose documents and align summaries to their source pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose a document into page chunks, images and references
    Extract {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "DOCALIGN_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Skip image and chart extraction
        #[arg(long)]
        text_only: bool,

        /// Fail on the first unreadable page
        #[arg(long)]
        strict: bool,

        /// Process pages one at a time
        #[arg(long)]
        sequential: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Align an existing summary to the pages of a document (offline)
    Align {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Summary text file, paragraphs separated by blank lines
        #[arg(short, long, value_name = "FILE")]
        summary: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "DOCALIGN_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Result format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputKind,
    },

    /// Summarize a document with the configured service and align the result
    Summarize {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "DOCALIGN_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// API key (read from GEMINI_API_KEY when omitted)
        #[arg(long, hide_env_values = true)]
        api_key: Option<String>,

        /// Minimum number of summary paragraphs
        #[arg(long, default_value = "3")]
        min_paragraphs: usize,

        /// Concurrent image-captioning requests
        #[arg(long)]
        concurrency: Option<usize>,

        /// Result format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputKind,
    },

    /// Show document information
    Info {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Remove the images written for a job
    Clean {
        /// Job identifier (prefix of the image file names)
        #[arg(value_name = "JOB")]
        job: String,

        /// Output directory the job wrote to
        #[arg(short, long, value_name = "DIR", env = "DOCALIGN_OUTPUT_DIR")]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// Pretty JSON array of entries
    Json,
    /// Page-by-page plain text
    Text,
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            text_only,
            strict,
            sequential,
            compact,
        } => {
            let mut options = ExtractOptions::new();
            if text_only {
                options = options.text_only();
            }
            if strict {
                options = options.strict();
            }
            if sequential {
                options = options.sequential();
            }
            cmd_extract(&input, output.as_deref(), &options, compact)
        }
        Commands::Align {
            input,
            summary,
            output,
            format,
        } => cmd_align(&input, &summary, output.as_deref(), format),
        Commands::Summarize {
            input,
            output,
            api_key,
            min_paragraphs,
            concurrency,
            format,
        } => cmd_summarize(
            &input,
            output.as_deref(),
            api_key,
            min_paragraphs,
            concurrency,
            format,
        ),
        Commands::Info { input } => cmd_info(&input),
        Commands::Clean { job, output } => cmd_clean(&job, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn output_dir(input: &Path, output: Option<&Path>) -> PathBuf {
    output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    })
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    options: &ExtractOptions,
    compact: bool,
) -> CliResult {
    let dir = output_dir(input, output);
    fs::create_dir_all(&dir)?;
    let job = JobContext::new(&dir);

    let doc = decompose_file(input, &job, options)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = to_json(&doc, format)?;
    let path = dir.join("decomposition.json");
    fs::write(&path, json)?;

    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), path.display());
    println!(
        "  {} images/ ({} assets, job {})",
        "└─".dimmed(),
        doc.images.len(),
        job.id()
    );

    Ok(())
}

fn cmd_align(input: &Path, summary: &Path, output: Option<&Path>, format: OutputKind) -> CliResult {
    let dir = output_dir(input, output);
    fs::create_dir_all(&dir)?;
    let job = JobContext::new(&dir);

    let summary = fs::read_to_string(summary)?;
    let doc = decompose_file(input, &job, &ExtractOptions::default())?;
    let entries = align_summary(&summary, &doc);

    write_entries(&entries, &dir, format)
}

fn cmd_summarize(
    input: &Path,
    output: Option<&Path>,
    api_key: Option<String>,
    min_paragraphs: usize,
    concurrency: Option<usize>,
    format: OutputKind,
) -> CliResult {
    let dir = output_dir(input, output);
    fs::create_dir_all(&dir)?;
    let job = JobContext::new(&dir);

    let mut config = match api_key {
        Some(key) => ServiceConfig::new(key),
        None => ServiceConfig::from_env()?,
    };
    if let Some(n) = concurrency {
        config = config.with_concurrency(n);
    }

    let rt = tokio::runtime::Runtime::new()?;
    let output = rt.block_on(async {
        println!("{}", "Connecting to the model service...".cyan());
        let client = GeminiClient::connect(config).await?;
        log::info!(
            "text model: {}, vision model: {:?}, embedding model: {:?}",
            client.text_model(),
            client.vision_model(),
            client.embedding_model()
        );

        println!("{} {}", "Processing".cyan(), input.display());
        Pipeline::with_client(Arc::new(client))
            .with_min_paragraphs(min_paragraphs)
            .process_file(input, &job)
            .await
    })?;

    println!(
        "{} {} words in {:.1}s ({} entries)",
        "Summary:".green(),
        output.timings.summary_words,
        output.timings.summary_secs,
        output.entries.len()
    );

    write_entries(&output.entries, &dir, format)
}

fn write_entries(entries: &[AlignedEntry], dir: &Path, format: OutputKind) -> CliResult {
    let (name, content) = match format {
        OutputKind::Json => ("result.json", entries_to_json(entries, JsonFormat::Pretty)?),
        OutputKind::Text => ("result.txt", to_text(entries)),
    };
    let path = dir.join(name);
    fs::write(&path, content)?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    // Text only, so nothing is written to disk.
    let scratch = std::env::temp_dir().join("docalign-info");
    let job = JobContext::new(&scratch);
    let doc = decompose_file(input, &job, &ExtractOptions::new().text_only())?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    match doc.kind {
        DocumentKind::Pdf => {
            let format = detect_format_from_path(input)?;
            println!("{}: {}", "Format".bold(), format);
            println!("{}: {}", "Pages".bold(), doc.page_count);
        }
        DocumentKind::Docx => {
            println!("{}: DOCX", "Format".bold());
            println!("{}: {}", "Paragraphs".bold(), doc.page_count);
        }
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let pages = doc.page_text_index();
    println!("{}: {}", "Chunks".bold(), doc.chunks.len());
    println!("{}: {}", "Pages with text".bold(), pages.len());
    println!(
        "{}: {}",
        "Words".bold(),
        doc.full_text.split_whitespace().count()
    );
    println!("{}: {}", "Characters".bold(), doc.full_text.chars().count());
    println!("{}: {}", "References".bold(), doc.references.len());

    Ok(())
}

fn cmd_clean(job: &str, output: Option<&Path>) -> CliResult {
    let dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let job = JobContext::with_id(job, dir);
    let removed = job.cleanup()?;
    println!("{} {} files removed", "Done!".green().bold(), removed);
    Ok(())
}
