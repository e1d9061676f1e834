use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_grammar::diagnostics::{OutputFormat, WriterSink};
use pdf_grammar::grammar::{GrammarCache, GrammarLoader, LoaderOptions};
use pdf_grammar::validator::ValidatorOptions;
use pdf_grammar::{validate_store, ObjectStore, PdfVersion, TRAILER_LINK};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pdfgrammar",
    about = "Validate PDF object graphs against a table-driven grammar",
    version,
    author
)]
struct Cli {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every grammar file in a folder and report its defects
    CheckGrammar {
        /// Grammar folder
        folder: PathBuf,

        /// Extension of grammar files
        #[arg(short, long, default_value = "tsv")]
        extension: String,

        /// Omit file paths from findings
        #[arg(short, long)]
        terse: bool,
    },

    /// Validate a JSON object-graph dump against a grammar folder
    Validate {
        /// JSON dump of the document's objects and trailer
        input: PathBuf,

        /// Grammar folder
        #[arg(short, long)]
        grammar: PathBuf,

        /// Link of the trailer's grammar table
        #[arg(short, long, default_value = TRAILER_LINK)]
        link: String,

        /// Validate against this PDF version instead of the document's
        #[arg(short = 'p', long)]
        pdf_version: Option<PdfVersion>,

        /// Stop after checking this many objects
        #[arg(long)]
        max_items: Option<usize>,

        /// Omit context paths from findings
        #[arg(short, long, conflicts_with = "json")]
        terse: bool,

        /// Write findings as JSON lines
        #[arg(long)]
        json: bool,

        /// Report file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::CheckGrammar {
            folder,
            extension,
            terse,
        } => check_grammar(&folder, extension, terse),

        Commands::Validate {
            input,
            grammar,
            link,
            pdf_version,
            max_items,
            terse,
            json,
            output,
        } => {
            let format = if json {
                OutputFormat::JsonLines
            } else if terse {
                OutputFormat::Terse
            } else {
                OutputFormat::Verbose
            };
            let mut options = ValidatorOptions::default();
            if let Some(version) = pdf_version {
                options = options.with_pdf_version(version);
            }
            if let Some(max_items) = max_items {
                options = options.with_max_items(max_items);
            }
            validate(&input, &grammar, &link, options, format, output.as_deref())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn check_grammar(folder: &Path, extension: String, terse: bool) -> Result<ExitCode> {
    let loader =
        GrammarLoader::with_options(folder, LoaderOptions::default().with_extension(extension));
    let cache = GrammarCache::new(loader);
    let format = if terse {
        OutputFormat::Terse
    } else {
        OutputFormat::Verbose
    };

    let mut sink = WriterSink::new(io::stdout().lock(), format);
    let failed = cache
        .load_all(&mut sink)
        .with_context(|| format!("Failed to read grammar folder {}", folder.display()))?;
    let reported = sink.reported();
    sink.finish().context("Failed to write findings")?;

    eprintln!(
        "Checked {} grammar files: {} failed, {} findings",
        cache.len(),
        failed.len(),
        reported
    );
    for link in &failed {
        debug!(link, "grammar file failed");
    }

    Ok(if failed.is_empty() && reported == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn validate(
    input: &Path,
    grammar: &Path,
    link: &str,
    options: ValidatorOptions,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<ExitCode> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let store = ObjectStore::from_json(&text)
        .with_context(|| format!("Failed to parse object dump {}", input.display()))?;
    info!(objects = store.len(), "loaded object dump");

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create report {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = WriterSink::new(writer, format);

    let cache = GrammarCache::from_folder(grammar);
    let stats = validate_store(&store, &cache, link, options, &mut sink)
        .with_context(|| format!("Cannot start validation at link {link}"))?;
    let reported = sink.reported();
    sink.finish().context("Failed to write findings")?;

    eprintln!(
        "Checked {} objects against PDF {}: {} findings",
        stats.checked, stats.version, reported
    );
    if stats.cancelled {
        eprintln!("Stopped early with {} objects unchecked", stats.remaining);
    }

    Ok(if reported == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
