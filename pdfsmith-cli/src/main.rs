use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pdfsmith::operations::{
    merge, reorder, rotate_pages, split, watermark, PageRange, StampInstructions,
    TextStampProducer,
};
use pdfsmith::Document;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pdfsmith",
    about = "Edit existing PDF files: extract text, rotate, merge, split and watermark",
    version,
    author
)]
struct Cli {
    /// Log structural progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from one page, or from every page
    ExtractText {
        /// Input PDF file
        input: PathBuf,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1, conflicts_with = "all")]
        page: usize,

        /// Extract every page, separated by form feeds
        #[arg(short, long)]
        all: bool,

        /// Output text file (defaults to <input stem>_extracted_text.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rotate pages in a PDF
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        output: PathBuf,

        /// Rotation angle, a multiple of 90
        #[arg(short, long, default_value_t = 90, allow_negative_numbers = true)]
        angle: i64,

        /// Pages to rotate (e.g., "all", "1,3,5", "2-6")
        #[arg(short, long, default_value = "all")]
        pages: PageRange,
    },

    /// Merge multiple PDFs into one
    Merge {
        /// Input PDF files, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a PDF into parts
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Page numbers (1-based) where a new part starts
        #[arg(long, num_args = 1.., required = true)]
        at: Vec<usize>,

        /// Directory for the parts (defaults to the input's directory)
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },

    /// Stamp a text watermark onto every page
    Watermark {
        /// Input PDF file
        input: PathBuf,

        /// Watermark text
        text: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value_t = 40.0)]
        font_size: f64,

        /// Counter-clockwise rotation in degrees
        #[arg(long, default_value_t = 45.0, allow_negative_numbers = true)]
        angle: f64,

        /// Fill gray level, 0 (black) to 1 (white)
        #[arg(long, default_value_t = 0.5)]
        gray: f64,

        /// Fill opacity, 0 to 1
        #[arg(long, default_value_t = 0.5)]
        opacity: f64,
    },

    /// Write the pages in a new order
    Reorder {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        output: PathBuf,

        /// New order as 1-based page numbers, e.g. "3,1,2"
        #[arg(long, value_delimiter = ',', required = true)]
        order: Vec<usize>,
    },

    /// Show page count, version, page geometry and metadata
    Info {
        /// Input PDF file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::ExtractText {
            input,
            page,
            all,
            output,
        } => {
            let document = open(&input)?;
            let text = if all {
                let count = document.page_count()?;
                (0..count)
                    .map(|i| {
                        document
                            .extract_text(i)
                            .with_context(|| format!("Failed to extract text from page {}", i + 1))
                    })
                    .collect::<Result<Vec<_>>>()?
                    .join("\u{c}")
            } else {
                let index = to_index(page)?;
                document
                    .extract_text(index)
                    .with_context(|| format!("Failed to extract text from page {page}"))?
            };

            let output = output.unwrap_or_else(|| sibling(&input, "_extracted_text.txt"));
            std::fs::write(&output, text)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("✓ Text extracted to: {}", output.display());
        }

        Commands::Rotate {
            input,
            output,
            angle,
            pages,
        } => {
            let mut document = open(&input)?;
            rotate_pages(&mut document, &pages, angle).context("Failed to rotate pages")?;
            save(&document, &output)?;
            println!(
                "✓ Successfully rotated pages {} degrees in {}",
                angle,
                output.display()
            );
        }

        Commands::Merge { inputs, output } => {
            let documents = inputs
                .iter()
                .map(|path| open(path))
                .collect::<Result<Vec<_>>>()?;
            let merged = merge(documents.iter()).context("Failed to merge documents")?;
            save(&merged, &output)?;
            println!(
                "✓ Merged {} files ({} pages) into {}",
                documents.len(),
                merged.page_count()?,
                output.display()
            );
        }

        Commands::Split {
            input,
            at,
            output_dir,
        } => {
            let document = open(&input)?;
            let boundaries = at.into_iter().map(to_index).collect::<Result<Vec<_>>>()?;
            let parts = split(&document, &boundaries).context("Failed to split document")?;

            let stem = file_stem(&input);
            let dir = output_dir
                .or_else(|| input.parent().map(Path::to_path_buf))
                .unwrap_or_default();
            for (k, part) in parts.iter().enumerate() {
                let path = dir.join(format!("{stem}_part{}.pdf", k + 1));
                save(part, &path)?;
                println!("✓ Wrote {} ({} pages)", path.display(), part.page_count()?);
            }
        }

        Commands::Watermark {
            input,
            text,
            output,
            font_size,
            angle,
            gray,
            opacity,
        } => {
            let mut document = open(&input)?;
            let instructions = StampInstructions::new(text)
                .with_font_size(font_size)
                .with_rotation(angle)
                .with_fill_gray(gray)
                .with_fill_alpha(opacity);
            watermark(&mut document, &TextStampProducer, &instructions)
                .context("Failed to apply watermark")?;
            save(&document, &output)?;
            println!("✓ Watermarked {}", output.display());
        }

        Commands::Reorder {
            input,
            output,
            order,
        } => {
            let document = open(&input)?;
            let order = order.into_iter().map(to_index).collect::<Result<Vec<_>>>()?;
            let reordered = reorder(&document, &order).context("Failed to reorder pages")?;
            save(&reordered, &output)?;
            println!("✓ Reordered pages into {}", output.display());
        }

        Commands::Info { input } => {
            let document = open(&input)?;
            print_info(&input, &document)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open(path: &Path) -> Result<Document> {
    let document =
        Document::open(path).with_context(|| format!("Failed to open PDF {}", path.display()))?;
    tracing::debug!("Opened {} (PDF {})", path.display(), document.version());
    Ok(document)
}

fn save(document: &Document, path: &Path) -> Result<()> {
    document
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// 1-based page number to index.
fn to_index(page: usize) -> Result<usize> {
    match page.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("Page numbers start at 1"),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// `<dir>/<stem><suffix>` next to `path`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    path.with_file_name(format!("{}{suffix}", file_stem(path)))
}

fn print_info(input: &Path, document: &Document) -> Result<()> {
    println!("PDF Information for: {}", input.display());
    println!("==========================================");
    println!("PDF Version: {}", document.version());

    let pages = document.pages()?;
    println!("Pages: {}", pages.len());

    let metadata = document.metadata();
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Creator", &metadata.creator),
        ("Producer", &metadata.producer),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{label}: {value}");
        }
    }
    if let Some(date) = metadata.creation_date {
        println!("Created: {}", date.to_rfc3339());
    }
    if let Some(date) = metadata.modification_date {
        println!("Modified: {}", date.to_rfc3339());
    }

    if !pages.is_empty() {
        println!("\nPage Information:");
        println!("-----------------");
    }
    for (i, page) in pages.iter().enumerate() {
        let [llx, lly, urx, ury] = page.media_box();
        println!(
            "Page {}: {:.0}x{:.0} pts, rotation {}, media box [{} {} {} {}]",
            i + 1,
            page.width(),
            page.height(),
            page.rotation(),
            llx,
            lly,
            urx,
            ury
        );
    }
    Ok(())
}
