//! pageturn CLI: terminal front end for the reader backend.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use pageturn::client::ReaderClient;
use pageturn::config::AppConfig;
use pageturn::error::PageturnResult;
use pageturn::notice::{Notice, NoticeSink, StdoutSink};
use pageturn::shelf::{BookId, BookPatch};

#[derive(Parser)]
#[command(name = "pageturn", version, about = "Terminal front end for the reader backend")]
struct Cli {
    /// Backend base URL (overrides config and PAGETURN_BACKEND_URL).
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the shelf interactively.
    Ui,

    /// List and edit book metadata.
    Books {
        #[command(subcommand)]
        action: BookAction,
    },

    /// Show a book's chapters.
    Chapters {
        /// Book ID (see `books list`).
        book_id: i64,
    },

    /// Show a book's sections, optionally restricted to one chapter.
    Sections {
        book_id: i64,
        /// Chapter ID to filter by.
        #[arg(long)]
        chapter: Option<i64>,
    },

    /// Print a page's text, or save its rendered image.
    Page {
        book_id: i64,
        /// Raw page index (zero-based).
        page: i64,
        /// Write the rendered PNG here instead of printing text.
        #[arg(long)]
        image: Option<PathBuf>,
        /// Render DPI (defaults to the configured value).
        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Upload a PDF and register it on the shelf.
    Upload {
        /// Path to the PDF file.
        file: PathBuf,
    },

    /// Delete a book and its stored PDF.
    Remove { book_id: i64 },

    /// Table-of-contents extraction.
    Toc {
        #[command(subcommand)]
        action: TocAction,
    },

    /// Visually align chapter numbering for a book.
    Align { book_id: i64 },
}

#[derive(Subcommand)]
enum BookAction {
    /// List all books on the shelf.
    List,
    /// Show one book's metadata.
    Show { book_id: i64 },
    /// Update metadata fields. Only the flags you pass are changed.
    Set {
        book_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        keywords: Option<String>,
        /// Set the alignment offset directly (use `align` to derive it visually).
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i64>,
    },
}

#[derive(Subcommand)]
enum TocAction {
    /// Whether a table of contents has been extracted.
    Status { book_id: i64 },
    /// Trigger (re-)extraction on the backend. Slow.
    Refresh {
        book_id: i64,
        /// Discard any previously extracted TOC first.
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (config, client) = bootstrap(cli.backend)?;
    let sink = StdoutSink;

    match cli.command {
        Commands::Ui => pageturn::tui::launch(client)?,

        Commands::Align { book_id } => {
            pageturn::tui::launch_alignment(client, BookId(book_id))?;
        }

        Commands::Books { action } => match action {
            BookAction::List => {
                let books = client.list_books()?;
                if books.is_empty() {
                    println!("Shelf is empty. Upload a PDF with `pageturn upload <file>`.");
                } else {
                    println!("Books ({}):", books.len());
                    for book in &books {
                        let author = book.author.as_deref().unwrap_or("unknown author");
                        let pages = book
                            .total_pages
                            .map(|p| format!("{p} pages"))
                            .unwrap_or_else(|| "? pages".into());
                        let toc = if book.toc_exists { "toc" } else { "no toc" };
                        println!(
                            "  {}. \"{}\" by {} [{pages}, {toc}, offset {:+}]",
                            book.id,
                            book.display_title(),
                            author,
                            book.offset(),
                        );
                    }
                }
            }
            BookAction::Show { book_id } => {
                let book = client.book(BookId(book_id))?;
                println!("Book: \"{}\"", book.display_title());
                println!("  id:       {}", book.id);
                println!("  author:   {}", book.author.as_deref().unwrap_or("-"));
                println!("  keywords: {}", book.keywords.as_deref().unwrap_or("-"));
                println!(
                    "  pages:    {}",
                    book.total_pages
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "unknown".into())
                );
                println!("  offset:   {:+}", book.offset());
                println!("  toc:      {}", if book.toc_exists { "extracted" } else { "none" });
                if let Some(summary) = &book.summary {
                    println!("  summary:  {summary}");
                }
            }
            BookAction::Set {
                book_id,
                title,
                author,
                keywords,
                offset,
            } => {
                let book = BookId(book_id);
                let patch = BookPatch {
                    title,
                    author,
                    keywords,
                    alignment_offset: offset,
                };
                if patch.is_empty() {
                    println!("Nothing to update — pass at least one of --title/--author/--keywords/--offset.");
                } else {
                    client.update_book(book, &patch)?;
                    match offset {
                        Some(offset) => sink.emit(&Notice::AlignmentSaved { book, offset }),
                        None => sink.emit(&Notice::info(format!("updated metadata for book {book}"))),
                    }
                }
            }
        },

        Commands::Chapters { book_id } => {
            let chapters = client.chapters(BookId(book_id))?;
            if chapters.is_empty() {
                println!("No chapters. Run `pageturn toc refresh {book_id}` to extract them.");
            } else {
                println!("Chapters ({}):", chapters.len());
                for ch in &chapters {
                    let index = ch.index.as_deref().unwrap_or("-");
                    let end = ch
                        .end_page_number
                        .map(|p| format!("-{p}"))
                        .unwrap_or_default();
                    println!("  [{index}] \"{}\" p.{}{end}", ch.title, ch.start_page_number);
                }
            }
        }

        Commands::Sections { book_id, chapter } => {
            let sections = client.sections(BookId(book_id), chapter)?;
            if sections.is_empty() {
                println!("No sections found.");
            } else {
                println!("Sections ({}):", sections.len());
                for sec in &sections {
                    let index = sec.index.as_deref().unwrap_or("-");
                    println!("  [{index}] \"{}\" p.{}", sec.title, sec.start_page_number);
                }
            }
        }

        Commands::Page {
            book_id,
            page,
            image,
            dpi,
        } => {
            let book = BookId(book_id);
            match image {
                Some(path) => {
                    let bytes = client.page_image(book, page, dpi.unwrap_or(config.dpi))?;
                    std::fs::write(&path, &bytes).into_diagnostic()?;
                    println!("Wrote page {page} ({} bytes) to {}", bytes.len(), path.display());
                }
                None => {
                    let text = client.page_text(book, page)?;
                    println!("{text}");
                }
            }
        }

        Commands::Upload { file } => {
            let id = client.upload_book(&file)?;
            sink.emit(&Notice::info(format!(
                "uploaded {} as book {id}",
                file.display()
            )));
        }

        Commands::Remove { book_id } => {
            client.delete_book(BookId(book_id))?;
            sink.emit(&Notice::info(format!("deleted book {book_id}")));
        }

        Commands::Toc { action } => match action {
            TocAction::Status { book_id } => {
                let exists = client.toc_exists(BookId(book_id))?;
                if exists {
                    println!("Table of contents extracted.");
                } else {
                    println!("No table of contents. Run `pageturn toc refresh {book_id}`.");
                }
            }
            TocAction::Refresh { book_id, overwrite } => {
                client.refresh_toc(BookId(book_id), overwrite)?;
                sink.emit(&Notice::info(format!(
                    "table of contents refreshed for book {book_id}"
                )));
            }
        },
    }

    Ok(())
}

/// Resolve configuration and construct the client every command shares.
fn bootstrap(backend_override: Option<String>) -> PageturnResult<(AppConfig, Arc<ReaderClient>)> {
    let mut config = AppConfig::load()?;
    if let Some(url) = backend_override {
        config.backend_url = url;
    }
    let client = Arc::new(ReaderClient::new(&config));
    Ok((config, client))
}
