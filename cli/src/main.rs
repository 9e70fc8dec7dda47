use clap::{Parser, Subcommand, ValueEnum};
use importer::{ImportReport, SqliteStore, Strategy, DEFAULT_INPUT};
use listenfd::ListenFd;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
struct Args {
    /// Path of the database file.
    #[arg(long)]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload words from a JSON file, creating any missing categories.
    Import {
        /// JSON array of {"english", "turkish", "category"} entries.
        #[arg(long, short = 'i', default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// How category word counts are updated after the upload.
        #[arg(long, value_enum, default_value_t = CountStrategy::Recompute)]
        strategy: CountStrategy,
    },
    /// Recompute the word count of every category.
    Recount,
    /// Serve a read-only view of the categories and their words.
    Serve {
        /// Bind to this address and TCP port (e.g. 0.0.0.0:3000).
        /// If unspecified (default), listen using the sd_listen_fd protocol.
        #[arg(long, short = 'l')]
        bind_pattern: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CountStrategy {
    /// Count the stored words of each category.
    Recompute,
    /// Add this run's words to the stored counts.
    Incremental,
}

impl From<CountStrategy> for Strategy {
    fn from(v: CountStrategy) -> Self {
        match v {
            CountStrategy::Recompute => Strategy::Recompute,
            CountStrategy::Incremental => Strategy::Incremental,
        }
    }
}

fn fatal(context: &str, err: impl std::fmt::Display) -> ! {
    tracing::error!("{context}: {err}");
    std::process::exit(1)
}

fn open_store(db: &Path) -> SqliteStore {
    SqliteStore::open(db).unwrap_or_else(|e| fatal("could not open the word store", e))
}

fn print_report(report: &ImportReport) {
    eprintln!("{} categories created", report.created.len());
    for c in &report.created {
        eprintln!("  {} ({})", c.name, c.color);
    }
    eprintln!(
        "{} of {} words uploaded in {} group commits, {} failed",
        report.uploaded, report.total, report.chunks, report.failed
    );
    if !report.failed_chunks.is_empty() {
        eprintln!("failed chunks: {:?}", report.failed_chunks);
    }
    for (name, count) in &report.word_counts {
        eprintln!("  {name}: {count} words");
    }
    if !report.errors.is_empty() {
        eprintln!("got {} errors", report.errors.len());
        for err in &report.errors {
            eprintln!("{err}");
        }
    }
}

fn run_import(db: &Path, input: &Path, strategy: Strategy) {
    let records = importer::load_words(input).unwrap_or_else(|e| fatal("could not load words", e));
    eprintln!("found {} words in {}", records.len(), input.display());

    let mut store = open_store(db);
    let report = importer::import(&mut store, &records, strategy)
        .unwrap_or_else(|e| fatal("import aborted", e));
    print_report(&report);
    if !report.errors.is_empty() {
        std::process::exit(2);
    }
}

fn run_recount(db: &Path) {
    let mut store = open_store(db);
    let out =
        importer::recount_all(&mut store).unwrap_or_else(|e| fatal("could not list categories", e));
    for (name, count) in &out.word_counts {
        eprintln!("{name}: {count} words");
    }
    if !out.errors.is_empty() {
        eprintln!("got {} errors", out.errors.len());
        for err in &out.errors {
            eprintln!("{err}");
        }
        std::process::exit(2);
    }
}

async fn serve(db: &Path, bind_pattern: Option<String>) {
    let server =
        browse::serve(db).unwrap_or_else(|e| fatal("could not instantiate the word browser", e));

    let tcp_listener = if let Some(v) = bind_pattern {
        tracing::info!("attempting to listen at {}", v);
        tokio::net::TcpListener::bind(&v)
            .await
            .unwrap_or_else(|e| fatal("could not open TCP socket", e))
    } else {
        let v = match ListenFd::from_env().take_tcp_listener(0) {
            Ok(Some(v)) => v,
            Ok(None) => fatal("no TCP socket available", "pass --bind-pattern or a listen fd"),
            Err(e) => fatal("could not take TCP socket from environment", e),
        };
        v.set_nonblocking(true)
            .and_then(|()| tokio::net::TcpListener::from_std(v))
            .unwrap_or_else(|e| fatal("could not open TCP socket from environment", e))
    };

    tracing::info!("starting server via TCP");
    if let Err(e) = axum::serve(tcp_listener, server).await {
        fatal("server failed", e);
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let args: Args = Args::parse();

    // Only the browser needs a runtime; imports are plain blocking SQLite work.
    match args.command {
        Command::Import { input, strategy } => run_import(&args.db, &input, strategy.into()),
        Command::Recount => run_recount(&args.db),
        Command::Serve { bind_pattern } => {
            let runtime = tokio::runtime::Runtime::new()
                .unwrap_or_else(|e| fatal("could not start the async runtime", e));
            runtime.block_on(serve(&args.db, bind_pattern));
        }
    }
}
