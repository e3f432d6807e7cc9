use std::path::Path;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::{App, Arg};

use tones::batch::load_folder;
use tones::config::PipelineConfig;
use tones::matcher::MatchOutcome;
use tones::pipeline::{index_file, search_file};
use tones::store::{IndexStore, SqliteIndexStore};

const DEFAULT_DB_PATH: &str = "tones.db";
const ERROR_LOG_PATH: &str = "error.log";

fn main() {
    let matches = App::new("tones")
        .version(env!("CARGO_PKG_VERSION"))
        .about("An audio fingerprinting and recognition tool, in the style of Shazam")
        .arg(
            Arg::with_name("mode")
                .long("mode")
                .value_name("MODE")
                .help("One of: load, load_folder, search")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("filename")
                .long("filename")
                .value_name("PATH")
                .help("File to load/search, or folder to load_folder")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .help("Enable debug-level logging"),
        )
        .arg(
            Arg::with_name("overwrite")
                .long("overwrite")
                .help("For load_folder, re-create the schema before ingest"),
        )
        .arg(
            Arg::with_name("db")
                .long("db")
                .value_name("PATH")
                .help("Path to the SQLite index database")
                .takes_value(true)
                .default_value(DEFAULT_DB_PATH),
        )
        .arg(
            Arg::with_name("workers")
                .long("workers")
                .value_name("N")
                .help("Worker thread count for load_folder")
                .takes_value(true),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mode = matches.value_of("mode").unwrap();
    let filename = matches.value_of("filename").unwrap();
    let db_path = matches.value_of("db").unwrap();

    let mut config = PipelineConfig::default();
    if let Some(workers) = matches.value_of("workers") {
        match workers.parse::<usize>() {
            Ok(n) => config = config.with_worker_count(n),
            Err(_) => {
                log::error!("invalid --workers value: {}", workers);
                process::exit(1);
            }
        }
    }

    let store = match SqliteIndexStore::open(db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("failed to open index database {}: {}", db_path, e);
            process::exit(2);
        }
    };

    if let Err(e) = store.create_schema() {
        log::error!("failed to initialize schema: {}", e);
        process::exit(2);
    }

    let exit_code = match mode {
        "load" => run_load(Path::new(filename), store.as_ref(), &config),
        "load_folder" => run_load_folder(Path::new(filename), store, config, matches.is_present("overwrite")),
        "search" => run_search(Path::new(filename), store.as_ref(), &config),
        other => {
            log::error!("invalid mode: {}", other);
            1
        }
    };

    process::exit(exit_code);
}

fn run_load(path: &Path, store: &dyn IndexStore, config: &PipelineConfig) -> i32 {
    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown");
    match index_file(path, name, store, config) {
        Ok(true) => {
            println!("indexed {}", path.display());
            0
        }
        Ok(false) => {
            println!("{} already indexed", path.display());
            0
        }
        Err(e) => {
            log::error!("failed to load {}: {}", path.display(), e);
            2
        }
    }
}

fn run_load_folder(path: &Path, store: Arc<SqliteIndexStore>, config: PipelineConfig, overwrite: bool) -> i32 {
    if overwrite {
        if let Err(e) = store.reset_schema() {
            log::error!("failed to re-create schema: {}", e);
            return 2;
        }
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let store: Arc<dyn IndexStore> = store;

    match load_folder(path, store, config, cancel, Path::new(ERROR_LOG_PATH)) {
        Ok(summary) => {
            println!(
                "load_folder complete: {} indexed, {} skipped, {} failed",
                summary.indexed, summary.skipped, summary.failed
            );
            0
        }
        Err(e) => {
            log::error!("failed to read directory {}: {}", path.display(), e);
            2
        }
    }
}

fn run_search(path: &Path, store: &dyn IndexStore, config: &PipelineConfig) -> i32 {
    match search_file(path, store, config) {
        Ok(MatchOutcome::Coherent { tone, score }) => {
            println!("match: {} (tone_id={}, coherency score={})", tone.name, tone.tone_id, score);
            0
        }
        Ok(MatchOutcome::Ratio(candidates)) => {
            println!("possible matches:");
            for (tone, ratio) in candidates {
                println!("  {} (tone_id={}, ratio={:.2})", tone.name, tone.tone_id, ratio);
            }
            0
        }
        Ok(MatchOutcome::NotFound) => {
            println!("not found");
            0
        }
        Err(e) => {
            log::error!("failed to search {}: {}", path.display(), e);
            2
        }
    }
}
