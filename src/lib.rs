//! # tones
//!
//! An audio fingerprinting and recognition library, in the style of
//! Shazam: WAV parsing, preprocessing, spectrogram/peak extraction,
//! target-zone fingerprinting, SQLite-backed indexing and matching.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tones::config::PipelineConfig;
//! use tones::store::SqliteIndexStore;
//! use tones::pipeline::{index_file, search_file};
//! use std::path::Path;
//!
//! let store = SqliteIndexStore::open("tones.db").unwrap();
//! store.create_schema().unwrap();
//!
//! let config = PipelineConfig::default();
//! index_file(Path::new("song.wav"), "song", &store, &config).unwrap();
//!
//! match search_file(Path::new("clip.wav"), &store, &config) {
//!     Ok(outcome) => println!("{:?}", outcome),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

pub mod batch;
pub mod codec;
pub mod config;
pub mod decode;
pub mod error;
pub mod fingerprint;
pub mod matcher;
pub mod peaks;
pub mod pipeline;
pub mod preprocess;
pub mod spectrogram;
pub mod store;
pub mod tone;
pub mod wav;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use matcher::MatchOutcome;
pub use tone::Tone;

/// Current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
