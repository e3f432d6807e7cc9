use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::index_file;
use crate::store::IndexStore;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "flac"];

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively enumerate files under `root` whose extension is one of
/// `.wav`, `.mp3`, `.flac`.
fn find_audio_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if has_supported_extension(&path) {
                out.push(path);
            }
        }
    }

    Ok(out)
}

/// Outcome counters for a `load_folder` run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

fn log_failure(error_log: &Mutex<std::fs::File>, path: &Path, message: &str) {
    let mut file = error_log.lock().unwrap();
    let _ = writeln!(
        file,
        "{}\t{}\t{}",
        chrono::Utc::now().to_rfc3339(),
        path.display(),
        message
    );
}

/// Recursively index every supported audio file under `root`. A worker
/// pool of `config.worker_count` threads pulls paths off a shared channel;
/// per-file failures are appended to `error.log` at `error_log_path`
/// rather than aborting the run. `cancel` is checked at each task boundary
/// so a caller can request an early, cooperative shutdown.
pub fn load_folder(
    root: &Path,
    store: Arc<dyn IndexStore>,
    config: PipelineConfig,
    cancel: Arc<AtomicBool>,
    error_log_path: &Path,
) -> Result<BatchSummary> {
    let files = find_audio_files(root)?;
    log::info!("found {} candidate files under {}", files.len(), root.display());

    let (tx, rx) = mpsc::channel::<PathBuf>();
    for path in files {
        let _ = tx.send(path);
    }
    drop(tx);

    let rx = Arc::new(Mutex::new(rx));
    let error_log = Arc::new(Mutex::new(
        OpenOptions::new().create(true).append(true).open(error_log_path)?,
    ));
    let summary = Arc::new(Mutex::new(BatchSummary::default()));

    let worker_count = config.worker_count.max(1);
    let mut handles = Vec::with_capacity(worker_count);

    for worker_id in 0..worker_count {
        let rx = Arc::clone(&rx);
        let store = Arc::clone(&store);
        let config = config.clone();
        let cancel = Arc::clone(&cancel);
        let error_log = Arc::clone(&error_log);
        let summary = Arc::clone(&summary);

        handles.push(thread::spawn(move || {
            loop {
                if cancel.load(Ordering::Relaxed) {
                    log::debug!("worker {} stopping on cancellation", worker_id);
                    break;
                }

                let next = { rx.lock().unwrap().recv() };
                let path = match next {
                    Ok(path) => path,
                    Err(_) => break,
                };

                let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown").to_string();

                match index_file(&path, &name, store.as_ref(), &config) {
                    Ok(true) => summary.lock().unwrap().indexed += 1,
                    Ok(false) => summary.lock().unwrap().skipped += 1,
                    Err(e) => {
                        log::error!("failed to index {}: {}", path.display(), e);
                        log_failure(&error_log, &path, &e.to_string());
                        summary.lock().unwrap().failed += 1;
                    }
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.join();
    }

    let summary = *summary.lock().unwrap();
    log::info!(
        "load_folder complete: {} indexed, {} skipped, {} failed",
        summary.indexed,
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_supported_extensions() {
        assert!(has_supported_extension(Path::new("song.wav")));
        assert!(has_supported_extension(Path::new("song.MP3")));
        assert!(has_supported_extension(Path::new("song.flac")));
        assert!(!has_supported_extension(Path::new("song.ogg")));
    }

    #[test]
    fn find_audio_files_walks_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(dir.path().join("top.wav"), b"").unwrap();
        std::fs::write(sub.join("deep.mp3"), b"").unwrap();
        std::fs::write(sub.join("ignore.txt"), b"").unwrap();

        let found = find_audio_files(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
    }
}
