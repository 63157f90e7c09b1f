//! Many independent comparisons on a bounded worker pool.

pub mod plan;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug, info_span, warn};

use crate::compare::{CompareError, CompareOptions, ComparisonResult, compare_png};

pub use self::plan::{BatchPlan, Pair};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid filter {0}")]
    Filter(String),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error("comparison task panicked")]
    Panicked,
}

/// A finished comparison and how long it took.
pub struct Compared {
    pub result: ComparisonResult,
    pub elapsed: Duration,
}

pub type PairOutcome = Result<Compared, BatchError>;

/// Read and compare one pair. Blocking.
pub fn compare_pair(pair: &Pair, options: &CompareOptions) -> PairOutcome {
    let start = Instant::now();
    let read = |path: &PathBuf| {
        std::fs::read(path).map_err(|source| BatchError::Read {
            path: path.clone(),
            source,
        })
    };
    let baseline = read(&pair.baseline)?;
    let current = read(&pair.current)?;
    let result = compare_png(&baseline, &current, options)?;
    Ok(Compared {
        result,
        elapsed: start.elapsed(),
    })
}

/// Compare every pair with at most `parallel` comparisons in flight.
///
/// A failing pair is reported through the channel and does not stop the run.
/// The channel closes once every pair has been reported.
pub fn run(
    pairs: Vec<Pair>,
    options: CompareOptions,
    parallel: usize,
) -> mpsc::Receiver<(Pair, PairOutcome)> {
    let parallel = parallel.max(1);
    let worker_count = pairs.len().min(parallel);
    debug!(pairs = pairs.len(), workers = worker_count, "starting batch");

    let (tx, rx) = mpsc::channel(parallel * 2);
    let queue = Arc::new(Mutex::new(pairs));

    for idx in 0..worker_count {
        let queue = queue.clone();
        let tx = tx.clone();
        tokio::spawn(
            async move {
                loop {
                    let Some(pair) = queue.lock().await.pop() else {
                        debug!("queue empty, exiting");
                        break;
                    };
                    debug!(pair = %pair.id, "picked pair");

                    let job = pair.clone();
                    let outcome = tokio::task::spawn_blocking(move || compare_pair(&job, &options))
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "comparison task panicked");
                            Err(BatchError::Panicked)
                        });

                    if tx.send((pair, outcome)).await.is_err() {
                        warn!("receiver dropped, stopping");
                        break;
                    }
                }
            }
            .instrument(info_span!("worker", id = idx)),
        );
    }

    rx
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::codec;

    fn write_png(root: &Path, id: &str, img: &RgbaImage) {
        let path = root.join(format!("{id}.png"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, codec::encode(img).unwrap()).unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_pair_is_reported() {
        let base = tempfile::tempdir().unwrap();
        let cur = tempfile::tempdir().unwrap();
        let white = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        let mut marked = white.clone();
        marked.put_pixel(4, 4, Rgba([0, 0, 0, 255]));

        for i in 0..6 {
            let id = format!("page{i}/desktop");
            write_png(base.path(), &id, &white);
            write_png(cur.path(), &id, if i % 2 == 0 { &white } else { &marked });
        }
        write_png(base.path(), "odd/size", &white);
        write_png(cur.path(), "odd/size", &RgbaImage::new(8, 9));

        let plan = BatchPlan::plan(base.path(), cur.path(), None).unwrap();
        assert_eq!(plan.total(), 7);
        let mut rx = run(plan.pairs, CompareOptions::default(), 3);

        let mut passed = 0;
        let mut failed = 0;
        let mut errored = Vec::new();
        while let Some((pair, outcome)) = rx.recv().await {
            match outcome {
                Ok(c) if c.result.metrics.pass => passed += 1,
                Ok(c) => {
                    assert_eq!(c.result.metrics.mismatched_pixel_count, 1);
                    assert!(c.result.diff_image.is_some());
                    failed += 1;
                }
                Err(e) => errored.push((pair.id, e)),
            }
        }
        assert_eq!((passed, failed), (3, 3));
        assert_eq!(errored.len(), 1);
        assert_eq!(errored[0].0, "odd/size");
        assert!(matches!(
            errored[0].1,
            BatchError::Compare(CompareError::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn empty_batch_closes_immediately() {
        let mut rx = run(Vec::new(), CompareOptions::default(), 4);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let pair = Pair {
            id: "x".into(),
            baseline: dir.path().join("missing.png"),
            current: dir.path().join("missing.png"),
        };
        let err = compare_pair(&pair, &CompareOptions::default()).err().unwrap();
        assert!(matches!(err, BatchError::Read { .. }));
    }
}
