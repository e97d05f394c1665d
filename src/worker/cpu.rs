//! CPU mining worker implementation
//!
//! Multi-threaded nonce search over the ziftr double-digest pipeline. The
//! nonce range is split into disjoint contiguous sub-ranges, one per thread,
//! so no nonce is ever examined twice and none is skipped.

use super::{compute_hash_rate, mining_span, scan_range, MiningStats, ScanOutcome};
use crate::{Error, Header, Nonce, Result, Target};
use std::cmp;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Nonces scanned between statistics updates
const BATCH_SIZE: u32 = 10_000;

/// CPU mining worker using multiple threads
pub struct CpuWorker {
    thread_count: usize,
    stats: Arc<CpuMiningStats>,
}

/// Thread-safe mining statistics for CPU worker
#[derive(Debug)]
struct CpuMiningStats {
    total_hashes: AtomicU64,
    solutions_found: AtomicU64,
    start_time: Instant,
    is_mining: AtomicBool,
}

impl CpuMiningStats {
    fn new() -> Self {
        Self {
            total_hashes: AtomicU64::new(0),
            solutions_found: AtomicU64::new(0),
            start_time: Instant::now(),
            is_mining: AtomicBool::new(false),
        }
    }

    fn reset(&self) {
        self.total_hashes.store(0, Ordering::Relaxed);
        self.solutions_found.store(0, Ordering::Relaxed);
        self.is_mining.store(false, Ordering::Relaxed);
    }

    fn to_mining_stats(&self) -> MiningStats {
        let total_hashes = self.total_hashes.load(Ordering::Relaxed);
        let solutions = self.solutions_found.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed();
        let rate = compute_hash_rate(total_hashes, elapsed);

        MiningStats {
            total_hashes,
            solutions_found: solutions,
            mining_time_secs: elapsed.as_secs(),
            current_hash_rate: rate,
            average_hash_rate: rate,
        }
    }
}

impl CpuWorker {
    /// Create a new CPU worker with specified thread count (0 = one thread
    /// per logical CPU)
    pub fn new(thread_count: usize) -> Self {
        let thread_count = if thread_count == 0 {
            num_cpus::get()
        } else {
            thread_count
        };

        info!("Creating CPU worker with {} threads", thread_count);

        Self {
            thread_count,
            stats: Arc::new(CpuMiningStats::new()),
        }
    }

    /// Search `[nonce_start, nonce_max)` for a header satisfying the target
    ///
    /// The range is split into one disjoint sub-range per thread. The first
    /// solution wins and cancels the remaining threads. When every thread
    /// exhausts its sub-range, or cancellation is requested from outside,
    /// the result is `Exhausted` - a normal outcome, not an error. In a
    /// `Found` outcome `hashes_done` counts the winning thread's own work;
    /// totals across all threads are available from [`CpuWorker::stats`].
    pub async fn mine(
        &self,
        template: Header,
        target: Target,
        nonce_start: Nonce,
        nonce_max: Nonce,
        cancellation: CancellationToken,
        stats_tx: Option<mpsc::UnboundedSender<MiningStats>>,
    ) -> Result<ScanOutcome> {
        let _span = mining_span("cpu", nonce_start, nonce_max);

        let total = nonce_max.value().saturating_sub(nonce_start.value());
        if total == 0 {
            return Ok(ScanOutcome::Exhausted {
                last_nonce: nonce_start,
                hashes_done: 0,
            });
        }

        info!(
            "Starting CPU mining with {} threads (difficulty level: {})",
            self.thread_count,
            target.difficulty_level()
        );

        self.stats.reset();
        self.stats.is_mining.store(true, Ordering::Relaxed);

        // Channel for per-thread outcomes
        let (solution_tx, mut solution_rx) = mpsc::unbounded_channel();

        // One disjoint contiguous sub-range per thread
        let threads = cmp::max(1, cmp::min(self.thread_count, total as usize));
        let chunk = total / threads as u32;

        let mut handles = Vec::new();
        for thread_id in 0..threads {
            let start = nonce_start.value() + thread_id as u32 * chunk;
            let end = if thread_id == threads - 1 {
                nonce_max.value()
            } else {
                start + chunk
            };

            let template = template.clone();
            let stats = Arc::clone(&self.stats);
            let cancellation = cancellation.clone();
            let solution_tx = solution_tx.clone();

            let handle = task::spawn_blocking(move || {
                let outcome =
                    Self::mine_thread(thread_id, &template, &target, start, end, &stats, &cancellation);
                // Receiver dropping just means nobody is listening anymore
                let _ = solution_tx.send(outcome);
            });

            handles.push(handle);
        }

        // Drop the original sender so the channel closes when all threads finish
        drop(solution_tx);

        // Statistics reporting loop
        let stats_clone = Arc::clone(&self.stats);
        let stats_cancellation = cancellation.clone();
        let stats_handle = stats_tx.map(|stats_tx| {
            task::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(5));
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let _ = stats_tx.send(stats_clone.to_mining_stats());
                        }
                        _ = stats_cancellation.cancelled() => break,
                    }
                }
            })
        });

        // Collect thread outcomes; the first solution preempts the rest
        let mut found: Option<ScanOutcome> = None;
        let mut last_nonce = nonce_start;
        let mut hashes_done: u64 = 0;

        while let Some(outcome) = solution_rx.recv().await {
            match outcome {
                ScanOutcome::Found { .. } => {
                    if found.is_none() {
                        info!("CPU mining found solution");
                        self.stats.solutions_found.fetch_add(1, Ordering::Relaxed);
                        cancellation.cancel();
                        found = Some(outcome);
                    }
                }
                ScanOutcome::Exhausted {
                    last_nonce: nonce,
                    hashes_done: done,
                } => {
                    last_nonce = cmp::max(last_nonce, nonce);
                    hashes_done += done;
                }
            }
        }

        // Cleanup: stop the stats loop and reap the threads
        cancellation.cancel();

        for handle in handles {
            handle
                .await
                .map_err(|e| Error::worker("cpu", e.to_string()))?;
        }

        if let Some(handle) = stats_handle {
            let _ = handle.await;
        }

        self.stats.is_mining.store(false, Ordering::Relaxed);

        let final_stats = self.stats.to_mining_stats();
        info!(
            "CPU mining completed. Total hashes: {}, Hash rate: {:.2} MH/s",
            final_stats.total_hashes,
            final_stats.average_hash_rate / 1_000_000.0
        );

        Ok(found.unwrap_or(ScanOutcome::Exhausted {
            last_nonce,
            hashes_done,
        }))
    }

    /// Mine one sub-range on a single thread
    fn mine_thread(
        thread_id: usize,
        template: &Header,
        target: &Target,
        start: u32,
        end: u32,
        stats: &CpuMiningStats,
        cancellation: &CancellationToken,
    ) -> ScanOutcome {
        debug!(
            "Starting mining thread {} for nonces {:08x}..{:08x}",
            thread_id, start, end
        );

        let mut nonce = start;
        let mut done: u64 = 0;
        let mut last_nonce = Nonce::new(start);

        while nonce < end && !cancellation.is_cancelled() {
            let batch_end = cmp::min(nonce.saturating_add(BATCH_SIZE), end);

            match scan_range(
                template,
                target,
                Nonce::new(nonce),
                Nonce::new(batch_end),
                cancellation,
            ) {
                ScanOutcome::Found {
                    header,
                    nonce: found_nonce,
                    hashes_done,
                } => {
                    stats.total_hashes.fetch_add(hashes_done, Ordering::Relaxed);
                    debug!("Thread {} found solution at nonce {}", thread_id, found_nonce);
                    return ScanOutcome::Found {
                        header,
                        nonce: found_nonce,
                        hashes_done: done + hashes_done,
                    };
                }
                ScanOutcome::Exhausted {
                    last_nonce: batch_last,
                    hashes_done,
                } => {
                    stats.total_hashes.fetch_add(hashes_done, Ordering::Relaxed);
                    done += hashes_done;
                    if hashes_done > 0 {
                        last_nonce = batch_last;
                    }
                    nonce = batch_end;
                }
            }
        }

        debug!("Thread {} exhausted with {} hashes", thread_id, done);
        ScanOutcome::Exhausted {
            last_nonce,
            hashes_done: done,
        }
    }

    /// Get current mining statistics
    pub fn stats(&self) -> MiningStats {
        self.stats.to_mining_stats()
    }
}
