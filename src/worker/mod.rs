//! Mining workers
//!
//! The nonce-search core (`scan_range`) plus the multi-threaded CPU worker
//! built on top of it and the statistics shared between them.

use crate::crypto::pow_hash;
use crate::types::{Header, Nonce, Target, POK_DATA_MASK};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Span};

pub mod cpu;

pub use cpu::CpuWorker;

/// Result of scanning a nonce range
///
/// Both variants are normal results. Running out of nonces, or being asked to
/// stop, is expected and common; neither is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A nonce satisfying the target was found
    Found {
        /// The winning header, version word patched with kernel data
        header: Header,
        /// The winning nonce (also present in header word 19)
        nonce: Nonce,
        /// Nonces examined, including the winning one
        hashes_done: u64,
    },
    /// The range was exhausted or cancellation was observed
    Exhausted {
        /// The last nonce examined (`nonce_start` when nothing was examined)
        last_nonce: Nonce,
        /// Nonces examined
        hashes_done: u64,
    },
}

/// Search a nonce range for a header whose proof-of-work digest meets the
/// target
///
/// For each nonce the digest is computed twice. The first pass runs over the
/// header with the kernel-data bits of the version word cleared; the high 16
/// bits of that digest's first word are then patched into the version word
/// before the second pass produces the digest that is tested against the
/// target. Binding the final digest to a digest of the masked header is what
/// makes precomputing valid headers independent of the nonce impossible.
///
/// Nonces are examined in strictly increasing order starting at
/// `nonce_start`, stopping below `nonce_max`. The cancellation token is
/// polled once per nonce, between double-digest computations; an in-flight
/// digest always completes.
pub fn scan_range(
    template: &Header,
    target: &Target,
    nonce_start: Nonce,
    nonce_max: Nonce,
    cancel: &CancellationToken,
) -> ScanOutcome {
    let real_version = template.real_version();
    let target_word7 = target.word(7);

    let mut header = template.clone();
    let start = nonce_start.value();
    let mut nonce = start;

    while nonce < nonce_max.value() && !cancel.is_cancelled() {
        header.set_version(real_version);
        header.set_nonce(Nonce::new(nonce));
        let first_pass = pow_hash(&header);

        // Proof of kernel: the first pass decides the kernel-data bits
        let kernel = u32::from_le_bytes([first_pass[0], first_pass[1], first_pass[2], first_pass[3]]);
        header.set_version(real_version | (kernel & POK_DATA_MASK));
        let hash = pow_hash(&header);

        // Word 7 is most significant; comparing it first skips the full
        // comparison for almost every nonce
        let hash_word7 = u32::from_le_bytes([hash[28], hash[29], hash[30], hash[31]]);
        if hash_word7 <= target_word7 && target.meets(&hash) {
            debug!("found nonce {:08x}", nonce);
            return ScanOutcome::Found {
                header,
                nonce: Nonce::new(nonce),
                hashes_done: u64::from(nonce - start) + 1,
            };
        }

        nonce += 1;
    }

    let last_nonce = if nonce > start {
        Nonce::new(nonce - 1)
    } else {
        nonce_start
    };
    ScanOutcome::Exhausted {
        last_nonce,
        hashes_done: u64::from(nonce - start),
    }
}

/// Mining statistics for a worker
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    /// Total hashes computed
    pub total_hashes: u64,
    /// Number of solutions found
    pub solutions_found: u64,
    /// Time spent mining (seconds)
    pub mining_time_secs: u64,
    /// Current hash rate (hashes per second)
    pub current_hash_rate: f64,
    /// Average hash rate (hashes per second)
    pub average_hash_rate: f64,
}

/// Utility function to compute hash rate over a time period
pub fn compute_hash_rate(hashes: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        hashes as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// Create a tracing span for mining operations
pub fn mining_span(worker_type: &str, nonce_start: Nonce, nonce_max: Nonce) -> Span {
    tracing::info_span!(
        "mining",
        worker_type = worker_type,
        nonce_start = nonce_start.value(),
        nonce_max = nonce_max.value(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn template() -> Header {
        let mut bytes = [0u8; Header::SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut header = Header::from_bytes(&bytes).unwrap();
        // Garbage kernel-data bits that the search must mask off
        header.set_version(0xbeef0004);
        header
    }

    #[test]
    fn test_scan_finds_first_nonce_on_max_target() {
        let cancel = CancellationToken::new();
        let outcome = scan_range(
            &template(),
            &Target::max(),
            Nonce::new(7),
            Nonce::new(100),
            &cancel,
        );

        assert_matches!(
            outcome,
            ScanOutcome::Found { nonce, hashes_done, .. } if nonce == Nonce::new(7) && hashes_done == 1
        );
    }

    #[test]
    fn test_found_header_is_reproducible() {
        let template = template();
        let cancel = CancellationToken::new();
        let outcome = scan_range(
            &template,
            &Target::max(),
            Nonce::new(42),
            Nonce::new(43),
            &cancel,
        );

        let header = match outcome {
            ScanOutcome::Found { header, .. } => header,
            other => panic!("expected a solution, got {:?}", other),
        };

        // Re-derive the kernel patch independently
        let mut check = template.clone();
        check.set_version(template.real_version());
        check.set_nonce(Nonce::new(42));
        let first_pass = pow_hash(&check);
        let kernel =
            u32::from_le_bytes([first_pass[0], first_pass[1], first_pass[2], first_pass[3]]);
        check.set_version(template.real_version() | (kernel & POK_DATA_MASK));

        assert_eq!(header, check);
        assert_eq!(header.real_version(), template.real_version());
        assert_eq!(header.nonce(), Nonce::new(42));
        assert!(Target::max().meets(&pow_hash(&header)));
    }

    #[test]
    fn test_scan_exhausts_on_min_target() {
        let cancel = CancellationToken::new();
        let outcome = scan_range(
            &template(),
            &Target::min(),
            Nonce::new(0),
            Nonce::new(10),
            &cancel,
        );

        assert_eq!(
            outcome,
            ScanOutcome::Exhausted {
                last_nonce: Nonce::new(9),
                hashes_done: 10,
            }
        );
    }

    #[test]
    fn test_scan_empty_range() {
        let cancel = CancellationToken::new();
        let outcome = scan_range(
            &template(),
            &Target::max(),
            Nonce::new(5),
            Nonce::new(5),
            &cancel,
        );

        assert_eq!(
            outcome,
            ScanOutcome::Exhausted {
                last_nonce: Nonce::new(5),
                hashes_done: 0,
            }
        );
    }

    #[test]
    fn test_scan_observes_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = scan_range(
            &template(),
            &Target::max(),
            Nonce::new(0),
            Nonce::new(u32::MAX),
            &cancel,
        );

        assert_eq!(
            outcome,
            ScanOutcome::Exhausted {
                last_nonce: Nonce::new(0),
                hashes_done: 0,
            }
        );
    }

    #[test]
    fn test_hashes_done_accounting() {
        // hashes_done == last_nonce - nonce_start + 1 in both outcomes
        let cancel = CancellationToken::new();

        match scan_range(&template(), &Target::min(), Nonce::new(20), Nonce::new(25), &cancel) {
            ScanOutcome::Exhausted { last_nonce, hashes_done } => {
                assert_eq!(hashes_done, u64::from(last_nonce.value()) - 20 + 1);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }

        match scan_range(&template(), &Target::max(), Nonce::new(20), Nonce::new(25), &cancel) {
            ScanOutcome::Found { nonce, hashes_done, .. } => {
                assert_eq!(hashes_done, u64::from(nonce.value()) - 20 + 1);
            }
            other => panic!("expected a solution, got {:?}", other),
        }
    }

    #[test]
    fn test_compute_hash_rate() {
        let rate = compute_hash_rate(1000, Duration::from_secs(10));
        assert_eq!(rate, 100.0);

        let rate = compute_hash_rate(1000, Duration::from_secs(0));
        assert_eq!(rate, 0.0);
    }
}
