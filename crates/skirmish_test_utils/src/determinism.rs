//! Determinism testing utilities.
//!
//! A skirmish must replay identically from its seed. Sources of
//! non-determinism the core guards against:
//!
//! - **Floating-point math**: positions and distances use
//!   [`skirmish_core::math::Fixed`].
//! - **HashMap iteration order**: systems walk entities in sorted id order.
//! - **System randomness**: the only RNG is the match `SmallRng`, seeded
//!   from the config.
//!
//! The helpers here run the same setup more than once and compare
//! [`Simulation::state_hash`] values.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skirmish_core::simulation::Simulation;

/// Result of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Ticks simulated per run.
    pub ticks: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, ticks: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            ticks,
        }
    }

    /// Distinct hashes; exactly one for a deterministic simulation.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Simulation is non-deterministic!\n\
             Runs: {}\n\
             Ticks: {}\n\
             Unique hashes: {} (expected 1)\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.ticks,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

fn run_to_hash<F>(setup: &F, ticks: u64) -> u64
where
    F: Fn() -> Simulation,
{
    let mut sim = setup();
    for _ in 0..ticks {
        sim.tick();
        if sim.is_over() {
            break;
        }
    }
    sim.state_hash()
}

/// Run the simulation built by `setup` `runs` times for `ticks` fixed
/// ticks each and compare the final hashes.
///
/// # Example
///
/// ```
/// use skirmish_core::config::GameConfig;
/// use skirmish_core::simulation::Simulation;
/// use skirmish_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 200, || Simulation::new_skirmish(GameConfig::with_seed(5)));
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<F>(runs: usize, ticks: u64, setup: F) -> DeterminismResult
where
    F: Fn() -> Simulation,
{
    let hashes = (0..runs).map(|_| run_to_hash(&setup, ticks)).collect();
    DeterminismResult::from_hashes(hashes, ticks)
}

/// Like [`verify_determinism`] but each run on its own scoped thread, to
/// catch state leaking between threads.
pub fn verify_determinism_parallel<F>(runs: usize, ticks: u64, setup: F) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| s.spawn(|| run_to_hash(&setup, ticks)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_default())
            .collect()
    });
    DeterminismResult::from_hashes(hashes, ticks)
}

/// Tick two copies side by side and report the first tick whose hashes
/// differ. `Some(0)` means the setups already differ.
pub fn find_first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut a = setup();
    let mut b = setup();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=ticks {
        a.tick();
        b.tick();
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }
    None
}

/// Hash any hashable value with the standard hasher.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
