use std::io::BufRead;

use crate::cache::{AccessOutcome, Cache};
use crate::trace::{Operation, Trace, TraceEntry, TraceError};

/// Aggregate counters for one simulation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl SimStats {
    fn record(&mut self, outcome: AccessOutcome) {
        match outcome {
            AccessOutcome::Hit => self.hits += 1,
            AccessOutcome::Miss => self.misses += 1,
            AccessOutcome::MissWithEviction => {
                self.misses += 1;
                self.evictions += 1;
            }
        }
    }
}

/// Drives a cache model from a reference stream and keeps the counters.
pub struct Simulator {
    cache: Cache,
    stats: SimStats,
}

impl Simulator {
    pub fn new(cache: Cache) -> Simulator {
        Simulator {
            cache,
            stats: SimStats::default(),
        }
    }

    /// Feed one reference through the cache. Instruction fetches are skipped
    /// outright and return None. A Modify reference accesses its address a
    /// second time; having just touched the line, that access is a guaranteed
    /// hit, and it still advances the recency clock.
    pub fn step(&mut self, entry: &TraceEntry) -> Option<AccessOutcome> {
        if entry.operation == Operation::Instruction {
            return None;
        }
        let outcome = self.cache.access(entry.address);
        self.stats.record(outcome);
        if entry.operation == Operation::Modify {
            let second = self.cache.access(entry.address);
            debug_assert_eq!(second, AccessOutcome::Hit);
            self.stats.hits += 1;
        }
        Some(outcome)
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }
}

/// Replay a whole trace, echoing each data reference and its outcome when
/// verbose (e.g. `M 20,1 miss eviction hit`), and return the final counters.
pub fn run_trace<R: BufRead>(
    trace: Trace<R>,
    cache: Cache,
    verbose: bool,
) -> Result<SimStats, TraceError> {
    let mut sim = Simulator::new(cache);
    for entry in trace {
        let entry = entry?;
        let Some(outcome) = sim.step(&entry) else {
            continue;
        };
        if verbose {
            let modify_hit = if entry.operation == Operation::Modify {
                " hit"
            } else {
                ""
            };
            println!(
                "{} {:x},{} {}{}",
                entry.operation, entry.address, entry.size, outcome, modify_hit
            );
        }
    }
    Ok(sim.stats())
}
