//! Drives the SAT solver to a lexicographically optimal model: first
//! minimizing unlocks from the lock, then minimizing version-downgrade
//! penalties. Selections are snapshotted into the [`Repository`] after every
//! improving model, per §9's incremental-solving discipline: never retract a
//! previously accepted solution mid-search.

use crate::internals::counters::{sequential_counters, CounterSet};
use crate::internals::encoder::Encoding;
use crate::internals::error::{self, ResolutionError};
use crate::internals::sat::{Assignment, SatSolver};
use crate::internals::types::Repository;

/// Runs the full optimization pipeline and writes the best-known selections
/// into `repo`. Returns an error only if the initial hard-constraint solve
/// is unsatisfiable; probe unsatisfiability during the upper-bound searches
/// is expected and simply ends that phase.
pub fn optimize<S: SatSolver>(
    solver: &mut S,
    repo: &mut Repository,
    encoding: &Encoding,
) -> Result<(), ResolutionError> {
    if !solver.solve(&[]) {
        return error::GlobalUnsatSnafu.fail();
    }
    snapshot_selections(solver, repo, encoding);
    log::debug!(
        "initial model found: {} names, {} packages",
        repo.names.len(),
        repo.packages.len()
    );

    if !encoding.unlock_vars.is_empty() {
        let unlocks = sequential_counters(solver, &encoding.unlock_vars);
        if let Some(k) = minimize(solver, repo, encoding, &unlocks, "unlock") {
            // Permanently assert the tightest bound so the penalty phase
            // cannot regress unlock count.
            solver.unit(unlocks.at_least(k).negative());
        }
    }

    if !encoding.penalty_vars.is_empty() {
        let penalties = sequential_counters(solver, &encoding.penalty_vars);
        minimize(solver, repo, encoding, &penalties, "penalty");
    }

    Ok(())
}

/// Binary upper-bound search for the smallest `k` such that asserting
/// `¬counters.at_least(k)` (fewer than `k` violations) is satisfiable.
/// Snapshots selections after every satisfiable probe. Returns the smallest
/// satisfiable `k`, or `None` if no probe in `1..=size` succeeded.
fn minimize<S: SatSolver>(
    solver: &mut S,
    repo: &mut Repository,
    encoding: &Encoding,
    counters: &CounterSet,
    label: &str,
) -> Option<usize> {
    let n = counters.size();
    let mut lo = 1usize;
    let mut hi = n;
    let mut best: Option<usize> = None;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let feasible = solver.solve(&[counters.at_least(mid).negative()]);
        log::debug!("{label} probe k={mid}: {}", if feasible { "sat" } else { "unsat" });
        if feasible {
            snapshot_selections(solver, repo, encoding);
            best = Some(mid);
            hi = mid - 1;
        } else {
            lo = mid + 1;
        }
    }

    best
}

fn snapshot_selections<S: SatSolver>(solver: &S, repo: &mut Repository, encoding: &Encoding) {
    for name_id in 0..repo.names.len() {
        let name_id = crate::internals::types::NameId(name_id as u32);
        let candidates = repo.name(name_id).candidates.clone();
        let mut selected = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let nc_var = encoding.candidate_var(name_id, i);
            if solver.model_value(nc_var) == Assignment::True {
                selected = Some(candidate.package);
                break;
            }
        }
        repo.name_mut(name_id).selection = selected;
    }
}
