//! Counter merger: combines multiple counter sets pairwise, smallest-first,
//! into one counter set representing their sum. Not used on the optimizer's
//! primary path (each phase builds one counter set over one flat variable
//! list) but retained as part of the core's algorithmic vocabulary, per the
//! reference tool's `violation_counter_merger`, for composing counter sets
//! built from heterogeneous sources such as per-name penalty groups.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::internals::counters::CounterSet;
use crate::internals::sat::SatSolver;

struct BySize(CounterSet);

impl PartialEq for BySize {
    fn eq(&self, other: &Self) -> bool {
        self.0.size() == other.0.size()
    }
}
impl Eq for BySize {}
impl PartialOrd for BySize {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for BySize {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.size().cmp(&other.0.size())
    }
}

/// A priority queue of counter sets, keyed by size, smallest first.
#[derive(Default)]
pub struct CounterMerger {
    queue: BinaryHeap<Reverse<BySize>>,
}

impl CounterMerger {
    pub fn empty() -> Self {
        CounterMerger {
            queue: BinaryHeap::new(),
        }
    }

    pub fn add(&mut self, set: CounterSet) {
        self.queue.push(Reverse(BySize(set)));
    }

    fn pop(&mut self) -> Option<CounterSet> {
        self.queue.pop().map(|Reverse(BySize(set))| set)
    }

    /// Precondition: exactly one set remains. Consumes the merger and returns it.
    pub fn release(mut self) -> CounterSet {
        assert_eq!(self.queue.len(), 1, "release requires exactly one set");
        self.pop().expect("checked non-empty above")
    }

    /// Repeatedly pops the two smallest sets and fuses them into one until a
    /// single set remains, then returns it. Precondition: non-empty.
    pub fn merge<S: SatSolver>(mut self, solver: &mut S) -> CounterSet {
        assert!(!self.queue.is_empty(), "merge requires a non-empty queue");
        while self.queue.len() > 1 {
            let lhs = self.pop().expect("len > 1");
            let rhs = self.pop().expect("len > 1");
            let merged = merge_pair(solver, &lhs, &rhs);
            self.add(merged);
        }
        self.release()
    }
}

fn merge_pair<S: SatSolver>(solver: &mut S, lhs: &CounterSet, rhs: &CounterSet) -> CounterSet {
    let p = lhs.size();
    let q = rhs.size();
    let merged_vars: Vec<_> = (0..p + q).map(|_| solver.new_var()).collect();

    for i in 1..=p {
        solver.add_clause(&[lhs.at_least(i).negative(), merged_vars[i - 1].positive()]);
    }
    for j in 1..=q {
        solver.add_clause(&[rhs.at_least(j).negative(), merged_vars[j - 1].positive()]);
    }
    for i in 1..=p {
        for j in 1..=q {
            solver.add_clause(&[
                lhs.at_least(i).negative(),
                rhs.at_least(j).negative(),
                merged_vars[i + j - 1].positive(),
            ]);
        }
    }

    CounterSet::from_vars(merged_vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::counters::sequential_counters;
    use crate::internals::sat::{Assignment, SatSolver, VarisatBackend};

    #[test]
    fn merging_two_sets_sums_their_sizes() {
        let mut solver = VarisatBackend::new();
        let a: Vec<_> = (0..2).map(|_| solver.new_var()).collect();
        let b: Vec<_> = (0..3).map(|_| solver.new_var()).collect();
        let ca = sequential_counters(&mut solver, &a);
        let cb = sequential_counters(&mut solver, &b);

        let mut merger = CounterMerger::empty();
        merger.add(ca);
        merger.add(cb);
        let merged = merger.merge(&mut solver);
        assert_eq!(merged.size(), 5);

        for v in a.iter().chain(b.iter()) {
            solver.unit(v.positive());
        }
        assert!(solver.solve(&[]));
        assert_eq!(
            solver.model_value(merged.at_least(5)),
            Assignment::True
        );
    }

    #[test]
    fn release_requires_single_set() {
        let mut solver = VarisatBackend::new();
        let a = vec![solver.new_var()];
        let ca = sequential_counters(&mut solver, &a);
        let mut merger = CounterMerger::empty();
        merger.add(ca);
        let released = merger.release();
        assert_eq!(released.size(), 1);
    }
}
