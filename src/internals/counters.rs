//! Cardinality (sequential / Sinz staircase) counter construction.
//!
//! Grounded directly on the reference tool's `violation_counter_set` and
//! `make_general_violation_counters`: the same `last`/`num` case split (base,
//! inductive num=1, inductive num>1, cap) and the same one-directional
//! implication discipline (inputs imply the counter, never the converse).

use crate::internals::sat::{SatSolver, Var};

/// An immutable ordered sequence `C[1..n]` of counter variables over some
/// input sequence `V[1..n]`: in every model where at least `k` of `V` are
/// true, `at_least(k)` is true. One-directional; sufficient for upper-bound
/// search via assumption negation.
#[derive(Debug, Clone, Default)]
pub struct CounterSet {
    counters: Vec<Var>,
}

impl CounterSet {
    fn empty() -> Self {
        CounterSet {
            counters: Vec::new(),
        }
    }

    /// Builds a counter set from already-materialized counter variables, for
    /// callers (the counter merger) that allocate the backing variables
    /// themselves rather than through [`sequential_counters`].
    pub(crate) fn from_vars(counters: Vec<Var>) -> Self {
        CounterSet { counters }
    }

    pub fn size(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// The counter variable for "at least `k` violations". `k` is 1-based.
    pub fn at_least(&self, k: usize) -> Var {
        assert!(k >= 1 && k <= self.counters.len(), "k out of range");
        self.counters[k - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = Var> + '_ {
        self.counters.iter().copied()
    }
}

/// Builds the sequential counter set over `violations`, emitting clauses on
/// `solver` per the documented Case A / B′ / B / C schema. Returns an empty
/// counter set (materializing no variables) when `violations` is empty.
pub fn sequential_counters<S: SatSolver>(solver: &mut S, violations: &[Var]) -> CounterSet {
    let n = violations.len();
    if n == 0 {
        return CounterSet::empty();
    }

    // previous[num] = c[last-1, num], 1-indexed into a 0-indexed Vec (index num-1).
    let mut previous: Vec<Var> = Vec::new();
    let mut current: Vec<Var> = Vec::new();

    for last in 0..n {
        current.clear();
        if last == 0 {
            // Case A: base, last=0, num=1. V[0] -> c[0,1].
            let c01 = solver.new_var();
            solver.add_clause(&[violations[0].negative(), c01.positive()]);
            current.push(c01);
        } else {
            // Case B': num=1, last>0. c[last-1,1] -> c[last,1]; V[last] -> c[last,1].
            let c_last_1 = solver.new_var();
            solver.add_clause(&[previous[0].negative(), c_last_1.positive()]);
            solver.add_clause(&[violations[last].negative(), c_last_1.positive()]);
            current.push(c_last_1);

            // Case B: 1 < num <= last. c[last-1,num] -> c[last,num];
            // V[last] & c[last-1,num-1] -> c[last,num].
            for num in 2..=last {
                let c = solver.new_var();
                solver.add_clause(&[previous[num - 1].negative(), c.positive()]);
                solver.add_clause(&[
                    violations[last].negative(),
                    previous[num - 2].negative(),
                    c.positive(),
                ]);
                current.push(c);
            }

            // Case C: cap, num = last+1. V[last] & c[last-1,last] -> c[last,last+1].
            let cap = solver.new_var();
            solver.add_clause(&[
                violations[last].negative(),
                previous[last - 1].negative(),
                cap.positive(),
            ]);
            current.push(cap);
        }

        std::mem::swap(&mut previous, &mut current);
    }

    CounterSet { counters: previous }
}
