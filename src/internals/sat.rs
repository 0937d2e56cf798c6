//! Minimal contract consumed from an external CDCL solver. The rest of the
//! core only ever names [`Var`] and [`Lit`]; the concrete backend
//! ([`VarisatBackend`]) is the sole place that imports `varisat` types.

use varisat::ExtendFormula;

/// A Boolean variable allocated from the solver. Opaque outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u32);

/// A variable with a polarity: `var` true (positive) or false (negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Var {
    pub fn positive(self) -> Lit {
        Lit {
            var: self,
            positive: true,
        }
    }

    pub fn negative(self) -> Lit {
        Lit {
            var: self,
            positive: false,
        }
    }

    pub fn lit(self, positive: bool) -> Lit {
        Lit {
            var: self,
            positive,
        }
    }
}

impl Lit {
    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_positive(self) -> bool {
        self.positive
    }
}

impl std::ops::Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit {
            var: self.var,
            positive: !self.positive,
        }
    }
}

/// Tri-state assignment read back from a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    True,
    False,
    Undef,
}

/// The minimal operations the core needs from a CDCL solver: allocate a
/// variable, assert a clause, solve (optionally under assumptions), and read
/// back a model value. Solver state lives entirely behind the implementor;
/// the core holds only [`Var`]/[`Lit`] identifiers.
pub trait SatSolver {
    fn new_var(&mut self) -> Var;

    fn add_clause(&mut self, lits: &[Lit]);

    /// Searches for a model entailing every literal in `assumptions`.
    /// Returns `true` iff one exists. May be called repeatedly with a
    /// monotonically growing clause set.
    fn solve(&mut self, assumptions: &[Lit]) -> bool;

    /// Valid only immediately after a `solve` call returned `true`.
    fn model_value(&self, var: Var) -> Assignment;

    fn unit(&mut self, lit: Lit) {
        self.add_clause(&[lit]);
    }
}

/// `varisat`-backed implementation of [`SatSolver`].
pub struct VarisatBackend {
    solver: varisat::Solver<'static>,
    vars: Vec<varisat::Var>,
    model: Option<Vec<varisat::Lit>>,
}

impl Default for VarisatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VarisatBackend {
    pub fn new() -> Self {
        VarisatBackend {
            solver: varisat::Solver::new(),
            vars: Vec::new(),
            model: None,
        }
    }

    fn to_varisat_var(&self, var: Var) -> varisat::Var {
        self.vars[var.0 as usize]
    }

    fn to_varisat_lit(&self, lit: Lit) -> varisat::Lit {
        self.to_varisat_var(lit.var).lit(lit.positive)
    }
}

impl SatSolver for VarisatBackend {
    fn new_var(&mut self) -> Var {
        let v = self.solver.new_var();
        let idx = self.vars.len() as u32;
        self.vars.push(v);
        Var(idx)
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        let converted: Vec<varisat::Lit> = lits.iter().map(|l| self.to_varisat_lit(*l)).collect();
        self.solver.add_clause(&converted);
    }

    fn solve(&mut self, assumptions: &[Lit]) -> bool {
        let converted: Vec<varisat::Lit> = assumptions
            .iter()
            .map(|l| self.to_varisat_lit(*l))
            .collect();
        self.solver.assume(&converted);
        let sat = self
            .solver
            .solve()
            .expect("varisat does not error in default configuration");
        self.model = if sat { self.solver.model() } else { None };
        sat
    }

    fn model_value(&self, var: Var) -> Assignment {
        let target = self.to_varisat_var(var);
        match &self.model {
            None => Assignment::Undef,
            Some(lits) => lits
                .iter()
                .find(|l| l.var() == target)
                .map(|l| {
                    if l.is_positive() {
                        Assignment::True
                    } else {
                        Assignment::False
                    }
                })
                .unwrap_or(Assignment::Undef),
        }
    }
}
