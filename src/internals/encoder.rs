//! Translates an ingested [`Repository`] into hard clauses plus the two
//! soft-constraint variable lists (unlocks, penalties) the optimizer
//! minimizes in order.
//!
//! Grounded on the reference tool's `run()`: per-name candidate variables,
//! pairwise exclusion, version-group penalty prefixes (via its
//! `multimap<version, …> version_groups` and `upper_bound` walk), and the
//! dependency gate clause. The unlock phase has no counterpart there (see
//! `DESIGN.md`) and is built from the external interface description alone.

use itertools::Itertools;

use crate::internals::error::{self, ResolutionError};
use crate::internals::sat::{SatSolver, Var};
use crate::internals::types::{NameId, PackageId, Repository};

/// The SAT side of an encoded [`Repository`]: variables keyed by the domain
/// ids they correspond to, plus the flat unlock/penalty lists the optimizer
/// builds counter sets over.
#[derive(Debug, Default)]
pub struct Encoding {
    pub package_vars: Vec<Var>,
    /// `candidate_vars[name.0][i]` is the `nc_var` of `name`'s i-th candidate,
    /// in the same order as `Repository::name(name).candidates`.
    pub candidate_vars: Vec<Vec<Var>>,
    pub unlock_vars: Vec<Var>,
    pub penalty_vars: Vec<Var>,
}

impl Encoding {
    pub fn package_var(&self, id: PackageId) -> Var {
        self.package_vars[id.0 as usize]
    }

    pub fn candidate_var(&self, name: NameId, index: usize) -> Var {
        self.candidate_vars[name.0 as usize][index]
    }
}

pub fn encode<S: SatSolver>(
    solver: &mut S,
    repo: &Repository,
) -> Result<Encoding, ResolutionError> {
    let mut encoding = Encoding {
        package_vars: Vec::with_capacity(repo.packages.len()),
        candidate_vars: Vec::with_capacity(repo.names.len()),
        unlock_vars: Vec::new(),
        penalty_vars: Vec::new(),
    };

    // Step 1: allocate package variables.
    for _ in &repo.packages {
        encoding.package_vars.push(solver.new_var());
    }

    // Step 2: build names and candidates.
    for (name_id, name) in repo.iter_names() {
        let mut nc_vars = Vec::with_capacity(name.candidates.len());
        let mut unlock_var: Option<Var> = None;

        for candidate in &name.candidates {
            let nc_var = solver.new_var();
            let pkg_var = encoding.package_var(candidate.package);
            solver.add_clause(&[nc_var.negative(), pkg_var.positive()]);

            if let Some(locked) = name.locked {
                if candidate.package != locked {
                    let unlock = *unlock_var.get_or_insert_with(|| {
                        let v = solver.new_var();
                        encoding.unlock_vars.push(v);
                        v
                    });
                    solver.add_clause(&[nc_var.negative(), unlock.positive()]);
                }
            }

            nc_vars.push(nc_var);
        }

        // Pairwise exclusion: at most one candidate true per name.
        for i in 0..nc_vars.len() {
            for j in (i + 1)..nc_vars.len() {
                solver.add_clause(&[nc_vars[i].negative(), nc_vars[j].negative()]);
            }
        }

        // Group candidates by version, ascending, multimap semantics (ties
        // keep their relative input order).
        let mut order: Vec<usize> = (0..name.candidates.len()).collect();
        order.sort_by(|&a, &b| {
            repo.package(name.candidates[a].package)
                .version
                .cmp(&repo.package(name.candidates[b].package).version)
        });

        let groups: Vec<Vec<usize>> = order
            .into_iter()
            .group_by(|&i| repo.package(name.candidates[i].package).version.clone())
            .into_iter()
            .map(|(_, g)| g.collect())
            .collect();

        let mut prefix: Vec<usize> = Vec::new();
        for group in &groups {
            prefix.extend(group.iter().copied());
            let penalty_var = solver.new_var();
            for &i in &prefix {
                solver.add_clause(&[nc_vars[i].negative(), penalty_var.positive()]);
            }
            encoding.penalty_vars.push(penalty_var);
        }

        encoding.candidate_vars.push(nc_vars);
    }

    // Step 3: dependencies.
    for (pkg_id, package) in repo.iter_packages() {
        for dep in &package.dependencies {
            let name = repo.name(dep.name);
            let gate = solver.new_var();
            solver.add_clause(&[encoding.package_var(pkg_id).negative(), gate.positive()]);

            let matching: Vec<Var> = name
                .candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| dep.matches(&repo.package(c.package).version))
                .map(|(i, _)| encoding.candidate_var(dep.name, i))
                .collect();

            if matching.is_empty() {
                return error::UnsatisfiableEdgeSnafu {
                    name: dep.name,
                    package: pkg_id,
                }
                .fail();
            }

            let mut clause = vec![gate.negative()];
            clause.extend(matching.into_iter().map(Var::positive));
            solver.add_clause(&clause);
        }
    }

    // Step 4: entry point.
    if let Some(entry) = repo.entry {
        solver.unit(encoding.package_var(entry).positive());
    }

    log::debug!(
        "encoded {} packages, {} names, {} unlock vars, {} penalty vars",
        encoding.package_vars.len(),
        encoding.candidate_vars.len(),
        encoding.unlock_vars.len(),
        encoding.penalty_vars.len(),
    );

    Ok(encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::sat::{Assignment, VarisatBackend};
    use crate::internals::types::{Candidate, Package};
    use semver::{Version, VersionReq};

    fn pkg(version: &str) -> Package {
        Package {
            id_str: version.to_owned(),
            version: Version::parse(version).unwrap(),
            location: None,
            integrity: None,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn pairwise_exclusion_forbids_two_candidates_at_once() {
        let mut repo = Repository::new();
        let a1 = repo.insert_package("A1".into(), pkg("1.0.0"));
        let a2 = repo.insert_package("A2".into(), pkg("2.0.0"));
        let name = repo.ensure_name("A");
        repo.name_mut(name).candidates = vec![Candidate { package: a1 }, Candidate { package: a2 }];

        let mut solver = VarisatBackend::new();
        let encoding = encode(&mut solver, &repo).unwrap();

        let c0 = encoding.candidate_var(name, 0);
        let c1 = encoding.candidate_var(name, 1);
        assert!(!solver.solve(&[c0.positive(), c1.positive()]));
        assert!(solver.solve(&[c0.positive(), c1.negative()]));
    }

    #[test]
    fn penalties_grow_with_version_prefix_count() {
        let mut repo = Repository::new();
        let a1 = repo.insert_package("A1".into(), pkg("1.0.0"));
        let a2 = repo.insert_package("A2".into(), pkg("2.0.0"));
        let name = repo.ensure_name("A");
        repo.name_mut(name).candidates = vec![Candidate { package: a1 }, Candidate { package: a2 }];

        let mut solver = VarisatBackend::new();
        let encoding = encode(&mut solver, &repo).unwrap();
        assert_eq!(encoding.penalty_vars.len(), 2);

        let c_latest = encoding.candidate_var(name, 1); // A2, version 2.0.0
        solver.unit(c_latest.positive());
        assert!(solver.solve(&[]));
        assert_eq!(
            solver.model_value(encoding.penalty_vars[1]),
            Assignment::True
        );
    }

    #[test]
    fn unsatisfiable_dependency_edge_is_reported() {
        let mut repo = Repository::new();
        let a1 = repo.insert_package("A1".into(), pkg("1.0.0"));
        let name_a = repo.ensure_name("A");
        repo.name_mut(name_a).candidates = vec![Candidate { package: a1 }];

        let mut root = pkg("1.0.0");
        root.dependencies.push(crate::internals::types::Requirement {
            name: name_a,
            range: VersionReq::parse("^3").unwrap(),
        });
        let root_id = repo.insert_package("ROOT".into(), root);
        let name_root = repo.ensure_name("ROOT");
        repo.name_mut(name_root).candidates = vec![Candidate { package: root_id }];

        let mut solver = VarisatBackend::new();
        let err = encode(&mut solver, &repo).unwrap_err();
        assert!(matches!(err, ResolutionError::UnsatisfiableEdge { .. }));
    }

    proptest::proptest! {
        /// Property 1: for every model, at most one candidate of a name is true.
        #[test]
        fn single_candidate_per_name_holds(versions in proptest::collection::vec(1u64..50, 1..8)) {
            let mut repo = Repository::new();
            let name = repo.ensure_name("A");
            let mut candidates = Vec::new();
            for (i, major) in versions.iter().enumerate() {
                let id = repo.insert_package(format!("A{i}"), pkg(&format!("{major}.0.0")));
                candidates.push(Candidate { package: id });
            }
            repo.name_mut(name).candidates = candidates;

            let mut solver = VarisatBackend::new();
            let encoding = encode(&mut solver, &repo).unwrap();
            let nc_vars = &encoding.candidate_vars[name.0 as usize];

            for i in 0..nc_vars.len() {
                for j in (i + 1)..nc_vars.len() {
                    proptest::prop_assert!(!solver.solve(&[
                        nc_vars[i].positive(),
                        nc_vars[j].positive(),
                    ]));
                }
            }
        }

        /// Property 5: penalty monotonicity — if penalty[i] is forced true,
        /// every later penalty[j >= i] is true in the same model.
        #[test]
        fn penalty_monotonicity_holds(versions in proptest::collection::vec(1u64..20, 2..6)) {
            let mut repo = Repository::new();
            let name = repo.ensure_name("A");
            let mut candidates = Vec::new();
            for (i, major) in versions.iter().enumerate() {
                let id = repo.insert_package(format!("A{i}"), pkg(&format!("{major}.0.0")));
                candidates.push(Candidate { package: id });
            }
            repo.name_mut(name).candidates = candidates;

            let mut solver = VarisatBackend::new();
            let encoding = encode(&mut solver, &repo).unwrap();
            let penalties = &encoding.penalty_vars;
            proptest::prop_assume!(penalties.len() >= 2);

            // Force selection of a lowest-version candidate: it belongs to
            // the first version group, so it must trip every penalty prefix.
            let min_major = *versions.iter().min().unwrap();
            let lowest_index = versions.iter().position(|&v| v == min_major).unwrap();
            let earliest = encoding.candidate_var(name, lowest_index);
            solver.unit(earliest.positive());
            proptest::prop_assert!(solver.solve(&[]));
            for &p in penalties {
                proptest::prop_assert_eq!(solver.model_value(p), Assignment::True);
            }
        }
    }
}
