#![forbid(unsafe_code)]

mod internals;

pub use internals::error;
pub use internals::{
    encoder::{encode, Encoding},
    error::{ResolutionError, Result},
    optimizer::optimize,
    sat::{Assignment, Lit, SatSolver, Var, VarisatBackend},
    state::{
        build_lockfile, ingest, lockfile_from_yaml, lockfile_to_yaml, parse_manifest, Lockfile,
        LockedIntegrity, LockedPackage, ManifestDirective, ManifestDirectives,
    },
    types::{Candidate, Integrity, Name, NameId, Package, PackageId, Repository, Requirement},
};

/// Runs the full pipeline — encode then optimize — against a freshly
/// ingested [`Repository`], using a fresh [`VarisatBackend`]. The thin
/// coordinator a CLI driver calls; ingestion and directive emission are the
/// caller's concern (see `bin/dappi.rs`).
pub fn resolve(mut repo: Repository) -> Result<Repository> {
    let mut solver = VarisatBackend::new();
    let encoding = encode(&mut solver, &repo)?;
    optimize(&mut solver, &mut repo, &encoding)?;
    Ok(repo)
}
