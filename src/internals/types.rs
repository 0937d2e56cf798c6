//! The data model ingested by the encoder: packages, names, candidates, locks
//! and the entry point. Built once by `internals::state::ingest` and never
//! mutated thereafter, except for each [`Name`]'s `selection` slot, which the
//! optimizer overwrites in place after every improving model.
//!
//! SAT variables are not part of this module: they live in the parallel
//! `internals::encoder::Encoding` produced from a `Repository`, keeping the
//! domain data free of solver concerns.

use indexmap::IndexMap;
use semver::{Version, VersionReq};

/// Dense index of a package within a [`Repository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(pub u32);

/// Dense index of a logical name within a [`Repository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameId(pub u32);

/// Content integrity metadata, carried through unchanged for lockfile output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integrity {
    pub algorithm: String,
    pub digest: String,
}

/// A required-dependency edge: a logical name and the range a candidate of
/// that name must satisfy. Absent ranges default to the universal range.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: NameId,
    pub range: VersionReq,
}

impl Requirement {
    /// Whether `version` satisfies this requirement, with prereleases
    /// included per the external interface's documented rule. `semver`
    /// excludes prereleases from `matches` unless the requirement itself
    /// names one; we additionally accept a prerelease version whose
    /// stripped-of-prerelease counterpart would match.
    pub fn matches(&self, version: &Version) -> bool {
        if self.range.matches(version) {
            return true;
        }
        if version.pre.is_empty() {
            return false;
        }
        let mut stable = version.clone();
        stable.pre = semver::Prerelease::EMPTY;
        self.range.matches(&stable)
    }
}

/// A concrete, versioned artifact identified by a unique id.
#[derive(Debug, Clone)]
pub struct Package {
    pub id_str: String,
    pub version: Version,
    pub location: Option<String>,
    pub integrity: Option<Integrity>,
    pub dependencies: Vec<Requirement>,
}

/// The pairing of a name with one package that could fulfill it.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub package: PackageId,
}

/// A logical dependency label that multiple packages may provide.
#[derive(Debug, Clone)]
pub struct Name {
    pub name_str: String,
    pub candidates: Vec<Candidate>,
    pub locked: Option<PackageId>,
    /// Informational prior selection, carried through for parity with the
    /// ingested state; not read by the encoder or optimizer.
    pub previously_selected: Option<PackageId>,
    /// The only mutable field: overwritten by the optimizer after each
    /// improving model.
    pub selection: Option<PackageId>,
}

/// The fully ingested resolver input: packages, names, an optional lock
/// (expressed per-name via [`Name::locked`]) and an optional entry point.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    pub packages: Vec<Package>,
    package_ids: IndexMap<String, PackageId>,
    pub names: Vec<Name>,
    name_ids: IndexMap<String, NameId>,
    pub entry: Option<PackageId>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn name(&self, id: NameId) -> &Name {
        &self.names[id.0 as usize]
    }

    pub fn name_mut(&mut self, id: NameId) -> &mut Name {
        &mut self.names[id.0 as usize]
    }

    pub fn package_id(&self, id_str: &str) -> Option<PackageId> {
        self.package_ids.get(id_str).copied()
    }

    pub fn name_id(&self, name_str: &str) -> Option<NameId> {
        self.name_ids.get(name_str).copied()
    }

    /// Inserts a package under `id_str`, returning its freshly allocated id.
    /// Callers (state ingestion) are responsible for rejecting duplicates.
    pub fn insert_package(&mut self, id_str: String, package: Package) -> PackageId {
        let id = PackageId(self.packages.len() as u32);
        self.package_ids.insert(id_str, id);
        self.packages.push(package);
        id
    }

    /// Inserts a name under `name_str` if absent, returning its id either way.
    pub fn ensure_name(&mut self, name_str: &str) -> NameId {
        if let Some(id) = self.name_ids.get(name_str) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.name_ids.insert(name_str.to_owned(), id);
        self.names.push(Name {
            name_str: name_str.to_owned(),
            candidates: Vec::new(),
            locked: None,
            previously_selected: None,
            selection: None,
        });
        id
    }

    pub fn iter_names(&self) -> impl Iterator<Item = (NameId, &Name)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (NameId(i as u32), n))
    }

    pub fn iter_packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId(i as u32), p))
    }
}
