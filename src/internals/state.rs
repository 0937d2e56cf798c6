//! Ingestion of the JSON state consumed by `run`/`save`, and the YAML
//! manifest/lockfile shapes consumed/produced by `load`/`save`.
//!
//! Grounded on the reference tool's `run()` (JSON `daps`/`names`/`entry`
//! walk, including the "dependency names must already be declared" rule) and
//! its `load_da` (manifest parsing and directive emission).

use indexmap::IndexMap;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::internals::error::{self, ResolutionError};
use crate::internals::types::{Candidate, Integrity, Package, Repository, Requirement};

// ---------------------------------------------------------------------
// JSON state (run / save)
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawState {
    #[serde(default)]
    daps: IndexMap<String, RawDap>,
    #[serde(default)]
    names: IndexMap<String, RawName>,
    entry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDap {
    version: String,
    location: Option<String>,
    integrity: Option<RawIntegrity>,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
}

#[derive(Debug, Deserialize)]
struct RawIntegrity {
    algorithm: String,
    digest: String,
}

#[derive(Debug, Deserialize)]
struct RawDependency {
    name: String,
    #[serde(rename = "requiredVersion")]
    required_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawName {
    #[serde(default)]
    selected: Option<String>,
    #[serde(default)]
    locked: Option<String>,
    #[serde(default)]
    known: Option<Vec<String>>,
}

/// Parses the JSON state and translates it into a [`Repository`], resolving
/// every string id into a dense [`PackageId`]/[`NameId`].
pub fn ingest(json: &str) -> Result<Repository, ResolutionError> {
    let raw: RawState = serde_json::from_str(json).context(error::JsonSnafu)?;
    let mut repo = Repository::new();

    for (id_str, dap) in &raw.daps {
        let version = Version::parse(&dap.version).map_err(|e| {
            error::MalformedInputSnafu {
                message: format!("package {id_str}: invalid version {:?}: {e}", dap.version),
            }
            .build()
        })?;
        let integrity = dap.integrity.as_ref().map(|i| Integrity {
            algorithm: i.algorithm.clone(),
            digest: i.digest.clone(),
        });
        repo.insert_package(
            id_str.clone(),
            Package {
                id_str: id_str.clone(),
                version,
                location: dap.location.clone(),
                integrity,
                dependencies: Vec::new(),
            },
        );
    }

    for (name_str, raw_name) in &raw.names {
        let name_id = repo.ensure_name(name_str);

        if let Some(known) = &raw_name.known {
            let mut candidates = Vec::with_capacity(known.len());
            for id_str in known {
                let package = resolve_package(&repo, id_str)?;
                candidates.push(Candidate { package });
            }
            repo.name_mut(name_id).candidates = candidates;
        }

        if let Some(locked) = &raw_name.locked {
            repo.name_mut(name_id).locked = Some(resolve_package(&repo, locked)?);
        }

        if let Some(selected) = &raw_name.selected {
            repo.name_mut(name_id).previously_selected = resolve_package(&repo, selected).ok();
        }
    }

    for (id_str, dap) in &raw.daps {
        if dap.dependencies.is_empty() {
            continue;
        }
        let package_id = repo
            .package_id(id_str)
            .expect("just inserted above, lookup cannot fail");
        let mut requirements = Vec::with_capacity(dap.dependencies.len());
        for dep in &dap.dependencies {
            let name_id = repo.name_id(&dep.name).ok_or_else(|| {
                error::UnresolvedReferenceSnafu {
                    reference: format!("name {} not found", dep.name),
                }
                .build()
            })?;
            let range_str = dep.required_version.as_deref().unwrap_or("*");
            let range = VersionReq::parse(range_str).map_err(|e| {
                error::MalformedInputSnafu {
                    message: format!(
                        "dependency on {}: invalid requiredVersion {range_str:?}: {e}",
                        dep.name
                    ),
                }
                .build()
            })?;
            requirements.push(Requirement {
                name: name_id,
                range,
            });
        }
        repo.packages[package_id.0 as usize].dependencies = requirements;
    }

    if let Some(entry) = &raw.entry {
        repo.entry = Some(resolve_package(&repo, entry)?);
    }

    Ok(repo)
}

fn resolve_package(
    repo: &Repository,
    id_str: &str,
) -> Result<crate::internals::types::PackageId, ResolutionError> {
    repo.package_id(id_str).ok_or_else(|| {
        error::UnresolvedReferenceSnafu {
            reference: id_str.to_owned(),
        }
        .build()
    })
}

// ---------------------------------------------------------------------
// Lockfile YAML (save / load -t dal)
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lockfile {
    pub version: u32,
    pub packages: IndexMap<String, LockedPackage>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedPackage {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<LockedIntegrity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedIntegrity {
    pub algorithm: String,
    pub digest: String,
}

/// Builds a [`Lockfile`] from a repository whose names have already been
/// resolved by the optimizer.
pub fn build_lockfile(repo: &Repository) -> Lockfile {
    let mut packages = IndexMap::new();
    for (_, name) in repo.iter_names() {
        let Some(selection) = name.selection else {
            continue;
        };
        let package = repo.package(selection);
        let mut dep_names: Vec<String> = package
            .dependencies
            .iter()
            .map(|req| repo.name(req.name).name_str.clone())
            .collect();
        dep_names.sort();
        dep_names.dedup();

        packages.insert(
            name.name_str.clone(),
            LockedPackage {
                version: package.version.to_string(),
                location: package.location.clone(),
                integrity: package.integrity.as_ref().map(|i| LockedIntegrity {
                    algorithm: i.algorithm.clone(),
                    digest: i.digest.clone(),
                }),
                dependencies: (!dep_names.is_empty()).then_some(dep_names),
            },
        );
    }
    Lockfile {
        version: 1,
        packages,
    }
}

pub fn lockfile_to_yaml(lockfile: &Lockfile) -> Result<String, ResolutionError> {
    serde_yml::to_string(lockfile).context(error::YamlSnafu)
}

pub fn lockfile_from_yaml(yaml: &str) -> Result<Lockfile, ResolutionError> {
    serde_yml::from_str(yaml).context(error::YamlSnafu)
}

// ---------------------------------------------------------------------
// Manifest YAML (load -t da)
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocationSpec {
    Single(String),
    Multiple(Vec<String>),
}

impl LocationSpec {
    fn into_vec(self) -> Vec<String> {
        match self {
            LocationSpec::Single(s) => vec![s],
            LocationSpec::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManifestDependency {
    #[serde(default)]
    require: Option<String>,
    #[serde(default)]
    location: Option<LocationSpec>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    dependencies: IndexMap<String, ManifestDependency>,
}

/// A single parsed manifest dependency, ready for directive emission.
pub struct ManifestDirective {
    pub name: String,
    pub require: Option<String>,
    pub locations: Vec<String>,
}

/// The result of parsing a `load -t da` manifest: the `DAP_INFO` header plus
/// zero or more `DAP` directive bodies.
pub struct ManifestDirectives {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: Vec<ManifestDirective>,
}

/// Parses a package manifest YAML document. `strict` only changes whether a
/// malformed document is surfaced as an error at the `load` CLI layer; this
/// function always reports malformed input as `Err`, leaving the
/// skip-vs-fail decision to the caller (matching the reference tool's
/// `well_formed` flag, which is orthogonal to parse success here since
/// `serde_yml` rejects the malformed shapes the original tolerated
/// type-mismatches for).
pub fn parse_manifest(yaml: &str) -> Result<ManifestDirectives, ResolutionError> {
    let manifest: Manifest = serde_yml::from_str(yaml).context(error::YamlSnafu)?;
    let dependencies = manifest
        .dependencies
        .into_iter()
        .map(|(name, dep)| ManifestDirective {
            name,
            require: dep.require,
            locations: dep.location.map(LocationSpec::into_vec).unwrap_or_default(),
        })
        .collect();
    Ok(ManifestDirectives {
        name: manifest.name,
        version: manifest.version,
        dependencies,
    })
}
