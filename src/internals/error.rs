use snafu::{Backtrace, Snafu};

use crate::internals::types::{NameId, PackageId};

/// Everything that can go wrong between ingesting state and emitting selections.
#[derive(Debug, Snafu)]
pub enum ResolutionError {
    #[snafu(display("malformed input: {message}"))]
    MalformedInput {
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("unresolved reference: {reference}"))]
    UnresolvedReference {
        reference: String,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "unsatisfiable edge: name {name:?} has no candidate matching the required range"
    ))]
    UnsatisfiableEdge {
        name: NameId,
        package: PackageId,
        backtrace: Backtrace,
    },

    #[snafu(display("Dependency conflicted"))]
    GlobalUnsat { backtrace: Backtrace },

    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("malformed YAML: {source}"))]
    Yaml {
        source: serde_yml::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("malformed JSON: {source}"))]
    Json {
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = ResolutionError> = std::result::Result<T, E>;
