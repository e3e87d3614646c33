//! Error types for mig-core

use thiserror::Error;

/// Core error type for migrations
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Project directory not found
    #[error("[E003] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// E004: Target not defined in config
    #[error("[E004] Target '{name}' not found in config. Available targets: {available}")]
    UnknownTarget { name: String, available: String },

    /// E005: Malformed revision token
    #[error("[E005] Invalid revision id '{id}': {reason}")]
    InvalidRevisionId { id: String, reason: String },

    /// E006: Two node files declare the same revision
    #[error("[E006] Duplicate revision '{revision}' in {path1} and {path2}")]
    DuplicateRevision {
        revision: String,
        path1: String,
        path2: String,
    },

    /// E007: Revision token does not resolve to any node
    #[error("[E007] Unknown revision: {revision}")]
    UnknownRevision { revision: String },

    /// E008: A node revises a revision that is not in the graph
    #[error("[E008] Revision '{revision}' revises unknown revision '{parent}'")]
    MissingParent { revision: String, parent: String },

    /// E009: Cycle in the revision graph
    #[error("[E009] Circular revision history detected: {cycle}")]
    CircularRevision { cycle: String },

    /// E010: More than one root revision
    #[error("[E010] Revision graph has multiple roots: {roots}")]
    MultipleRoots { roots: String },

    /// E011: Branching history with no merge
    #[error("[E011] Multiple heads present: {heads}. Run `migrations merge` to join them")]
    MultipleHeads { heads: String },

    /// E012: Prefix matches several revisions
    #[error("[E012] Ambiguous revision '{prefix}' matches: {candidates}")]
    AmbiguousRevision { prefix: String, candidates: String },

    /// E013: Downgrade target is not applied
    #[error("[E013] Revision '{revision}' is not applied")]
    NotApplied { revision: String },

    /// E014: Stored snapshot does not match its checksum
    #[error("[E014] Snapshot checksum mismatch in revision '{revision}': file records {expected}, content hashes to {actual}")]
    SnapshotChecksumMismatch {
        revision: String,
        expected: String,
        actual: String,
    },

    /// E015: Node file name does not carry its revision id
    #[error("[E015] Node file '{path}' does not match its revision '{revision}'")]
    RevisionFileMismatch { path: String, revision: String },

    /// E016: Table declared more than once in models
    #[error("[E016] Duplicate table '{table}' declared in {path}")]
    DuplicateTable { table: String, path: String },

    /// E017: Operation cannot be applied to the schema snapshot
    #[error("[E017] Invalid operation {operation}: {reason}")]
    InvalidOperation { operation: String, reason: String },

    /// E018: Operations unsupported by the target dialect
    #[error("[E018] Operations not supported by {dialect}:\n{problems}")]
    InfeasibleOperations { dialect: String, problems: String },

    /// E019: Merge parents disagree on a table definition
    #[error("[E019] Cannot merge: table '{table}' differs between {left} and {right}")]
    MergeConflict {
        table: String,
        left: String,
        right: String,
    },

    /// E020: Merge needs at least two heads
    #[error("[E020] Nothing to merge: {reason}")]
    NothingToMerge { reason: String },

    /// E021: Unrecognised column type
    #[error("[E021] Invalid column type '{value}'")]
    InvalidColumnType { value: String },

    /// E022: Identifier that cannot be used as a table/column name
    #[error("[E022] Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// E023: Node file could not be parsed
    #[error("[E023] Failed to parse node file {path}: {details}")]
    NodeParseError { path: String, details: String },

    /// E024: Model file could not be parsed
    #[error("[E024] Failed to parse model file {path}: {details}")]
    ModelParseError { path: String, details: String },

    /// E025: IO error
    #[error("[E025] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E026: IO error with file path context
    #[error("[E026] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E027: YAML parse error
    #[error("[E027] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E028: Token that cannot be used as a downgrade target
    #[error("[E028] '{target}' is not a downgrade target; name a revision or `base`")]
    InvalidDowngradeTarget { target: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Wrap an IO error with the path that produced it.
pub(crate) fn io_err(path: &std::path::Path, source: std::io::Error) -> CoreError {
    CoreError::IoWithPath {
        path: path.display().to_string(),
        source,
    }
}
