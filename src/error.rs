// ⚠️ Error types for the rationing library
// Typed errors at the library seams, anyhow at the file-writing edges and binaries

use std::path::PathBuf;
use thiserror::Error;

/// Problems building a household or supply record from user input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("household size must be at least 1, got {0}")]
    InvalidMemberCount(i64),

    #[error("supply name must not be empty")]
    EmptySupplyName,

    #[error("quantity must be a whole non-negative number, got '{0}'")]
    InvalidQuantity(String),

    #[error("unknown supply category '{0}'")]
    UnknownCategory(String),

    #[error("unknown vulnerability attribute '{0}'")]
    UnknownAttribute(String),
}

/// Fatal failures of a household import (row-level problems are skipped, not raised)
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is empty (no header line)")]
    EmptyInput,

    #[error("could not find a 'Size' column in the header")]
    MissingSizeColumn,

    #[error("inventory line {line}: {source}")]
    InvalidSupplyRow {
        line: usize,
        #[source]
        source: ModelError,
    },
}

/// Failures of the interactive session layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("missing data: {households} households and {supplies} supplies loaded")]
    MissingData { households: usize, supplies: usize },

    #[error("no supply named '{0}' in the inventory")]
    UnknownSupply(String),

    #[error("no distribution has been run yet")]
    NoDistribution,

    #[error(transparent)]
    Model(#[from] ModelError),
}
