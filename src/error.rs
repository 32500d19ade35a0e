//! Error types for organization cloning.

use crate::github::PartialListing;
use thiserror::Error;

/// The main error type for listing and cloning operations.
#[derive(Error, Debug)]
pub enum OrgCloneError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid proxy address '{proxy}': {message}")]
    InvalidProxy { proxy: String, message: String },

    #[error("must have one org")]
    MissingOrg,

    #[error("GitHub API error: {message}")]
    GitHub { message: String },

    #[error("Clone failed for {repo}: {message}")]
    CloneError { repo: String, message: String },

    #[error(transparent)]
    Listing(#[from] PartialListing),
}

/// A specialized Result type for organization cloning.
pub type Result<T> = std::result::Result<T, OrgCloneError>;
