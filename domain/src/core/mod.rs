//! Core domain concepts shared across all subdomains.
//!
//! - [`correlation::CorrelationId`]: token tying every artifact of one run together
//! - [`query::UserQueryPackage`]: the workflow's only external input
//! - [`error::DomainError`]: domain-level errors

pub mod correlation;
pub mod error;
pub mod query;
