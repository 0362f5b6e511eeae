//! Exports container image vulnerabilities from a Prisma Cloud Compute
//! console as a denormalized CSV report, one row per (image, CVE) pairing
//! enriched with host, cluster, namespace, and package metadata.

pub mod api;
pub mod config;
pub mod logging;
pub mod models;
pub mod output;
pub mod report;
