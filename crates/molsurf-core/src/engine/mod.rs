//! # Engine Module
//!
//! Non-covalent interaction detection between molecules.
//!
//! ## Overview
//!
//! Each molecule is reduced to a list of interaction sites ([`sites`]):
//! hydrophobic carbons, hydrogen-bond donors and acceptors, halogen-bond
//! partners, charged groups, aromatic rings and waters. Sites depend on
//! topology only and are cached per molecule ([`cache`]); their world-space
//! geometry is refreshed whenever coordinates move. Every eligible pair of
//! molecules ([`eligibility`]) is then classified site by site
//! ([`classify`]) against a set of geometric thresholds ([`config`]), and
//! redundant contacts are removed ([`dedup`]).
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Surface build settings and interaction criteria presets
//! - **Sites** ([`sites`]) - Rule-based site perception and site geometry
//! - **Caching** ([`cache`]) - Versioned per-molecule site cache with change listeners
//! - **Classification** ([`classify`], [`dedup`]) - Pairwise predicates and redundancy removal
//! - **Eligibility** ([`eligibility`]) - Which molecule pairs are compared at all
//! - **Progress Monitoring** ([`progress`]) - Stage and task reporting for long runs
//! - **Error Handling** ([`error`]) - Engine error type wrapping the lower layers

pub mod cache;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod eligibility;
pub mod error;
pub mod progress;
pub mod sites;
