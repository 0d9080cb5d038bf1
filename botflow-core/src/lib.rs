// botflow-core/src/lib.rs

#![allow(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::perf)]

// --- MODULES ---

// 1. Domain (core types: DSL, Manifest, PolicyPack, CFG, ExecutionPlan,
//    Classification lattice). Depends on nothing else in this crate.
pub mod domain;

// 2. Application (use cases: AI-config validation, CFG building,
//    classification propagation, policy evaluation, plan compilation).
//    Depends on domain only.
pub mod application;

// --- GLOBAL ERROR TYPE ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use application::compile::{compile, CompileOptions};
pub use domain::plan::CompileResult;
pub use error::CompileError;
