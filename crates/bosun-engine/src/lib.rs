// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Validation engine for guided Kubernetes exercises.
//!
//! The engine evaluates a step's declarative [`ValidationCriteria`] against
//! live environment state and aggregates the outcome into a
//! [`ValidationResult`]:
//! - [`ValidationEngine`]: the orchestrator — availability fail-fast,
//!   sequential check execution, result aggregation and remediation
//!   suggestions
//! - domain validators: high-level predicates such as deployment pod
//!   health, secret encoding, namespace isolation and storage persistence
//! - the comprehensive harness: a multi-section deployment report with a
//!   rendered summary block
//!
//! Check failures are results, not errors: a failing check produces a
//! `❌` detail line and sibling checks still run. `Err` is reserved for
//! caller defects and transport trouble that retries could not absorb.

mod criteria;
mod error;
mod harness;
mod orchestrator;
mod registry;
mod result;
mod runner;
mod suggest;
#[cfg(test)]
mod testutil;
mod validators;

pub use bosun_common_http::ExpectedResponse;
pub use criteria::{CriteriaType, ValidationCheck, ValidationCriteria};
pub use error::EngineError;
pub use harness::Section;
pub use orchestrator::ValidationEngine;
pub use registry::{CheckContext, CustomValidator, ValidatorRegistry};
pub use result::ValidationResult;
pub use validators::{ProbeKind, ResourceExpectations};
