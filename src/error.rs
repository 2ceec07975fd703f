// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use thiserror::Error;

use crate::failure::FailureSet;

/// Errors raised to the caller of the provisioning workflow.
///
/// Per-node trouble is not raised; it is isolated at the stage that saw it
/// and recorded in the run's `FailureSet`. The variants here are the cases
/// where the whole operation (or an indivisible stage) could not proceed.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid provisioning config: {0}")]
    InvalidConfig(String),

    /// A record failed validation before writing. Carries the store's
    /// validation detail.
    #[error("record failed validation: {0}")]
    PersistenceInvalid(String),

    /// The batched disk-inventory query failed. The failure cannot be
    /// attributed to a single node, so the whole batch is aborted.
    #[error("disk discovery aborted for the whole batch: {0}")]
    DiscoveryBatchFailed(String),

    #[error("cluster creation failed\nfailed nodes: {failed}\nreason: {reason}")]
    ClusterCreationFailed { failed: FailureSet, reason: String },

    #[error("host addition failed\nfailed nodes: {failed}\nreason: {reason}")]
    HostAdditionFailed { failed: FailureSet, reason: String },
}
