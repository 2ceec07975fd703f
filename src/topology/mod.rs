// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Cluster-type-specific topology construction.

pub mod ceph;
pub mod gluster;
