// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod artifact;
pub mod build;
pub mod daemon;
pub mod logs;
pub mod plugin;
pub mod status;
