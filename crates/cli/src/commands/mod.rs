// SPDX-License-Identifier: MIT

//! Subcommand handlers. Each function owns exactly one `CoordinatorRequest`.

pub mod job;
pub mod status;
