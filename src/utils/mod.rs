// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Shared utilities

mod spinner;

pub use spinner::create_spinner;
