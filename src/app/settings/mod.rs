// SPDX-License-Identifier: GPL-3.0-only

//! Settings UI module
//!
//! This module handles the settings drawer: camera choice, preview options
//! and rectangle detection tuning.

pub mod view;
