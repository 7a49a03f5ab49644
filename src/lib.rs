// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! EASEL - infinite canvas workspace for arranging, framing and annotating
//! images.

pub mod config;
pub mod engine;
pub mod history;
pub mod io;
pub mod models;
pub mod ui;
pub mod util;
