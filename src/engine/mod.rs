// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canvas workspace engine.
//!
//! Everything here is independent of the windowing layer: hosts feed input
//! events in, call [`Workspace::tick`] once per frame and paint from the
//! read-only accessors.

mod annotate;
pub mod compose;
pub mod frame;
pub mod generation;
mod gestures;
pub mod hit;
pub mod input;
pub mod raster;
pub mod viewport;
pub mod workspace;

pub use frame::FrameEditor;
pub use generation::{GenerationReply, Generator, OfflineGenerator, OutpaintRequest};
pub use input::{CursorHint, GestureKind, Key, Modifiers, PointerButton, Tool};
pub use raster::{RasterSource, RasterState, RasterStore};
pub use viewport::Viewport;
pub use workspace::{AnnotationSession, BrushSettings, Workspace, WorkspaceEvent};
