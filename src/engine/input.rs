// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Input vocabulary and gesture states.
//!
//! Hosts translate their native events into these types; the workspace
//! turns them into exactly one active [`Gesture`] at a time.

use crate::models::item::ItemId;
use crate::models::layer::{Layer, LayerId};
use crate::util::geometry::{Handle, Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl on Linux/Windows, Cmd on macOS
    pub command: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        command: false,
        alt: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        command: false,
        alt: false,
    };
}

/// Keys the workspace reacts to directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Space,
    Delete,
}

/// Active tool. Drawing tools only apply inside annotation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Pan,
    Brush,
    Lasso,
    Arrow,
    Text,
}

impl Tool {
    pub fn draws(self) -> bool {
        matches!(self, Tool::Brush | Tool::Lasso | Tool::Arrow)
    }
}

/// Cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    Grabbing,
    Move,
    PointingHand,
    Crosshair,
    Text,
    ResizeNwSe,
    ResizeNeSw,
    ResizeHorizontal,
    ResizeVertical,
}

impl CursorHint {
    pub fn for_handle(handle: Handle) -> Self {
        match handle {
            Handle::TopLeft | Handle::BottomRight => CursorHint::ResizeNwSe,
            Handle::TopRight | Handle::BottomLeft => CursorHint::ResizeNeSw,
            Handle::Left | Handle::Right => CursorHint::ResizeHorizontal,
            Handle::Top | Handle::Bottom => CursorHint::ResizeVertical,
        }
    }
}

/// Public summary of the active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    None,
    Pan,
    Drag,
    Resize,
    Marquee,
    PanImageInFrame,
    PanFrame,
    Sketch,
}

/// What a drag moves once it passes the threshold.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DragTarget {
    /// Items, with positions captured when the move began
    Items {
        hit: ItemId,
        origins: Vec<(ItemId, Point)>,
    },
    /// One layer of the annotated item, origin in item pixels
    Layer {
        item: ItemId,
        layer: LayerId,
        origin: Point,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DragGesture {
    pub target: DragTarget,
    pub start_screen: Point,
    pub start_world: Point,
    /// False until movement reaches the drag threshold
    pub committed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResizeTarget {
    Item { id: ItemId, natural: Size },
    Layer { item: ItemId, original: Layer },
    Frame,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResizeGesture {
    pub target: ResizeTarget,
    pub handle: Handle,
    /// Rectangle at gesture start (world units, item pixels for layers)
    pub original: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SketchGesture {
    pub item: ItemId,
    pub tool: Tool,
    /// Item-pixel points collected so far
    pub points: Vec<Point>,
}

/// The single active pointer gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum Gesture {
    #[default]
    None,
    Pan {
        last_screen: Point,
    },
    Drag(DragGesture),
    Resize(ResizeGesture),
    Marquee {
        start_screen: Point,
        current_screen: Point,
        start_world: Point,
        current_world: Point,
        additive: bool,
    },
    PanImageInFrame {
        last_world: Point,
    },
    PanFrame {
        last_world: Point,
    },
    Sketch(SketchGesture),
}

impl Gesture {
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::None => GestureKind::None,
            Gesture::Pan { .. } => GestureKind::Pan,
            Gesture::Drag(_) => GestureKind::Drag,
            Gesture::Resize(_) => GestureKind::Resize,
            Gesture::Marquee { .. } => GestureKind::Marquee,
            Gesture::PanImageInFrame { .. } => GestureKind::PanImageInFrame,
            Gesture::PanFrame { .. } => GestureKind::PanFrame,
            Gesture::Sketch(_) => GestureKind::Sketch,
        }
    }
}
