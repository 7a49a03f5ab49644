// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster source decoding.
//!
//! Raw image bytes are opaque to the workspace; this module is the only
//! place that interprets them.

use anyhow::{Context, Result};
use image::{ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Read an image file into memory without decoding it.
pub fn read_image_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("cannot read image {}", path.display()))
}

/// Pixel dimensions from the image header, without a full decode.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("cannot guess image format")?;
    reader
        .into_dimensions()
        .context("cannot read image dimensions")
}

/// Fully decode an image to RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).context("cannot decode image")?;
    Ok(image.to_rgba8())
}

/// Encode an RGBA image as PNG, e.g. to hand a composition to a generator.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("cannot encode PNG")?;
    Ok(buffer.into_inner())
}
