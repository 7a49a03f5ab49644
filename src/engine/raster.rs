// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster ownership and background decoding.
//!
//! Every bitmap the workspace shows lives here, keyed by [`RasterId`].
//! Encoded sources are decoded on a worker thread; completion only fills the
//! cache entry and asks for a repaint, it never touches geometry or
//! selection. Entries are released explicitly once nothing references them.

use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use crate::io::media;
use crate::models::RasterId;

/// Raw or already-decoded raster content supplied by a caller.
#[derive(Debug, Clone)]
pub enum RasterSource {
    Encoded(Arc<[u8]>),
    Decoded(Arc<RgbaImage>),
}

impl RasterSource {
    pub fn encoded(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Encoded(bytes.into())
    }

    /// Natural size without decoding (header probe for encoded data).
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            RasterSource::Encoded(bytes) => match media::probe_dimensions(bytes) {
                Ok(dimensions) => Some(dimensions),
                Err(e) => {
                    log::warn!("cannot probe raster dimensions: {:#}", e);
                    None
                }
            },
            RasterSource::Decoded(image) => Some(image.dimensions()),
        }
    }
}

/// Decode progress of a raster.
#[derive(Debug, Clone)]
pub enum RasterState {
    Pending,
    Ready(Arc<RgbaImage>),
    Failed,
}

/// Result of a background decode.
struct DecodedRaster {
    id: RasterId,
    result: Result<RgbaImage, String>,
}

/// Arena of rasters referenced by items and layers.
pub struct RasterStore {
    entries: HashMap<RasterId, RasterState>,
    next_id: u64,
    sender: Sender<DecodedRaster>,
    receiver: Receiver<DecodedRaster>,
}

impl Default for RasterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterStore {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            entries: HashMap::new(),
            next_id: 0,
            sender,
            receiver,
        }
    }

    fn allocate(&mut self) -> RasterId {
        self.next_id += 1;
        RasterId(self.next_id)
    }

    /// Register any source; encoded data is decoded in the background.
    pub fn insert(&mut self, source: RasterSource) -> RasterId {
        match source {
            RasterSource::Encoded(bytes) => self.insert_encoded(bytes),
            RasterSource::Decoded(image) => self.insert_decoded(image),
        }
    }

    /// Register encoded bytes and start decoding them on a worker thread.
    pub fn insert_encoded(&mut self, bytes: Arc<[u8]>) -> RasterId {
        let id = self.allocate();
        self.entries.insert(id, RasterState::Pending);

        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let result = media::decode_rgba(&bytes).map_err(|e| format!("{:#}", e));
            let _ = sender.send(DecodedRaster { id, result });
        });

        log::debug!("decoding raster {:?}", id);
        id
    }

    /// Register a bitmap that is ready to draw.
    pub fn insert_decoded(&mut self, image: Arc<RgbaImage>) -> RasterId {
        let id = self.allocate();
        self.entries.insert(id, RasterState::Ready(image));
        id
    }

    /// Drain finished decodes. Returns how many entries changed.
    pub fn poll(&mut self) -> usize {
        let mut changed = 0;
        while let Ok(decoded) = self.receiver.try_recv() {
            // Released while decoding.
            let Some(entry) = self.entries.get_mut(&decoded.id) else {
                continue;
            };
            *entry = match decoded.result {
                Ok(image) => {
                    log::info!(
                        "decoded raster {:?} ({}x{})",
                        decoded.id,
                        image.width(),
                        image.height()
                    );
                    RasterState::Ready(Arc::new(image))
                }
                Err(e) => {
                    log::error!("failed to decode raster {:?}: {}", decoded.id, e);
                    RasterState::Failed
                }
            };
            changed += 1;
        }
        changed
    }

    pub fn state(&self, id: RasterId) -> Option<&RasterState> {
        self.entries.get(&id)
    }

    /// Decoded bitmap, `None` while pending, after failure or once released.
    pub fn image(&self, id: RasterId) -> Option<&Arc<RgbaImage>> {
        match self.entries.get(&id) {
            Some(RasterState::Ready(image)) => Some(image),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.entries
            .values()
            .any(|state| matches!(state, RasterState::Pending))
    }

    pub fn contains(&self, id: RasterId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Release every raster not in `live`. Returns the released ids.
    pub fn retain(&mut self, live: &HashSet<RasterId>) -> Vec<RasterId> {
        let released: Vec<RasterId> = self
            .entries
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();
        for id in &released {
            self.entries.remove(id);
        }
        if !released.is_empty() {
            log::debug!("released {} raster(s)", released.len());
        }
        released
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::{Duration, Instant};

    fn wait_for_decode(store: &mut RasterStore) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while store.poll() == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_encoded_source_decodes_in_background() {
        let png = media::encode_png(&RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255])))
            .expect("encode");
        let source = RasterSource::encoded(png);
        assert_eq!(source.dimensions(), Some((4, 2)));

        let mut store = RasterStore::new();
        let id = store.insert(source);
        wait_for_decode(&mut store);
        let image = store.image(id).expect("decoded image");
        assert_eq!(image.dimensions(), (4, 2));
    }

    #[test]
    fn test_failed_decode_is_not_an_image() {
        let mut store = RasterStore::new();
        let id = store.insert_encoded(Arc::from(&b"garbage"[..]));
        wait_for_decode(&mut store);
        assert!(matches!(store.state(id), Some(RasterState::Failed)));
        assert!(store.image(id).is_none());
    }

    #[test]
    fn test_retain_releases_unreferenced() {
        let mut store = RasterStore::new();
        let keep = store.insert_decoded(Arc::new(RgbaImage::new(1, 1)));
        let drop = store.insert_decoded(Arc::new(RgbaImage::new(1, 1)));
        let live: HashSet<RasterId> = [keep].into_iter().collect();
        assert_eq!(store.retain(&live), vec![drop]);
        assert!(store.contains(keep));
        assert!(!store.contains(drop));
    }
}
