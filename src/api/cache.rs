//! Per-call image metadata cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::collect::Transport;
use crate::error::VgError;
use crate::model::{Image, ImageId, Lookup};

use super::fetch_image;

/// Id-keyed image lookups made during one paging run.
///
/// QA listings name their image by id on every record; the cache makes sure
/// each distinct image costs a single request, including images that turn
/// out not to exist.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: HashMap<ImageId, Lookup<Arc<Image>>>,
    fetches: usize,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        id: ImageId,
    ) -> Result<Lookup<Arc<Image>>, VgError> {
        if let Some(cached) = self.images.get(&id) {
            return Ok(cached.clone());
        }
        let fetched = fetch_image(transport, id)?.map(Arc::new);
        self.fetches += 1;
        self.images.insert(id, fetched.clone());
        Ok(fetched)
    }

    /// Like [`ImageCache::get`], but an unknown image is an error.
    pub fn require<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        id: ImageId,
    ) -> Result<Arc<Image>, VgError> {
        self.get(transport, id)?
            .found()
            .ok_or(VgError::ImageNotFound { id })
    }

    /// Number of requests actually sent.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
