use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cached::Cached;
use cached::stores::{CanExpire, ExpiringValueCache};
use image::RgbImage;
use log::{debug, trace};

use crate::distance::ColourDistance;

use super::{GigaScreenPaletteFamily, attribute_grid};

const DEFAULT_LIFESPAN: Duration = Duration::from_secs(10);
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct CachedGrid {
    grid: Arc<Vec<usize>>,
    expires: Instant,
}

impl CanExpire for CachedGrid {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires
    }
}

/// Short lived memo of attribute grids, shared by every frame of a run.
///
/// Entries are keyed by a hash of the image content together with the palette
/// family and distance metric, so a preview and an export pass over the same
/// frame only search the candidates once.
pub struct GigaScreenCache {
    store: Mutex<ExpiringValueCache<u64, CachedGrid>>,
    lifespan: Duration,
}

impl GigaScreenCache {
    pub fn new(capacity: usize, lifespan: Duration) -> Self {
        Self {
            store: Mutex::new(ExpiringValueCache::with_size(capacity)),
            lifespan,
        }
    }

    /// Looks up the attribute grid for an image, computing and storing it on a miss.
    pub fn attribute_grid(
        &self,
        image: &RgbImage,
        family: GigaScreenPaletteFamily,
        metric: ColourDistance,
    ) -> Arc<Vec<usize>> {
        let key = fingerprint(image, family, metric);

        if let Some(entry) = self.lock().cache_get(&key) {
            trace!("GigaScreen attribute cache hit for {key:016x}");
            return Arc::clone(&entry.grid);
        }

        let grid = Arc::new(attribute_grid(image, family, metric));
        debug!("Computed GigaScreen attribute grid {key:016x}");

        self.lock().cache_set(
            key,
            CachedGrid {
                grid: Arc::clone(&grid),
                expires: Instant::now() + self.lifespan,
            },
        );

        grid
    }

    pub fn len(&self) -> usize {
        self.lock().cache_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ExpiringValueCache<u64, CachedGrid>> {
        self.store.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for GigaScreenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_LIFESPAN)
    }
}

impl std::fmt::Debug for GigaScreenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GigaScreenCache")
            .field("entries", &self.len())
            .field("lifespan", &self.lifespan)
            .finish()
    }
}

fn fingerprint(image: &RgbImage, family: GigaScreenPaletteFamily, metric: ColourDistance) -> u64 {
    let mut hasher = DefaultHasher::new();
    image.dimensions().hash(&mut hasher);
    image.as_raw().hash(&mut hasher);
    family.hash(&mut hasher);
    metric.hash(&mut hasher);
    hasher.finish()
}
