use barrage_core::{ConfigError, RequestDescriptor};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};

/// The set of requests a run chooses from.
///
/// Every call to [`next`](RequestCatalog::next) picks uniformly at random from the full set, with
/// replacement, so the same descriptor can be in flight several times at once.
pub struct RequestCatalog {
    descriptors: Vec<Arc<RequestDescriptor>>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl RequestCatalog {
    pub fn new(descriptors: Vec<RequestDescriptor>) -> Result<Self, ConfigError> {
        Self::with_rng(descriptors, SmallRng::from_entropy())
    }

    /// Use a caller-provided randomness source, e.g. a seeded generator in tests.
    pub fn with_rng<R>(descriptors: Vec<RequestDescriptor>, rng: R) -> Result<Self, ConfigError>
    where
        R: RngCore + Send + 'static,
    {
        if descriptors.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        Ok(Self {
            descriptors: descriptors.into_iter().map(Arc::new).collect(),
            rng: Mutex::new(Box::new(rng)),
        })
    }

    pub fn next(&self) -> Arc<RequestDescriptor> {
        // NOTE: A panic while holding the lock cannot leave the generator in a bad state.
        let idx = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.gen_range(0..self.descriptors.len())
        };
        self.descriptors[idx].clone()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &RequestDescriptor> {
        self.descriptors.iter().map(|d| d.as_ref())
    }
}

impl std::fmt::Debug for RequestCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCatalog")
            .field("descriptors", &self.descriptors)
            .finish_non_exhaustive()
    }
}
