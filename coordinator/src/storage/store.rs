use std::sync::Arc;

use log::info;
use parking_lot::RwLock;

use super::ModelSnapshot;

/// Holds the latest published model snapshot.
///
/// Publishing swaps a fully built snapshot in under the write lock, so readers
/// either see the previous snapshot or the new one, never a partially written
/// vector. Versions are assigned here: `0` for the first publish, then one more
/// per publish.
#[derive(Debug, Default)]
pub struct GlobalModelStore {
    current: RwLock<Option<ModelSnapshot>>,
}

impl GlobalModelStore {
    /// Creates a new empty `GlobalModelStore`.
    ///
    /// # Returns
    /// A new `GlobalModelStore` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot with a new version built from `weights`.
    ///
    /// # Arguments
    /// * `weights` - The aggregated weights.
    /// * `round` - The round these weights were aggregated from.
    /// * `contributors` - The amount of updates folded into these weights.
    ///
    /// # Returns
    /// The newly published snapshot.
    pub fn publish(&self, weights: Vec<f64>, round: u64, contributors: usize) -> ModelSnapshot {
        let weights: Arc<[f64]> = weights.into();
        let mut current = self.current.write();
        let version = current.as_ref().map_or(0, |s| s.version + 1);

        let snapshot = ModelSnapshot {
            version,
            round,
            contributors,
            weights,
        };

        *current = Some(snapshot.clone());
        info!("published model version {version} from round {round}");
        snapshot
    }

    /// Reads the current snapshot, `None` until the first publish.
    pub fn read(&self) -> Option<ModelSnapshot> {
        self.current.read().clone()
    }

    /// The version of the current snapshot, `None` until the first publish.
    pub fn version(&self) -> Option<u64> {
        self.current.read().as_ref().map(|s| s.version)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        thread,
    };

    use super::*;

    #[test]
    fn test_empty_until_first_publish() {
        let store = GlobalModelStore::new();
        assert!(store.read().is_none());
        assert!(store.version().is_none());
    }

    #[test]
    fn test_versions_increase_by_one() {
        let store = GlobalModelStore::new();

        let first = store.publish(vec![20., 40.], 0, 3);
        assert_eq!(first.version, 0);
        assert_eq!(&*first.weights, &[20., 40.]);

        let second = store.publish(vec![21., 41.], 1, 3);
        assert_eq!(second.version, 1);
        assert_eq!(store.version(), Some(1));

        // Versions are independent from the round numbers.
        let third = store.publish(vec![22., 42.], 7, 2);
        assert_eq!(third.version, 2);
        assert_eq!(store.read(), Some(third));
    }

    #[test]
    fn test_readers_never_see_partial_vectors() {
        const DIM: usize = 4096;
        const PUBLISHES: usize = 200;

        let store = GlobalModelStore::new();
        let done = AtomicBool::new(false);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let Some(snapshot) = store.read() else {
                            continue;
                        };

                        let expected = snapshot.version as f64;
                        assert_eq!(snapshot.weights.len(), DIM);
                        assert!(snapshot.weights.iter().all(|&w| w == expected));
                    }
                });
            }

            for i in 0..PUBLISHES {
                store.publish(vec![i as f64; DIM], i as u64, 1);
            }

            done.store(true, Ordering::Release);
        });

        assert_eq!(store.version(), Some(PUBLISHES as u64 - 1));
    }
}
