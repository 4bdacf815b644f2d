//! Background noise-map generation for Bevy.
//!
//! [`NoiseMap::generate`] is a blocking loop with no yield points, so it runs
//! on a private, bounded [`rayon`] pool instead of Bevy's task pools. Each
//! map is still produced by a single worker; the pool only keeps the work
//! off the main thread and caps how many maps are built at once.
//!
//! # Usage
//! ```rust,ignore
//! commands.spawn(PendingNoiseMap::new(NoiseMapConfig::default()));
//!
//! // Later, query for NoiseMapReady to consume the map and its image handle.
//! ```

use std::sync::{
    Arc, Mutex, OnceLock,
    atomic::{AtomicBool, Ordering},
    mpsc,
};

use bevy::{
    asset::Assets,
    ecs::{
        component::Component,
        entity::Entity,
        system::{Commands, Query, ResMut},
    },
    image::Image,
    prelude::Handle,
};

use crate::{
    map::{NoiseMap, NoiseMapConfig},
    render::noise_map_to_image,
};

/// Maximum number of noise maps generated concurrently.
const MAX_GENERATION_THREADS: usize = 4;

fn gen_pool() -> &'static rayon::ThreadPool {
    static POOL: OnceLock<rayon::ThreadPool> = OnceLock::new();
    POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(MAX_GENERATION_THREADS)
            .thread_name(|i| format!("noise-gen-{i}"))
            .build()
            .expect("failed to build noise generation thread pool")
    })
}

/// Spawned onto an entity to request background noise-map generation.
///
/// Dropping it (e.g. by despawning the entity) sets a cancellation flag;
/// tasks that have not started yet exit without generating anything.
#[derive(Component)]
pub struct PendingNoiseMap {
    // Mutex makes the receiver Sync, which Component requires.
    rx: Mutex<mpsc::Receiver<NoiseMap>>,
    cancelled: Arc<AtomicBool>,
}

impl PendingNoiseMap {
    /// Queue generation of a map described by `config`.
    pub fn new(config: NoiseMapConfig) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let (tx, rx) = mpsc::sync_channel(1);
        gen_pool().spawn(move || {
            if !flag.load(Ordering::Relaxed) {
                tx.send(NoiseMap::with_config(&config)).ok();
            }
        });
        Self {
            rx: Mutex::new(rx),
            cancelled,
        }
    }

    /// Non-blocking check for a finished map.
    ///
    /// `Ok(None)` while the task is still running; `Err` if the task died
    /// without producing a map.
    pub fn try_take(&self) -> Result<Option<NoiseMap>, mpsc::TryRecvError> {
        let rx = match self.rx.lock() {
            Ok(rx) => rx,
            Err(poisoned) => poisoned.into_inner(),
        };
        match rx.try_recv() {
            Ok(map) => Ok(Some(map)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for PendingNoiseMap {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Added by [`poll_noise_map_tasks`] once generation has finished.
#[derive(Component)]
pub struct NoiseMapReady {
    /// The generated values.
    pub map: NoiseMap,
    /// Greyscale upload of `map`.
    pub image: Handle<Image>,
}

/// Bevy system — polls pending generation tasks and uploads finished maps.
pub fn poll_noise_map_tasks(
    mut commands: Commands,
    tasks: Query<(Entity, &PendingNoiseMap)>,
    mut images: ResMut<Assets<Image>>,
) {
    for (entity, pending) in &tasks {
        match pending.try_take() {
            Ok(Some(map)) => {
                let image = noise_map_to_image(&map, &mut images);
                commands
                    .entity(entity)
                    .remove::<PendingNoiseMap>()
                    .insert(NoiseMapReady { map, image });
            }
            Ok(None) => {}
            Err(_) => {
                tracing::error!(?entity, "noise map generation task panicked");
                commands.entity(entity).remove::<PendingNoiseMap>();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn pending_map_completes() {
        let config = NoiseMapConfig {
            width: 16,
            height: 16,
            ..NoiseMapConfig::default()
        };
        let pending = PendingNoiseMap::new(config.clone());
        let deadline = Instant::now() + Duration::from_secs(30);
        let map = loop {
            if let Some(map) = pending.try_take().unwrap() {
                break map;
            }
            assert!(Instant::now() < deadline, "generation timed out");
            std::thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(map, NoiseMap::with_config(&config));
    }
}
