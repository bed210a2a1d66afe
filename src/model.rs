//! Run manager: owns the setup, the primary generator and the event recorder,
//! and transports photons event by event on a rayon pool.

use crate::config::RunConfig;
use crate::construction::{DetectorConstruction, Setup};
use crate::error::Result;
use crate::fast_rng::FastRng;
use crate::hit::HitsMap;
use crate::particle::Photon;
use crate::physics::{compton_scatter, photoelectric_absorb};
use crate::recorder::EventRecorder;
use crate::sensitive::Step;
use crate::settings::Settings;
use crate::source::{DirectionMode, PrimaryGenerator};
use crate::units::{MEV, MM};
use rand::Rng;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Distance a photon is pushed past a boundary so it is located in the next volume.
const BOUNDARY_PUSH: f64 = 1e-6 * MM;
/// Upper bound on steps per history guarding against navigation loops.
const MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub run_id: u64,
    pub events: u64,
    /// Events with at least one hit
    pub events_with_hits: u64,
    /// Events with hits in two or more detectors
    pub coincidences: u64,
    /// Lines written to the output file
    pub recorded: u64,
}

pub struct Model {
    pub setup: Setup,
    pub settings: Settings,
    pub generator: PrimaryGenerator,
    output: PathBuf,
    recorder: Option<EventRecorder>,
    pool: rayon::ThreadPool,
    run_id: u64,
}

impl Model {
    pub fn new(setup: Setup, settings: Settings, generator: PrimaryGenerator, output: PathBuf) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build()?;
        Ok(Model {
            setup,
            settings,
            generator,
            output,
            recorder: None,
            pool,
            run_id: 0,
        })
    }

    /// Construct the world and generator described by `config`.
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        let settings = Settings::from_config(&config.run)?;
        let setup = DetectorConstruction::construct(config, settings.seed)?;
        let direction = match &config.source.target {
            Some(name) => DirectionMode::TowardVolume {
                name: name.clone(),
                margin: config.source.margin_mm * MM,
            },
            None => DirectionMode::Isotropic,
        };
        let mut generator = PrimaryGenerator::new(config.source.energy_mev * MEV, direction);
        generator.reference_height = config.source.reference_height_mm * MM;
        Self::new(setup, settings, generator, config.output.clone())
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Change the output file; the current one is closed.
    pub fn set_output(&mut self, output: PathBuf) -> Result<()> {
        self.close()?;
        self.output = output;
        Ok(())
    }

    /// Rebuild the worker pool with a new size.
    pub fn set_threads(&mut self, threads: usize) -> Result<()> {
        self.settings.threads = threads.max(1);
        self.pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.threads)
            .build()?;
        Ok(())
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn close(&mut self) -> Result<()> {
        if let Some(recorder) = self.recorder.take() {
            recorder.close()?;
        }
        Ok(())
    }

    /// Process `events` events and return the run's counters.
    pub fn beam_on(&mut self, events: u64) -> Result<RunSummary> {
        let run_id = self.run_id;
        self.run_id += 1;
        let mut summary = RunSummary {
            run_id,
            ..RunSummary::default()
        };

        let assembly_name = self.setup.assembly_name.clone();
        let Some(assembly) = self.setup.registry.assembly(&assembly_name) else {
            tracing::warn!("Run {} skipped: no spent fuel assembly", run_id);
            return Ok(summary);
        };
        if assembly.status().active_count() == 0 {
            tracing::warn!("Run {} skipped: no active fuel rods", run_id);
            return Ok(summary);
        }
        if !self.generator.prepare(&self.setup.geometry, &assembly_name) {
            tracing::warn!("Run {} skipped: {} is not placed", run_id, assembly_name);
            return Ok(summary);
        }
        if self.recorder.is_none() {
            self.recorder = Some(EventRecorder::open(
                &self.output,
                assembly.status(),
                self.settings.min_hits,
            )?);
        }

        tracing::info!(
            "Run {} starts: {} events on {} threads, {} physics, {} MeV",
            run_id,
            events,
            self.settings.threads,
            self.settings.physics.name(),
            self.generator.energy
        );

        let interval = self.settings.progress_interval(events);
        let processed = AtomicU64::new(0);
        let with_hits = AtomicU64::new(0);
        let coincidences = AtomicU64::new(0);
        let recorded = AtomicU64::new(0);
        let seed = self.settings.seed;
        let transport = Transport { setup: &self.setup, settings: &self.settings };
        let generator = &self.generator;
        let recorder = self.recorder.as_ref();

        let outcome: Result<()> = self.pool.install(|| {
            (0..events).into_par_iter().try_for_each(|event_id| {
                let mut rng = FastRng::for_event(seed, run_id, event_id);
                let mut hits = HitsMap::new();
                if let Some(photon) = generator.generate(assembly, &mut rng) {
                    transport.track(photon, &mut rng, &mut hits);
                }
                if !hits.is_empty() {
                    with_hits.fetch_add(1, Ordering::Relaxed);
                }
                if hits.len() >= 2 {
                    coincidences.fetch_add(1, Ordering::Relaxed);
                }
                if let Some(recorder) = recorder {
                    if recorder.record(event_id, &hits)? {
                        recorded.fetch_add(1, Ordering::Relaxed);
                    }
                }
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % interval == 0 {
                    tracing::info!("--> Event {} of run {} processed", done, run_id);
                }
                Ok(())
            })
        });
        outcome?;
        if let Some(recorder) = recorder {
            recorder.flush()?;
        }

        summary.events = processed.into_inner();
        summary.events_with_hits = with_hits.into_inner();
        summary.coincidences = coincidences.into_inner();
        summary.recorded = recorded.into_inner();
        tracing::info!(
            "Run {} ends: {} events, {} with hits, {} coincidences, {} recorded",
            run_id,
            summary.events,
            summary.events_with_hits,
            summary.coincidences,
            summary.recorded
        );
        Ok(summary)
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!("Failed to close {}: {}", self.output.display(), err);
        }
    }
}

/// Shared, read-only view used by every worker to follow one history.
struct Transport<'a> {
    setup: &'a Setup,
    settings: &'a Settings,
}

impl Transport<'_> {
    /// Follow a photon until it is absorbed or leaves the world, filling `hits` with
    /// the deposits made in sensitive volumes.
    fn track<R: Rng + ?Sized>(&self, mut photon: Photon, rng: &mut R, hits: &mut HitsMap) {
        let geometry = &self.setup.geometry;
        let mut steps = 0;
        while photon.alive {
            steps += 1;
            if steps > MAX_STEPS {
                tracing::warn!("History abandoned after {} steps at {:?}", MAX_STEPS, photon.position);
                break;
            }
            // leaving the world ends the history
            let Some(touchable) = geometry.locate(&photon.position) else {
                break;
            };
            let logical = geometry.logical(touchable.logical());
            let material = self.setup.materials.get(logical.material);
            let xs = material
                .map(|m| m.photon_xs(photon.energy, self.settings.physics))
                .unwrap_or_default();
            let collision = material
                .and_then(|m| m.sample_distance_to_collision(&xs, rng))
                .unwrap_or(f64::INFINITY);
            let boundary = geometry.distance_to_boundary(&touchable, &photon.position, &photon.direction);

            if boundary < collision {
                photon.move_by(boundary + BOUNDARY_PUSH);
                continue;
            }

            photon.move_by(collision);
            let edep = if rng.gen::<f64>() * xs.total() < xs.photoelectric {
                photoelectric_absorb(&mut photon)
            } else {
                compton_scatter(&mut photon, rng)
            };
            if logical.sensitive {
                let step = Step {
                    edep,
                    touchable: &touchable,
                    post_position: photon.position,
                    global_time: photon.time,
                    weight: photon.weight,
                };
                self.setup.sensitive.process_hits(&step, hits);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Orientation;
    use crate::source::REFERENCE_HEIGHT;
    use crate::Vec3;

    fn config_in(dir: &Path) -> RunConfig {
        let mut config = RunConfig::default();
        config.output = dir.join("data.txt");
        config.assembly.nx = 2;
        config.assembly.ny = 2;
        config.run.seed = Some(5);
        config
    }

    #[test]
    fn test_beam_toward_camera_records_hits() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.assembly.orientation = Orientation::Horizontal;
        config.assembly.surface_distance_mm = 500.0;
        config.source.target = Some("ComptonCamera".to_string());
        let mut model = Model::from_config(&config).unwrap();
        let summary = model.beam_on(2000).unwrap();
        model.close().unwrap();

        assert_eq!(summary.events, 2000);
        assert!(summary.events_with_hits >= 20, "{:?}", summary);
        assert_eq!(summary.recorded, summary.events_with_hits);
        let text = std::fs::read_to_string(dir.path().join("data.txt")).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(lines.len() as u64, summary.recorded);
        for line in lines {
            let fields: Vec<&str> = line.trim_end_matches('\t').split('\t').collect();
            assert_eq!((fields.len() - 2) % 6, 0);
            let detector: i32 = fields[2].parse().unwrap();
            assert!(detector == 0 || detector == 1);
            let weight: f64 = fields[1].parse().unwrap();
            assert!(weight > 0.0 && weight < 1.0);
        }
    }

    #[test]
    fn test_track_deposits_in_scatter() {
        let dir = tempfile::tempdir().unwrap();
        let model = Model::from_config(&config_in(dir.path())).unwrap();
        let transport = Transport {
            setup: &model.setup,
            settings: &model.settings,
        };
        let mut any = false;
        for event in 0..200 {
            let mut rng = FastRng::for_event(1, 0, event);
            let mut hits = HitsMap::new();
            let photon = Photon::new(Vec3::new(0.0, 0.0, 50.0), Vec3::new(0.0, 0.0, -1.0), 0.662, 1.0);
            transport.track(photon, &mut rng, &mut hits);
            for (copy_no, hit) in &hits {
                assert!(*copy_no == 0 || *copy_no == 1);
                assert!(hit.edep > 0.0 && hit.edep <= 0.662 + 1e-12);
                assert!(hit.position.x.abs() <= 25.0 + 1e-6);
                assert!(hit.time > 0.0);
                any = true;
            }
        }
        assert!(any);
    }

    #[test]
    fn test_empty_active_set_skips_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.assembly.active_rods = Some(vec![]);
        let mut model = Model::from_config(&config).unwrap();
        let summary = model.beam_on(10).unwrap();
        assert_eq!(summary.events, 0);
        assert!(!dir.path().join("data.txt").exists());
    }

    #[test]
    fn test_run_ids_advance() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = Model::from_config(&config_in(dir.path())).unwrap();
        assert_eq!(model.beam_on(5).unwrap().run_id, 0);
        assert_eq!(model.beam_on(5).unwrap().run_id, 1);
        assert_eq!(model.generator.reference_height, REFERENCE_HEIGHT);
    }
}
