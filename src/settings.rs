use crate::config::RunSection;
use crate::error::{CcError, Result};
use crate::physics::PhysicsList;

pub const DEFAULT_SEED: u64 = 20200915;

/// Run-level settings resolved from the `[run]` section and CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub threads: usize,
    pub seed: u64,
    pub physics: PhysicsList,
    pub print_progress: Option<u64>,
    pub min_hits: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            threads: 1,
            seed: DEFAULT_SEED,
            physics: PhysicsList::Standard,
            print_progress: None,
            min_hits: 1,
        }
    }
}

impl Settings {
    pub fn from_config(run: &RunSection) -> Result<Self> {
        let physics = PhysicsList::from_str_option(&run.physics)
            .ok_or_else(|| CcError::UnknownPhysicsList(run.physics.clone()))?;
        Ok(Settings {
            threads: run.threads.max(1),
            seed: run.seed.unwrap_or(DEFAULT_SEED),
            physics,
            print_progress: run.print_progress,
            min_hits: run.min_hits.max(1),
        })
    }

    /// Progress interval for a run of `events`; at least every event
    pub fn progress_interval(&self, events: u64) -> u64 {
        match self.print_progress {
            Some(n) if n > 0 => n,
            _ => (events / 10).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_run_section() {
        let run = RunSection {
            threads: 0,
            seed: Some(7),
            physics: "compton".to_string(),
            print_progress: None,
            min_hits: 2,
        };
        let settings = Settings::from_config(&run).unwrap();
        assert_eq!(settings.threads, 1);
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.physics, PhysicsList::ComptonOnly);
        assert_eq!(settings.min_hits, 2);
    }

    #[test]
    fn test_unknown_physics_list() {
        let run = RunSection {
            physics: "QGSP_BIC".to_string(),
            ..RunSection::default()
        };
        assert!(matches!(
            Settings::from_config(&run),
            Err(CcError::UnknownPhysicsList(ref name)) if name == "QGSP_BIC"
        ));
    }

    #[test]
    fn test_progress_interval() {
        let mut settings = Settings::default();
        assert_eq!(settings.progress_interval(1000), 100);
        assert_eq!(settings.progress_interval(5), 1);
        settings.print_progress = Some(25);
        assert_eq!(settings.progress_interval(1000), 25);
    }
}
