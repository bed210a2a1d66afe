//! Macro commands driving a session: `/run/beamOn 1000`, `/gun/energy 662 keV`, ...
//!
//! A session starts from a [`RunConfig`]. Commands issued before `/run/initialize`
//! edit the configuration; afterwards they act on the constructed model.

use crate::config::RunConfig;
use crate::construction::log_status;
use crate::error::{CcError, Result};
use crate::fast_rng::FastRng;
use crate::model::{Model, RunSummary};
use crate::source::DirectionMode;
use crate::units::{energy_unit, length_unit, MEV, MM};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Nesting limit for `/control/execute`.
const MAX_MACRO_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RunInitialize,
    BeamOn(u64),
    PrintProgress(u64),
    NumberOfThreads(usize),
    /// Energy in MeV
    GunEnergy(f64),
    SetSeeds(u64, u64),
    ActivationRatio(f64),
    ActiveRods(Vec<usize>),
    PrintStatus,
    /// Target placement and margin in mm
    SourceTarget(String, f64),
    SourceIsotropic,
    OutputFile(PathBuf),
    MinHits(usize),
    DrawTree(String),
    Execute(PathBuf),
    Exit,
}

fn arg<T: FromStr>(args: &[&str], index: usize, what: &str) -> std::result::Result<T, String> {
    let raw = args.get(index).ok_or_else(|| format!("missing {}", what))?;
    raw.parse().map_err(|_| format!("invalid {} '{}'", what, raw))
}

impl Command {
    /// Parse one macro line; Ok(None) for blank lines and comments.
    pub fn parse(line: &str) -> std::result::Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = tokens.collect();

        let command = match name {
            "/run/initialize" => Command::RunInitialize,
            "/run/beamOn" => Command::BeamOn(arg(&args, 0, "event count")?),
            "/run/printProgress" => Command::PrintProgress(arg(&args, 0, "progress interval")?),
            "/run/numberOfThreads" => Command::NumberOfThreads(arg(&args, 0, "thread count")?),
            "/gun/energy" => {
                let value: f64 = arg(&args, 0, "energy")?;
                let unit = match args.get(1) {
                    Some(u) => energy_unit(u).ok_or_else(|| format!("unknown energy unit '{}'", u))?,
                    None => MEV,
                };
                if value <= 0.0 {
                    return Err(format!("energy must be positive, got {}", value));
                }
                Command::GunEnergy(value * unit)
            }
            "/random/setSeeds" => Command::SetSeeds(arg(&args, 0, "seed")?, arg(&args, 1, "seed")?),
            "/fuel/activationRatio" => Command::ActivationRatio(arg(&args, 0, "activation ratio")?),
            "/fuel/activeRods" => {
                let ids = args
                    .iter()
                    .map(|a| a.parse().map_err(|_| format!("invalid fuel rod id '{}'", a)))
                    .collect::<std::result::Result<Vec<usize>, String>>()?;
                Command::ActiveRods(ids)
            }
            "/fuel/printStatus" => Command::PrintStatus,
            "/source/target" => {
                let target: String = arg(&args, 0, "target volume")?;
                let margin: f64 = match args.get(1) {
                    Some(_) => arg(&args, 1, "margin")?,
                    None => 0.0,
                };
                let unit = match args.get(2) {
                    Some(u) => length_unit(u).ok_or_else(|| format!("unknown length unit '{}'", u))?,
                    None => MM,
                };
                Command::SourceTarget(target, margin * unit)
            }
            "/source/isotropic" => Command::SourceIsotropic,
            "/output/file" => Command::OutputFile(PathBuf::from(arg::<String>(&args, 0, "output path")?)),
            "/output/minHits" => Command::MinHits(arg(&args, 0, "hit count")?),
            "/vis/drawTree" => Command::DrawTree(arg(&args, 0, "volume name")?),
            "/control/execute" => Command::Execute(PathBuf::from(arg::<String>(&args, 0, "macro path")?)),
            "exit" => Command::Exit,
            other => return Err(format!("command <{}> not found", other)),
        };
        Ok(Some(command))
    }
}

/// State of a macro session: the configuration and, once initialised, the model.
pub struct Session {
    config: RunConfig,
    model: Option<Model>,
    summaries: Vec<RunSummary>,
    depth: usize,
    reshuffles: u64,
    finished: bool,
}

impl Session {
    pub fn new(config: RunConfig) -> Self {
        Session {
            config,
            model: None,
            summaries: Vec::new(),
            depth: 0,
            reshuffles: 0,
            finished: false,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn summaries(&self) -> &[RunSummary] {
        &self.summaries
    }

    /// Build the model from the current configuration unless already built.
    pub fn initialize(&mut self) -> Result<&mut Model> {
        if self.model.is_none() {
            self.model = Some(Model::from_config(&self.config)?);
        }
        match self.model.as_mut() {
            Some(model) => Ok(model),
            None => Err(CcError::Geometry("model not initialized".to_string())),
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::RunInitialize => {
                if self.model.is_some() {
                    tracing::warn!("/run/initialize ignored: already initialized");
                } else {
                    self.initialize()?;
                }
            }
            Command::BeamOn(events) => {
                let summary = self.initialize()?.beam_on(events)?;
                self.summaries.push(summary);
            }
            Command::PrintProgress(n) => {
                self.config.run.print_progress = Some(n);
                if let Some(model) = self.model.as_mut() {
                    model.settings.print_progress = Some(n);
                }
            }
            Command::NumberOfThreads(n) => {
                self.config.run.threads = n.max(1);
                if let Some(model) = self.model.as_mut() {
                    model.set_threads(n)?;
                }
            }
            Command::GunEnergy(energy) => {
                self.config.source.energy_mev = energy / MEV;
                if let Some(model) = self.model.as_mut() {
                    model.generator.energy = energy;
                }
            }
            Command::SetSeeds(a, b) => {
                let seed = (a << 32) ^ b;
                self.config.run.seed = Some(seed);
                if let Some(model) = self.model.as_mut() {
                    model.settings.seed = seed;
                }
            }
            Command::ActivationRatio(ratio) => match self.model.as_mut() {
                None => {
                    self.config.assembly.activation_ratio = ratio;
                    self.config.assembly.active_rods = None;
                }
                Some(model) => {
                    let mut rng = FastRng::for_event(model.settings.seed, u64::MAX, self.reshuffles);
                    self.reshuffles += 1;
                    let changed = model.setup.assembly_mut().is_some_and(|assembly| {
                        let before = assembly.status().active_ids().to_vec();
                        assembly.status_mut().set_activation_ratio(ratio, &mut rng);
                        assembly.status().active_ids() != before.as_slice()
                    });
                    // next run writes a fresh status header
                    if changed {
                        model.close()?;
                    }
                }
            },
            Command::ActiveRods(ids) => match self.model.as_mut() {
                None => self.config.assembly.active_rods = Some(ids),
                Some(model) => {
                    let changed = model.setup.assembly_mut().is_some_and(|assembly| {
                        let before = assembly.status().active_ids().to_vec();
                        assembly.status_mut().set_active_rods(&ids);
                        assembly.status().active_ids() != before.as_slice()
                    });
                    if changed {
                        model.close()?;
                    }
                }
            },
            Command::PrintStatus => match self.model.as_ref().and_then(|m| m.setup.assembly()) {
                Some(assembly) => log_status(assembly),
                None => tracing::warn!("/fuel/printStatus: run /run/initialize first"),
            },
            Command::SourceTarget(name, margin) => {
                self.config.source.target = Some(name.clone());
                self.config.source.margin_mm = margin / MM;
                if let Some(model) = self.model.as_mut() {
                    model.generator.set_direction_mode(DirectionMode::TowardVolume { name, margin });
                }
            }
            Command::SourceIsotropic => {
                self.config.source.target = None;
                if let Some(model) = self.model.as_mut() {
                    model.generator.set_direction_mode(DirectionMode::Isotropic);
                }
            }
            Command::OutputFile(path) => {
                self.config.output = path.clone();
                if let Some(model) = self.model.as_mut() {
                    model.set_output(path)?;
                }
            }
            Command::MinHits(n) => {
                self.config.run.min_hits = n.max(1);
                if let Some(model) = self.model.as_mut() {
                    model.settings.min_hits = n.max(1);
                    model.close()?;
                }
            }
            Command::DrawTree(name) => match self.model.as_ref() {
                Some(model) => {
                    let stdout = std::io::stdout();
                    let mut out = stdout.lock();
                    if !model.setup.geometry.write_tree(&name, &mut out)? {
                        tracing::warn!("/vis/drawTree: no volume named '{}'", name);
                    }
                }
                None => tracing::warn!("/vis/drawTree: run /run/initialize first"),
            },
            Command::Execute(path) => self.execute_file(&path)?,
            Command::Exit => self.finished = true,
        }
        Ok(())
    }

    /// Parse and apply one line. Malformed lines are logged and skipped.
    pub fn execute_line(&mut self, line: &str, file: &str, line_no: usize) -> Result<()> {
        match Command::parse(line) {
            Ok(Some(command)) => {
                tracing::debug!("{}:{}: {}", file, line_no, line.trim());
                self.apply(command)
            }
            Ok(None) => Ok(()),
            Err(message) => {
                let err = CcError::Macro {
                    file: file.to_string(),
                    line: line_no,
                    message,
                };
                tracing::warn!("{}", err);
                Ok(())
            }
        }
    }

    pub fn execute_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if self.depth >= MAX_MACRO_DEPTH {
            tracing::warn!("/control/execute {} skipped: macros nested too deeply", path.display());
            return Ok(());
        }
        let file = std::fs::File::open(path)?;
        self.depth += 1;
        let result = self.run_reader(BufReader::new(file), &path.display().to_string());
        self.depth -= 1;
        result
    }

    /// Execute commands from a reader until it ends or `exit` is read.
    pub fn run_reader<R: BufRead>(&mut self, reader: R, name: &str) -> Result<()> {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            self.execute_line(&line, name, index + 1)?;
            if self.finished {
                break;
            }
        }
        Ok(())
    }

    /// Close the output file.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(model) = self.model.as_mut() {
            model.close()?;
        }
        Ok(())
    }
}
