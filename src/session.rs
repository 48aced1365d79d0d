use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cascade::extinguish;
use crate::graph::{FoodWeb, WebSnapshot};
use crate::introduction::{introduce, Introduction};
use crate::snapshot::SnapshotWriter;

/// A validated mutation applied to the web: extinction of one species, or
/// the introduction of a new one. Scenarios script these under `events:`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Extinguish { species: String },
    Introduce(Introduction),
}

impl Command {
    pub fn label(&self) -> String {
        match self {
            Command::Extinguish { species } => format!("extinguish {species}"),
            Command::Introduce(intro) => format!("introduce {}", intro.name),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: u64,
    pub action: String,
    pub removed: Vec<String>,
    pub notice: Option<String>,
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionFrame {
    pub outcome: StepOutcome,
    pub snapshot: WebSnapshot,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub scenario: String,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepOutcome>,
    pub extinct: Vec<String>,
    pub surviving: Vec<String>,
}

pub struct SessionSettings {
    pub scenario_name: String,
    pub snapshot_dir: PathBuf,
    pub snapshot_every: u64,
}

/// Applies commands in order to a caller-owned web, snapshotting after
/// every step. Step 0 is the seed state, emitted before any command runs;
/// command steps count from 1.
pub struct Session {
    settings: SessionSettings,
    writer: SnapshotWriter,
    step: u64,
    outcomes: Vec<StepOutcome>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        let writer = SnapshotWriter::new(&settings.snapshot_dir, settings.snapshot_every);
        Self {
            settings,
            writer,
            step: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn run(&mut self, web: &mut FoodWeb, commands: &[Command]) -> Result<()> {
        self.run_with_hook(web, commands, |_| {})
    }

    pub fn run_with_hook(
        &mut self,
        web: &mut FoodWeb,
        commands: &[Command],
        mut hook: impl FnMut(SessionFrame),
    ) -> Result<()> {
        if self.step == 0 && self.outcomes.is_empty() {
            let seed = StepOutcome {
                step: 0,
                action: "seed".to_string(),
                removed: Vec::new(),
                notice: None,
                snapshot_path: None,
            };
            self.emit(web, seed, commands.is_empty(), &mut hook)?;
        }

        for (index, command) in commands.iter().enumerate() {
            self.step += 1;
            let step = self.step;
            let (removed, notice) = match command {
                Command::Extinguish { species } => {
                    let removed = extinguish(web, species);
                    let notice = if removed.is_empty() {
                        Some(format!("'{species}' is not part of the web; nothing to do"))
                    } else {
                        None
                    };
                    (removed, notice)
                }
                Command::Introduce(intro) => {
                    introduce(web, intro).with_context(|| {
                        format!("step {step}: failed to introduce '{}'", intro.name)
                    })?;
                    (Vec::new(), None)
                }
            };
            let outcome = StepOutcome {
                step,
                action: command.label(),
                removed,
                notice,
                snapshot_path: None,
            };
            self.emit(web, outcome, index + 1 == commands.len(), &mut hook)?;
        }
        Ok(())
    }

    fn emit(
        &mut self,
        web: &FoodWeb,
        mut outcome: StepOutcome,
        completed: bool,
        hook: &mut impl FnMut(SessionFrame),
    ) -> Result<()> {
        let snapshot = web.snapshot(&self.settings.scenario_name, outcome.step);
        outcome.snapshot_path = self.writer.maybe_write(&snapshot)?;
        self.outcomes.push(outcome.clone());
        hook(SessionFrame {
            outcome,
            snapshot,
            completed,
        });
        Ok(())
    }

    pub fn current_step(&self) -> u64 {
        self.step
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn report(&self, web: &FoodWeb) -> SessionReport {
        let extinct: Vec<String> = self
            .outcomes
            .iter()
            .flat_map(|outcome| outcome.removed.iter().cloned())
            .collect();
        SessionReport {
            scenario: self.settings.scenario_name.clone(),
            finished_at: Utc::now(),
            steps: self.outcomes.clone(),
            extinct,
            surviving: web.species_names(),
        }
    }

    pub fn write_report(&self, web: &FoodWeb) -> Result<PathBuf> {
        self.writer.write_report(&self.report(web))
    }
}
