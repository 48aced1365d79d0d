use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use trophic::{
    scenario::ScenarioLoader,
    session::{Session, SessionSettings},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "TROPHIC food-web runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/meadow.yaml")]
    scenario: PathBuf,

    /// Extinguish this species after the scripted events (repeatable)
    #[arg(long)]
    extinguish: Vec<String>,

    /// Override the snapshot interval in steps (0 disables snapshots)
    #[arg(long)]
    snapshot_every: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Serve the web viewer instead of printing to stdout
    #[arg(long)]
    serve: bool,

    /// Address for the web viewer
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for the web viewer
    #[arg(long, default_value_t = 8642)]
    port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    let snapshot_every = cli.snapshot_every.unwrap_or(scenario.snapshot_every);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    if cli.serve {
        let config = WebServerConfig {
            scenario,
            extra_extinguish: cli.extinguish,
            snapshot_every,
            snapshot_dir,
            host: cli.host,
            port: cli.port,
        };
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(web::run(config));
    }

    let mut web = scenario.build_web()?;
    let seeded = web.species_count();
    let commands = scenario.commands(&cli.extinguish);
    let mut session = Session::new(SessionSettings {
        scenario_name: scenario.name.clone(),
        snapshot_dir,
        snapshot_every,
    });
    session.run(&mut web, &commands)?;

    for outcome in session.outcomes().iter().skip(1) {
        match &outcome.notice {
            Some(notice) => println!("step {}: {} ({notice})", outcome.step, outcome.action),
            None if outcome.removed.is_empty() => {
                println!("step {}: {}", outcome.step, outcome.action)
            }
            None => println!(
                "step {}: {} -> lost {}",
                outcome.step,
                outcome.action,
                outcome.removed.join(", ")
            ),
        }
    }

    if snapshot_every > 0 {
        let report_path = session.write_report(&web)?;
        println!("Report written to {}", report_path.display());
    }
    println!(
        "Scenario '{}' completed after {} steps. {} of {} species survive.",
        scenario.name,
        session.current_step(),
        web.species_count(),
        seeded
    );
    Ok(())
}
