use ballsim::{ScenarioConfig, Scenario};
use ballsim::{bench_collide, bench_collide_curve};

use clap::Parser;
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Headless sphere collision simulation")]
struct Args {
    /// Scenario file under `scenarios/`
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Override the frame count from the scenario file
    #[arg(long)]
    frames: Option<usize>,

    /// Run the collision benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.bench {
        bench_collide()?;
        bench_collide_curve()?;
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::build_scenario(scenario_cfg).context("failed to build scenario")?;
    let frames = args.frames.unwrap_or(scenario.parameters.frames);

    let energy_start = scenario.bodies().kinetic_energy();
    let (mut sphere_contacts, mut wall_contacts) = (0, 0);
    for _ in 0..frames {
        let stats = scenario.step()?;
        sphere_contacts += stats.sphere_contacts;
        wall_contacts += stats.wall_contacts;
    }
    let energy_end = scenario.bodies().kinetic_energy();

    info!(
        frames,
        bodies = scenario.bodies().count(),
        sphere_contacts,
        wall_contacts,
        energy_start,
        energy_end,
        "run finished"
    );
    Ok(())
}
