//! Spins a (1, 2, 3) body about its intermediate axis for ten seconds and writes the
//! run to CSV. Set `RUST_LOG=debug` to see every frame.

use nalgebra::Vector3;
use rigid_body::prelude::*;
use std::error::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SimulationConfig::new(BodyMode::RotationOnly)
        .with_inertia(Inertia::diagonal(1.0, 2.0, 3.0)?)
        .with_rates(Vector3::new(0.1, 3.0, 0.1))
        .with_duration(10.0)
        .with_fps(60.0);

    let out = std::env::temp_dir().join("spinning_body");
    std::fs::create_dir_all(&out)?;
    config.save(&out.join("config.ron"))?;

    let mut sim = Simulation::new(&config)?;
    let mut writer = FrameWriter::create(&out.join("frames.csv"), config.mode)?;
    writer.write(&sim.initial_frame())?;

    let mut worst = 0.0_f64;
    sim.run(|frame| {
        worst = worst.max((frame.quaternion_norm - 1.0).abs());
        writer.write(frame)?;
        Ok(())
    })?;
    writer.flush()?;

    let energy = sim.outputs().energy;
    info!(
        steps = sim.steps(),
        worst_norm_error = worst,
        kinetic = energy.kinetic,
        path = %out.display(),
        "done"
    );
    Ok(())
}
