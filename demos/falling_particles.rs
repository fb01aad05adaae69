use verlet_grid::*;

fn main() -> Result<()> {
    env_logger::init();

    let config = SimulationConfig {
        subdivision_depth: 3,
        ..Default::default()
    };
    let particles = ParticlesSoA::block(60, 50, Vec2::new(-0.6, -0.2), 0.021);
    let mut engine = SimulationEngine::new(config, particles)?;
    let mut sink = NoopSink::new();

    // Ten seconds of 60 Hz frames.
    for frame in 0..600 {
        engine.step(1.0 / 60.0);
        engine.present(&mut sink);

        if frame % 120 == 0 {
            println!(
                "frame {frame:>3}: {} particles, kinetic energy {:.6}",
                engine.particle_count(),
                engine.kinetic_energy()
            );
        }
    }

    let lowest = engine
        .positions()
        .iter()
        .map(|p| p.y)
        .fold(f32::INFINITY, f32::min);
    println!(
        "{} ticks through '{}', lowest particle at y = {lowest:.4}",
        engine.tick_count(),
        sink.name()
    );
    engine.profiler().report();
    Ok(())
}
