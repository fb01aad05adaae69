use std::thread;
use std::time::Duration;

use verlet_grid::*;

const WINDOW: (u32, u32) = (800, 800);

/// Records the bounding box of every uploaded frame.
#[derive(Default)]
struct BoundsSink {
    min: Vec2,
    max: Vec2,
}

impl ParticleSink for BoundsSink {
    fn name(&self) -> &str {
        "bounds"
    }

    fn upload(&mut self, _radius: f32, positions: &[f32]) {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for pair in positions.chunks_exact(2) {
            let point = Vec2::new(pair[0], pair[1]);
            min = min.min(point);
            max = max.max(point);
        }
        self.min = min;
        self.max = max;
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = SimulationConfig {
        boundary: BoundaryShape::Circle,
        ..Default::default()
    };
    let particles = ParticlesSoA::block(40, 40, Vec2::new(-0.4, -0.4), 0.021);
    let mut engine = SimulationEngine::new(config, particles)?;

    // A separate thread plays the part of the window event loop.
    let input = engine.input();
    let driver = thread::spawn(move || {
        for step in 0..240u32 {
            let angle = step as f64 * 0.05;
            let (width, height) = WINDOW;
            let x = (0.5 + 0.3 * angle.cos()) * width as f64;
            let y = (0.5 + 0.3 * angle.sin()) * height as f64;
            input.set_pointer_from_window(x, y, width, height);
            input.set_buttons(step % 80 < 60, step % 80 >= 60);
            thread::sleep(Duration::from_millis(2));
        }
        input.set_buttons(false, false);
    });

    let mut sink = BoundsSink::default();
    for frame in 0..480 {
        engine.step(1.0 / 60.0);
        engine.present(&mut sink);
        if frame % 60 == 0 {
            println!(
                "frame {frame:>3}: pointer {:?}, extent {:?}..{:?}",
                engine.input().snapshot().position,
                sink.min,
                sink.max
            );
        }
    }

    if driver.join().is_err() {
        log::error!("input thread panicked");
    }
    engine.profiler().report();
    Ok(())
}
