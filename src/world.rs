use std::time::Instant;

use glam::Vec2;
use log::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    collision::{
        grid::SpatialGrid,
        partition::{RegionPartition, RegionPartitioner, PASS_COUNT},
        resolver::{CollisionResolver, SharedParticles, SweepStats},
    },
    config::{SimulationConfig, DOMAIN_HALF_EXTENT},
    core::particles::ParticlesSoA,
    dynamics::{
        constraints::BoundaryConstraint,
        forces::{ForceRegistry, GravityForce, PointerForce},
        integrator::Integrator,
    },
    error::{Result, SimError},
    input::InputHandle,
    render::ParticleSink,
    utils::{
        logging::{warn_if_frame_budget_exceeded, ScopedTimer},
        profiling::{PhaseTimer, TickProfiler},
    },
};

/// Stage of the tick state machine the engine is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePhase {
    #[default]
    Idle,
    Integrating,
    GridRebuild,
    CollisionPass(u8),
    Constrain,
}

/// Counters produced by a single tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub pairs_tested: usize,
    pub contacts_resolved: usize,
    pub dropped_entries: usize,
}

/// Callback invoked on every phase transition.
pub type PhaseObserver = Box<dyn Fn(EnginePhase) + Send + Sync>;

/// Owns the particle state and runs the fixed-timestep pipeline:
/// integrate, rebuild the grid, four checkerboard collision passes, constrain.
pub struct SimulationEngine {
    pub force_registry: ForceRegistry,
    config: SimulationConfig,
    particles: ParticlesSoA,
    grid: SpatialGrid,
    partition: RegionPartition,
    resolver: CollisionResolver,
    integrator: Integrator,
    boundary: BoundaryConstraint,
    input: InputHandle,
    phase: EnginePhase,
    phase_observer: Option<PhaseObserver>,
    time_accumulated: f32,
    tick_count: u64,
    profiler: TickProfiler,
    parallel_enabled: bool,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl SimulationEngine {
    /// Builds an engine around a fixed particle set.
    ///
    /// Fails if the configuration is invalid, if the particle arrays differ in
    /// length, if the subdivision depth would produce regions too small for
    /// the quadrant scheme, or if the worker pool cannot be created.
    pub fn new(config: SimulationConfig, particles: ParticlesSoA) -> Result<Self> {
        config.validate()?;
        if !particles.is_consistent() {
            return Err(SimError::InvalidConfig(format!(
                "particle arrays differ in length: {} positions, {} previous positions",
                particles.positions.len(),
                particles.previous.len()
            )));
        }

        let dimension = config.grid_dimension();
        let grid = SpatialGrid::new(
            Vec2::splat(-DOMAIN_HALF_EXTENT),
            config.cell_size(),
            dimension,
            dimension,
            config.cell_capacity,
        );
        if grid.interior().is_empty() {
            return Err(SimError::GridTooSmall {
                width: grid.width(),
                height: grid.height(),
            });
        }

        let partition = RegionPartitioner::new(config.subdivision_depth).partition(grid.interior())?;

        let mut force_registry = ForceRegistry::new();
        force_registry.add_force(GravityForce::new(config.gravity));
        force_registry.add_force(PointerForce::new(config.pointer_strength));

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(partition.worker_count())
            .thread_name(|index| format!("collision-worker-{index}"))
            .build()?;

        debug!(
            "Simulation engine: {} particle(s), {}x{} grid, {} worker region(s)",
            particles.len(),
            grid.width(),
            grid.height(),
            partition.worker_count()
        );

        Ok(Self {
            force_registry,
            resolver: CollisionResolver::new(
                config.particle_radius,
                config.restitution,
                config.separation_factor,
            ),
            integrator: Integrator::new(config.integration),
            boundary: BoundaryConstraint::new(config.boundary, config.particle_radius),
            input: InputHandle::new(),
            phase: EnginePhase::Idle,
            phase_observer: None,
            time_accumulated: 0.0,
            tick_count: 0,
            profiler: TickProfiler::default(),
            parallel_enabled: cfg!(feature = "parallel"),
            #[cfg(feature = "parallel")]
            pool,
            config,
            particles,
            grid,
            partition,
        })
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        let enabled = enabled && cfg!(feature = "parallel");
        self.parallel_enabled = enabled;
        self.integrator.set_parallel(enabled);
        self.boundary.set_parallel(enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn particles(&self) -> &ParticlesSoA {
        &self.particles
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.particles.positions
    }

    /// Interleaved `[x, y]` positions, ready for a vertex/storage buffer upload.
    pub fn positions_flat(&self) -> &[f32] {
        self.particles.positions_flat()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn radius(&self) -> f32 {
        self.config.particle_radius
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn partition(&self) -> &RegionPartition {
        &self.partition
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Installs a callback that sees every phase the engine enters.
    pub fn set_phase_observer<F>(&mut self, observer: F)
    where
        F: Fn(EnginePhase) + Send + Sync + 'static,
    {
        self.phase_observer = Some(Box::new(observer));
    }

    pub fn clear_phase_observer(&mut self) {
        self.phase_observer = None;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Unconsumed simulated time carried over to the next `step`.
    pub fn time_accumulated(&self) -> f32 {
        self.time_accumulated
    }

    /// Handle the input collaborator writes pointer state through.
    pub fn input(&self) -> InputHandle {
        self.input.clone()
    }

    pub fn profiler(&self) -> &TickProfiler {
        &self.profiler
    }

    pub fn reset_profiler(&mut self) {
        self.profiler.reset();
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.particles.kinetic_energy()
    }

    /// Uploads the current positions to `sink` and asks it to draw.
    pub fn present(&self, sink: &mut dyn ParticleSink) {
        sink.upload(self.radius(), self.positions_flat());
        sink.draw(self.particle_count());
    }

    /// Drains `frame_dt` of real time into as many fixed ticks as it covers.
    ///
    /// At most `max_ticks_per_step` ticks run per call; debt beyond that is
    /// dropped so a slow frame cannot snowball. Returns the number of ticks run.
    pub fn step(&mut self, frame_dt: f32) -> u32 {
        let started = Instant::now();
        let time_step = self.config.time_step;
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.time_accumulated += frame_dt;
        }

        let mut ticks = 0;
        while self.time_accumulated >= time_step && ticks < self.config.max_ticks_per_step {
            self.time_accumulated -= time_step;
            self.tick();
            ticks += 1;
        }

        if self.time_accumulated >= time_step {
            debug!(
                "Dropping {:.4} s of simulation debt after {} tick(s)",
                self.time_accumulated - self.time_accumulated % time_step,
                ticks
            );
            self.time_accumulated %= time_step;
        }

        warn_if_frame_budget_exceeded(started.elapsed(), self.config.frame_budget_ms);
        ticks
    }

    /// Runs one tick of the configured fixed length.
    pub fn tick(&mut self) -> TickReport {
        self.tick_with_dt(self.config.time_step)
    }

    /// Runs one tick of length `dt`; meaningful with the time-corrected scheme.
    pub fn tick_with_dt(&mut self, dt: f32) -> TickReport {
        let started = Instant::now();

        self.enter(EnginePhase::Integrating);
        self.integrate(dt);

        self.enter(EnginePhase::GridRebuild);
        {
            let _timer = PhaseTimer::new(&mut self.profiler.grid_time);
            let _trace = ScopedTimer::new("grid::rebuild");
            self.grid.rebuild(&self.particles);
        }

        let mut sweep = SweepStats::default();
        {
            let _trace = ScopedTimer::new("collision::passes");
            let collide_started = Instant::now();
            for pass in 0..PASS_COUNT {
                self.enter(EnginePhase::CollisionPass(pass as u8));
                sweep = sweep.merge(self.run_collision_pass(pass));
            }
            self.profiler.collision_time += collide_started.elapsed();
        }

        self.enter(EnginePhase::Constrain);
        self.constrain();

        self.enter(EnginePhase::Idle);
        self.tick_count += 1;

        let report = TickReport {
            pairs_tested: sweep.pairs_tested,
            contacts_resolved: sweep.contacts_resolved,
            dropped_entries: self.grid.overflow_count(),
        };
        self.profiler.ticks += 1;
        self.profiler.particle_count = self.particles.len();
        self.profiler.pairs_tested += report.pairs_tested;
        self.profiler.contacts_resolved += report.contacts_resolved;
        self.profiler.dropped_entries += report.dropped_entries;
        self.profiler.total_time += started.elapsed();
        report
    }

    fn enter(&mut self, phase: EnginePhase) {
        trace!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        if let Some(observer) = &self.phase_observer {
            observer(phase);
        }
    }

    fn integrate(&mut self, dt: f32) {
        // Read once per tick; later writes land in the next tick.
        let pointer = self.input.snapshot();
        let _timer = PhaseTimer::new(&mut self.profiler.integrate_time);
        let _trace = ScopedTimer::new("integrate");

        let integrator = &mut self.integrator;
        let particles = &mut self.particles;
        let forces = &self.force_registry;

        #[cfg(feature = "parallel")]
        if self.parallel_enabled {
            self.pool
                .install(|| integrator.step(particles, forces, &pointer, dt));
            return;
        }

        integrator.step(particles, forces, &pointer, dt);
    }

    fn run_collision_pass(&mut self, pass: usize) -> SweepStats {
        let ranges = self.partition.pass(pass);
        let grid = &self.grid;
        let resolver = &self.resolver;
        let shared = SharedParticles::new(&mut self.particles);

        #[cfg(feature = "parallel")]
        if self.parallel_enabled {
            return self.pool.install(|| {
                ranges
                    .par_iter()
                    .map_init(Vec::new, |scratch, range| {
                        // SAFETY: ranges of one pass are same-named quadrants of disjoint
                        // leaf regions whose halos never overlap (see `RegionPartitioner`).
                        unsafe { resolver.resolve_range_shared(grid, *range, &shared, scratch) }
                    })
                    .reduce(SweepStats::default, SweepStats::merge)
            });
        }

        let mut scratch = Vec::new();
        ranges.iter().fold(SweepStats::default(), |stats, range| {
            // SAFETY: single-threaded; `shared` is the only access path to the particles.
            stats.merge(unsafe { resolver.resolve_range_shared(grid, *range, &shared, &mut scratch) })
        })
    }

    fn constrain(&mut self) {
        let _timer = PhaseTimer::new(&mut self.profiler.constrain_time);
        let _trace = ScopedTimer::new("constrain");

        let boundary = &self.boundary;
        let particles = &mut self.particles;

        #[cfg(feature = "parallel")]
        if self.parallel_enabled {
            self.pool.install(|| boundary.apply(particles));
            return;
        }

        boundary.apply(particles);
    }
}
