use log::info;
use std::time::{Duration, Instant};

/// Per-phase timing and counters accumulated across ticks.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickProfiler {
    pub integrate_time: Duration,
    pub grid_time: Duration,
    pub collision_time: Duration,
    pub constrain_time: Duration,
    pub total_time: Duration,

    pub ticks: u64,
    pub particle_count: usize,
    pub pairs_tested: usize,
    pub contacts_resolved: usize,
    pub dropped_entries: usize,
}

impl TickProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) {
        let total_us = self.total_time.as_micros() as f32;
        if total_us < 1.0 || self.ticks == 0 {
            return;
        }

        let share = |d: Duration| (d.as_micros() as f32 / total_us) * 100.0;
        let ms = |d: Duration| d.as_secs_f32() * 1000.0;

        info!(
            "Ticks: {}, Particles: {}, Pair tests: {}, Contacts: {}, Dropped: {}",
            self.ticks,
            self.particle_count,
            self.pairs_tested,
            self.contacts_resolved,
            self.dropped_entries
        );
        info!(
            "Total: {:.2} ms ({:.3} ms/tick)",
            ms(self.total_time),
            ms(self.total_time) / self.ticks as f32
        );
        info!(
            "  Integrate: {:.2} ms ({:.1}%)",
            ms(self.integrate_time),
            share(self.integrate_time)
        );
        info!(
            "  Grid:      {:.2} ms ({:.1}%)",
            ms(self.grid_time),
            share(self.grid_time)
        );
        info!(
            "  Collide:   {:.2} ms ({:.1}%)",
            ms(self.collision_time),
            share(self.collision_time)
        );
        info!(
            "  Constrain: {:.2} ms ({:.1}%)",
            ms(self.constrain_time),
            share(self.constrain_time)
        );
    }
}

/// Adds the elapsed time of a scope to a profiler field.
pub struct PhaseTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
