//! The particle field itself: topping up, advancing and culling the flames

use rand::rngs::StdRng;
use rand::SeedableRng as _;

use super::config::Config;
use super::particle::Particle;

/// The live particle field. It is the single owner of every particle: once a particle is culled
/// it is simply discarded, there's no pooling.
pub(crate) struct Simulation {
    /// All the live particles. Unordered, paint order has no effect on the final frame.
    pub particles: Vec<Particle>,
    /// Viewport width in pixels
    pub width: usize,
    /// Viewport height in pixels
    pub height: usize,
    /// The flame config
    pub config: Config,
    /// The random source used for spawning
    rng: StdRng,
}

impl Simulation {
    /// Instantiate
    pub fn new(width: usize, height: usize, config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            particles: Vec::new(),
            width,
            height,
            config,
            rng,
        }
    }

    /// Whether we have real viewport dimensions yet.
    pub const fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Seed the field in one burst so the first frame isn't empty.
    pub fn initial_burst(&mut self) {
        for _ in 0..self.config.initial_burst {
            let particle = self.spawn_one();
            self.particles.push(particle);
        }
    }

    /// Advance the field one tick: top up, then move every particle. Culling is a separate step
    /// so that a particle whose budget expires this tick still gets one final paint.
    pub fn tick(&mut self) {
        self.top_up();
        self.advance();
    }

    /// Keep the spawn extent in step with the viewport. Live particles are kept; anything now
    /// outside the new extent is simply not visible.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Spawn a small batch of new particles whenever the field is under its target density.
    /// From empty this ramps up to the ceiling over `max_particles / spawn_per_tick` ticks.
    fn top_up(&mut self) {
        if self.particles.len() >= self.config.max_particles {
            return;
        }
        for _ in 0..self.config.spawn_per_tick {
            let particle = self.spawn_one();
            self.particles.push(particle);
        }
    }

    /// Advance every live particle one tick. There's no inter-particle interaction, so the
    /// order doesn't matter.
    fn advance(&mut self) {
        for particle in &mut self.particles {
            particle.update();
        }
    }

    /// Drop every particle whose termination predicate now holds. Called after the draw step so
    /// a dying particle is painted on its death tick. `retain` builds the kept subset in place,
    /// so there's no index arithmetic to get wrong while removing mid-scan.
    pub fn cull(&mut self) {
        let min_visible_radius = self.config.min_visible_radius;
        self.particles
            .retain(|particle| !particle.is_dead(min_visible_radius));
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "Viewport dimensions are tiny compared to what f32 can represent"
    )]
    fn spawn_one(&mut self) -> Particle {
        Particle::spawn(
            &mut self.rng,
            self.width as f32,
            self.height as f32,
            &self.config,
        )
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng as _;

    use super::*;

    fn test_config() -> Config {
        Config {
            seed: Some(7),
            ..Config::default()
        }
    }

    /// A config whose minimum lifetime outlasts the ramp up to the ceiling, so no particle
    /// dies before the field is full.
    fn long_lived_config() -> Config {
        Config {
            lifetime: (200, 300),
            ..test_config()
        }
    }

    #[test]
    fn the_first_tick_spawns_exactly_one_batch() {
        let mut simulation = Simulation::new(100, 100, test_config());
        assert!(simulation.particles.is_empty());

        simulation.tick();
        assert_eq!(simulation.particles.len(), 2);
        for particle in &simulation.particles {
            // Spawned at age 0, advanced once within the same tick.
            assert_eq!(particle.age, 1);
        }
    }

    #[test]
    fn the_field_fills_to_the_ceiling_within_150_ticks() {
        let mut simulation = Simulation::new(100, 100, long_lived_config());
        for _ in 0..150 {
            simulation.tick();
            simulation.cull();
        }
        assert_eq!(simulation.particles.len(), 300);
    }

    #[test]
    fn the_ceiling_is_never_exceeded_by_more_than_a_batch() {
        let mut simulation = Simulation::new(100, 100, test_config());
        let bound = simulation.config.max_particles + simulation.config.spawn_per_tick;
        for _ in 0..2000 {
            simulation.tick();
            assert!(simulation.particles.len() <= bound);
            simulation.cull();
        }
    }

    #[test]
    fn ages_increase_by_exactly_one_per_tick() {
        let mut simulation = Simulation::new(100, 100, long_lived_config());
        simulation.tick();
        let ages: Vec<u32> = simulation.particles.iter().map(|p| p.age).collect();

        simulation.tick();
        for (particle, old_age) in simulation.particles.iter().zip(&ages) {
            assert_eq!(particle.age, old_age + 1);
        }
    }

    #[test]
    fn a_particle_outlives_its_budget_by_at_most_one_tick() {
        let config = Config {
            // Disable spawning so the hand-made particle is the only one in the field.
            spawn_per_tick: 0,
            initial_burst: 0,
            ..test_config()
        };
        let mut simulation = Simulation::new(100, 100, config);

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut particle = Particle::spawn(&mut rng, 100.0, 100.0, &simulation.config);
        particle.max_age = 50;
        simulation.particles.push(particle);

        for tick in 1..=50 {
            simulation.tick();
            simulation.cull();
            assert_eq!(simulation.particles.len(), 1, "still alive at tick {tick}");
        }
        assert_eq!(simulation.particles[0].age, 50);

        // Tick 51: age becomes 51, which is past the budget. The particle is still in the field
        // for its final paint, then the cull step removes it.
        simulation.tick();
        assert_eq!(simulation.particles.len(), 1);
        simulation.cull();
        assert!(simulation.particles.is_empty());
    }

    #[test]
    fn a_dying_particle_gets_one_final_paint() {
        let config = Config {
            spawn_per_tick: 0,
            initial_burst: 0,
            ..test_config()
        };
        let mut simulation = Simulation::new(100, 100, config);
        simulation.particles.push(Particle {
            position: glam::Vec2::new(5.0, 5.0),
            velocity: glam::Vec2::ZERO,
            age: 0,
            max_age: 3,
            radius: 1.5,
            colour: (1.0, 0.0, 0.0, 1.0),
        });

        for _ in 0..4 {
            simulation.tick();
        }
        assert!(simulation.particles[0].age > simulation.particles[0].max_age);

        // The death-tick frame: the particle is drawn, then culled.
        let mut surface = crate::surface::Surface::new("test".into(), 100, 100, -5);
        for particle in &simulation.particles {
            particle.draw(&mut surface).unwrap();
        }
        simulation.cull();

        assert_eq!(surface.pixel(5, 5), Some((1.0, 0.0, 0.0, 1.0)));
        assert!(simulation.particles.is_empty());
    }

    #[test]
    fn the_initial_burst_seeds_the_field() {
        let mut simulation = Simulation::new(100, 100, test_config());
        simulation.initial_burst();
        assert_eq!(simulation.particles.len(), 100);
        for particle in &simulation.particles {
            assert_eq!(particle.age, 0);
        }
    }

    #[test]
    fn after_a_resize_new_spawns_fit_the_new_extent() {
        let mut simulation = Simulation::new(100, 100, test_config());
        simulation.tick();

        simulation.set_size(10, 20);
        let already_alive = simulation.particles.len();
        simulation.tick();

        // The spawns have been advanced once already, so subtract one tick of travel to get
        // back to the spawn position itself.
        for particle in simulation.particles.iter().skip(already_alive) {
            let spawn_x = particle.position.x - particle.velocity.x;
            assert!(spawn_x >= 0.0 && spawn_x < 10.0);
            assert!(particle.position.y - particle.velocity.y >= 20.0);
        }
    }

    #[test]
    fn seeded_fields_are_reproducible() {
        let mut first = Simulation::new(100, 100, test_config());
        let mut second = Simulation::new(100, 100, test_config());
        for _ in 0..10 {
            first.tick();
            second.tick();
        }
        assert_eq!(first.particles, second.particles);
    }
}
