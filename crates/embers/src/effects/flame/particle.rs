//! A single mote of flame

use color_eyre::eyre::Result;
use glam::Vec2;
use rand::Rng;

use crate::surface::Colour;

use super::config::Config;

/// The multiplier applied to a particle's radius every tick. Currently the identity, so
/// particles only ever die of old age; the intended fade-out rate was never settled.
pub const RADIUS_DECAY: f32 = 1.0;

/// The colour used if the user configures an empty palette.
const FALLBACK_COLOUR: Colour = (1.0, 0.84, 0.0, 0.6);

/// A single mote of flame
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Particle {
    /// Position in pixels. Origin top-left, y increasing downward.
    pub position: Vec2,
    /// Velocity in pixels per tick. Constant for the particle's lifetime.
    pub velocity: Vec2,
    /// Ticks since spawn
    pub age: u32,
    /// The lifetime budget, in ticks
    pub max_age: u32,
    /// Draw radius in pixels
    pub radius: f32,
    /// The translucent draw colour
    pub colour: Colour,
}

impl Particle {
    /// Spawn a new particle just below the bottom edge of the viewport, drifting sideways and
    /// travelling upwards. The random source is passed in so that tests can seed it.
    pub fn spawn(rng: &mut impl Rng, width: f32, height: f32, config: &Config) -> Self {
        let position = Vec2::new(
            rng.gen_range(0.0..width),
            rng.gen_range(height..height + config.spawn_depth),
        );
        let velocity = Vec2::new(
            rng.gen_range(-config.horizontal_drift..config.horizontal_drift),
            -rng.gen_range(config.rise_speed.0..config.rise_speed.1),
        );
        let max_age = rng.gen_range(config.lifetime.0..config.lifetime.1);
        let radius = rng.gen_range(config.radius.0..config.radius.1);

        let colour = if config.palette.is_empty() {
            FALLBACK_COLOUR
        } else {
            config.palette[rng.gen_range(0..config.palette.len())]
        };

        Self {
            position,
            velocity,
            age: 0,
            max_age,
            radius,
            colour,
        }
    }

    /// Advance the particle one tick: simple Euler integration, no acceleration, no collision,
    /// no boundary reflection.
    pub fn update(&mut self) {
        self.position += self.velocity;
        self.age = self.age.saturating_add(1);
        self.radius *= RADIUS_DECAY;
    }

    /// Whether the particle has outlived its budget or faded from view.
    #[must_use]
    pub fn is_dead(&self, min_visible_radius: f32) -> bool {
        self.age > self.max_age || self.radius < min_visible_radius
    }

    /// Paint the particle onto the frame's surface. Pure side effect, no state mutation.
    pub fn draw(&self, surface: &mut crate::surface::Surface) -> Result<()> {
        surface.fill_circle(self.position, self.radius, self.colour)
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng as _;

    use super::*;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn spawns_stay_within_their_configured_ranges() {
        let config = Config::default();
        let mut rng = seeded_rng();
        let (width, height) = (120.0, 80.0);

        for _ in 0..1000 {
            let particle = Particle::spawn(&mut rng, width, height, &config);

            assert!(particle.position.x >= 0.0 && particle.position.x < width);
            assert!(
                particle.position.y >= height
                    && particle.position.y < height + config.spawn_depth,
                "particles must spawn below the fold"
            );

            assert!(particle.velocity.x >= -config.horizontal_drift);
            assert!(particle.velocity.x < config.horizontal_drift);
            assert!(
                particle.velocity.y < 0.0,
                "vertical velocity must be strictly upward"
            );
            assert!(particle.velocity.y >= -config.rise_speed.1);

            assert!(particle.max_age >= config.lifetime.0);
            assert!(particle.max_age < config.lifetime.1);
            assert!(particle.radius >= config.radius.0 && particle.radius < config.radius.1);

            assert_eq!(particle.age, 0);
            assert!(config.palette.contains(&particle.colour));
        }
    }

    #[test]
    fn the_same_seed_spawns_the_same_particle() {
        let config = Config::default();
        let first = Particle::spawn(&mut seeded_rng(), 100.0, 100.0, &config);
        let second = Particle::spawn(&mut seeded_rng(), 100.0, 100.0, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn updates_are_euler_integration() {
        let config = Config::default();
        let mut particle = Particle::spawn(&mut seeded_rng(), 100.0, 100.0, &config);
        let start = particle.position;
        let velocity = particle.velocity;

        particle.update();
        assert_eq!(particle.position, start + velocity);
        assert_eq!(particle.age, 1);
        assert_eq!(particle.velocity, velocity);

        particle.update();
        assert_eq!(particle.position, start + velocity * 2.0);
        assert_eq!(particle.age, 2);
    }

    #[test]
    fn radius_decay_is_currently_a_noop() {
        let config = Config::default();
        let mut particle = Particle::spawn(&mut seeded_rng(), 100.0, 100.0, &config);
        let radius = particle.radius;
        for _ in 0..1000 {
            particle.update();
        }
        assert_eq!(particle.radius, radius);
        // So in practice only old age ever kills a particle.
        assert!(particle.is_dead(config.min_visible_radius));
        assert!(particle.age > particle.max_age);
    }

    #[test]
    fn the_termination_predicate() {
        let config = Config::default();
        let mut particle = Particle::spawn(&mut seeded_rng(), 100.0, 100.0, &config);

        particle.age = particle.max_age;
        assert!(!particle.is_dead(config.min_visible_radius));
        particle.age += 1;
        assert!(particle.is_dead(config.min_visible_radius));

        // A particle below the visibility threshold is dead no matter its age.
        particle.age = 0;
        particle.radius = config.min_visible_radius / 2.0;
        assert!(particle.is_dead(config.min_visible_radius));
    }
}
