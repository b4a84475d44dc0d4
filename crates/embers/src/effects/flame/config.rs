//! All the variables that can be configured for the flame effect

use color_eyre::eyre::{bail, Result};

use crate::surface::Colour;

/// All the config for the flame effect
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// The soft ceiling on simultaneously live particles
    pub max_particles: usize,
    /// How many new particles to spawn per frame whilst under the ceiling
    pub spawn_per_tick: usize,
    /// How many particles to seed the field with before the first frame
    pub initial_burst: usize,
    /// How far below the bottom edge a particle may first appear, in pixels. Spawning below the
    /// fold hides the "pop" of a particle appearing from nothing.
    pub spawn_depth: f32,
    /// Horizontal drift is picked per particle from `[-horizontal_drift, horizontal_drift)`
    pub horizontal_drift: f32,
    /// Upward speed is picked per particle from this range, in pixels per frame. Applied
    /// negatively, so every particle is guaranteed net upward travel.
    pub rise_speed: (f32, f32),
    /// Lifetime budgets are picked per particle from this range, in frames
    pub lifetime: (u32, u32),
    /// Radii are picked per particle from this range, in pixels
    pub radius: (f32, f32),
    /// Particles smaller than this are considered invisible and culled
    pub min_visible_radius: f32,
    /// The translucent colours that spawning particles pick from
    pub palette: Vec<Colour>,
    /// Seed for the particle field's random source. `None` means a fresh seed every run.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_particles: 300,
            spawn_per_tick: 2,
            initial_burst: 100,
            spawn_depth: 100.0,
            horizontal_drift: 1.0,
            rise_speed: (1.0, 3.0),
            lifetime: (50, 150),
            radius: (1.0, 2.0),
            min_visible_radius: 0.1,
            // Bright red, bright orange and gold.
            palette: vec![
                (1.0, 0.27, 0.27, 0.8),
                (1.0, 0.55, 0.0, 0.8),
                (1.0, 0.84, 0.0, 0.6),
            ],
            seed: None,
        }
    }
}

impl Config {
    /// Reject values that can't drive the simulation. Every range here is sampled per spawn, and
    /// sampling an empty range panics, so bad values must be caught when the config is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.horizontal_drift <= 0.0 {
            bail!("`horizontal_drift` must be greater than zero");
        }
        if self.spawn_depth <= 0.0 {
            bail!("`spawn_depth` must be greater than zero");
        }
        if self.rise_speed.0 <= 0.0 {
            bail!("`rise_speed` must be positive, it is applied as upward travel");
        }
        if self.rise_speed.0 >= self.rise_speed.1 {
            bail!("`rise_speed` must be a low-to-high range");
        }
        if self.lifetime.0 >= self.lifetime.1 {
            bail!("`lifetime` must be a low-to-high range");
        }
        if self.radius.0 >= self.radius.1 {
            bail!("`radius` must be a low-to-high range");
        }

        Ok(())
    }
}
