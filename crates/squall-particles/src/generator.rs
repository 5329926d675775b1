//! Weather particle generator backed by a shared sprite cell.

use std::cell::Cell;
use std::rc::Rc;

use rand::{Rng, rngs::SmallRng};

use crate::assets::Sprite;
use crate::engine::{ParticleGenerator, ParticleLook};

/// The sprite currently assigned to new particles, shared between the
/// [`WeatherView`](crate::WeatherView) (the only writer) and its generator.
pub type SharedSprite = Rc<Cell<Option<&'static Sprite>>>;

/// Generates raindrops or snowflakes depending on the shared sprite.
#[derive(Debug, Clone)]
pub struct WeatherParticleGenerator {
    current: SharedSprite,
}

impl WeatherParticleGenerator {
    pub fn new(current: SharedSprite) -> Self {
        Self { current }
    }
}

impl ParticleGenerator for WeatherParticleGenerator {
    fn generate(&mut self, rng: &mut SmallRng) -> Option<ParticleLook> {
        let sprite = self.current.get()?;
        Some(ParticleLook {
            sprite,
            variant: rng.gen_range(0..sprite.variants()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{SNOW_GLYPHS, assets};
    use rand::SeedableRng;

    #[test]
    fn test_follows_shared_sprite() {
        let current: SharedSprite = Rc::new(Cell::new(None));
        let mut generator = WeatherParticleGenerator::new(current.clone());
        let mut rng = SmallRng::seed_from_u64(3);

        assert!(generator.generate(&mut rng).is_none());

        current.set(Some(&assets().snow));
        let look = generator.generate(&mut rng).unwrap();
        assert!(std::ptr::eq(look.sprite, &assets().snow));
        assert!(look.variant < SNOW_GLYPHS.len());

        current.set(Some(&assets().rain));
        let look = generator.generate(&mut rng).unwrap();
        assert!(std::ptr::eq(look.sprite, &assets().rain));
        assert_eq!(look.variant, 0);
    }
}
