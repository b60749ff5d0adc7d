use crate::{core::config::SpringConfig, Result};

/// A scalar that eases towards its target.
///
/// `spring_to` follows an exponential ease-out curve that arrives exactly at
/// the target after `animation_time` seconds. `toss` releases the spring with
/// its recent velocity, which then decays under constant friction until it
/// stops after roughly `decay_time` seconds.
///
/// All times are in milliseconds and come from the caller, so the spring is
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    divisor: f64,
    current_value: f64,
    start_value: f64,
    target_value: f64,
    current_time: f64,
    start_time: f64,
    target_time: f64,
    velocity: f64,
    sliding: bool,
    /// Distance per ms² while sliding.
    friction: f64,
}

impl Spring {
    pub fn new(config: SpringConfig, now: f64) -> Result<Self> {
        config.validate()?;
        Ok(Self::unchecked(config, now))
    }

    pub fn with_defaults(now: f64) -> Self {
        Self::unchecked(SpringConfig::default(), now)
    }

    fn unchecked(config: SpringConfig, now: f64) -> Self {
        let value = config.initial_value;
        Self {
            divisor: 1.0 - (-config.stiffness).exp(),
            current_value: value,
            start_value: value,
            target_value: value,
            current_time: now,
            start_time: now,
            target_time: now,
            velocity: 0.0,
            sliding: false,
            friction: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    pub fn current(&self) -> f64 {
        self.current_value
    }

    pub fn target(&self) -> f64 {
        self.target_value
    }

    /// Running average of recent velocity, in units per ms
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn is_sliding(&self) -> bool {
        self.sliding
    }

    /// Eased progress for a linear fraction `x` in `[0, 1]`
    fn transform(&self, x: f64) -> f64 {
        (1.0 - (-x * self.config.stiffness).exp()) / self.divisor
    }

    /// Jumps straight to `target`, cancelling any transition
    pub fn reset_to(&mut self, target: f64) {
        self.sliding = false;
        self.current_value = target;
        self.target_value = target;
        self.target_time = self.current_time;
        self.start_value = target;
        self.start_time = self.current_time;
    }

    /// Starts an eased transition from the current value to `target`
    pub fn spring_to(&mut self, target: f64) {
        self.sliding = false;
        self.start_value = self.current_value;
        self.start_time = self.current_time;
        self.target_value = target;
        self.target_time = self.start_time + 1000.0 * self.config.animation_time;
    }

    /// Moves the whole transition, start and target alike
    pub fn shift_by(&mut self, delta: f64) {
        self.start_value += delta;
        self.target_value += delta;
    }

    /// Lets go with the current velocity
    pub fn toss(&mut self) {
        self.friction = (self.velocity / (1000.0 * self.config.decay_time)).abs();
        self.sliding = true;
    }

    /// Stops a toss
    pub fn grab(&mut self) {
        self.sliding = false;
    }

    /// Advances to `now`. Returns true while a toss is still sliding.
    pub fn update(&mut self, now: f64) -> bool {
        let last_time = self.current_time;
        let last_value = self.current_value;
        self.current_time = now;
        let elapsed = now - last_time;

        if self.sliding {
            if self.velocity > 0.0 {
                self.velocity = (self.velocity - self.friction * elapsed).max(0.0);
            } else if self.velocity < 0.0 {
                self.velocity = (self.velocity + self.friction * elapsed).min(0.0);
            }
            self.current_value += self.velocity * elapsed;
            self.target_value = self.current_value;

            if self.velocity == 0.0 {
                // come to rest where the slide ended
                self.sliding = false;
                self.start_value = self.current_value;
                self.start_time = now;
                self.target_time = now;
            }
        } else {
            self.current_value = if self.current_time >= self.target_time {
                self.target_value
            } else {
                let progress =
                    (self.current_time - self.start_time) / (self.target_time - self.start_time);
                self.start_value + (self.target_value - self.start_value) * self.transform(progress)
            };

            if elapsed != 0.0 {
                let weight = (-elapsed / self.config.velocity_half_life_ms).exp();
                self.velocity = weight * self.velocity
                    + (1.0 - weight) * (self.current_value - last_value) / elapsed;
            }
        }
        self.sliding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_to_arrives_exactly() {
        let mut spring = Spring::with_defaults(0.0);
        spring.spring_to(10.0);
        assert_eq!(spring.target(), 10.0);

        assert!(!spring.update(750.0));
        let halfway = spring.current();
        assert!(halfway > 5.0 && halfway < 10.0, "ease-out is ahead of linear: {}", halfway);

        spring.update(1500.0);
        assert_eq!(spring.current(), 10.0);
        spring.update(2000.0);
        assert_eq!(spring.current(), 10.0);
    }

    #[test]
    fn test_reset_to_is_immediate() {
        let mut spring = Spring::with_defaults(0.0);
        spring.reset_to(5.0);
        assert_eq!(spring.current(), 5.0);
        assert_eq!(spring.target(), 5.0);

        spring.spring_to(10.0);
        spring.update(100.0);
        spring.reset_to(3.0);
        assert_eq!(spring.current(), 3.0);
        spring.update(116.0);
        assert_eq!(spring.current(), 3.0);
        assert_eq!(spring.target(), 3.0);
    }

    #[test]
    fn test_shift_by_moves_target() {
        let mut spring = Spring::with_defaults(0.0);
        spring.spring_to(10.0);
        spring.shift_by(5.0);
        assert_eq!(spring.target(), 15.0);
        spring.update(1500.0);
        assert_eq!(spring.current(), 15.0);
    }

    #[test]
    fn test_toss_decelerates_to_rest() {
        let mut spring = Spring::with_defaults(0.0);
        spring.spring_to(100.0);
        let mut now = 0.0;
        for _ in 0..5 {
            now += 16.0;
            spring.update(now);
        }
        assert!(spring.velocity() > 0.0);

        spring.toss();
        let mut speeds = vec![spring.velocity().abs()];
        let mut frames = 0;
        loop {
            now += 16.0;
            let sliding = spring.update(now);
            speeds.push(spring.velocity().abs());
            frames += 1;
            assert_eq!(spring.current(), spring.target());
            if !sliding {
                break;
            }
            assert!(frames < 1000, "toss never came to rest");
        }
        assert_eq!(spring.velocity(), 0.0);
        assert!(speeds.windows(2).all(|pair| pair[1] < pair[0]));

        // at rest the spring stays put
        let rest = spring.current();
        assert!(!spring.update(now + 100.0));
        assert_eq!(spring.current(), rest);
    }

    #[test]
    fn test_grab_stops_slide() {
        let mut spring = Spring::with_defaults(0.0);
        spring.spring_to(100.0);
        spring.update(16.0);
        spring.toss();
        assert!(spring.is_sliding());
        spring.grab();
        assert!(!spring.update(32.0));
    }

    #[test]
    fn test_invalid_config() {
        let config = SpringConfig {
            stiffness: 0.0,
            ..SpringConfig::default()
        };
        assert!(Spring::new(config, 0.0).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn spring_to_lands_on_target(
                start in -1e6f64..1e6,
                target in -1e6f64..1e6,
                stiffness in 0.5f64..20.0,
                animation_time in 0.1f64..5.0,
            ) {
                let config = SpringConfig {
                    initial_value: start,
                    stiffness,
                    animation_time,
                    ..SpringConfig::default()
                };
                let mut spring = Spring::new(config, 0.0).unwrap();
                spring.spring_to(target);
                spring.update(1000.0 * animation_time);
                prop_assert_eq!(spring.current(), target);
            }

            #[test]
            fn eased_value_stays_between_endpoints(
                target in -1e3f64..1e3,
                fraction in 0.0f64..1.0,
            ) {
                let mut spring = Spring::with_defaults(0.0);
                spring.spring_to(target);
                spring.update(1500.0 * fraction);
                let (low, high) = if target < 0.0 { (target, 0.0) } else { (0.0, target) };
                prop_assert!(spring.current() >= low - 1e-9 && spring.current() <= high + 1e-9);
            }
        }
    }
}
