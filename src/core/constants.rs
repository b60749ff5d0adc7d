//! Engine-wide defaults carried over from the classic deep zoom viewer.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Smallest number of entries a tile cache may hold.
pub const MIN_CACHE_CAPACITY: usize = 2;

/// Default number of resident tile views.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Time, in ms, to blend a freshly loaded tile in.
pub const DEFAULT_BLEND_TIME_MS: f64 = 500.0;

/// Time, in ms, to fade a level out during zoom-out.
pub const DEFAULT_FADE_TIME_MS: f64 = 500.0;

/// Fixed-interval fallback when no animation-frame callback is available.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 16;

/// A frame gap longer than this (under ~15fps) snaps blends and fades to their end.
pub const SLOW_FRAME_MS: f64 = 67.0;

/// Default spring stiffness.
pub const DEFAULT_STIFFNESS: f64 = 5.0;

/// Default spring animation time, in seconds.
pub const DEFAULT_ANIMATION_TIME: f64 = 1.5;

/// Default time, in seconds, for a tossed spring to come to rest.
pub const DEFAULT_DECAY_TIME: f64 = 1.0;

/// Half-life-ish weighting window, in ms, for the spring's running velocity.
pub const VELOCITY_HALF_LIFE_MS: f64 = 40.0;

/// Number of fractional digits used for percentage styles.
pub const STYLE_PRECISION: usize = 8;
