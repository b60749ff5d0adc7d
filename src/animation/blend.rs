//! Blend-in and fade-out curves for tiles and levels.
//!
//! Both are linear in time, but snap to their end state when the frame rate
//! drops so far that a visible animation would only look like stutter.

/// Opacity of a tile that started blending in at `start`.
///
/// `last_frame` is the time of the previous frame; a gap longer than
/// `slow_frame_ms` since then completes the blend immediately.
pub fn blend_in_progress(now: f64, start: f64, last_frame: f64, blend_time_ms: f64, slow_frame_ms: f64) -> f32 {
    if blend_time_ms <= 0.0 {
        return 1.0;
    }
    let progress = (now - start) / blend_time_ms;
    if progress >= 1.0 || now - last_frame > slow_frame_ms {
        return 1.0;
    }
    progress.max(0.0) as f32
}

/// Opacity of a level that started fading out at `start`
pub fn fade_out_progress(now: f64, start: f64, last_frame: f64, fade_time_ms: f64, slow_frame_ms: f64) -> f32 {
    if fade_time_ms <= 0.0 || now - last_frame > slow_frame_ms {
        return 0.0;
    }
    (1.0 - (now - start) / fade_time_ms).clamp(0.0, 1.0) as f32
}
