//! Pixel size to integer module scale conversion

/// Default upper bound for the per-module scale
pub const DEFAULT_MAX_SCALE: u32 = 100;

/// Resolved per-module scale, always at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleResolution {
    /// Pixels per module along each axis
    pub per_module_scale: u32,
}

/// Largest integer scale whose output does not exceed `target_pixels`.
///
/// Floors `target_pixels / unscaled_width`, then clamps into `1..=max_scale`,
/// so a request smaller than the symbol still renders at one pixel per module.
pub fn resolve_scale(target_pixels: u32, unscaled_width: u32, max_scale: u32) -> ScaleResolution {
    let floor = target_pixels / unscaled_width.max(1);
    ScaleResolution {
        per_module_scale: floor.min(max_scale.max(1)).max(1),
    }
}
