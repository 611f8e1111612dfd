use glam::{Quat, Vec2, Vec3};

/// Values that can be blended linearly toward a target.
pub trait Blend: Copy + Sized {
    fn blend(start: Self, end: Self, t: f32) -> Self;
}

impl Blend for f32 {
    fn blend(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Blend for Vec2 {
    fn blend(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Blend for Vec3 {
    fn blend(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Blend for Quat {
    fn blend(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t)
    }
}

/// One exponential smoothing step: moves `current` a fraction `alpha` of
/// the way to `target` and returns the new value.
///
/// With a constant target the error shrinks by `1 - alpha` per call.
#[inline]
pub fn approach<T: Blend>(current: &mut T, target: T, alpha: f32) -> T {
    *current = T::blend(*current, target, alpha);
    *current
}
