use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic pseudo-random point in [-1, 1]^2 derived from an entity id.
/// Used for initial node placement so rebuilds reproduce the same layout.
pub(crate) fn stable_jitter(id: u64) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_jitter_is_deterministic_and_bounded() {
        for id in [0u64, 1, 7, 42, u64::MAX] {
            let (x1, y1) = stable_jitter(id);
            let (x2, y2) = stable_jitter(id);
            assert_eq!((x1, y1), (x2, y2));
            assert!((-1.0..=1.0).contains(&x1));
            assert!((-1.0..=1.0).contains(&y1));
        }
    }
}
