use std::collections::HashSet;

use proptest::prelude::*;

use one_second_left::consts::MIN_GAP_WIDTH;
use one_second_left::sim::{DifficultyCurve, ObstacleWall, Pool, PoolHandle, Poolable};

const EPS: f32 = 1e-4;

#[derive(Debug, Default)]
struct Slot {
    active: bool,
    resets: u32,
}

impl Poolable for Slot {
    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

proptest! {
    #[test]
    fn configured_gap_is_ordered_and_clamped(
        center in -20.0f32..20.0,
        width in -5.0f32..30.0,
        half in 0.5f32..10.0,
    ) {
        let mut wall = ObstacleWall::default();
        wall.configure(center, width, half, 7.0);

        prop_assert!(wall.gap_left() < wall.gap_right());
        let gap = wall.gap_width();
        prop_assert!(gap >= MIN_GAP_WIDTH - EPS, "gap {} too narrow", gap);
        prop_assert!(gap <= half * 2.0 + EPS, "gap {} wider than row", gap);
        prop_assert!(wall.gap_left() >= -half - EPS);
        prop_assert!(wall.gap_right() <= half + EPS);
    }

    #[test]
    fn oscillating_gap_stays_within_limits(
        center in -4.0f32..4.0,
        width in 0.9f32..4.0,
        amplitude in 0.0f32..5.0,
        frequency in 0.1f32..6.0,
        phase in 0.0f32..std::f32::consts::TAU,
        limit_lo in -6.0f32..0.0,
        limit_hi in 0.0f32..6.0,
    ) {
        let half = 6.0;
        let mut wall = ObstacleWall::default();
        wall.configure(center, width, half, 7.0);
        wall.set_oscillation(amplitude, frequency, phase, limit_lo, limit_hi);

        for _ in 0..240 {
            wall.simulate(1.0 / 60.0);
            let (lo, hi) = wall.center_limits();
            let c = wall.gap_center();
            prop_assert!(c >= lo - EPS && c <= hi + EPS, "center {} outside [{}, {}]", c, lo, hi);
            prop_assert!(wall.gap_left() > -half - EPS);
            prop_assert!(wall.gap_right() < half + EPS);
        }
    }

    #[test]
    fn pool_never_hands_out_an_owned_handle(
        capacity in 1usize..16,
        ops in prop::collection::vec(prop::option::of(0usize..32), 0..200),
    ) {
        let mut pool = Pool::new(capacity, |_| Slot::default());
        let mut active: Vec<PoolHandle> = Vec::new();

        for op in ops {
            match op {
                None => {
                    if let Some(handle) = pool.try_get() {
                        prop_assert!(!active.contains(&handle));
                        prop_assert!(!pool.is_available(handle));
                        prop_assert!(pool.get(handle).is_some_and(|s| s.active));
                        active.push(handle);
                    } else {
                        prop_assert_eq!(active.len(), pool.capacity());
                    }
                }
                Some(i) if !active.is_empty() => {
                    let handle = active.swap_remove(i % active.len());
                    prop_assert!(pool.release(handle));
                    prop_assert!(!pool.release(handle), "double release must be ignored");
                    prop_assert!(pool.is_available(handle));
                }
                Some(_) => {}
            }

            let unique: HashSet<_> = active.iter().copied().collect();
            prop_assert_eq!(unique.len(), active.len());
            prop_assert_eq!(pool.active_count(), active.len());
            prop_assert_eq!(pool.available_count() + active.len(), pool.capacity());
        }

        pool.release_all(&mut active);
        prop_assert!(active.is_empty());
        prop_assert_eq!(pool.available_count(), pool.capacity());
    }

    #[test]
    fn speed_progress_is_monotonic(t1 in 0.0f32..400.0, dt in 0.0f32..50.0) {
        let curve = DifficultyCurve::default();
        let t2 = t1 + dt;
        let p1 = curve.evaluate_speed_progress(t1);
        let p2 = curve.evaluate_speed_progress(t2);
        prop_assert!(p1 <= p2 + 1e-6, "progress dropped: {} at {} -> {} at {}", p1, t1, p2, t2);
        prop_assert!((0.0..=1.0).contains(&p1));
    }
}

#[test]
fn pool_capacity_three_fails_fourth_get() {
    let mut pool = Pool::new(3, |_| Slot::default());
    let handles: Vec<_> = (0..3).filter_map(|_| pool.try_get()).collect();
    assert_eq!(handles.len(), 3);
    assert!(pool.try_get().is_none());
}
