use cgmath::prelude::*;
use cgmath::{Vector2, vec2};
use proptest::prelude::*;

use flurry::random::seeded;
use flurry::{Bounds, Fade, FieldAttraction, Integrator, Particle, ParticlePool, SelfPropelled};

fn still(birth_time: f32) -> Particle<Vector2<f32>> {
    Particle {
        position: vec2(0.0, 0.0),
        velocity: vec2(0.0, 0.0),
        birth_time,
    }
}

proptest! {
    #[test]
    fn cursor_visits_slots_in_order(capacity in 1usize..64, spawns in 0usize..300) {
        let mut pool = ParticlePool::new(capacity);
        for i in 0..spawns {
            let slot = pool.spawn(still(i as f32));
            prop_assert_eq!(slot, i % capacity);
        }
        prop_assert_eq!(pool.cursor(), spawns % capacity);
        prop_assert_eq!(pool.len(), spawns.min(capacity));

        let births: Vec<f32> = pool.oldest_first().map(|p| p.birth_time).collect();
        let first = spawns.saturating_sub(capacity);
        let expected: Vec<f32> = (first..spawns).map(|i| i as f32).collect();
        prop_assert_eq!(births, expected);
    }

    #[test]
    fn alpha_never_increases_with_time(
        lifetime in 0.1f32..20.0,
        scale in 0.01f32..1.0,
        birth in -100.0f32..100.0,
        t1 in 0.0f32..50.0,
        gap in 0.0f32..50.0,
    ) {
        let fade = Fade { lifetime, scale };
        let p = still(birth);
        let early = fade.alpha(&p, birth + t1);
        let late = fade.alpha(&p, birth + t1 + gap);
        prop_assert!(late <= early);
        prop_assert!((0.0..=scale).contains(&late));
        prop_assert_eq!(fade.alpha(&p, birth), scale);
    }

    #[test]
    fn field_acceleration_is_bounded(
        x in -500.0f32..500.0,
        y in -500.0f32..500.0,
        gravity_constant in 1.0f32..1.0e6,
        softening_squared in 1.0f32..1.0e4,
    ) {
        let field = FieldAttraction { gravity_constant, softening_squared };
        let a = field.acceleration(vec2(x, y), &[vec2(0.0, 0.0)]);
        let bound = gravity_constant / softening_squared.powf(1.5);
        prop_assert!(a.x.is_finite() && a.y.is_finite());
        prop_assert!(a.magnitude() <= bound * (1.0 + 1e-4));
    }

    #[test]
    fn walkers_stay_capped_and_inside(
        seed in any::<u64>(),
        vx in -500.0f32..500.0,
        vy in -500.0f32..500.0,
        px in 0.0f32..100.0,
        py in 0.0f32..60.0,
        dt in 0.001f32..0.2,
    ) {
        let bounds = Bounds::new(vec2(0.0f32, 0.0), vec2(100.0, 60.0));
        let integrator = Integrator::new(0.97, SelfPropelled {
            perturbation: 40.0,
            max_speed: 120.0,
            bounds,
        });
        let mut pool = ParticlePool::new(8);
        for _ in 0..8 {
            pool.spawn(Particle {
                position: vec2(px, py),
                velocity: vec2(vx, vy),
                birth_time: 0.0,
            });
        }
        let mut rng = seeded(seed);
        for _ in 0..50 {
            integrator.step(&mut pool, &[], dt, &mut rng);
            for p in pool.iter() {
                prop_assert!(p.velocity.magnitude() <= 120.0 + 1e-3);
                prop_assert!(bounds.contains(p.position));
            }
        }
    }
}
