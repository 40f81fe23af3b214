use kinema::vec::Vec as _;
use kinema::{HumanoidPart, NoOpStepObserver, Ragdoll, RagdollConfig, TracingStepObserver, Vec2};

const EPS: f32 = 1e-4;

#[test]
fn settled_humanoid_stays_above_ground() {
    let mut doll = Ragdoll::humanoid(Vec2::new(0.0, 1.5), RagdollConfig::new()).unwrap();
    doll.apply_impulse(HumanoidPart::Torso.index(), Vec2::new(20.0, 0.0));
    doll.apply_impulse(HumanoidPart::Head.index(), Vec2::new(3.0, 2.0));

    for _ in 0..600 {
        doll.step(1.0 / 60.0, Vec2::zero(), &mut NoOpStepObserver);
        for p in doll.parts() {
            assert!(p.lower_extent() >= -EPS, "part below ground: {:?}", p);
        }
    }
    for p in doll.parts() {
        assert!(p.position.is_finite() && p.angle.is_finite());
    }
    assert!(doll.max_joint_error() < 0.1, "joints pulled apart: {}", doll.max_joint_error());
}

#[test]
fn raised_ground_is_respected() {
    let config = RagdollConfig::new().with_ground(-2.0).with_iterations(8);
    let mut doll = Ragdoll::humanoid(Vec2::new(3.0, 0.0), config).unwrap();
    for _ in 0..300 {
        doll.step(1.0 / 60.0, Vec2::zero(), &mut NoOpStepObserver);
    }
    for p in doll.parts() {
        assert!(p.lower_extent() >= -2.0 - EPS);
    }
    let lowest = doll.parts().iter().map(|p| p.lower_extent()).fold(f32::MAX, f32::min);
    assert!(lowest < -2.0 + 0.05, "doll should be resting on the ground, lowest {}", lowest);
}

#[test]
fn friction_brings_a_sliding_doll_to_rest() {
    let mut doll = Ragdoll::<f32>::humanoid(Vec2::new(0.0, 1.05), RagdollConfig::new()).unwrap();
    for i in 0..doll.parts().len() {
        doll.apply_impulse(i, Vec2::new(10.0, 0.0));
    }
    for _ in 0..600 {
        doll.step(1.0 / 60.0, Vec2::zero(), &mut NoOpStepObserver);
    }
    let speed = doll.parts().iter().map(|p| p.velocity.x.abs()).fold(0.0, f32::max);
    assert!(speed < 0.5, "still sliding at {}", speed);
}

#[test]
fn step_reports_each_relaxation_pass() {
    let mut doll = Ragdoll::humanoid(Vec2::new(0.0, 3.0), RagdollConfig::new()).unwrap();
    let mut observer = TracingStepObserver::new();
    for _ in 0..3 {
        doll.step(1.0 / 60.0, Vec2::zero(), &mut observer);
    }
    assert_eq!(observer.steps(), 3);
    assert_eq!(observer.iterations(), 15);
}
