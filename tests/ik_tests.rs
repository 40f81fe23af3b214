use kinema::vec::Vec as _;
use kinema::{IkChain, IkConfig, IkSegment, IkStatus, NoOpStepObserver, PhysicsError, TracingStepObserver, Vec2};

fn arm() -> IkChain<f64> {
    IkChain::new(Vec2::new(0.0, 0.0), &[IkSegment::new(10.0); 3]).unwrap()
}

#[test]
fn reachable_target_is_reached_within_tolerance() {
    let config = IkConfig::default();
    for target in [Vec2::new(9.0, 12.0), Vec2::new(0.0, 15.0)] {
        let mut chain = arm();
        let report = chain.solve(target, &config, &mut NoOpStepObserver);
        assert_eq!(report.status, IkStatus::Reached, "target {:?}", target);
        assert!(report.iterations <= config.max_iterations);
        assert!(chain.end_effector().distance(target) <= config.tolerance);
        assert!((report.error - chain.end_effector().distance(target)).abs() < 1e-12);
    }
}

#[test]
fn unreachable_target_fully_extends_toward_it() {
    let mut chain = arm();
    let report = chain.solve(Vec2::new(100.0, 0.0), &IkConfig::default(), &mut NoOpStepObserver);
    assert_eq!(report.status, IkStatus::Unreachable);
    assert_eq!(report.iterations, 0);
    let end = chain.end_effector();
    assert!((end.x - 30.0).abs() < 1e-9 && end.y.abs() < 1e-9, "{:?}", end);
    assert!((report.error - 70.0).abs() < 1e-9);
}

#[test]
fn unreachable_diagonal_target() {
    let mut chain = arm();
    chain.solve(Vec2::new(60.0, 80.0), &IkConfig::default(), &mut NoOpStepObserver);
    let end = chain.end_effector();
    assert!((end.x - 18.0).abs() < 1e-9);
    assert!((end.y - 24.0).abs() < 1e-9);
}

#[test]
fn zero_width_limit_locks_a_joint_straight() {
    let segments = [
        IkSegment::new(10.0),
        IkSegment::new(10.0).with_limits(0.0, 0.0),
        IkSegment::new(10.0),
    ];
    for target in [Vec2::new(9.0, 12.0), Vec2::new(0.0, 100.0), Vec2::new(-5.0, 5.0)] {
        let mut chain = IkChain::<f64>::new(Vec2::new(0.0, 0.0), &segments).unwrap();
        chain.solve(target, &IkConfig::default(), &mut NoOpStepObserver);
        assert!(chain.relative_angle(1).abs() < 1e-6, "target {:?}: {}", target, chain.relative_angle(1));
    }
}

#[test]
fn limits_hold_when_the_target_cannot_be_reached_within_them() {
    let segments = [IkSegment::new(10.0).with_limits(-0.5, 0.5); 3];
    let mut chain = IkChain::new(Vec2::new(0.0, 0.0), &segments).unwrap();
    let report = chain.solve(Vec2::new(0.0, 20.0), &IkConfig::default(), &mut NoOpStepObserver);
    assert_eq!(report.status, IkStatus::Approximate);
    assert_eq!(report.iterations, 10);
    for k in 0..3 {
        let rel = chain.relative_angle(k);
        assert!((-0.5 - 1e-9..=0.5 + 1e-9).contains(&rel), "bone {} at {}", k, rel);
    }
}

#[test]
fn moving_the_base_moves_the_solution() {
    let mut chain = arm();
    chain.set_base(Vec2::new(5.0, 5.0)).unwrap();
    let mut observer = TracingStepObserver::new();
    let report = chain.solve(Vec2::new(14.0, 17.0), &IkConfig::default(), &mut observer);
    assert_eq!(report.status, IkStatus::Reached);
    assert_eq!(chain.joints()[0].position(), Vec2::new(5.0, 5.0));
    assert_eq!(observer.iterations(), report.iterations as u64);
    assert_eq!(observer.steps(), 1);
}

#[test]
fn every_direction_at_half_reach_is_reached() {
    let config = IkConfig::default();
    for degrees in 0..360 {
        let heading = (degrees as f64).to_radians();
        let target = Vec2::new(15.0 * heading.cos(), 15.0 * heading.sin());
        let mut chain = arm();
        let report = chain.solve(target, &config, &mut NoOpStepObserver);
        assert_eq!(report.status, IkStatus::Reached, "{} degrees: {:?}", degrees, report);
        assert!(chain.end_effector().distance(target) <= config.tolerance);
    }
}

#[test]
fn straight_chain_bends_toward_a_target_on_its_own_line() {
    for target in [Vec2::new(15.0, 0.0), Vec2::new(-15.0, 0.0), Vec2::new(5.0, 0.0)] {
        let mut chain = arm();
        let report = chain.solve(target, &IkConfig::default(), &mut NoOpStepObserver);
        assert_eq!(report.status, IkStatus::Reached, "target {:?}: {:?}", target, report);
        let p = chain.positions();
        for k in 0..3 {
            assert!((p[k].distance(p[k + 1]) - 10.0).abs() < 1e-9);
        }
    }
}

#[test]
fn straight_chain_keeps_locked_joints_straight_while_bending() {
    let segments = [
        IkSegment::new(10.0),
        IkSegment::new(10.0).with_limits(0.0, 0.0),
        IkSegment::new(10.0),
    ];
    let mut chain = IkChain::<f64>::new(Vec2::new(0.0, 0.0), &segments).unwrap();
    chain.solve(Vec2::new(20.0, 0.0), &IkConfig::default(), &mut NoOpStepObserver);
    assert!(chain.relative_angle(1).abs() < 1e-6);
    assert!(chain.end_effector().distance(Vec2::new(20.0, 0.0)) < 1.0);
}

#[test]
fn non_finite_base_is_rejected() {
    let mut chain = arm();
    assert_eq!(chain.set_base(Vec2::new(f64::NAN, 0.0)), Err(PhysicsError::InvalidParameter("base")));
    assert_eq!(chain.set_base_angle(f64::INFINITY), Err(PhysicsError::InvalidParameter("base_angle")));
    assert_eq!(chain.base(), Vec2::new(0.0, 0.0));
    let report = chain.solve(Vec2::new(9.0, 12.0), &IkConfig::default(), &mut NoOpStepObserver);
    assert_eq!(report.status, IkStatus::Reached);
    assert!(chain.positions().iter().all(|p| p.is_finite()));
}

#[test]
fn tighter_tolerance_needs_more_iterations() {
    let target = Vec2::new(12.0, 9.0);
    // Start both from the same bent pose so the passes do the work.
    let mut loose = arm();
    let mut tight = arm();
    loose.solve(Vec2::new(0.0, 15.0), &IkConfig::default(), &mut NoOpStepObserver);
    tight.solve(Vec2::new(0.0, 15.0), &IkConfig::default(), &mut NoOpStepObserver);
    let a = loose.solve(target, &IkConfig::default(), &mut NoOpStepObserver);
    let b = tight.solve(
        target,
        &IkConfig::default().with_tolerance(1e-6).with_max_iterations(100),
        &mut NoOpStepObserver,
    );
    assert_eq!(b.status, IkStatus::Reached);
    assert!(b.iterations > a.iterations);
}
