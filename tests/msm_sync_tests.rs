use glam::{Quat, Vec3};
use msmrd_core::markov::TimeKind;
use msmrd_core::particle::BodyType;
use msmrd_core::propagate::{langevin::ForceTorque, msm_switch::resync_msm};
use msmrd_core::{MarkovModel, Particle, SeededRng};

// a particle with lagtime=0.03 and dt=0.01 never
// advances its MSM state within a single step; after three steps it
// advances exactly once and its diffusion constant matches the new state.
#[test]
fn lagtime_resync_fires_exactly_once_after_three_matching_steps() {
    let msm = MarkovModel::new(
        0,
        1.0,
        vec![vec![-1.0, 1.0], vec![1.0, -1.0]],
        vec![1.0, 9.0],
        vec![1.0, 9.0],
        1,
        TimeKind::Continuous,
    )
    .unwrap();
    let mut p = Particle::new(Vec3::ZERO, Quat::IDENTITY, 1.0, 1.0, BodyType::Point);
    p.lagtime = 0.03;
    p.propagate_tmsm = false;
    p.msm_state = 1;
    let initial_d = p.d_trans;
    let mut rng = SeededRng::new(99);

    resync_msm(&mut p, 0.01, &msm, 1.0, &mut rng, |_| ForceTorque::default());
    assert!((p.lagtime - 0.02).abs() < 1e-9, "after step 1: lagtime={}", p.lagtime);
    assert_eq!(p.d_trans, initial_d, "D must not change before lagtime is exhausted");

    resync_msm(&mut p, 0.01, &msm, 1.0, &mut rng, |_| ForceTorque::default());
    assert!((p.lagtime - 0.01).abs() < 1e-9, "after step 2: lagtime={}", p.lagtime);
    assert_eq!(p.d_trans, initial_d);

    resync_msm(&mut p, 0.01, &msm, 1.0, &mut rng, |_| ForceTorque::default());
    assert!(p.lagtime.abs() < 1e-9, "after step 3: lagtime={}", p.lagtime);
    assert!(p.propagate_tmsm, "lagtime exhausted exactly on the step boundary, so the state resync is deferred to the next call");
    assert_eq!(p.d_trans, initial_d, "D has not propagated yet after exactly three steps");

    // the deferred resync fires at the start of the fourth call.
    resync_msm(&mut p, 0.01, &msm, 1.0, &mut rng, |_| ForceTorque::default());
    assert!(p.d_trans == 1.0 || p.d_trans == 9.0, "state must have propagated to a valid D");
}
