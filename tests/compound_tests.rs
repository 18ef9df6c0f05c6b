use glam::{Quat, Vec3};
use msmrd_core::CompoundRegistry;

#[test]
fn binding_followed_by_unbinding_restores_membership() {
    // binding followed by unbinding restores membership to its pre-bind
    // contents: after unbind, neither particle belongs to a two-member
    // compound anymore.
    let mut reg = CompoundRegistry::new();
    let (id, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
    assert_eq!(reg.get(id).members.len(), 2);

    let new_ids = reg.unbind(id, 0, 1);
    assert!(new_ids.is_empty());
    assert!(!reg.get(id).active);
}

#[test]
fn three_particle_chain_merge_produces_two_bound_pairs() {
    // three particles, binding (1,2) then (2,3);
    // the resulting compound holds two boundPairs entries.
    let mut reg = CompoundRegistry::new();
    let (c01, _) = reg.bind(0, 1, 5, |_| None, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
    let membership = move |p: usize| if p <= 1 { Some(c01) } else { None };
    let (c012, _) = reg.bind(
        1,
        2,
        6,
        membership,
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Quat::IDENTITY,
    );
    assert_eq!(reg.get(c012).members.len(), 3);
    assert_eq!(reg.get(c012).bound_pairs.len(), 2);
}

#[test]
fn unbinding_the_middle_pair_of_a_four_particle_chain_splits_into_two_dyads() {
    // chain 1-2-3-4 (0-indexed 0-1-2-3), unbind (1,2)
    // leaves compounds {0,1} and {2,3}.
    let mut reg = CompoundRegistry::new();
    let (c, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
    let m1 = move |p: usize| if p <= 1 { Some(c) } else { None };
    let (c, _) = reg.bind(1, 2, 2, m1, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
    let m2 = move |p: usize| if p <= 2 { Some(c) } else { None };
    let (c, _) = reg.bind(
        2,
        3,
        3,
        m2,
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(3.0, 0.0, 0.0),
        Quat::IDENTITY,
    );

    let new_ids = reg.unbind(c, 1, 2);
    assert_eq!(new_ids.len(), 1);
    let other = new_ids[0];
    let mut a = reg.get(c).members.iter().copied().collect::<Vec<_>>();
    let mut b = reg.get(other).members.iter().copied().collect::<Vec<_>>();
    a.sort();
    b.sort();
    assert_eq!(a, vec![0, 1]);
    assert_eq!(b, vec![2, 3]);
}

#[test]
fn compaction_drops_inactive_compounds_and_returns_a_consistent_remap() {
    let mut reg = CompoundRegistry::new();
    let (c01, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
    let (c23, _) = reg.bind(2, 3, 1, |_| None, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
    let membership = move |p: usize| if p <= 1 { Some(c01) } else { Some(c23) };
    let (survivor, _) = reg.bind(
        1,
        2,
        2,
        membership,
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Quat::IDENTITY,
    );
    let remap = reg.compact();
    assert!(remap.contains_key(&survivor));
    assert_eq!(reg.len(), 1);
}
