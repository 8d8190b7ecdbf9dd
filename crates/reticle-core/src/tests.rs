use std::time::Duration;

use web_time::Instant;

use crate::animation::{Clock, Easing, ManualClock};
use crate::geometry::{Axis, AxisVec, BoundingBox, Vec3};
use crate::scene::{LocalScene, SceneHost};
use crate::schedule::UpdateQueue;

#[test]
fn axis_vec_get_set() {
    let mut v = AxisVec::ZERO;
    v.set(Axis::Y, 3.5);
    assert_eq!(v.get(Axis::Y), 3.5);
    assert_eq!(v.get(Axis::X), 0.0);
}

#[test]
fn axis_vec_sentinels() {
    assert!(AxisVec::UNSET.is_nan());
    assert!(!AxisVec::UNSET.is_finite());

    let mut v = AxisVec::splat(1.0);
    assert!(v.is_finite());
    v.set(Axis::Z, f32::INFINITY);
    assert!(v.is_infinite());
    assert!(!v.is_nan());
}

#[test]
fn bounding_box_ray_hit_and_miss() {
    let b = BoundingBox::from_center_extent(Vec3::new(0.0, 0.0, -5.0), AxisVec::splat(2.0));
    let hit = b.intersect_ray(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
    assert!(hit.is_some());
    assert!((hit.unwrap() - 4.0).abs() < 1e-4);

    let miss = b.intersect_ray(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
    assert!(miss.is_none());
}

#[test]
fn easing_endpoints() {
    for easing in [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
    ] {
        assert!(easing.interpolate(0.0).abs() < 1e-6);
        assert!((easing.interpolate(1.0) - 1.0).abs() < 1e-6);
        // values outside [0,1] clamp
        assert_eq!(easing.interpolate(-1.0), easing.interpolate(0.0));
        assert_eq!(easing.interpolate(2.0), easing.interpolate(1.0));
    }
}

#[test]
fn easing_monotonic() {
    for easing in [Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
        let mut prev = 0.0;
        for step in 1..=20 {
            let v = easing.interpolate(step as f32 / 20.0);
            assert!(v >= prev, "{easing:?} regressed at step {step}");
            prev = v;
        }
    }
}

#[test]
fn update_queue_orders_immediate_before_due_delayed() {
    let q: UpdateQueue<u32> = UpdateQueue::new();
    let t0 = Instant::now();
    q.post_delayed(2, Duration::from_millis(5), t0);
    q.post(1);
    assert_eq!(q.drain(t0 + Duration::from_millis(10)), vec![1, 2]);
    assert!(q.is_empty());
}

#[test]
fn update_queue_holds_undue_delayed() {
    let q: UpdateQueue<&str> = UpdateQueue::new();
    let t0 = Instant::now();
    q.post_delayed("later", Duration::from_millis(100), t0);
    assert!(q.drain(t0 + Duration::from_millis(50)).is_empty());
    assert_eq!(
        q.drain(t0 + Duration::from_millis(150)),
        vec!["later"]
    );
}

#[test]
fn update_queue_cancel() {
    let q: UpdateQueue<u8> = UpdateQueue::new();
    let t0 = Instant::now();
    let token = q.post_delayed(7, Duration::from_millis(1), t0);
    assert!(q.cancel(token));
    assert!(!q.cancel(token));
    assert!(q.drain(t0 + Duration::from_secs(1)).is_empty());
}

#[test]
fn manual_clock_advances_clones_together() {
    let clock = ManualClock::start_now();
    let other = clock.clone();
    let before = clock.now();
    other.advance(Duration::from_millis(250));
    assert_eq!(clock.now() - before, Duration::from_millis(250));
}

#[test]
fn local_scene_pick_orders_by_distance() {
    let mut scene = LocalScene::new();
    let near = scene.create_node("near").unwrap();
    let far = scene.create_node("far").unwrap();
    for (node, z) in [(near, -2.0), (far, -6.0)] {
        scene.set_bounds(node, AxisVec::splat(1.0));
        scene.attach_collider(node);
        let mut t = scene.transform(node);
        t.position = Vec3::new(0.0, 0.0, z);
        scene.set_transform(node, t);
    }

    let picks = scene.pick(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(picks.len(), 2);
    assert_eq!(picks[0].node, near);
    assert_eq!(picks[1].node, far);
    assert!(picks[0].distance < picks[1].distance);
}

#[test]
fn local_scene_pick_skips_colliderless_and_hidden() {
    let mut scene = LocalScene::new();
    let visible = scene.create_node("visible").unwrap();
    let plain = scene.create_node("plain").unwrap();
    let hidden = scene.create_node("hidden").unwrap();
    for node in [visible, plain, hidden] {
        scene.set_bounds(node, AxisVec::splat(1.0));
        let mut t = scene.transform(node);
        t.position = Vec3::new(0.0, 0.0, -3.0);
        scene.set_transform(node, t);
    }
    scene.attach_collider(visible);
    scene.attach_collider(hidden);
    scene.set_rendering_enabled(hidden, false);

    let picks = scene.pick(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0].node, visible);
}

#[test]
fn local_scene_world_position_composes_parents() {
    let mut scene = LocalScene::new();
    let parent = scene.create_node("parent").unwrap();
    let child = scene.create_node("child").unwrap();
    scene.add_child(parent, child);

    let mut t = scene.transform(parent);
    t.position = Vec3::new(0.0, 0.0, -4.0);
    scene.set_transform(parent, t);

    scene.set_bounds(child, AxisVec::splat(1.0));
    scene.attach_collider(child);

    let picks = scene.pick(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0].node, child);
}

#[test]
fn local_scene_destroy_recurses() {
    let mut scene = LocalScene::new();
    let parent = scene.create_node("parent").unwrap();
    let child = scene.create_node("child").unwrap();
    scene.add_child(parent, child);
    scene.destroy_node(parent);
    assert!(scene.is_empty());
    assert!(!scene.contains(child));
}
