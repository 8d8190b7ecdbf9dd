use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use web_time::Instant;

use reticle_core::{Axis, AxisVec, LocalScene, PickHit, Vec3, approx_eq};

use crate::adapter::{Adapter, DataSetObserver, ObserverRegistry, SharedAdapter};
use crate::layout::{Direction, Gravity, Layout, LinearLayout, Orientation, Viewport, WidgetContainer};
use crate::list::{ListConfig, ListEngine, ListListener};
use crate::touch::ClickEvent;
use crate::ui::Ui;
use crate::widget::{WidgetError, WidgetEvent, WidgetFlags, WidgetId, WidgetState};

fn test_ui() -> Ui {
    Ui::new(Box::new(LocalScene::new()))
}

fn hit(ui: &Ui, widget: WidgetId) -> PickHit {
    PickHit {
        node: ui.tree.node(widget),
        point: Vec3::ZERO,
        distance: 1.0,
    }
}

// ---- widget tree ----

#[test]
#[should_panic(expected = "own child")]
fn widget_cannot_be_its_own_child() {
    let mut ui = test_ui();
    let w = ui.create_group("w").unwrap();
    ui.add_child(w, w);
}

#[test]
#[should_panic(expected = "already owned")]
fn node_cannot_have_two_widget_owners() {
    let mut ui = test_ui();
    let w = ui.create_group("w").unwrap();
    let node = ui.tree.node(w);
    ui.tree.adopt_node(node, None, false);
}

#[test]
fn attach_is_idempotent_and_detach_reverses() {
    let mut ui = test_ui();
    let parent = ui.create_group("parent").unwrap();
    let child = ui.create_quad("child", 1.0, 1.0).unwrap();
    assert!(ui.add_child(parent, child));
    assert!(!ui.add_child(parent, child));
    assert_eq!(ui.tree.parent(child), Some(parent));
    assert!(ui.remove_child(parent, child));
    assert_eq!(ui.tree.parent(child), None);
}

#[test]
fn state_cascades_through_follow_state_group() {
    let mut ui = test_ui();
    let parent = ui.create_group("parent").unwrap();
    let child = ui.create_quad("child", 1.0, 1.0).unwrap();
    ui.add_child(parent, child);
    ui.set_children_follow_state(parent, true);
    ui.drain_events();
    ui.tree.set_selected(parent, true);
    let events = ui.drain_events();
    assert!(events.contains(&WidgetEvent::StateChanged {
        widget: child,
        state: WidgetState::Selected,
    }));
}

// ---- focus routing ----

#[test]
fn focus_moves_with_picks_and_releases_on_empty() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    let now = Instant::now();

    ui.frame(&[hit(&ui, a)], now);
    assert!(ui.tree.is_focused(a));
    assert_eq!(ui.focus.current_focus(), Some(a));

    ui.frame(&[], now);
    assert!(!ui.tree.is_focused(a));
    assert_eq!(ui.focus.current_focus(), None);
}

#[test]
fn focus_loss_is_observed_before_the_next_gain() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    let b = ui.create_quad("b", 1.0, 1.0).unwrap();
    let now = Instant::now();

    ui.frame(&[hit(&ui, a)], now);
    ui.drain_events();
    ui.frame(&[hit(&ui, b)], now);

    let events = ui.drain_events();
    let lost = events
        .iter()
        .position(|e| *e == WidgetEvent::FocusChanged { widget: a, focused: false });
    let gained = events
        .iter()
        .position(|e| *e == WidgetEvent::FocusChanged { widget: b, focused: true });
    assert!(lost.expect("a lost focus") < gained.expect("b gained focus"));
}

#[test]
fn refused_focus_falls_through_to_the_next_hit() {
    let mut ui = test_ui();
    let front = ui.create_quad("front", 1.0, 1.0).unwrap();
    let back = ui.create_quad("back", 1.0, 1.0).unwrap();
    ui.tree.set_flag(front, WidgetFlags::ACCEPTS_FOCUS, false);
    let now = Instant::now();

    ui.frame(&[hit(&ui, front), hit(&ui, back)], now);
    assert!(!ui.tree.is_focused(front));
    assert!(ui.tree.is_focused(back));
}

#[test]
fn long_focus_fires_after_the_timeout() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    let t0 = Instant::now();

    ui.frame(&[hit(&ui, a)], t0);
    ui.drain_events();
    ui.frame(&[hit(&ui, a)], t0 + Duration::from_secs(4));
    assert!(!ui.drain_events().iter().any(|e| matches!(e, WidgetEvent::LongFocus { .. })));

    ui.frame(&[hit(&ui, a)], t0 + Duration::from_secs(6));
    assert!(
        ui.drain_events()
            .contains(&WidgetEvent::LongFocus { widget: a })
    );
}

#[test]
fn long_focus_cancelled_when_focus_moves() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    let b = ui.create_quad("b", 1.0, 1.0).unwrap();
    let t0 = Instant::now();

    ui.frame(&[hit(&ui, a)], t0);
    ui.frame(&[hit(&ui, b)], t0 + Duration::from_secs(2));
    ui.drain_events();

    // a's deadline passes while b holds focus
    ui.frame(&[hit(&ui, b)], t0 + Duration::from_secs(6));
    assert!(
        !ui.drain_events()
            .contains(&WidgetEvent::LongFocus { widget: a })
    );
}

#[test]
fn follow_parent_focus_delegates_picks_and_cascades() {
    let mut ui = test_ui();
    let parent = ui.create_group("parent").unwrap();
    let child = ui.create_quad("child", 1.0, 1.0).unwrap();
    ui.add_child(parent, child);
    ui.set_follow_parent_focus(child, true);
    assert_eq!(ui.tree.focus_owner(child), parent);

    let now = Instant::now();
    ui.frame(&[hit(&ui, child)], now);
    assert!(ui.tree.is_focused(parent));
    assert!(ui.tree.is_focused(child));

    ui.frame(&[], now);
    assert!(!ui.tree.is_focused(parent));
    assert!(!ui.tree.is_focused(child));
}

// ---- touch routing ----

#[test]
fn click_delivers_touch_event() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    let picks = [hit(&ui, a)];
    assert!(ui.handle_click(&picks, ClickEvent::Primary));
    assert!(
        ui.drain_events()
            .iter()
            .any(|e| matches!(e, WidgetEvent::Touch { widget, .. } if *widget == a))
    );
}

#[test]
fn filtered_hits_fall_back_to_the_default_action() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    ui.touch.add_touch_filter(Box::new(|_| false));
    ui.touch.set_default_action(Some(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    let picks = [hit(&ui, a)];
    assert!(!ui.handle_click(&picks, ClickEvent::Primary));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(
        !ui.drain_events()
            .iter()
            .any(|e| matches!(e, WidgetEvent::Touch { .. }))
    );
}

#[test]
fn touch_filters_do_not_affect_back_key_routing() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    ui.touch.add_touch_filter(Box::new(|_| false));
    let picks = [hit(&ui, a)];

    assert!(!ui.handle_click(&picks, ClickEvent::Primary));
    ui.handle_click(&picks, ClickEvent::BackKey);
    let events = ui.drain_events();
    assert!(!events.iter().any(|e| matches!(e, WidgetEvent::Touch { .. })));
    assert!(events.contains(&WidgetEvent::BackKey { widget: a }));

    ui.touch.add_back_key_filter(Box::new(|_| false));
    ui.handle_click(&picks, ClickEvent::BackKey);
    assert!(
        !ui.drain_events()
            .iter()
            .any(|e| matches!(e, WidgetEvent::BackKey { .. }))
    );
}

#[test]
fn children_follow_input_delegates_touch() {
    let mut ui = test_ui();
    let parent = ui.create_group("parent").unwrap();
    let child = ui.create_quad("child", 1.0, 1.0).unwrap();
    ui.add_child(parent, child);
    ui.set_children_follow_input(parent, true);

    assert!(ui.tree.deliver_touch(parent, Vec3::ZERO));
    let events = ui.drain_events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, WidgetEvent::Touch { widget, .. } if *widget == child))
    );
}

#[test]
fn interceptor_swallows_clicks() {
    let mut ui = test_ui();
    let a = ui.create_quad("a", 1.0, 1.0).unwrap();
    ui.touch.set_interceptor(Some(Box::new(|_, _| true)));
    let picks = [hit(&ui, a)];
    assert!(ui.handle_click(&picks, ClickEvent::Primary));
    assert!(ui.drain_events().is_empty());
}

// ---- linear layout ----

struct FakeContainer {
    sizes: Vec<f32>,
    positions: HashMap<usize, f32>,
}

impl FakeContainer {
    fn uniform(count: usize, size: f32) -> Self {
        Self {
            sizes: vec![size; count],
            positions: HashMap::new(),
        }
    }
}

impl WidgetContainer for FakeContainer {
    fn get(&mut self, index: usize) -> Option<WidgetId> {
        (index < self.sizes.len()).then(WidgetId::default)
    }

    fn len(&self) -> usize {
        self.sizes.len()
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn extent(&mut self, index: usize, _axis: Axis) -> f32 {
        self.sizes[index]
    }

    fn set_position(&mut self, index: usize, _axis: Axis, offset: f32) {
        self.positions.insert(index, offset);
    }

    fn bounds(&self, _axis: Axis) -> f32 {
        10.0
    }
}

fn vertical_layout() -> LinearLayout {
    let mut layout = LinearLayout::new(Orientation::Vertical, Gravity::Center);
    layout.on_applied(Viewport::new(AxisVec::new(f32::INFINITY, 10.0, f32::INFINITY)));
    layout
}

#[test]
fn measure_until_full_covers_the_viewport_around_the_center() {
    let mut layout = vertical_layout();
    let mut cx = FakeContainer::uniform(100, 2.0);
    let mut measured = Vec::new();
    layout.measure_until_full(Some(50), &mut cx, &mut measured);

    assert!(measured.contains(&50));
    assert_eq!(layout.center_child(), Some(50));
    // a 10-unit viewport holds five 2-unit children
    assert!(measured.len() >= 5 && measured.len() <= 7, "got {measured:?}");
    for pair in measured.windows(2) {
        assert_eq!(pair[1], pair[0] + 1, "measured window is contiguous");
    }
    assert!(approx_eq(layout.distance_to_child(50, Axis::Y), 0.0));
}

#[test]
fn pre_measure_reports_signed_growth_and_nan_at_the_ends() {
    let mut layout = vertical_layout();
    let mut cx = FakeContainer::uniform(3, 2.0);
    let mut measured = Vec::new();
    layout.measure_until_full(Some(1), &mut cx, &mut measured);

    // both neighbors of the center fit; nothing is left to measure
    let fwd = layout.pre_measure_next(&mut cx, Axis::Y, Direction::Forward, &mut measured);
    assert!(fwd.is_nan());
    let back = layout.pre_measure_next(&mut cx, Axis::Y, Direction::Backward, &mut measured);
    assert!(back.is_nan());
}

#[test]
fn pre_measure_growth_is_negative_forward_positive_backward() {
    let mut layout = vertical_layout();
    let mut cx = FakeContainer::uniform(100, 2.0);
    let mut measured = Vec::new();
    layout.measure_until_full(Some(50), &mut cx, &mut measured);

    let fwd = layout.pre_measure_next(&mut cx, Axis::Y, Direction::Forward, &mut measured);
    assert!(approx_eq(fwd, -2.0), "forward growth {fwd}");
    let back = layout.pre_measure_next(&mut cx, Axis::Y, Direction::Backward, &mut measured);
    assert!(approx_eq(back, 2.0), "backward growth {back}");
}

#[test]
fn shifting_moves_the_center_child() {
    let mut layout = vertical_layout();
    let mut cx = FakeContainer::uniform(100, 2.0);
    let mut measured = Vec::new();
    layout.measure_until_full(Some(50), &mut cx, &mut measured);

    assert_eq!(layout.direction_to_child(52, Axis::Y), Direction::Forward);
    assert!(approx_eq(layout.distance_to_child(52, Axis::Y), -4.0));

    layout.shift_by(-4.0, Axis::Y);
    assert_eq!(layout.center_child(), Some(52));
}

#[test]
fn off_axis_queries_are_inert() {
    let mut layout = vertical_layout();
    let mut cx = FakeContainer::uniform(10, 2.0);
    let mut measured = Vec::new();
    layout.measure_until_full(Some(5), &mut cx, &mut measured);

    assert_eq!(layout.distance_to_child(5, Axis::X), 0.0);
    assert_eq!(layout.direction_to_child(7, Axis::X), Direction::None);
    let mut scratch = Vec::new();
    assert!(
        layout
            .pre_measure_next(&mut cx, Axis::X, Direction::Forward, &mut scratch)
            .is_nan()
    );
}

#[test]
fn fill_gravity_packs_centered_when_children_overflow() {
    let mut fill = LinearLayout::new(Orientation::Vertical, Gravity::Fill);
    fill.on_applied(Viewport::new(AxisVec::new(f32::INFINITY, 10.0, f32::INFINITY)));
    let mut center = vertical_layout();

    let mut cx_fill = FakeContainer::uniform(100, 2.0);
    let mut cx_center = FakeContainer::uniform(100, 2.0);
    let mut measured_fill = Vec::new();
    let mut measured_center = Vec::new();
    fill.measure_until_full(Some(50), &mut cx_fill, &mut measured_fill);
    center.measure_until_full(Some(50), &mut cx_center, &mut measured_center);

    // with more children than fit there is no padding to respread
    assert_eq!(measured_fill, measured_center);
    for &i in &measured_fill {
        assert!(approx_eq(
            fill.distance_to_child(i, Axis::Y),
            center.distance_to_child(i, Axis::Y)
        ));
    }
}

#[test]
fn vertical_offsets_flip_sign_in_world_space() {
    let mut layout = vertical_layout();
    let mut cx = FakeContainer::uniform(3, 2.0);
    let mut measured = Vec::new();
    layout.measure_all(&mut cx, &mut measured);
    layout.layout_children(&mut cx);

    // layout offsets -2, 0, 2 become world y 2, 0, -2
    assert!(approx_eq(cx.positions[&0], 2.0));
    assert!(approx_eq(cx.positions[&1], 0.0));
    assert!(approx_eq(cx.positions[&2], -2.0));
}

// ---- list engine ----

struct TestAdapter {
    count: usize,
    observers: ObserverRegistry,
    binds: usize,
}

impl TestAdapter {
    fn new(count: usize) -> Self {
        Self {
            count,
            observers: ObserverRegistry::new(),
            binds: 0,
        }
    }

    fn set_count(&mut self, count: usize) {
        self.count = count;
        self.observers.notify_changed();
    }
}

impl Adapter for TestAdapter {
    fn count(&self) -> usize {
        self.count
    }

    fn bind_view(
        &mut self,
        ui: &mut Ui,
        index: usize,
        recycled: Option<WidgetId>,
        _host: WidgetId,
    ) -> Result<WidgetId, WidgetError> {
        self.binds += 1;
        match recycled {
            Some(view) => Ok(view),
            None => ui.create_quad(&format!("item-{index}"), 2.0, 2.0),
        }
    }

    fn uniform_view_size(&self) -> Option<AxisVec> {
        Some(AxisVec::new(2.0, 2.0, 0.0))
    }

    fn register_observer(&self, observer: Arc<dyn DataSetObserver>) {
        self.observers.register(observer);
    }

    fn unregister_observer(&self, observer: &Arc<dyn DataSetObserver>) {
        self.observers.unregister(observer);
    }
}

#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
    positions: Arc<Mutex<Vec<usize>>>,
}

impl ListListener for Recorder {
    fn on_scroll_started(&mut self, position: Option<usize>) {
        self.log.lock().push(format!("started:{position:?}"));
    }

    fn on_scroll_position_changed(&mut self, position: Option<usize>) {
        if let Some(p) = position {
            self.positions.lock().push(p);
        }
    }

    fn on_scroll_finished(&mut self, position: Option<usize>) {
        self.log.lock().push(format!("finished:{position:?}"));
    }

    fn on_item_touched(&mut self, data_index: usize) {
        self.log.lock().push(format!("touched:{data_index}"));
    }

    fn on_item_focused(&mut self, data_index: usize, focused: bool) {
        self.log.lock().push(format!("focused:{data_index}:{focused}"));
    }
}

fn list_fixture(count: usize) -> (Ui, ListEngine, Rc<RefCell<TestAdapter>>) {
    let mut ui = test_ui();
    let mut engine = ListEngine::new(
        &mut ui,
        "list",
        AxisVec::new(f32::INFINITY, 10.0, f32::INFINITY),
    )
    .unwrap();
    engine.add_layout(
        Box::new(LinearLayout::new(Orientation::Vertical, Gravity::Center)),
        &ui,
    );
    let adapter = Rc::new(RefCell::new(TestAdapter::new(count)));
    let shared: SharedAdapter = adapter.clone();
    engine.set_adapter(&mut ui, Some(shared));
    (ui, engine, adapter)
}

#[test]
fn initial_layout_materializes_only_viewport_items() {
    let (mut ui, mut engine, adapter) = list_fixture(100);
    engine.update(&mut ui, Instant::now());

    let visible = engine.visible_items();
    assert!(!visible.is_empty());
    assert!(visible.len() < 10, "only viewport items bound: {visible:?}");
    assert!(adapter.borrow().binds < 10);
    assert_eq!(engine.current_position(), Some(0));
}

#[test]
fn animated_scroll_walks_monotonically_and_recycles() {
    let (mut ui, mut engine, _) = list_fixture(10);
    let recorder = Recorder::default();
    engine.add_listener(Box::new(recorder.clone()));
    let t0 = Instant::now();
    engine.update(&mut ui, t0);

    assert!(engine.scroll_to_position(&mut ui, 9));
    assert!(engine.is_scrolling());
    // a second scroll request is refused while one is running
    assert!(!engine.scroll_to_position(&mut ui, 5));

    for i in 1..=40u64 {
        engine.update(&mut ui, t0 + Duration::from_millis(50 * i));
        if !engine.is_scrolling() {
            break;
        }
    }
    assert!(!engine.is_scrolling());
    assert_eq!(engine.current_position(), Some(9));
    assert!(!engine.visible_items().contains(&0), "head items recycled");

    let log = recorder.log.lock();
    assert_eq!(log.first().map(String::as_str), Some("started:Some(0)"));
    assert_eq!(log.last().map(String::as_str), Some("finished:Some(9)"));
    let positions = recorder.positions.lock();
    for pair in positions.windows(2) {
        assert!(pair[1] >= pair[0], "centers move one way: {positions:?}");
    }
}

#[test]
fn each_guest_is_bound_to_at_most_one_host() {
    let (mut ui, mut engine, _) = list_fixture(50);
    let t0 = Instant::now();
    engine.update(&mut ui, t0);
    engine.scroll_to_position(&mut ui, 30);
    for i in 1..=80u64 {
        engine.update(&mut ui, t0 + Duration::from_millis(50 * i));
    }

    let mut guests: Vec<WidgetId> = engine
        .visible_items()
        .into_iter()
        .map(|i| engine.view_for(i).expect("visible item has a view"))
        .collect();
    let before = guests.len();
    guests.sort();
    guests.dedup();
    assert_eq!(guests.len(), before);
}

#[test]
fn non_animated_scroll_jumps_in_one_tick() {
    let (mut ui, mut engine, _) = list_fixture(10);
    let recorder = Recorder::default();
    engine.add_listener(Box::new(recorder.clone()));
    engine.set_config(ListConfig {
        animate: false,
        ..ListConfig::default()
    });
    engine.update(&mut ui, Instant::now());

    assert!(engine.scroll_to_position(&mut ui, 9));
    assert!(!engine.is_scrolling());
    assert_eq!(engine.current_position(), Some(9));
    assert!(!engine.visible_items().contains(&0));
    let log = recorder.log.lock();
    assert_eq!(log.last().map(String::as_str), Some("finished:Some(9)"));
}

#[test]
fn scroll_by_offset_rejects_non_finite_and_clamps_to_data() {
    let (mut ui, mut engine, _) = list_fixture(5);
    let t0 = Instant::now();
    engine.update(&mut ui, t0);

    assert!(!engine.scroll_by_offset(AxisVec::new(0.0, f32::NAN, 0.0)));
    assert!(!engine.is_scrolling());

    // far more travel than five 2-unit items allow
    assert!(engine.scroll_by_offset(AxisVec::new(0.0, -1000.0, 0.0)));
    for i in 1..=100u64 {
        engine.update(&mut ui, t0 + Duration::from_millis(100 * i));
        if !engine.is_scrolling() {
            break;
        }
    }
    assert!(!engine.is_scrolling());
    assert_eq!(engine.current_position(), Some(4));
}

#[test]
fn force_stop_ends_the_scroll_at_the_next_tick() {
    let (mut ui, mut engine, _) = list_fixture(50);
    let t0 = Instant::now();
    engine.update(&mut ui, t0);
    engine.scroll_to_position(&mut ui, 40);
    engine.update(&mut ui, t0 + Duration::from_millis(100));
    assert!(engine.is_scrolling());

    engine.stop_scrolling();
    engine.update(&mut ui, t0 + Duration::from_millis(200));
    assert!(!engine.is_scrolling());
}

#[test]
fn single_selection_is_exclusive() {
    let (mut ui, mut engine, _) = list_fixture(10);
    engine.update(&mut ui, Instant::now());

    engine.select_item(&mut ui, 1, true);
    engine.select_item(&mut ui, 2, true);
    assert_eq!(engine.selected_items(), vec![2]);

    engine.enable_multi_selection(&mut ui, true);
    assert!(engine.selected_items().is_empty(), "toggle clears selection");
    engine.select_item(&mut ui, 1, true);
    engine.select_item(&mut ui, 2, true);
    assert_eq!(engine.selected_items(), vec![1, 2]);
}

#[test]
#[should_panic(expected = "out of range")]
fn selecting_out_of_range_panics() {
    let (mut ui, mut engine, _) = list_fixture(3);
    engine.update(&mut ui, Instant::now());
    engine.select_item(&mut ui, 5, true);
}

#[test]
fn selection_survives_adapter_swap() {
    let (mut ui, mut engine, _) = list_fixture(10);
    engine.update(&mut ui, Instant::now());
    engine.select_item(&mut ui, 3, true);

    let replacement = Rc::new(RefCell::new(TestAdapter::new(10)));
    let shared: SharedAdapter = replacement.clone();
    engine.set_adapter(&mut ui, Some(shared));
    engine.update(&mut ui, Instant::now());

    assert!(engine.is_selected(3));
    assert_eq!(engine.selected_items(), vec![3]);

    engine.clear(&mut ui);
    assert!(engine.selected_items().is_empty());
}

#[test]
fn adapter_swap_rematerializes_from_the_start() {
    let (mut ui, mut engine, _) = list_fixture(60);
    engine.set_config(ListConfig {
        animate: false,
        ..ListConfig::default()
    });
    engine.update(&mut ui, Instant::now());
    engine.scroll_to_position(&mut ui, 50);
    assert_eq!(engine.current_position(), Some(50));

    let replacement = Rc::new(RefCell::new(TestAdapter::new(10)));
    let shared: SharedAdapter = replacement.clone();
    engine.set_adapter(&mut ui, Some(shared));
    engine.update(&mut ui, Instant::now());

    let visible = engine.visible_items();
    assert!(!visible.is_empty(), "new data set is materialized");
    assert_eq!(visible.first(), Some(&0));
    assert!(visible.iter().all(|&i| i < 10), "got {visible:?}");
    assert_eq!(engine.current_position(), Some(0));
}

#[test]
fn recycled_items_are_not_pickable() {
    let (mut ui, mut engine, _) = list_fixture(30);
    engine.set_config(ListConfig {
        animate: false,
        ..ListConfig::default()
    });
    engine.update(&mut ui, Instant::now());

    let guest = engine.view_for(0).expect("item 0 visible");
    let node = ui.tree.node(guest);
    assert!(ui.focus.is_registered(node));
    assert!(ui.touch.is_registered(node));

    engine.scroll_to_position(&mut ui, 25);
    assert!(engine.view_for(0).is_none(), "item 0 recycled");
    assert!(!ui.focus.is_registered(node));
    assert!(!ui.touch.is_registered(node));
    assert!(!ui.scene.has_collider(node));

    engine.scroll_to_position(&mut ui, 0);
    let rebound = engine.view_for(0).expect("item 0 rebound");
    let node = ui.tree.node(rebound);
    assert!(ui.focus.is_registered(node));
    assert!(ui.touch.is_registered(node));
    assert!(ui.scene.has_collider(node));
}

#[test]
fn destroying_the_list_releases_scene_and_routers() {
    let (mut ui, mut engine, adapter) = list_fixture(30);
    engine.set_config(ListConfig {
        animate: false,
        ..ListConfig::default()
    });
    engine.update(&mut ui, Instant::now());
    // churn the pool so some hosts are parked when the list goes away
    engine.scroll_to_position(&mut ui, 25);

    let guest = engine.view_for(25).expect("item 25 visible");
    let node = ui.tree.node(guest);
    let root = engine.root();
    engine.destroy(&mut ui);

    assert!(!ui.tree.contains(root));
    assert!(ui.tree.is_empty(), "every list widget destroyed");
    assert!(!ui.focus.is_registered(node));
    assert!(!ui.touch.is_registered(node));

    // the observer is gone: data changes no longer reach anyone
    adapter.borrow_mut().set_count(5);
}

#[test]
fn selection_visual_follows_recycling() {
    let (mut ui, mut engine, _) = list_fixture(30);
    engine.set_config(ListConfig {
        animate: false,
        ..ListConfig::default()
    });
    engine.update(&mut ui, Instant::now());

    engine.select_item(&mut ui, 0, true);
    let guest = engine.view_for(0).expect("item 0 visible");
    assert!(ui.tree.is_selected(guest));

    engine.scroll_to_position(&mut ui, 25);
    assert!(engine.view_for(0).is_none(), "item 0 recycled");
    assert!(engine.is_selected(0));

    engine.scroll_to_position(&mut ui, 0);
    let rebound = engine.view_for(0).expect("item 0 rebound");
    assert!(ui.tree.is_selected(rebound));
}

#[test]
fn touch_on_item_selects_when_enabled() {
    let (mut ui, mut engine, _) = list_fixture(10);
    let recorder = Recorder::default();
    engine.add_listener(Box::new(recorder.clone()));
    engine.enable_select_on_touch(true);
    engine.update(&mut ui, Instant::now());

    let guest = engine.view_for(0).expect("item 0 visible");
    engine.handle_events(
        &mut ui,
        &[WidgetEvent::Touch {
            widget: guest,
            hit: Vec3::ZERO,
        }],
    );
    assert!(engine.is_selected(0));
    assert!(recorder.log.lock().contains(&"touched:0".to_owned()));

    engine.handle_events(
        &mut ui,
        &[WidgetEvent::Touch {
            widget: guest,
            hit: Vec3::ZERO,
        }],
    );
    assert!(!engine.is_selected(0));
}

#[test]
fn item_focus_events_reach_list_listeners() {
    let (mut ui, mut engine, _) = list_fixture(10);
    let recorder = Recorder::default();
    engine.add_listener(Box::new(recorder.clone()));
    engine.update(&mut ui, Instant::now());

    let guest = engine.view_for(1).expect("item 1 visible");
    engine.handle_events(
        &mut ui,
        &[WidgetEvent::FocusChanged {
            widget: guest,
            focused: true,
        }],
    );
    let log = recorder.log.lock();
    assert_eq!(
        log.iter().filter(|e| e.as_str() == "focused:1:true").count(),
        1
    );
}

#[test]
fn data_change_notifications_cross_into_the_update_tick() {
    let (mut ui, mut engine, adapter) = list_fixture(2);
    let t0 = Instant::now();
    engine.update(&mut ui, t0);
    assert_eq!(engine.data_count(), 2);

    adapter.borrow_mut().set_count(40);
    assert_eq!(engine.data_count(), 40);
    engine.update(&mut ui, t0 + Duration::from_millis(16));

    // relayout extended the window into the new data
    assert!(engine.visible_items().len() > 2);
}

#[test]
fn empty_adapter_yields_empty_list() {
    let (mut ui, mut engine, _) = list_fixture(0);
    engine.update(&mut ui, Instant::now());
    assert!(engine.visible_items().is_empty());
    assert_eq!(engine.current_position(), None);
    assert!(!engine.scroll_to_position(&mut ui, 0));
}
