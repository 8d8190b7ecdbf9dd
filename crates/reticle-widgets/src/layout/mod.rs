//! Container layout contract.
//!
//! A [`Layout`] measures the children of a [`WidgetContainer`] and positions
//! them inside a viewport. Measurement is incremental: dynamic containers are
//! measured only until the viewport is covered, and scrolling extends the
//! measured window one child at a time via [`Layout::pre_measure_next`].
//!
//! Sentinel convention: `f32::NAN` means "no answer" (child not measured,
//! no next child to measure), never an error. Infinite viewport extents mean
//! "unconstrained".

pub mod linear;

pub use linear::{Gravity, LinearLayout, Orientation};

use reticle_core::{Axis, AxisVec};

use crate::widget::WidgetId;

/// Scroll/measure direction along a layout axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    None,
}

/// The box a layout arranges children within. Extents may be infinite on
/// axes the container does not constrain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub size: AxisVec,
}

impl Viewport {
    pub fn new(size: AxisVec) -> Self {
        Self { size }
    }

    pub fn extent(&self, axis: Axis) -> f32 {
        self.size.get(axis)
    }
}

/// What a layout needs from the thing it is laying out. Implemented by the
/// list engine's content view; `get`/`extent` may materialize a child on
/// first access, which is why they take `&mut self`.
pub trait WidgetContainer {
    fn get(&mut self, index: usize) -> Option<WidgetId>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Dynamic containers are adapter-backed: children are expensive and the
    /// layout must not measure beyond viewport coverage.
    fn is_dynamic(&self) -> bool;
    fn extent(&mut self, index: usize, axis: Axis) -> f32;
    fn set_position(&mut self, index: usize, axis: Axis, offset: f32);
    /// Container size along `axis`; infinite when unconstrained.
    fn bounds(&self, axis: Axis) -> f32;
}

pub trait Layout {
    /// Called when the layout is applied to a container.
    fn on_applied(&mut self, viewport: Viewport);

    fn viewport(&self) -> Viewport;

    fn enable_clipping(&mut self, enable: bool);

    fn clipping_enabled(&self) -> bool;

    /// Drops all measurement state.
    fn invalidate(&mut self);

    /// Drops measurement state for `index` and everything measured after it.
    fn invalidate_index(&mut self, index: usize);

    /// Measures every child. Used for static containers.
    fn measure_all(&mut self, cx: &mut dyn WidgetContainer, measured: &mut Vec<usize>);

    /// Measures outward from `center` (or from the existing measured window)
    /// until the viewport is covered or data runs out, then trims entries
    /// that fell outside the viewport. `measured` receives the data indices
    /// that remain measured; anything the container has materialized beyond
    /// that set is the caller's to recycle.
    fn measure_until_full(
        &mut self,
        center: Option<usize>,
        cx: &mut dyn WidgetContainer,
        measured: &mut Vec<usize>,
    );

    /// Measures the next unmeasured child in `direction` along `axis` and
    /// returns the signed growth of the measured span. NaN when there is no
    /// next child — the natural end-of-data signal during a scroll.
    fn pre_measure_next(
        &mut self,
        cx: &mut dyn WidgetContainer,
        axis: Axis,
        direction: Direction,
        measured: &mut Vec<usize>,
    ) -> f32;

    /// Data index of the child currently straddling the layout anchor, if
    /// any child is measured.
    fn center_child(&self) -> Option<usize>;

    fn direction_to_child(&self, index: usize, axis: Axis) -> Direction;

    /// Signed shift that would bring `index` to its resting alignment; 0 for
    /// off-axis queries, NaN when the child is not measured.
    fn distance_to_child(&self, index: usize, axis: Axis) -> f32;

    /// Shifts every measured child by `amount` along `axis`.
    fn shift_by(&mut self, amount: f32, axis: Axis);

    /// Writes measured offsets through to child transforms.
    fn layout_children(&mut self, cx: &mut dyn WidgetContainer);

    fn in_viewport(&self, index: usize) -> bool;
}
