//! Single-axis layout with a sliding measurement cache.
//!
//! Measured children form one contiguous run of data indices. Each cache
//! entry stores the child's center offset in layout coordinates, where 0 is
//! the layout anchor and offsets grow with data index. Scrolling shifts every
//! offset; measurement extends the run at either end.

use serde::{Deserialize, Serialize};

use reticle_core::{Axis, approx_eq};

use super::{Direction, Layout, Viewport, WidgetContainer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
    /// Along the depth axis, near to far.
    Stack,
}

impl Orientation {
    pub fn axis(self) -> Axis {
        match self {
            Orientation::Horizontal => Axis::X,
            Orientation::Vertical => Axis::Y,
            Orientation::Stack => Axis::Z,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    Start,
    #[default]
    Center,
    End,
    /// Respreads padding so the children span the whole viewport. Respreading
    /// needs the full child set measured, so it only applies when every child
    /// fits the viewport; virtualized containers pack centered instead.
    Fill,
}

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    data_index: usize,
    size: f32,
    start_pad: f32,
    end_pad: f32,
    /// Child center in layout coordinates.
    offset: f32,
}

impl CacheEntry {
    fn start_edge(&self) -> f32 {
        self.offset - self.size / 2.0 - self.start_pad
    }

    fn end_edge(&self) -> f32 {
        self.offset + self.size / 2.0 + self.end_pad
    }
}

pub struct LinearLayout {
    orientation: Orientation,
    gravity: Gravity,
    divider_padding: f32,
    viewport: Viewport,
    clipping: bool,
    cache: Vec<CacheEntry>,
}

impl LinearLayout {
    pub fn new(orientation: Orientation, gravity: Gravity) -> Self {
        Self {
            orientation,
            gravity,
            divider_padding: 0.0,
            viewport: Viewport::new(reticle_core::AxisVec::UNSET),
            clipping: false,
            cache: Vec::new(),
        }
    }

    pub fn with_divider_padding(mut self, padding: f32) -> Self {
        self.divider_padding = padding;
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Gravity) {
        if self.gravity != gravity {
            self.gravity = gravity;
            self.invalidate();
        }
    }

    pub fn axis(&self) -> Axis {
        self.orientation.axis()
    }

    /// Layout offsets grow rightward on X but downward on Y and into the
    /// scene on Z, so world positions flip sign on those axes.
    fn factor(&self) -> f32 {
        match self.axis() {
            Axis::X => 1.0,
            Axis::Y | Axis::Z => -1.0,
        }
    }

    fn half_extent(&self) -> f32 {
        self.viewport.extent(self.axis()) / 2.0
    }

    fn first_index(&self) -> Option<usize> {
        self.cache.first().map(|e| e.data_index)
    }

    fn last_index(&self) -> Option<usize> {
        self.cache.last().map(|e| e.data_index)
    }

    fn entry(&self, data_index: usize) -> Option<&CacheEntry> {
        let first = self.first_index()?;
        if data_index < first {
            return None;
        }
        self.cache.get(data_index - first)
    }

    fn total_with_padding(&self) -> f32 {
        match (self.cache.first(), self.cache.last()) {
            (Some(first), Some(last)) => last.end_edge() - first.start_edge(),
            _ => 0.0,
        }
    }

    fn measure(&self, cx: &mut dyn WidgetContainer, index: usize) -> (f32, f32, f32) {
        let size = cx.extent(index, self.axis());
        let pad = self.divider_padding / 2.0;
        (size, pad, pad)
    }

    /// Resting center offset for a child of the given metrics, per gravity.
    fn anchor_for(&self, size: f32, start_pad: f32, end_pad: f32) -> f32 {
        let bounds = self.viewport.extent(self.axis());
        match self.gravity {
            Gravity::Center | Gravity::Fill => 0.0,
            Gravity::Start => {
                let edge = if bounds.is_finite() { -bounds / 2.0 } else { 0.0 };
                edge + start_pad + size / 2.0
            }
            Gravity::End => {
                let edge = if bounds.is_finite() { bounds / 2.0 } else { 0.0 };
                edge - end_pad - size / 2.0
            }
        }
    }

    fn append(&mut self, cx: &mut dyn WidgetContainer, data_index: usize) {
        let (size, start_pad, end_pad) = self.measure(cx, data_index);
        let alignment = match self.cache.last() {
            Some(last) => last.end_edge(),
            None => self.anchor_for(size, start_pad, end_pad) - start_pad - size / 2.0,
        };
        self.cache.push(CacheEntry {
            data_index,
            size,
            start_pad,
            end_pad,
            offset: alignment + start_pad + size / 2.0,
        });
    }

    fn prepend(&mut self, cx: &mut dyn WidgetContainer, data_index: usize) {
        let (size, start_pad, end_pad) = self.measure(cx, data_index);
        let alignment = self
            .cache
            .first()
            .map(|first| first.start_edge())
            .unwrap_or_else(|| self.anchor_for(size, start_pad, end_pad) + end_pad + size / 2.0);
        self.cache.insert(
            0,
            CacheEntry {
                data_index,
                size,
                start_pad,
                end_pad,
                offset: alignment - end_pad - size / 2.0,
            },
        );
    }

    fn entry_in_viewport(&self, entry: &CacheEntry) -> bool {
        let half = self.half_extent();
        if !half.is_finite() {
            return true;
        }
        entry.end_edge() > -half && entry.start_edge() < half
    }
}

impl Layout for LinearLayout {
    fn on_applied(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.invalidate();
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn enable_clipping(&mut self, enable: bool) {
        self.clipping = enable;
    }

    fn clipping_enabled(&self) -> bool {
        self.clipping
    }

    fn invalidate(&mut self) {
        self.cache.clear();
    }

    fn invalidate_index(&mut self, index: usize) {
        if let Some(first) = self.first_index()
            && index >= first
        {
            self.cache.truncate(index - first);
        }
    }

    fn measure_all(&mut self, cx: &mut dyn WidgetContainer, measured: &mut Vec<usize>) {
        self.invalidate();
        let len = cx.len();
        if len == 0 {
            return;
        }
        let axis = self.axis();
        let bounds = self.viewport.extent(axis);
        let pad = self.divider_padding / 2.0;
        let sizes: Vec<f32> = (0..len).map(|i| cx.extent(i, axis)).collect();
        let content: f32 = sizes.iter().sum::<f32>() + self.divider_padding * len as f32;

        let extra = if self.gravity == Gravity::Fill && bounds.is_finite() && bounds > content {
            (bounds - content) / (2.0 * len as f32)
        } else {
            0.0
        };
        let total = content + 2.0 * extra * len as f32;
        let mut alignment = match self.gravity {
            Gravity::Start | Gravity::Fill => {
                if bounds.is_finite() {
                    -bounds / 2.0
                } else {
                    0.0
                }
            }
            Gravity::Center => -total / 2.0,
            Gravity::End => {
                if bounds.is_finite() {
                    bounds / 2.0 - total
                } else {
                    -total
                }
            }
        };
        for (i, size) in sizes.into_iter().enumerate() {
            let start_pad = pad + extra;
            let end_pad = pad + extra;
            self.cache.push(CacheEntry {
                data_index: i,
                size,
                start_pad,
                end_pad,
                offset: alignment + start_pad + size / 2.0,
            });
            alignment += start_pad + size + end_pad;
            measured.push(i);
        }
    }

    fn measure_until_full(
        &mut self,
        center: Option<usize>,
        cx: &mut dyn WidgetContainer,
        measured: &mut Vec<usize>,
    ) {
        let len = cx.len();
        if len == 0 {
            self.invalidate();
            return;
        }
        let half = self.half_extent();
        if !half.is_finite() || !cx.is_dynamic() {
            return self.measure_all(cx, measured);
        }
        if self.cache.is_empty() {
            let seed = center.unwrap_or(0).min(len - 1);
            let (size, start_pad, end_pad) = self.measure(cx, seed);
            self.cache.push(CacheEntry {
                data_index: seed,
                size,
                start_pad,
                end_pad,
                offset: self.anchor_for(size, start_pad, end_pad),
            });
        }
        while let Some(last) = self.cache.last() {
            if last.end_edge() >= half || last.data_index + 1 >= len {
                break;
            }
            let next = last.data_index + 1;
            self.append(cx, next);
        }
        while let Some(first) = self.cache.first() {
            if first.start_edge() <= -half || first.data_index == 0 {
                break;
            }
            let prev = first.data_index - 1;
            self.prepend(cx, prev);
        }
        // trim children that slid out of the viewport
        while self.cache.len() > 1 && !self.entry_in_viewport(&self.cache[0]) {
            self.cache.remove(0);
        }
        while self.cache.len() > 1
            && !self.entry_in_viewport(self.cache.last().expect("non-empty"))
        {
            self.cache.pop();
        }
        measured.extend(self.cache.iter().map(|e| e.data_index));
    }

    fn pre_measure_next(
        &mut self,
        cx: &mut dyn WidgetContainer,
        axis: Axis,
        direction: Direction,
        measured: &mut Vec<usize>,
    ) -> f32 {
        if axis != self.axis() || self.cache.is_empty() {
            return f32::NAN;
        }
        let old_total = self.total_with_padding();
        let sign = match direction {
            Direction::Forward => {
                let next = self.last_index().expect("non-empty cache") + 1;
                if next >= cx.len() {
                    return f32::NAN;
                }
                self.append(cx, next);
                measured.push(next);
                -1.0
            }
            Direction::Backward => {
                let first = self.first_index().expect("non-empty cache");
                if first == 0 {
                    return f32::NAN;
                }
                self.prepend(cx, first - 1);
                measured.push(first - 1);
                1.0
            }
            Direction::None => return f32::NAN,
        };
        sign * (self.total_with_padding() - old_total)
    }

    fn center_child(&self) -> Option<usize> {
        if self.cache.is_empty() {
            return None;
        }
        for entry in &self.cache {
            if entry.start_edge() <= 0.0 && entry.end_edge() > 0.0 {
                return Some(entry.data_index);
            }
        }
        self.cache
            .iter()
            .min_by(|a, b| {
                a.offset
                    .abs()
                    .partial_cmp(&b.offset.abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.data_index)
    }

    fn direction_to_child(&self, index: usize, axis: Axis) -> Direction {
        if axis != self.axis() {
            return Direction::None;
        }
        match self.entry(index) {
            Some(entry) => {
                let distance = self.anchor_for(entry.size, entry.start_pad, entry.end_pad)
                    - entry.offset;
                if approx_eq(distance, 0.0) {
                    Direction::None
                } else if distance < 0.0 {
                    Direction::Forward
                } else {
                    Direction::Backward
                }
            }
            None => match (self.first_index(), self.last_index()) {
                (Some(first), _) if index < first => Direction::Backward,
                (_, Some(last)) if index > last => Direction::Forward,
                _ => Direction::None,
            },
        }
    }

    fn distance_to_child(&self, index: usize, axis: Axis) -> f32 {
        if axis != self.axis() {
            return 0.0;
        }
        match self.entry(index) {
            Some(entry) => {
                self.anchor_for(entry.size, entry.start_pad, entry.end_pad) - entry.offset
            }
            None => f32::NAN,
        }
    }

    fn shift_by(&mut self, amount: f32, axis: Axis) {
        if axis != self.axis() || !amount.is_finite() {
            return;
        }
        for entry in &mut self.cache {
            entry.offset += amount;
        }
    }

    fn layout_children(&mut self, cx: &mut dyn WidgetContainer) {
        let axis = self.axis();
        let factor = self.factor();
        // entries borrow self, so collect before writing positions
        let placements: Vec<(usize, f32)> = self
            .cache
            .iter()
            .map(|e| (e.data_index, factor * e.offset))
            .collect();
        for (index, position) in placements {
            cx.set_position(index, axis, position);
        }
    }

    fn in_viewport(&self, index: usize) -> bool {
        self.entry(index)
            .is_some_and(|entry| self.entry_in_viewport(entry))
    }
}
