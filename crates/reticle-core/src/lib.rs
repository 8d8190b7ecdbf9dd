//! # Reticle core runtime
//!
//! The pieces every Reticle crate builds on:
//!
//! - [`geometry`] — axis math: [`Axis`], [`Vec3`], [`Transform3`], and
//!   [`AxisVec`], the per-axis extent/offset helper whose NaN/∞ values are
//!   sentinels for "no constraint", never errors.
//! - [`scene`] — the host engine boundary: the [`SceneHost`] trait the widget
//!   layer talks to, the opaque [`NodeId`] handle, ordered [`PickHit`] lists,
//!   and [`LocalScene`], a slotmap-backed reference implementation with a
//!   ray pick for tests and engine-less hosts.
//! - [`schedule`] — [`UpdateQueue`], the cloneable "run on the update thread,
//!   optionally after a delay, cancellable" primitive. All cross-thread entry
//!   into the toolkit funnels through these queues; delivery happens when the
//!   single update thread drains them.
//! - [`animation`] — [`Easing`] curves and the [`Clock`] abstraction that
//!   makes scroll animation deterministic under test.

pub mod animation;
pub mod geometry;
pub mod scene;
pub mod schedule;

#[cfg(test)]
mod tests;

pub use animation::{Clock, Easing, ManualClock, SystemClock};
pub use geometry::{Axis, AxisVec, BoundingBox, Quat, Transform3, Vec3, approx_eq};
pub use scene::{LocalScene, NodeId, PickHit, SceneError, SceneHost};
pub use schedule::{DelayToken, UpdateQueue};
