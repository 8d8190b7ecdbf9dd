//! Retained-mode widget layer for gaze-driven 3D interfaces.
//!
//! Builds on `reticle-core`'s scene abstraction with a widget tree, focus and
//! touch routing driven by per-frame pick results, an incremental layout
//! contract, and an adapter-backed list engine that virtualizes item views.
//!
//! Threading model: everything here runs on a single update thread. Data-set
//! changes from other threads cross over through command queues and are
//! applied at the next update tick.

pub mod adapter;
pub mod focus;
pub mod layout;
pub mod list;
pub mod registry;
pub mod touch;
pub mod ui;
pub mod widget;

#[cfg(test)]
mod tests;

pub use adapter::{Adapter, DataSetObserver, ObserverRegistry, SharedAdapter};
pub use focus::{CurrentFocusListener, FocusRouter};
pub use layout::{
    Direction, Gravity, Layout, LinearLayout, Orientation, Viewport, WidgetContainer,
};
pub use list::{ListCommand, ListConfig, ListEngine, ListListener, ScrollTarget};
pub use registry::{WidgetRegistry, WidgetSpec};
pub use touch::{ClickEvent, TouchRouter};
pub use ui::Ui;
pub use widget::{
    ListenerId, OnFocusListener, OnTouchListener, ViewportVisibility, Visibility, WidgetError,
    WidgetEvent, WidgetFlags, WidgetId, WidgetState, WidgetTree,
};
