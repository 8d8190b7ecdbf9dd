//! Adapter contract between a data set and a list.
//!
//! Adapters are consulted lazily: the list engine asks for item views only
//! when the layout needs them, and hands back recycled views for rebinding.
//! Data-set change notifications may arrive from any thread; the observer
//! registry is the synchronized edge that marshals them toward the update
//! tick.

use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;

use reticle_core::AxisVec;

use crate::ui::Ui;
use crate::widget::{WidgetError, WidgetId};

/// Watches an adapter's data set. `on_changed` means contents changed but
/// the set is still valid; `on_invalidated` means the data is gone.
pub trait DataSetObserver: Send + Sync {
    fn on_changed(&self);
    fn on_invalidated(&self) {
        self.on_changed();
    }
}

/// Thread-safe fan-out list for [`DataSetObserver`]s.
#[derive(Default, Clone)]
pub struct ObserverRegistry {
    observers: Arc<Mutex<Vec<Arc<dyn DataSetObserver>>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn DataSetObserver>) {
        self.observers.lock().push(observer);
    }

    pub fn unregister(&self, observer: &Arc<dyn DataSetObserver>) {
        self.observers.lock().retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub fn notify_changed(&self) {
        let observers = self.observers.lock().clone();
        for o in &observers {
            o.on_changed();
        }
    }

    pub fn notify_invalidated(&self) {
        let observers = self.observers.lock().clone();
        for o in &observers {
            o.on_invalidated();
        }
    }
}

/// Supplies item views for a list. Implementations live on the update thread;
/// only observer notification crosses threads.
pub trait Adapter {
    fn count(&self) -> usize;

    /// Creates or rebinds the view for `index`. `recycled` is a previously
    /// bound view of the same kind when one is available; `host` is the
    /// parent the returned view is (or will be) attached to.
    fn bind_view(
        &mut self,
        ui: &mut Ui,
        index: usize,
        recycled: Option<WidgetId>,
        host: WidgetId,
    ) -> Result<WidgetId, WidgetError>;

    fn item_id(&self, index: usize) -> i64 {
        index as i64
    }

    /// When every item has the same extents, returning them here lets the
    /// layout measure without materializing views.
    fn uniform_view_size(&self) -> Option<AxisVec> {
        None
    }

    fn register_observer(&self, observer: Arc<dyn DataSetObserver>);

    fn unregister_observer(&self, observer: &Arc<dyn DataSetObserver>);
}

pub type SharedAdapter = Rc<std::cell::RefCell<dyn Adapter>>;
