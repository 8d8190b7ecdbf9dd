//! Widget factories keyed by type tag.
//!
//! Serialized UI descriptions name widget kinds by string tag; the registry
//! maps each tag to a construction closure so embedders can extend the set
//! without the library knowing their types.

use std::collections::HashMap;

use crate::layout::{Gravity, LinearLayout, Orientation};
use crate::ui::Ui;
use crate::widget::{WidgetError, WidgetId};

pub type WidgetFactory = Box<dyn Fn(&mut Ui, &WidgetSpec) -> Result<WidgetId, WidgetError>>;

/// Parameters handed to a factory. Extents default to zero for group-like
/// widgets.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct WidgetSpec {
    pub name: String,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub gravity: Gravity,
}

pub struct WidgetRegistry {
    factories: HashMap<String, WidgetFactory>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetRegistry {
    /// Registry pre-populated with the built-in widget kinds.
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("group", |ui, spec| ui.create_group(&spec.name));
        registry.register("quad", |ui, spec| {
            ui.create_quad(&spec.name, spec.width, spec.height)
        });
        registry
    }

    pub fn register(
        &mut self,
        tag: &str,
        factory: impl Fn(&mut Ui, &WidgetSpec) -> Result<WidgetId, WidgetError> + 'static,
    ) {
        self.factories.insert(tag.to_owned(), Box::new(factory));
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn create(
        &self,
        ui: &mut Ui,
        tag: &str,
        spec: &WidgetSpec,
    ) -> Result<WidgetId, WidgetError> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| WidgetError::UnknownType(tag.to_owned()))?;
        factory(ui, spec)
    }

    /// Convenience for specs that describe a layout rather than a widget.
    pub fn layout_from_spec(spec: &WidgetSpec) -> LinearLayout {
        LinearLayout::new(spec.orientation, spec.gravity)
    }
}
