//! Widget type → filler dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::classifier::WidgetType;
use crate::config::EngineConfig;
use crate::field::Field;
use crate::fill::{
    CheckboxFiller, ComboboxFiller, CustomComboboxFiller, DirectFiller, FillTarget, Filler,
    NotFoundFiller, RadioFiller, SelectFiller, TextFiller,
};

pub type FillerFactory = fn(FillTarget) -> Box<dyn Filler>;

/// Maps each [`WidgetType`] to the filler that drives it. New widget
/// variants plug in through [`FillerRegistry::register`].
#[derive(Clone)]
pub struct FillerRegistry {
    factories: HashMap<WidgetType, FillerFactory>,
}

impl FillerRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(WidgetType::Textbox, |t| {
            Box::new(TextFiller::new(t, WidgetType::Textbox))
        });
        registry.register(WidgetType::Textarea, |t| {
            Box::new(TextFiller::new(t, WidgetType::Textarea))
        });
        registry.register(WidgetType::Number, |t| {
            Box::new(DirectFiller::new(t, WidgetType::Number))
        });
        registry.register(WidgetType::Date, |t| {
            Box::new(DirectFiller::new(t, WidgetType::Date))
        });
        registry.register(WidgetType::Checkbox, |t| Box::new(CheckboxFiller::new(t)));
        registry.register(WidgetType::Radio, |t| Box::new(RadioFiller::new(t)));
        registry.register(WidgetType::Select, |t| Box::new(SelectFiller::new(t)));
        registry.register(WidgetType::Combobox, |t| Box::new(ComboboxFiller::new(t)));
        registry.register(WidgetType::CustomCombobox, |t| {
            Box::new(CustomComboboxFiller::new(t))
        });
        registry
    }

    /// Replace the factory for `widget`.
    pub fn register(&mut self, widget: WidgetType, factory: FillerFactory) -> &mut Self {
        self.factories.insert(widget, factory);
        self
    }

    pub fn is_registered(&self, widget: WidgetType) -> bool {
        self.factories.contains_key(&widget)
    }

    /// Filler for a resolved field. The not-found sentinel always gets the
    /// no-op filler; a type with no registered factory is typed into as text.
    pub fn create(&self, field: &Field, config: Arc<EngineConfig>) -> Box<dyn Filler> {
        let (Some(context), Some(element)) = (field.context(), field.element()) else {
            return Box::new(NotFoundFiller);
        };
        if field.widget() == WidgetType::NotFound {
            return Box::new(NotFoundFiller);
        }
        let target = FillTarget {
            key: field.key().to_string(),
            context: context.clone(),
            element: element.clone(),
            config,
        };
        match self.factories.get(&field.widget()) {
            Some(factory) => factory(target),
            None => Box::new(TextFiller::new(target, field.widget())),
        }
    }
}

impl Default for FillerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
