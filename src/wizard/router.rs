use std::collections::HashMap;

use serde_json::Value;

use super::component::{NullStep, StepComponent};
use super::domain::{StepDescriptor, StepKind};

type ComponentFactory = Box<dyn Fn() -> Box<dyn StepComponent> + Send + Sync>;

/// Selects which step component to mount for a descriptor.
///
/// Dispatch is keyed on the closed [`StepKind`] catalog rather than raw
/// bundle strings; descriptors whose bundle falls outside the catalog, or
/// kinds without a registered factory, mount a [`NullStep`].
#[derive(Default)]
pub struct StepRouter {
    factories: HashMap<StepKind, ComponentFactory>,
}

impl StepRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the component factory for one step kind, replacing any
    /// previous registration.
    pub fn register<F>(&mut self, kind: StepKind, factory: F)
    where
        F: Fn() -> Box<dyn StepComponent> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
    }

    /// Mount the component for `descriptor`, seeding it from `value` when a
    /// cached payload exists.
    pub fn mount(&self, descriptor: &StepDescriptor, value: Option<Value>) -> Box<dyn StepComponent> {
        let mut component: Box<dyn StepComponent> = match descriptor.kind() {
            Some(kind) => match self.factories.get(&kind) {
                Some(factory) => factory(),
                None => Box::new(NullStep),
            },
            None => {
                tracing::warn!(
                    bundle = %descriptor.component_bundle,
                    step = %descriptor.developer_name,
                    "unknown component bundle, mounting null step"
                );
                Box::new(NullStep)
            }
        };

        if let Some(value) = value {
            component.seed(value);
        }

        component
    }
}
