//! Component definitions and factories

use std::fmt;
use std::sync::Arc;

use vitrine_core::component::Component;

/// Factory for building component values
pub trait ComponentFactory: Send + Sync + 'static {
    /// Build a fresh component instance
    fn create(&self) -> Arc<dyn Component>;
}

impl<F> ComponentFactory for F
where
    F: Fn() -> Arc<dyn Component> + Send + Sync + 'static,
{
    fn create(&self) -> Arc<dyn Component> {
        (self)()
    }
}

/// A construction recipe stored in the registry
///
/// Uniquely keyed by `name`. `singleton` definitions produce at most one live
/// instance; `lazy` defers a singleton's instantiation to the first `create`
/// call instead of registration time (it has no effect on non-singletons).
#[derive(Clone)]
pub struct ComponentDefinition {
    /// The type name instances are created under
    pub name: String,
    /// Factory invoked per instance
    pub factory: Arc<dyn ComponentFactory>,
    /// At most one live instance
    pub singleton: bool,
    /// Defer singleton instantiation to first use
    pub lazy: bool,
}

impl ComponentDefinition {
    /// Create a definition with default flags (non-singleton, eager)
    pub fn new(name: impl Into<String>, factory: impl ComponentFactory) -> Self {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            singleton: false,
            lazy: false,
        }
    }

    /// Mark this definition as a singleton
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Defer singleton instantiation to first use
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("singleton", &self.singleton)
            .field("lazy", &self.lazy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vitrine_core::component::ComponentContext;

    struct Blank;

    #[async_trait]
    impl Component for Blank {
        fn type_name(&self) -> &str {
            "Blank"
        }
        fn render(&self, _ctx: &ComponentContext) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_builder_flags() {
        let definition =
            ComponentDefinition::new("Blank", || Arc::new(Blank) as Arc<dyn Component>)
                .singleton()
                .lazy();
        assert_eq!(definition.name, "Blank");
        assert!(definition.singleton);
        assert!(definition.lazy);
    }

    #[test]
    fn test_factory_builds_components() {
        let definition =
            ComponentDefinition::new("Blank", || Arc::new(Blank) as Arc<dyn Component>);
        let component = definition.factory.create();
        assert_eq!(component.type_name(), "Blank");
    }
}
