//! Collector registry: named factories instantiated once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::collector::status;
use crate::collector::{Collector, CollectorContext, CollectorError};

/// Builds a collector from the run context.
pub type CollectorFactory =
    Box<dyn Fn(&CollectorContext) -> Result<Arc<dyn Collector>, CollectorError> + Send + Sync>;

/// Instantiated collectors keyed by registered name.
pub type CollectorSet = BTreeMap<String, Arc<dyn Collector>>;

/// Table of collector factories.
///
/// Registering under an existing name replaces the previous factory.
#[derive(Default)]
pub struct CollectorRegistry {
    factories: BTreeMap<String, CollectorFactory>,
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CollectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in collector.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(status::NAME, status::factory);
        registry
    }

    /// Register a collector factory under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&CollectorContext) -> Result<Arc<dyn Collector>, CollectorError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        tracing::debug!(collector = %name, "Registering collector");
        if self.factories.insert(name.clone(), Box::new(factory)).is_some() {
            tracing::debug!(collector = %name, "Replaced previously registered collector");
        }
        self
    }

    /// Registered collector names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Run every factory with `ctx`.
    ///
    /// # Errors
    /// Fails on the first factory error with `CollectorError::Construction`;
    /// no partial set is returned.
    pub fn instantiate(&self, ctx: &CollectorContext) -> Result<CollectorSet, CollectorError> {
        let mut collectors = CollectorSet::new();
        for (name, factory) in &self.factories {
            tracing::debug!(collector = %name, "Creating collector");
            let collector = factory(ctx).map_err(|e| CollectorError::Construction {
                name: name.clone(),
                source: Box::new(e),
            })?;
            collectors.insert(name.clone(), collector);
        }
        Ok(collectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::{ListError, Release, ReleaseLister};
    use crate::metric::{Desc, Sample, SampleSink};

    struct EmptyLister;

    #[async_trait::async_trait]
    impl ReleaseLister for EmptyLister {
        async fn list_releases(&self) -> Result<Vec<Release>, ListError> {
            Ok(Vec::new())
        }
    }

    /// Emits a single sample with a fixed value.
    struct ConstCollector {
        desc: Arc<Desc>,
        value: f64,
    }

    #[async_trait::async_trait]
    impl Collector for ConstCollector {
        async fn update(&self, sink: &SampleSink) -> Result<(), CollectorError> {
            sink.emit(Sample::gauge(&self.desc, self.value, Vec::<String>::new())?);
            Ok(())
        }
    }

    fn constant(value: f64) -> impl Fn(&CollectorContext) -> Result<Arc<dyn Collector>, CollectorError> {
        move |ctx| {
            let collector: Arc<dyn Collector> = Arc::new(ConstCollector {
                desc: Arc::new(Desc::new(format!("{}_const", ctx.namespace), "const", &[])),
                value,
            });
            Ok(collector)
        }
    }

    fn ctx() -> CollectorContext {
        CollectorContext::new("test", Arc::new(EmptyLister))
    }

    #[test]
    fn test_with_builtin_registers_status() {
        let registry = CollectorRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["status"]);
        let collectors = registry.instantiate(&ctx()).unwrap();
        assert!(collectors.contains_key("status"));
    }

    #[tokio::test]
    async fn test_register_last_wins() {
        let mut registry = CollectorRegistry::new();
        registry.register("const", constant(1.0));
        registry.register("const", constant(2.0));
        assert_eq!(registry.len(), 1);

        let collectors = registry.instantiate(&ctx()).unwrap();
        let (sink, rx) = SampleSink::channel();
        collectors["const"].update(&sink).await.unwrap();
        drop(sink);

        let samples = crate::metric::drain(rx).await;
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(), 2.0);
        assert_eq!(samples[0].desc().fq_name, "test_const");
    }

    #[test]
    fn test_instantiate_fails_whole_set() {
        let mut registry = CollectorRegistry::new();
        registry.register("good", constant(1.0));
        registry.register("broken", |_: &CollectorContext| -> Result<Arc<dyn Collector>, CollectorError> {
            Err(CollectorError::Config("boom".to_string()))
        });

        match registry.instantiate(&ctx()) {
            Err(CollectorError::Construction { name, .. }) => assert_eq!(name, "broken"),
            Err(other) => panic!("expected Construction, got {other:?}"),
            Ok(set) => panic!("expected failure, got {} collectors", set.len()),
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = CollectorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.instantiate(&ctx()).unwrap().is_empty());
    }
}
