// =============================================================================
// Adapter Registry
// =============================================================================
//
// Maps a model-kind tag to the extraction logic that produces its three
// tabular views. New model families plug in without touching any caller:
// implement `TidyModel` for the fit-result type and register it under its
// kind tag.
//
// Two layers:
//
//   - `TidyModel` is the typed capability set a model kind implements
//     (term rows, summary row, augmented rows).
//   - `ModelAdapter` is the erased surface the registry stores; the typed
//     shim downcasts the opaque result handle exactly once, at the
//     registry boundary, so extraction code stays fully typed.
//
// Lookup of an unregistered kind is `UnsupportedModelKind` - never a
// partial result.
//
// =============================================================================

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::error::{Result, TidyError};
use crate::frame::Frame;
use crate::models::{CorrelationFit, LinearFit, ModelResult};
use crate::tidy::{AugmentedRow, SummaryRow, TermRow};

/// The capability set a model kind implements to join the registry.
///
/// All three extractions are pure: they read the finished result and never
/// mutate it.
pub trait TidyModel: ModelResult + Sized {
    /// The kind tag this model registers under. Must match
    /// [`ModelResult::kind`] for the same type.
    const KIND: &'static str;

    /// One row per estimated term, in fitting order.
    fn term_rows(&self) -> Vec<TermRow>;

    /// Exactly one row of fit statistics.
    fn summary_row(&self) -> SummaryRow;

    /// One row per original observation, aligned with `data`'s rows.
    fn augmented_rows(&self, data: &Frame) -> Result<Vec<AugmentedRow>>;
}

/// Type-erased extraction surface stored by the registry.
pub trait ModelAdapter: Send + Sync {
    fn term_rows(&self, model: &dyn ModelResult) -> Result<Vec<TermRow>>;
    fn summary_row(&self, model: &dyn ModelResult) -> Result<SummaryRow>;
    fn augmented_rows(&self, model: &dyn ModelResult, data: &Frame) -> Result<Vec<AugmentedRow>>;
}

/// Bridges the erased adapter surface to a typed `TidyModel` impl.
struct TypedAdapter<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M> TypedAdapter<M> {
    fn new() -> Self {
        TypedAdapter {
            _marker: PhantomData,
        }
    }
}

impl<M: TidyModel> TypedAdapter<M> {
    fn downcast<'a>(&self, model: &'a dyn ModelResult) -> Result<&'a M> {
        model
            .as_any()
            .downcast_ref::<M>()
            .ok_or_else(|| TidyError::AdapterMismatch(M::KIND.to_string()))
    }
}

impl<M: TidyModel> ModelAdapter for TypedAdapter<M> {
    fn term_rows(&self, model: &dyn ModelResult) -> Result<Vec<TermRow>> {
        Ok(self.downcast(model)?.term_rows())
    }

    fn summary_row(&self, model: &dyn ModelResult) -> Result<SummaryRow> {
        Ok(self.downcast(model)?.summary_row())
    }

    fn augmented_rows(&self, model: &dyn ModelResult, data: &Frame) -> Result<Vec<AugmentedRow>> {
        self.downcast(model)?.augmented_rows(data)
    }
}

/// Registry of model-kind adapters.
///
/// `with_builtins` covers the kinds this crate ships; `register_model`
/// adds externally defined ones. Registering a kind twice replaces the
/// earlier adapter.
pub struct AdapterRegistry {
    adapters: HashMap<String, Box<dyn ModelAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry with no kinds.
    pub fn new() -> Self {
        AdapterRegistry {
            adapters: HashMap::new(),
        }
    }

    /// A registry with every built-in model kind registered.
    pub fn with_builtins() -> Self {
        let mut registry = AdapterRegistry::new();
        registry.register_model::<LinearFit>();
        registry.register_model::<CorrelationFit>();
        registry
    }

    /// Register a typed model kind under its `KIND` tag.
    pub fn register_model<M: TidyModel + 'static>(&mut self) {
        self.register(M::KIND, Box::new(TypedAdapter::<M>::new()));
    }

    /// Register an adapter under an explicit kind tag.
    pub fn register(&mut self, kind: &str, adapter: Box<dyn ModelAdapter>) {
        self.adapters.insert(kind.to_string(), adapter);
    }

    /// Look up the adapter for a kind tag.
    pub fn get(&self, kind: &str) -> Result<&dyn ModelAdapter> {
        self.adapters
            .get(kind)
            .map(|a| a.as_ref())
            .ok_or_else(|| TidyError::UnsupportedModelKind(kind.to_string()))
    }

    /// Is this kind registered?
    pub fn contains(&self, kind: &str) -> bool {
        self.adapters.contains_key(kind)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        AdapterRegistry::with_builtins()
    }
}

// =============================================================================
// Tests
// =============================================================================
