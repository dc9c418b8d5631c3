//! View model resolution
//!
//! Maps screens to logical type names and template names, and rebuilds
//! bookmarkable screens from URL parameters. Types are looked up in an
//! explicit registration table built by the application at startup.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::NavigationError;
use crate::view_model::{type_id_of, Parameters, ViewModel, ViewModelRef};
use crate::Result;

/// Suffix stripped from a type name to derive its view name
pub const DEFAULT_VIEW_SUFFIX: &str = "Model";

type Factory = Arc<dyn Fn(&Parameters) -> anyhow::Result<ViewModelRef> + Send + Sync>;

#[derive(Clone)]
pub struct ViewModelResolver {
    factories: HashMap<String, Factory>,
    type_names: HashMap<TypeId, String>,
    view_suffix: String,
}

impl ViewModelResolver {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            type_names: HashMap::new(),
            view_suffix: DEFAULT_VIEW_SUFFIX.to_string(),
        }
    }

    pub fn with_view_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.view_suffix = suffix.into();
        self
    }

    pub fn view_suffix(&self) -> &str {
        &self.view_suffix
    }

    /// Register a screen type under `type_name` with a factory that rebuilds
    /// it from bookmark parameters.
    pub fn register<T, F>(mut self, type_name: impl Into<String>, factory: F) -> Self
    where
        T: ViewModel + 'static,
        F: Fn(&Parameters) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        self.type_names.insert(TypeId::of::<T>(), type_name.clone());
        let build: Factory = Arc::new(move |params: &Parameters| {
            let view_model: ViewModelRef = Arc::new(factory(params)?);
            Ok(view_model)
        });
        self.factories.insert(type_name, build);
        self
    }

    /// Register a type name for a screen that is never rebuilt from a URL
    pub fn register_type<T: ViewModel + 'static>(mut self, type_name: impl Into<String>) -> Self {
        self.type_names.insert(TypeId::of::<T>(), type_name.into());
        self
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Logical type name of a screen.
    ///
    /// The instance-level name wins over the registration table.
    pub fn type_name(&self, view_model: &dyn ViewModel) -> Result<String> {
        if let Some(name) = view_model.type_name() {
            return Ok(name.to_string());
        }

        self.type_names
            .get(&type_id_of(view_model))
            .cloned()
            .ok_or_else(|| NavigationError::NotFound(format!("{:?}", view_model)))
    }

    /// Rebuild a bookmarkable screen.
    ///
    /// Never fails loudly: old or malformed bookmarks must degrade to "no
    /// match" as screens change shape between releases.
    pub fn create_view_model(
        &self,
        type_name: Option<&str>,
        parameters: &Parameters,
    ) -> Option<ViewModelRef> {
        let type_name = type_name.filter(|name| !name.is_empty())?;
        let factory = self.factories.get(type_name)?;

        match factory(parameters) {
            Ok(view_model) if view_model.bookmarkable() => Some(view_model),
            Ok(_) => {
                tracing::debug!(type_name, "Rebuilt view model is not bookmarkable");
                None
            }
            Err(e) => {
                tracing::debug!(type_name, error = %e, "Failed to rebuild view model");
                None
            }
        }
    }

    /// Build a registered screen directly, without the bookmark checks of
    /// `create_view_model`. Used for configured default and placeholder screens.
    pub fn instantiate(&self, type_name: &str, parameters: &Parameters) -> Result<ViewModelRef> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| NavigationError::NotFound(type_name.to_string()))?;

        factory(parameters).map_err(|e| NavigationError::Reconstruction {
            type_name: type_name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn type_to_view_name(&self, type_name: &str) -> String {
        type_name.replacen(&self.view_suffix, "", 1)
    }

    /// Template name for a screen.
    ///
    /// Whether the template exists is the template engine's concern.
    pub fn resolve_view(&self, view_model: Option<&dyn ViewModel>) -> Result<Option<String>> {
        let Some(view_model) = view_model else {
            return Ok(None);
        };

        if let Some(view_name) = view_model.view_name() {
            return Ok(Some(view_name.to_string()));
        }

        let type_name = self
            .type_name(view_model)
            .map_err(|_| NavigationError::Ambiguous)?;

        Ok(Some(self.type_to_view_name(&type_name)))
    }
}

impl Default for ViewModelResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewModelResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.type_names.values().collect();
        names.sort();

        f.debug_struct("ViewModelResolver")
            .field("types", &names)
            .field("view_suffix", &self.view_suffix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_model::QueryValue;

    #[derive(Debug)]
    struct OrderModel {
        id: f64,
    }

    impl ViewModel for OrderModel {
        fn bookmarkable(&self) -> bool {
            true
        }
    }

    #[derive(Debug)]
    struct DraftModel;

    impl ViewModel for DraftModel {}

    #[derive(Debug)]
    struct Named;

    impl ViewModel for Named {
        fn type_name(&self) -> Option<&str> {
            Some("CustomModel")
        }
    }

    #[derive(Debug)]
    struct Explicit;

    impl ViewModel for Explicit {
        fn view_name(&self) -> Option<&str> {
            Some("explicit-view")
        }
    }

    fn resolver() -> ViewModelResolver {
        ViewModelResolver::new()
            .register("OrderModel", |params: &Parameters| {
                let id = params
                    .get("id")
                    .and_then(QueryValue::as_f64)
                    .ok_or_else(|| anyhow::anyhow!("missing id"))?;
                Ok(OrderModel { id })
            })
            .register("DraftModel", |_: &Parameters| Ok(DraftModel))
    }

    #[test]
    fn test_type_name_precedence() {
        let resolver = resolver().register_type::<Named>("RegisteredName");

        assert_eq!(resolver.type_name(&Named).unwrap(), "CustomModel");
        assert_eq!(resolver.type_name(&OrderModel { id: 1.0 }).unwrap(), "OrderModel");
        assert!(matches!(
            resolver.type_name(&Explicit),
            Err(NavigationError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_view_model() {
        let resolver = resolver();
        let mut params = Parameters::new();
        params.insert("id".to_string(), QueryValue::Number(12.0));

        let vm = resolver
            .create_view_model(Some("OrderModel"), &params)
            .unwrap();
        let order = crate::view_model::downcast_ref::<OrderModel>(vm.as_ref()).unwrap();
        assert_eq!(order.id, 12.0);
    }

    #[test]
    fn test_create_view_model_failures_are_silent() {
        let resolver = resolver();
        let empty = Parameters::new();

        // Unknown or missing type
        assert!(resolver.create_view_model(Some("Missing"), &empty).is_none());
        assert!(resolver.create_view_model(Some(""), &empty).is_none());
        assert!(resolver.create_view_model(None, &empty).is_none());

        // Factory error
        assert!(resolver.create_view_model(Some("OrderModel"), &empty).is_none());

        // Not bookmarkable
        assert!(resolver.create_view_model(Some("DraftModel"), &empty).is_none());
    }

    #[test]
    fn test_instantiate_skips_bookmark_checks() {
        let resolver = resolver();
        let empty = Parameters::new();

        let draft = resolver.instantiate("DraftModel", &empty).unwrap();
        assert!(!draft.bookmarkable());

        assert!(matches!(
            resolver.instantiate("OrderModel", &empty),
            Err(NavigationError::Reconstruction { .. })
        ));
        assert!(matches!(
            resolver.instantiate("Missing", &empty),
            Err(NavigationError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_view() {
        let resolver = resolver();

        assert_eq!(resolver.resolve_view(None).unwrap(), None);
        assert_eq!(
            resolver.resolve_view(Some(&Explicit)).unwrap(),
            Some("explicit-view".to_string())
        );
        assert_eq!(
            resolver.resolve_view(Some(&DraftModel)).unwrap(),
            Some("Draft".to_string())
        );
        assert!(matches!(
            resolver.resolve_view(Some(&Named)),
            Ok(Some(ref view)) if view == "Custom"
        ));
    }

    #[test]
    fn test_resolve_view_ambiguous() {
        #[derive(Debug)]
        struct Anonymous;
        impl ViewModel for Anonymous {}

        assert!(matches!(
            resolver().resolve_view(Some(&Anonymous)),
            Err(NavigationError::Ambiguous)
        ));
    }

    #[test]
    fn test_custom_suffix() {
        let resolver = ViewModelResolver::new().with_view_suffix("Screen");
        assert_eq!(resolver.type_to_view_name("CartScreen"), "Cart");
        assert_eq!(resolver.type_to_view_name("CartModel"), "CartModel");
    }
}
