//! Template engine collaborator
//!
//! The binding hands each stack item to a `TemplateEngine` together with a
//! template name. In auto-resolve mode the name is a function evaluated per
//! item, normally the resolver's `resolve_view`.

use std::fmt;
use std::sync::Arc;

use waypoint_navigation::{ViewModel, ViewModelRef, ViewModelResolver};

use crate::transition::Element;
use crate::Result;

type ResolveFn = Arc<dyn Fn(&dyn ViewModel) -> Result<Option<String>> + Send + Sync>;

#[derive(Clone)]
pub enum TemplateName {
    Named(String),
    Resolve(ResolveFn),
}

impl TemplateName {
    /// Resolve the template from each item's type name or explicit view name
    pub fn auto(resolver: Arc<ViewModelResolver>) -> Self {
        let resolve: ResolveFn = Arc::new(
            move |view_model: &dyn ViewModel| -> Result<Option<String>> {
                Ok(resolver.resolve_view(Some(view_model))?)
            },
        );
        TemplateName::Resolve(resolve)
    }

    pub fn resolve(&self, view_model: &dyn ViewModel) -> Result<Option<String>> {
        match self {
            TemplateName::Named(name) => Ok(Some(name.clone())),
            TemplateName::Resolve(resolve) => resolve(view_model),
        }
    }
}

impl From<&str> for TemplateName {
    fn from(name: &str) -> Self {
        TemplateName::Named(name.to_string())
    }
}

impl fmt::Debug for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateName::Named(name) => f.debug_tuple("Named").field(name).finish(),
            TemplateName::Resolve(_) => f.write_str("Resolve"),
        }
    }
}

pub trait TemplateEngine {
    type Element: Element;

    /// Render `item` into a new element
    fn render(&mut self, template: &TemplateName, item: &ViewModelRef) -> Result<Self::Element>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use waypoint_navigation::NavigationError;

    #[derive(Debug)]
    struct InvoiceModel;

    impl ViewModel for InvoiceModel {}

    #[derive(Debug)]
    struct Unregistered;

    impl ViewModel for Unregistered {}

    #[test]
    fn test_auto_resolve() {
        let resolver =
            Arc::new(ViewModelResolver::new().register_type::<InvoiceModel>("InvoiceModel"));
        let template = TemplateName::auto(resolver);

        assert_eq!(
            template.resolve(&InvoiceModel).unwrap(),
            Some("Invoice".to_string())
        );
        assert!(matches!(
            template.resolve(&Unregistered),
            Err(RenderError::Navigation(NavigationError::Ambiguous))
        ));
    }

    #[test]
    fn test_named_ignores_item() {
        let template = TemplateName::from("layout");
        assert_eq!(
            template.resolve(&Unregistered).unwrap(),
            Some("layout".to_string())
        );
    }
}
