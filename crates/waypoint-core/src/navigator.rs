//! Navigation dispatcher
//!
//! Owns the shell model and its rendering binding, and runs every user call
//! as the same ordered steps: the call itself, then the resulting history
//! notifications, then the render transitions they cause.

use std::fmt;
use std::sync::Arc;

use waypoint_navigation::{
    DefaultViewModel, History, HistoryHandle, Parameters, ShellNavigationModel, ShellOptions,
    ViewModelRef, ViewModelResolver,
};
use waypoint_render::{
    BindingConfig, NavigationBinding, NavigationType, TemplateEngine, TemplateName, Transitions,
};

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct Navigator<H: History, T: TemplateEngine> {
    shell: ShellNavigationModel<H>,
    binding: NavigationBinding<T>,
}

impl<H: History, T: TemplateEngine> Navigator<H, T> {
    /// Install on `history` with templates resolved from screen type names
    pub fn new(
        config: &Config,
        history: &HistoryHandle<H>,
        resolver: ViewModelResolver,
        engine: T,
        transitions: Transitions<T::Element>,
    ) -> Result<Self> {
        let resolver = Arc::new(configure(resolver, config));
        let template = TemplateName::auto(Arc::clone(&resolver));
        Self::build(config, history, resolver, engine, template, transitions)
    }

    /// Install on `history`, rendering every screen with `template`
    pub fn with_template(
        config: &Config,
        history: &HistoryHandle<H>,
        resolver: ViewModelResolver,
        engine: T,
        template: TemplateName,
        transitions: Transitions<T::Element>,
    ) -> Result<Self> {
        let resolver = Arc::new(configure(resolver, config));
        Self::build(config, history, resolver, engine, template, transitions)
    }

    fn build(
        config: &Config,
        history: &HistoryHandle<H>,
        resolver: Arc<ViewModelResolver>,
        engine: T,
        template: TemplateName,
        transitions: Transitions<T::Element>,
    ) -> Result<Self> {
        let screen = |type_name: Option<&str>| -> Result<Option<ViewModelRef>> {
            let Some(type_name) = type_name else {
                return Ok(None);
            };

            resolver
                .instantiate(type_name, &Parameters::new())
                .map(Some)
                .map_err(|e| CoreError::Config(format!("Screen '{}': {}", type_name, e)))
        };

        let options = ShellOptions {
            default_view_model: screen(config.default_screen.as_deref())?
                .map(DefaultViewModel::Instance),
            expired_view_model: screen(config.expired_screen.as_deref())?,
            max_stack_size: config.max_stack_size,
        };

        let shell = ShellNavigationModel::new(history, Arc::clone(&resolver), options)?;
        let binding = NavigationBinding::new(
            BindingConfig::from_shell(&shell).with_transition_key(config.transition_key.clone()),
            engine,
            template,
            transitions,
        )?;

        let mut navigator = Self { shell, binding };
        let initial = navigator.settle()?;

        tracing::info!(
            transitions = initial.len(),
            key = %config.transition_key,
            "Navigator started"
        );

        Ok(navigator)
    }

    pub fn navigate_to(&mut self, view_model: ViewModelRef) -> Result<Vec<NavigationType>> {
        self.shell.navigate_to(view_model)?;
        self.settle()
    }

    pub fn back(&mut self) -> Result<Vec<NavigationType>> {
        self.shell.back();
        self.settle()
    }

    pub fn forward(&mut self) -> Result<Vec<NavigationType>> {
        self.shell.forward();
        self.settle()
    }

    /// Reconcile pending history notifications, then render the resulting
    /// changes. Call after history moved on its own (a typed URL, the
    /// browser's back button).
    pub fn settle(&mut self) -> Result<Vec<NavigationType>> {
        let handled = self.shell.pump();
        let transitions = self.binding.update()?;

        if handled > 0 {
            tracing::debug!(handled, transitions = ?transitions, "Settled history changes");
        }

        Ok(transitions)
    }

    pub fn current(&self) -> Option<ViewModelRef> {
        self.shell.current()
    }

    pub fn can_go_back(&self) -> bool {
        self.shell.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.shell.can_go_forward()
    }

    pub fn shell(&self) -> &ShellNavigationModel<H> {
        &self.shell
    }

    pub fn binding(&self) -> &NavigationBinding<T> {
        &self.binding
    }

    pub fn resolver(&self) -> &Arc<ViewModelResolver> {
        self.shell.resolver()
    }
}

fn configure(resolver: ViewModelResolver, config: &Config) -> ViewModelResolver {
    match &config.view_suffix {
        Some(suffix) => resolver.with_view_suffix(suffix.clone()),
        None => resolver,
    }
}

impl<H: History, T: TemplateEngine> fmt::Debug for Navigator<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("shell", &self.shell)
            .field("binding", &self.binding)
            .finish()
    }
}
