//! Navigation rendering binding
//!
//! Keeps one rendered element per item in `stack ∪ transient`, and on every
//! change of the current item classifies the move and hands the previous and
//! new elements to the configured transition.
//!
//! Changes are consumed from observable queues by [`NavigationBinding::update`],
//! so a host decides when rendering happens relative to history processing.
//! Stack and current-item changes are replayed in publish order, and each
//! current-item change is classified against the stack as it stood then.

use std::collections::VecDeque;
use std::fmt;

use waypoint_navigation::{
    position_of, same_item, CurrentItem, History, NavigationModel, Observable,
    ShellNavigationModel, Subscription, ViewModelRef,
};

use crate::error::RenderError;
use crate::template::{TemplateEngine, TemplateName};
use crate::transition::{Element, NavigationType, Transitions, DEFAULT_TRANSITION};
use crate::Result;

/// Observables and options the binding reads from
#[derive(Debug, Clone, Default)]
pub struct BindingConfig {
    pub current_item: Option<Observable<Option<CurrentItem>>>,
    pub navigation_stack: Option<Observable<Vec<ViewModelRef>>>,
    /// Defaults to `"default"`
    pub transition_key: Option<String>,
}

impl BindingConfig {
    pub fn new(
        current_item: Observable<Option<CurrentItem>>,
        navigation_stack: Observable<Vec<ViewModelRef>>,
    ) -> Self {
        Self {
            current_item: Some(current_item),
            navigation_stack: Some(navigation_stack),
            transition_key: None,
        }
    }

    pub fn from_shell<H: History>(model: &ShellNavigationModel<H>) -> Self {
        Self::new(model.current_item().clone(), model.navigation_stack().clone())
    }

    pub fn from_model(model: &NavigationModel) -> Self {
        Self::new(model.current_item().clone(), model.navigation_stack().clone())
    }

    pub fn with_transition_key(mut self, key: impl Into<String>) -> Self {
        self.transition_key = Some(key.into());
        self
    }
}

#[derive(Clone)]
enum Change {
    Stack(Vec<ViewModelRef>),
    Current(Option<CurrentItem>),
}

pub struct NavigationBinding<T: TemplateEngine> {
    engine: T,
    template: TemplateName,
    transitions: Transitions<T::Element>,
    transition_key: String,
    changes: Subscription<Option<CurrentItem>>,
    stack_changes: Subscription<Vec<ViewModelRef>>,
    backlog: VecDeque<Change>,
    /// The stack as of the last replayed stack change
    stack: Vec<ViewModelRef>,
    transient: Vec<ViewModelRef>,
    rendered: Vec<(ViewModelRef, T::Element)>,
    previous: Option<(ViewModelRef, T::Element)>,
}

impl<T: TemplateEngine> NavigationBinding<T> {
    /// Bind to the observables in `config`.
    ///
    /// The current value of `current_item` is queued, so the first `update`
    /// renders it as the `Initial` transition.
    pub fn new(
        config: BindingConfig,
        engine: T,
        template: TemplateName,
        transitions: Transitions<T::Element>,
    ) -> Result<Self> {
        let current_item = config
            .current_item
            .ok_or(RenderError::MissingContract("current_item"))?;
        let navigation_stack = config
            .navigation_stack
            .ok_or(RenderError::MissingContract("navigation_stack"))?;

        let transition_key = config
            .transition_key
            .unwrap_or_else(|| DEFAULT_TRANSITION.to_string());
        if !transitions.contains(&transition_key) {
            return Err(RenderError::UnknownTransition(transition_key));
        }

        let changes = current_item.subscribe();
        let stack_changes = navigation_stack.subscribe();
        let backlog = VecDeque::from([Change::Current(current_item.get())]);

        Ok(Self {
            engine,
            template,
            transitions,
            transition_key,
            changes,
            stack_changes,
            backlog,
            stack: navigation_stack.get(),
            transient: Vec::new(),
            rendered: Vec::new(),
            previous: None,
        })
    }

    /// Process every queued change, oldest first.
    ///
    /// Returns the transitions that ran. On error the failed change stays
    /// queued and the rendered set is left as it was.
    pub fn update(&mut self) -> Result<Vec<NavigationType>> {
        self.collect_changes();

        let mut transitions = Vec::new();
        while let Some(change) = self.backlog.front().cloned() {
            match change {
                Change::Stack(stack) => {
                    self.sync_elements(&stack)?;
                    self.stack = stack;
                }
                Change::Current(Some(current)) => {
                    if let Some(navigation_type) = self.apply(current.effective().clone())? {
                        transitions.push(navigation_type);
                    }
                }
                Change::Current(None) => {}
            }
            self.backlog.pop_front();
        }

        Ok(transitions)
    }

    /// Merge both subscriptions into the backlog in publish order
    fn collect_changes(&mut self) {
        let mut changes: Vec<(u64, Change)> = self
            .stack_changes
            .drain_sequenced()
            .into_iter()
            .map(|(sequence, stack)| (sequence, Change::Stack(stack)))
            .collect();
        changes.extend(
            self.changes
                .drain_sequenced()
                .into_iter()
                .map(|(sequence, current)| (sequence, Change::Current(current))),
        );

        changes.sort_by_key(|(sequence, _)| *sequence);
        self.backlog
            .extend(changes.into_iter().map(|(_, change)| change));
    }

    pub fn engine(&self) -> &T {
        &self.engine
    }

    /// Items with a rendered element, stack order first
    pub fn rendered_items(&self) -> Vec<ViewModelRef> {
        self.rendered.iter().map(|(item, _)| item.clone()).collect()
    }

    pub fn element_for(&self, item: &ViewModelRef) -> Option<&T::Element> {
        self.rendered
            .iter()
            .find(|(rendered, _)| same_item(rendered, item))
            .map(|(_, element)| element)
    }

    pub fn transient_items(&self) -> &[ViewModelRef] {
        &self.transient
    }

    pub fn current_element(&self) -> Option<&T::Element> {
        self.previous.as_ref().map(|(_, element)| element)
    }

    fn apply(&mut self, item: ViewModelRef) -> Result<Option<NavigationType>> {
        let stack = self.stack.clone();

        if position_of(&stack, &item).is_none() && !self.is_transient(&item) {
            self.transient.push(item.clone());
        }
        self.sync_elements(&stack)?;

        if matches!(&self.previous, Some((previous, _)) if same_item(previous, &item)) {
            return Ok(None);
        }

        let element = self
            .element_for(&item)
            .cloned()
            .ok_or_else(|| RenderError::Template(format!("No element rendered for {:?}", item)))?;

        let (from_transient, from_index) = match &self.previous {
            Some((previous, _)) => (self.is_transient(previous), index_of(&stack, previous)),
            None => (false, -1),
        };
        let navigation_type = NavigationType::classify(
            self.previous.is_some(),
            from_transient,
            self.is_transient(&item),
            index_of(&stack, &item) - from_index,
        );

        let previous_element = self.previous.as_ref().map(|(_, element)| element.clone());
        self.transitions.run(
            &self.transition_key,
            previous_element.as_ref(),
            &element,
            navigation_type,
        )?;
        tracing::debug!(navigation_type = %navigation_type, key = %self.transition_key, "Transition");

        let vacated = self.previous.replace((item, element)).map(|(item, _)| item);

        // The vacated transient item is only released after the previous-item
        // memory moved on, so the handler still had its element
        if navigation_type == NavigationType::FromTransient {
            if let Some(vacated) = vacated {
                self.transient.retain(|item| !same_item(item, &vacated));
                self.sync_elements(&stack)?;
            }
        }

        Ok(Some(navigation_type))
    }

    fn is_transient(&self, item: &ViewModelRef) -> bool {
        position_of(&self.transient, item).is_some()
    }

    /// Render elements for new items and drop those for vanished ones
    fn sync_elements(&mut self, stack: &[ViewModelRef]) -> Result<()> {
        let mut wanted = stack.to_vec();
        for item in &self.transient {
            if position_of(&wanted, item).is_none() {
                wanted.push(item.clone());
            }
        }

        let mut next = Vec::with_capacity(wanted.len());
        let mut fresh: Vec<T::Element> = Vec::new();
        for item in wanted {
            let existing = self
                .rendered
                .iter()
                .find(|(rendered, _)| same_item(rendered, &item))
                .map(|(_, element)| element.clone());

            let element = match existing {
                Some(element) => element,
                None => match self.engine.render(&self.template, &item) {
                    Ok(element) => {
                        element.hide();
                        fresh.push(element.clone());
                        element
                    }
                    Err(e) => {
                        // Nothing rendered in a failed pass is kept
                        for element in &fresh {
                            element.remove();
                        }
                        return Err(e);
                    }
                },
            };
            next.push((item, element));
        }

        let mut dropped = 0;
        for (item, element) in &self.rendered {
            if !next.iter().any(|(kept, _)| same_item(kept, item)) {
                element.remove();
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, rendered = next.len(), "Dropped rendered screens");
        }

        self.rendered = next;
        Ok(())
    }
}

fn index_of(stack: &[ViewModelRef], item: &ViewModelRef) -> isize {
    position_of(stack, item).map_or(-1, |index| index as isize)
}

impl<T: TemplateEngine> fmt::Debug for NavigationBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationBinding")
            .field("template", &self.template)
            .field("transition_key", &self.transition_key)
            .field("rendered", &self.rendered.len())
            .field("transient", &self.transient.len())
            .field("pending", &self.backlog.len())
            .finish()
    }
}
