//! Transition classification
//!
//! Eight ways the displayed screen can change:
//! ```text
//! Initial        nothing was shown before
//! Transient      transient -> transient
//! FromTransient  transient -> stack item
//! ToTransient    stack item -> transient
//! Forward / Back             one step along the stack
//! JumpForward / JumpBack     several steps along the stack
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::RenderError;
use crate::Result;

/// Key of the built-in show/hide transition
pub const DEFAULT_TRANSITION: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationType {
    Initial,
    Forward,
    Back,
    JumpForward,
    JumpBack,
    Transient,
    FromTransient,
    ToTransient,
}

impl NavigationType {
    /// Classify a change of the displayed item. Rules apply in order.
    ///
    /// `jump` is the new item's stack index minus the previous one's, with
    /// -1 standing in for an item missing from the stack.
    pub fn classify(
        has_previous: bool,
        from_transient: bool,
        to_transient: bool,
        jump: isize,
    ) -> Self {
        if !has_previous {
            return NavigationType::Initial;
        }

        match (from_transient, to_transient) {
            (true, true) => NavigationType::Transient,
            (true, false) => NavigationType::FromTransient,
            (false, true) => NavigationType::ToTransient,
            (false, false) => match jump {
                1 => NavigationType::Forward,
                -1 => NavigationType::Back,
                j if j > 1 => NavigationType::JumpForward,
                j if j < -1 => NavigationType::JumpBack,
                // Neither item is on the stack
                _ => NavigationType::Transient,
            },
        }
    }

    pub fn involves_transient(&self) -> bool {
        matches!(
            self,
            NavigationType::Transient | NavigationType::FromTransient | NavigationType::ToTransient
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationType::Initial => "Initial",
            NavigationType::Forward => "Forward",
            NavigationType::Back => "Back",
            NavigationType::JumpForward => "JumpForward",
            NavigationType::JumpBack => "JumpBack",
            NavigationType::Transient => "Transient",
            NavigationType::FromTransient => "FromTransient",
            NavigationType::ToTransient => "ToTransient",
        }
    }
}

impl fmt::Display for NavigationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NavigationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Initial" => Ok(NavigationType::Initial),
            "Forward" => Ok(NavigationType::Forward),
            "Back" => Ok(NavigationType::Back),
            "JumpForward" => Ok(NavigationType::JumpForward),
            "JumpBack" => Ok(NavigationType::JumpBack),
            "Transient" => Ok(NavigationType::Transient),
            "FromTransient" => Ok(NavigationType::FromTransient),
            "ToTransient" => Ok(NavigationType::ToTransient),
            _ => Err(format!("Unknown navigation type: {}", s)),
        }
    }
}

/// A rendered screen. Clones are handles to the same element.
pub trait Element: Clone + 'static {
    fn show(&self);
    fn hide(&self);

    /// Called once the element's item leaves the rendered set
    fn remove(&self) {}
}

pub type TransitionHandler<E> = Box<dyn FnMut(Option<&E>, &E, NavigationType)>;

/// Hide the previous element, show the new one
pub fn default_transition<E: Element>(from: Option<&E>, to: &E, _: NavigationType) {
    // No previous element on the initial render
    if let Some(from) = from {
        from.hide();
    }
    to.show();
}

/// Named transition handlers
pub struct Transitions<E> {
    handlers: HashMap<String, TransitionHandler<E>>,
}

impl<E: Element> Transitions<E> {
    pub fn new() -> Self {
        let mut handlers: HashMap<String, TransitionHandler<E>> = HashMap::new();
        handlers.insert(
            DEFAULT_TRANSITION.to_string(),
            Box::new(default_transition::<E>),
        );
        Self { handlers }
    }

    pub fn register<F>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(Option<&E>, &E, NavigationType) + 'static,
    {
        self.handlers.insert(key.into(), Box::new(handler));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn run(
        &mut self,
        key: &str,
        from: Option<&E>,
        to: &E,
        navigation_type: NavigationType,
    ) -> Result<()> {
        let handler = self
            .handlers
            .get_mut(key)
            .ok_or_else(|| RenderError::UnknownTransition(key.to_string()))?;

        handler(from, to, navigation_type);
        Ok(())
    }
}

impl<E: Element> Default for Transitions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Transitions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("Transitions").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Flag(Rc<RefCell<bool>>);

    impl Element for Flag {
        fn show(&self) {
            *self.0.borrow_mut() = true;
        }

        fn hide(&self) {
            *self.0.borrow_mut() = false;
        }
    }

    #[test]
    fn test_classification_order() {
        use NavigationType as N;

        assert_eq!(N::classify(false, true, true, 1), N::Initial);
        assert_eq!(N::classify(true, true, true, 1), N::Transient);
        assert_eq!(N::classify(true, false, true, 1), N::ToTransient);
        assert_eq!(N::classify(true, false, false, 1), N::Forward);
        assert_eq!(N::classify(true, false, false, -1), N::Back);
        assert_eq!(N::classify(true, false, false, 3), N::JumpForward);
        assert_eq!(N::classify(true, false, false, -2), N::JumpBack);
    }

    #[test]
    fn test_from_transient_ignores_index_arithmetic() {
        let navigation_type = NavigationType::classify(true, true, false, 1);
        assert_eq!(navigation_type, NavigationType::FromTransient);
        assert!(navigation_type.involves_transient());
    }

    #[test]
    fn test_parse_round_trip() {
        for name in ["Initial", "JumpBack", "ToTransient"] {
            let parsed: NavigationType = name.parse().unwrap();
            assert_eq!(parsed.to_string(), name);
        }
        assert!("Sideways".parse::<NavigationType>().is_err());
    }

    #[test]
    fn test_default_transition() {
        let mut transitions = Transitions::<Flag>::new();
        let from = Flag::default();
        let to = Flag::default();
        from.show();

        transitions
            .run(DEFAULT_TRANSITION, Some(&from), &to, NavigationType::Forward)
            .unwrap();

        assert!(!*from.0.borrow());
        assert!(*to.0.borrow());
    }

    #[test]
    fn test_custom_and_unknown_keys() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut transitions = Transitions::<Flag>::new().register("slide", move |_, _: &Flag, kind| {
            log.borrow_mut().push(kind);
        });

        assert!(transitions.contains("slide"));
        transitions
            .run("slide", None, &Flag::default(), NavigationType::Initial)
            .unwrap();
        assert_eq!(*seen.borrow(), vec![NavigationType::Initial]);

        assert!(matches!(
            transitions.run("fade", None, &Flag::default(), NavigationType::Back),
            Err(RenderError::UnknownTransition(_))
        ));
    }
}
