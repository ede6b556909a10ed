//! `reload scripts` event
//!
//! Fires after every registry reload. Paths may filter on whether the
//! reload pass reported configuration errors with a `had_error:<bool>`
//! switch.

use std::any::Any;

use crate::containers::ScriptContainer;
use crate::events::context::ContextSnapshot;
use crate::events::ScriptEventKind;
use crate::switches::check_switch;

#[derive(Debug, Default)]
pub struct ReloadScriptsEvent {
    had_error: bool,
}

impl ReloadScriptsEvent {
    /// Record the outcome of the reload this occurrence describes.
    pub fn set_had_error(&mut self, had_error: bool) {
        self.had_error = had_error;
    }
}

impl ScriptEventKind for ReloadScriptsEvent {
    fn name(&self) -> &'static str {
        "Reload Scripts"
    }

    fn could_match(&self, _container: &ScriptContainer, event: &str) -> bool {
        event.to_ascii_lowercase().starts_with("reload scripts")
    }

    fn matches(&self, _container: &ScriptContainer, event: &str) -> bool {
        let actual = if self.had_error { "true" } else { "false" };
        check_switch(event, "had_error", actual)
    }

    fn context(&self, snapshot: &mut ContextSnapshot) {
        snapshot.set("had_error", self.had_error);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::context::ContextSource;

    fn container() -> ScriptContainer {
        ScriptContainer::new("test", true, None)
    }

    #[test]
    fn test_could_match_prefix() {
        let kind = ReloadScriptsEvent::default();
        assert!(kind.could_match(&container(), "reload scripts"));
        assert!(kind.could_match(&container(), "Reload Scripts had_error:true"));
        assert!(!kind.could_match(&container(), "system time hourly"));
    }

    #[test]
    fn test_matches_filters_on_had_error() {
        let mut kind = ReloadScriptsEvent::default();
        assert!(kind.matches(&container(), "reload scripts"));
        assert!(kind.matches(&container(), "reload scripts had_error:false"));
        assert!(!kind.matches(&container(), "reload scripts had_error:true"));

        kind.set_had_error(true);
        assert!(kind.matches(&container(), "reload scripts"));
        assert!(kind.matches(&container(), "reload scripts had_error:true"));
        assert!(!kind.matches(&container(), "reload scripts had_error:false"));
    }

    #[test]
    fn test_context_reports_had_error() {
        let mut kind = ReloadScriptsEvent::default();
        kind.set_had_error(true);

        let mut snapshot = ContextSnapshot::new();
        kind.context(&mut snapshot);
        assert_eq!(
            snapshot.context_value("had_error"),
            Some(crate::events::context::ContextValue::Bool(true))
        );
    }
}
