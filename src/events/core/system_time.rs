//! `system time` event
//!
//! Periodic wall-clock event. Declared paths pick a granularity:
//!
//! - `system time secondly` fires on every tick
//! - `system time minutely` fires when the minute rolls over
//! - `system time hourly` fires when the hour rolls over
//! - `system time <HH:MM>` fires once when the clock reaches that time
//!
//! A driver calls [`SystemTimeEvent::update`] about once a second and fires
//! the kind whenever it returns true.

use std::any::Any;

use chrono::{NaiveTime, Timelike};

use crate::containers::ScriptContainer;
use crate::events::context::ContextSnapshot;
use crate::events::ScriptEventKind;

#[derive(Debug, Default)]
pub struct SystemTimeEvent {
    hour: u32,
    minute: u32,
    minute_changed: bool,
    hour_changed: bool,
    last: Option<(u32, u32, u32)>,
}

impl SystemTimeEvent {
    /// Advance the clock state. Returns true when the second rolled over
    /// since the last call, meaning the caller should fire this kind.
    pub fn update(&mut self, now: NaiveTime) -> bool {
        let current = (now.hour(), now.minute(), now.second());
        if self.last == Some(current) {
            return false;
        }
        let previous = self.last;
        self.last = Some(current);
        self.hour = current.0;
        self.minute = current.1;
        match previous {
            Some((hour, minute, _)) => {
                self.minute_changed = minute != current.1 || hour != current.0;
                self.hour_changed = hour != current.0;
                true
            }
            None => {
                // first tick establishes the baseline
                self.minute_changed = false;
                self.hour_changed = false;
                true
            }
        }
    }

    fn granularity_matches(&self, spec: &str) -> bool {
        if spec.eq_ignore_ascii_case("secondly") {
            return true;
        }
        if spec.eq_ignore_ascii_case("minutely") {
            return self.minute_changed;
        }
        if spec.eq_ignore_ascii_case("hourly") {
            return self.hour_changed;
        }
        // fixed time of day, HH:MM
        if let Ok(at) = NaiveTime::parse_from_str(spec, "%H:%M") {
            return self.minute_changed && at.hour() == self.hour && at.minute() == self.minute;
        }
        false
    }
}

impl ScriptEventKind for SystemTimeEvent {
    fn name(&self) -> &'static str {
        "System Time"
    }

    fn could_match(&self, _container: &ScriptContainer, event: &str) -> bool {
        event.to_ascii_lowercase().starts_with("system time ")
    }

    fn matches(&self, _container: &ScriptContainer, event: &str) -> bool {
        match event.split_whitespace().nth(2) {
            Some(spec) => self.granularity_matches(spec),
            None => false,
        }
    }

    fn context(&self, snapshot: &mut ContextSnapshot) {
        snapshot.set("hour", i64::from(self.hour));
        snapshot.set("minute", i64::from(self.minute));
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::context::ContextSource;

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn container() -> ScriptContainer {
        ScriptContainer::new("clock", true, None)
    }

    #[test]
    fn test_could_match_prefix() {
        let kind = SystemTimeEvent::default();
        assert!(kind.could_match(&container(), "system time hourly"));
        assert!(kind.could_match(&container(), "System Time 14:30 priority:2"));
        assert!(!kind.could_match(&container(), "reload scripts"));
    }

    #[test]
    fn test_update_dedupes_same_second() {
        let mut kind = SystemTimeEvent::default();
        assert!(kind.update(time(9, 0, 0)));
        assert!(!kind.update(time(9, 0, 0)));
        assert!(kind.update(time(9, 0, 1)));
    }

    #[test]
    fn test_secondly_matches_every_tick() {
        let mut kind = SystemTimeEvent::default();
        kind.update(time(9, 0, 0));
        assert!(kind.matches(&container(), "system time secondly"));
        kind.update(time(9, 0, 1));
        assert!(kind.matches(&container(), "system time secondly"));
    }

    #[test]
    fn test_minutely_matches_on_minute_rollover() {
        let mut kind = SystemTimeEvent::default();
        kind.update(time(9, 0, 59));
        assert!(!kind.matches(&container(), "system time minutely"));
        kind.update(time(9, 1, 0));
        assert!(kind.matches(&container(), "system time minutely"));
        kind.update(time(9, 1, 1));
        assert!(!kind.matches(&container(), "system time minutely"));
    }

    #[test]
    fn test_hourly_matches_on_hour_rollover() {
        let mut kind = SystemTimeEvent::default();
        kind.update(time(9, 59, 59));
        kind.update(time(10, 0, 0));
        assert!(kind.matches(&container(), "system time hourly"));
        assert!(kind.matches(&container(), "system time minutely"));
        kind.update(time(10, 0, 1));
        assert!(!kind.matches(&container(), "system time hourly"));
    }

    #[test]
    fn test_fixed_time_matches_once() {
        let mut kind = SystemTimeEvent::default();
        kind.update(time(14, 29, 59));
        kind.update(time(14, 30, 0));
        assert!(kind.matches(&container(), "system time 14:30"));
        assert!(!kind.matches(&container(), "system time 14:31"));
        kind.update(time(14, 30, 1));
        assert!(!kind.matches(&container(), "system time 14:30"));
    }

    #[test]
    fn test_switches_do_not_confuse_granularity() {
        let mut kind = SystemTimeEvent::default();
        kind.update(time(9, 0, 0));
        assert!(kind.matches(&container(), "system time secondly priority:3"));
        assert!(!kind.matches(&container(), "system time priority:3"));
    }

    #[test]
    fn test_context_carries_clock() {
        let mut kind = SystemTimeEvent::default();
        kind.update(time(14, 30, 0));

        let mut snapshot = ContextSnapshot::new();
        kind.context(&mut snapshot);
        assert_eq!(
            snapshot.context_value("hour"),
            Some(crate::events::context::ContextValue::Int(14))
        );
        assert_eq!(
            snapshot.context_value("minute"),
            Some(crate::events::context::ContextValue::Int(30))
        );
    }
}
