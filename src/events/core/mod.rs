//! Built-in event kinds registered by
//! [`EventRegistry::register_core_events`](crate::events::registry::EventRegistry::register_core_events).

pub mod reload_scripts;
pub mod system_time;

pub use reload_scripts::ReloadScriptsEvent;
pub use system_time::SystemTimeEvent;
