//! Declarative script event matching and dispatch
//!
//! Script containers declare textual event lines (`on system time hourly
//! priority:1:` in the written form); registered event kinds bind those
//! lines into priority-sorted path indexes at reload time and, when an
//! occurrence fires, hand matching script bodies to an external execution
//! queue. Determinations returned by a body mutate the occurrence's
//! cancellation state, which later paths of the same firing observe.

pub mod config;
pub mod containers;
pub mod events;
pub mod logging;
pub mod queue;
pub mod switches;

pub use config::{ConfigError, ScriptLibrary};
pub use containers::{ContainerStore, EventEntry, EventsBlock, ScriptContainer};
pub use events::context::{ContextSnapshot, ContextSource, ContextValue};
pub use events::registry::{EventRegistry, ReloadReport};
pub use events::{EventPath, EventStats, RegisteredEvent, ScriptEventKind};
pub use queue::{ExecutionQueue, InlineQueue, QueueError, QueueRequest, RequestId, ScriptStep};
