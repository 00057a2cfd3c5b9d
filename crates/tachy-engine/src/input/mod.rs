//! Input subsystem.
//!
//! Events are drained from an `EventSource`, stamped with the shared clock and
//! folded into per-identifier state tables by `InputCapture`.
//! - `RawInput`: untimed events as a source delivers them
//! - `InputEvent`: timestamped transitions kept in the session history
//! - `ScriptedEvents`: a deterministic source for tests and simulations
//!
//! winit translation lives in `platform`; nothing else here sees winit types.

mod capture;
pub mod platform;
mod state;
mod synthetic;
mod types;

pub use capture::{CaptureConfig, EventSource, InputCapture};
pub use state::{StateTable, TransitionState};
pub use synthetic::ScriptedEvents;
pub use types::{
    Device,
    InputEvent,
    InputId,
    Key,
    MouseButton,
    RawInput,
    Transition,
    UnknownKeyName,
};
