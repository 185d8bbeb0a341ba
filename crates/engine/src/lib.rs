//! # Cadence Engine
//!
//! Sequences heterogeneous units of work where each step reports completion
//! through a one-shot token, either during its own invocation or later via
//! an external timer or I/O callback. One run
//! serializes its steps into a single deterministic order against one
//! shared execution context.
//!
//! ## Key Properties
//!
//! - **Constant stack depth**: a trampoline loop runs arbitrarily long
//!   purely-synchronous chains without growing the call stack, and switches
//!   to event-driven resumption the moment a step defers completion
//! - **Strict ordering**: a step never starts before the previous one
//!   completed, at any nesting depth; at most one step is ever in flight
//! - **Two propagation modes**: series (accumulate every step's output
//!   positionally) and waterfall (thread each output into the next input)
//! - **Composability**: a task may be a plain step, a whole nested
//!   sequence, or one operation mapped over a captured collection snapshot
//! - **Fail-fast**: the first failure halts the run and reaches the
//!   terminal callback alone, exactly once
//!
//! ## Usage
//!
//! ```rust
//! use cadence_engine::Sequence;
//! use serde_json::json;
//! use std::sync::{Arc, Mutex};
//!
//! let result = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&result);
//!
//! Sequence::new()
//!     .step(|_cx, _inputs, done| {
//!         let _ = done.succeed(json!("first"));
//!         Ok(())
//!     })
//!     .step(|_cx, _inputs, done| {
//!         let _ = done.succeed(json!("second"));
//!         Ok(())
//!     })
//!     .run(move |_cx, outcome| {
//!         *sink.lock().expect("result lock") = Some(outcome);
//!     });
//!
//! // Every step completed synchronously, so the run already finished.
//! let outcome = result.lock().expect("result lock").take().expect("terminal fired");
//! assert_eq!(outcome.expect("success"), json!(["first", "second"]));
//! ```
//!
//! ## Architecture
//!
//! - **`values`**: positional completion values and result-slot shaping
//! - **`completion`**: the one-shot completion token
//! - **`cursor`**: the uniform pull protocol over the three task kinds
//! - **`driver`**: the trampoline loop and detach/resume machinery
//! - **`sequence`**: the builder surface and `run`
//!
//! A step may resolve its token from another thread; the engine is `Send`
//! and guards each run behind its own lock. Independent runs share nothing.

mod completion;
mod cursor;
mod driver;
mod error;
mod sequence;
mod values;

pub use completion::Completion;
pub use driver::TerminalFn;
pub use error::ProtocolViolation;
pub use sequence::{ElementFn, Mode, Sequence, StepFn, run_series};
pub use values::Values;
