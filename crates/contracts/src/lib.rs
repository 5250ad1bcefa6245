//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Call model
//! - Every reporting call is fire-and-forget: nothing is returned to the caller
//! - Payloads (`Event`, `UserIdentity`, `UserProperties`) are transient values
//! - Parameter maps are key-sorted (`BTreeMap`) so rendering is reproducible

mod backend;
mod blueprint;
mod error;
mod event;
mod user;
mod value;

pub use backend::Backend;
pub use blueprint::*;
pub use error::*;
pub use event::{Event, NativeLevel, Severity};
pub use user::{UserIdentity, UserProperties};
pub use value::{Parameters, Value};
