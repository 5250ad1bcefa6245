//! Backend trait - Dispatcher output interface
//!
//! Every logging destination (console, crash reporter, analytics SDK wrapper)
//! implements this trait. The dispatcher only ever sees `Box<dyn Backend>`.

use async_trait::async_trait;

use crate::{Event, UserIdentity, UserProperties};

/// Logging backend capability.
///
/// Calls return nothing: delivery failures are the backend's private concern
/// (log, swallow, or retry internally). Each instance is owned by exactly one
/// dispatcher worker, which drives it one call at a time, so `&mut self`
/// needs no locking.
#[async_trait]
pub trait Backend: Send + 'static {
    /// Backend name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Report an analytics or diagnostic event
    async fn report_event(&mut self, event: &Event);

    /// Report a screen view
    ///
    /// Separate from `report_event` so backends can treat navigation
    /// differently (e.g. reset a breadcrumb trail).
    async fn report_screen_view(&mut self, event: &Event);

    /// Associate subsequent reports with a user
    async fn identify_user(&mut self, user: &UserIdentity);

    /// Merge properties into the user's profile
    async fn set_user_properties(&mut self, properties: &UserProperties);

    /// Forget everything about the current user
    async fn delete_user_profile(&mut self);

    /// Called once when the owning dispatcher shuts down, after every queued
    /// call has been handled.
    async fn flush(&mut self) {}

    /// Opt into a bounded dispatch queue of this capacity.
    ///
    /// `None` (the default) keeps the queue unbounded so no call is ever
    /// dropped. When bounded, calls that find the queue full are dropped for
    /// this backend only.
    fn queue_capacity(&self) -> Option<usize> {
        None
    }
}
