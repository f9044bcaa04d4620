//! # Subscriber trait.
//!
//! A [`Subscribe`] implementation receives every lifecycle event on its own worker,
//! behind a bounded queue owned by [`SubscriberSet`](crate::SubscriberSet). Slow handlers
//! only ever delay themselves; when their queue is full the event is dropped for them and
//! `SubscriberOverflow` is published.

use async_trait::async_trait;

use crate::events::Event;

/// Event handler plugged into the lifecycle.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Panics are caught and reported as `SubscriberPanicked`.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length for this subscriber (minimum 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
