//! Type-erased view of RPC request and response messages
//!
//! Hooks receive messages of any type. The [`Payload`] trait keeps them
//! printable for payload logging and downcastable for callers that know
//! the concrete message type of a method.

use std::any::Any;
use std::fmt;

/// A request or response message as seen by inclusion and decorator hooks.
///
/// Implemented for every `Debug + Send + Sync + 'static` type.
///
/// # Example
///
/// ```rust
/// use rpctrace_core::Payload;
///
/// #[derive(Debug)]
/// struct GetUser {
///     id: u64,
/// }
///
/// let req = GetUser { id: 7 };
/// let payload: &dyn Payload = &req;
/// assert_eq!(payload.downcast_ref::<GetUser>().map(|r| r.id), Some(7));
/// ```
pub trait Payload: fmt::Debug + Send + Sync + 'static {
    /// Borrow the message as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T> Payload for T
where
    T: fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Payload {
    /// Downcast to the concrete message type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Check whether the message is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}
