//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants, in
//! particular the service-call futures every slice reducer returns.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use freekick_core::async_effect;
///
/// async_effect! {
///     match client.get(&id).await {
///         Ok(record) => Some(ResourceAction::FetchedOne { epoch, record }),
///         Err(error) => Some(ResourceAction::Rejected { epoch, op, message: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use freekick_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(3),
///     action: ResourceAction::ClearSuccess
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
