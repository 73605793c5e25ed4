use crate::naming::NamingError;
use hostbind_events::EventBusError;
use hostbind_kernel::StoreError;
use std::borrow::Cow;

/// Failures of the registration controller. Reconcile failures are all retried by the controller.
#[hostbind_derive::hostbind_error]
pub enum RegistrationError {
    #[error("Store error{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    #[error("DNS naming error{}: {source}", format_context(.context))]
    Naming { source: NamingError, context: Option<Cow<'static, str>> },

    #[error("Watch subscription failed{}: {source}", format_context(.context))]
    Events { source: EventBusError, context: Option<Cow<'static, str>> },

    /// Concurrent writers kept invalidating the snapshot of a shared object.
    #[error("Gave up on {key} after {attempts} conflicting writes{}", format_context(.context))]
    ConflictRetriesExhausted { key: String, attempts: u32, context: Option<Cow<'static, str>> },

    #[error("Internal registration error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
