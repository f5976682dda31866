//! Setup-time validation of Deliveroo HK API tokens.
//!
//! [`DeliverooValidator`] issues a single authenticated request and classifies
//! the result into a [`ValidationOutcome`]. [`UserStep`] wraps it in the
//! host's config-flow contract and turns outcomes into [`FlowResult`]s.

pub mod credentials;
pub mod flow;
pub mod log;
pub mod validator;

pub use credentials::{Credentials, Locale};
pub use flow::{
    FieldKind, FlowPhase, FlowResult, FlowState, FormError, FormField, FormSchema, SetupStep,
    UserStep, ABORT_ALREADY_CONFIGURED, ERROR_KEY_BASE, STEP_USER,
};
pub use log::{mask_token, TracingLog, ValidationLog};
pub use validator::{
    DeliverooValidator, TokenValidator, ValidationError, ValidationOutcome, DEFAULT_ENDPOINT,
    ENTRY_TITLE,
};
