use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::credentials::{Credentials, Locale};
use crate::validator::{TokenValidator, ValidationOutcome};

pub const STEP_USER: &str = "user";

/// Error key for messages that are not tied to a single field.
pub const ERROR_KEY_BASE: &str = "base";

pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// Error codes shown on a re-rendered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    CannotConnect,
    InvalidAuth,
    Unknown,
}

impl FormError {
    pub fn code(self) -> &'static str {
        match self {
            FormError::CannotConnect => "cannot_connect",
            FormError::InvalidAuth => "invalid_auth",
            FormError::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Select {
        options: Vec<&'static str>,
        default: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Fields the host renders for the `user` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormSchema {
    pub fields: Vec<FormField>,
}

impl FormSchema {
    pub fn user() -> Self {
        Self {
            fields: vec![
                FormField {
                    name: "token",
                    required: true,
                    kind: FieldKind::String,
                },
                FormField {
                    name: "locale",
                    required: true,
                    kind: FieldKind::Select {
                        options: Locale::ALL.iter().map(|locale| locale.as_str()).collect(),
                        default: Locale::default().as_str(),
                    },
                },
            ],
        }
    }
}

/// What the host should do after a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    Form {
        step_id: &'static str,
        data_schema: FormSchema,
        errors: BTreeMap<String, String>,
    },
    CreateEntry {
        title: String,
        data: Credentials,
    },
    Abort {
        reason: String,
    },
}

impl FlowResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowResult::Form { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowState {
    pub errors: BTreeMap<String, String>,
    pub submitted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    AwaitingInput,
    Complete,
}

/// A wizard step the host drives with optional form input.
#[async_trait]
pub trait SetupStep: Send {
    fn step_id(&self) -> &'static str;

    async fn step(&mut self, input: Option<Credentials>) -> FlowResult;
}

/// The single `user` step: collect a token and locale, validate, then create the entry.
pub struct UserStep {
    validator: Arc<dyn TokenValidator>,
    state: FlowState,
    phase: FlowPhase,
}

impl UserStep {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            validator,
            state: FlowState::default(),
            phase: FlowPhase::AwaitingInput,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    fn show_form(&self) -> FlowResult {
        FlowResult::Form {
            step_id: STEP_USER,
            data_schema: FormSchema::user(),
            errors: self.state.errors.clone(),
        }
    }

    fn record_error(&mut self, error: FormError) {
        self.state
            .errors
            .insert(ERROR_KEY_BASE.to_string(), error.code().to_string());
    }
}

#[async_trait]
impl SetupStep for UserStep {
    fn step_id(&self) -> &'static str {
        STEP_USER
    }

    async fn step(&mut self, input: Option<Credentials>) -> FlowResult {
        if self.phase == FlowPhase::Complete {
            return FlowResult::Abort {
                reason: ABORT_ALREADY_CONFIGURED.to_string(),
            };
        }

        let Some(credentials) = input else {
            self.state.errors.clear();
            return self.show_form();
        };

        self.state.submitted = true;
        self.state.errors.clear();

        match self.validator.validate(&credentials).await {
            ValidationOutcome::Success { title } => {
                info!(step_id = STEP_USER, locale = %credentials.locale, "credentials accepted");
                self.phase = FlowPhase::Complete;
                return FlowResult::CreateEntry {
                    title,
                    data: credentials,
                };
            }
            ValidationOutcome::CannotConnect => self.record_error(FormError::CannotConnect),
            ValidationOutcome::InvalidAuth => self.record_error(FormError::InvalidAuth),
            ValidationOutcome::Unknown(detail) => {
                error!(step_id = STEP_USER, %detail, "unexpected error while validating credentials");
                self.record_error(FormError::Unknown);
            }
        }

        debug!(step_id = STEP_USER, errors = ?self.state.errors, "re-prompting for credentials");
        self.show_form()
    }
}
