//! MFA step-up gate shown after sign-in.
//!
//! The gate only decides; navigation and the verification form belong to the caller.

use filedesk_api_client::FactorSource;
use filedesk_core::models::has_verified_totp;
use filedesk_core::ErrorMetadata;
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Continue into the application.
    Proceed,
    /// Show the verification form; call [`TwoFactorGate::on_verified`] when it succeeds.
    VerificationRequired,
    /// The factor check failed; the message is in [`GateState::error`].
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateState {
    pub loading: bool,
    pub error: Option<String>,
    pub decision: Option<GateDecision>,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            decision: None,
        }
    }
}

pub struct TwoFactorGate {
    factors: Arc<dyn FactorSource>,
    state: Mutex<GateState>,
}

impl TwoFactorGate {
    pub fn new(factors: Arc<dyn FactorSource>) -> Self {
        Self {
            factors,
            state: Mutex::new(GateState::default()),
        }
    }

    pub fn snapshot(&self) -> GateState {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut GateState)) {
        f(&mut self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
    }

    /// A verified TOTP factor lets the user through; anything else needs verification.
    pub async fn check(&self) -> GateDecision {
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let decision = match self.factors.list_factors().await {
            Ok(factors) if has_verified_totp(&factors) => GateDecision::Proceed,
            Ok(factors) => {
                tracing::debug!(factor_count = factors.len(), "No verified TOTP factor");
                GateDecision::VerificationRequired
            }
            Err(e) => {
                let err = e.into_auth_error();
                tracing::error!(error = %err, code = err.error_code(), "Error checking MFA status");
                let message = err.client_message();
                self.update(|s| s.error = Some(message));
                GateDecision::Failed
            }
        };

        self.update(|s| {
            s.loading = false;
            s.decision = Some(decision);
        });
        decision
    }

    pub fn on_verified(&self) -> GateDecision {
        self.update(|s| {
            s.error = None;
            s.decision = Some(GateDecision::Proceed);
        });
        GateDecision::Proceed
    }
}
