//! Client-side export gate.
//!
//! The gate is a session-local view of the authoritative server record:
//! `Unvalidated → {Active, Used, Expired, Invalid}`. Only `Active` allows
//! export. The local `has_downloaded` flag disables further exports without
//! a round-trip, but the server flag remains the source of truth across
//! sessions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::foundation::error::{PosterError, PosterResult};
use crate::token::client::{TokenApi, TokenCheck};

/// Gate state as observed by this session.
#[derive(Clone, Debug, PartialEq)]
pub enum GateState {
    /// No validation performed yet.
    Unvalidated,
    /// Token redeemable; export may proceed.
    Active {
        /// Buyer email.
        customer_email: Option<String>,
        /// Token expiry.
        expires_at: Option<DateTime<Utc>>,
        /// Owning order.
        order_id: Option<String>,
    },
    /// Token consumed; terminal for this session.
    Used {
        /// Download timestamp.
        downloaded_at: Option<DateTime<Utc>>,
    },
    /// Token expired; terminal for this session.
    Expired {
        /// The expiry that passed.
        expires_at: Option<DateTime<Utc>>,
    },
    /// Token unknown or unreachable; terminal for this session.
    Invalid {
        /// User-facing message.
        message: String,
    },
}

impl GateState {
    /// Whether this state permits customization and export.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Outcome of a guarded export attempt.
#[derive(Debug)]
pub enum ExportOutcome {
    /// The gate is not in a state that permits exporting.
    NotAllowed,
    /// The user declined the confirmation prompt; state unchanged.
    Declined,
    /// Another export is already running; this call was a no-op.
    InFlight,
    /// The file was produced. `tracked` is false when the completion report
    /// failed: the file is safe locally, but server-side bookkeeping may
    /// need manual follow-up.
    Completed {
        /// Where the file landed.
        path: PathBuf,
        /// Whether the server recorded the download.
        tracked: bool,
    },
    /// Rasterization or file delivery failed; nothing was consumed.
    Failed(PosterError),
}

/// Guards the single-use export flow for one token.
pub struct TokenGate {
    api: Box<dyn TokenApi>,
    token: String,
    state: GateState,
    has_downloaded: bool,
    exporting: bool,
}

impl TokenGate {
    /// Gate for `token`, initially unvalidated.
    pub fn new(api: Box<dyn TokenApi>, token: impl Into<String>) -> Self {
        Self {
            api,
            token: token.into(),
            state: GateState::Unvalidated,
            has_downloaded: false,
            exporting: false,
        }
    }

    /// The guarded token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Current state.
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Whether an export may start right now.
    pub fn can_export(&self) -> bool {
        self.state.is_active() && !self.has_downloaded && !self.exporting
    }

    /// Validate against the store and settle into one of the four states.
    /// Network failure maps to `Invalid` (fail closed, not open).
    pub async fn validate(&mut self) -> &GateState {
        let check = self.api.validate(&self.token).await;
        tracing::debug!(token = %self.token, ?check, "token validated");
        self.state = match check {
            TokenCheck::Active {
                customer_email,
                expires_at,
                order_id,
            } => GateState::Active {
                customer_email,
                expires_at,
                order_id,
            },
            TokenCheck::Used { downloaded_at } => {
                self.has_downloaded = true;
                GateState::Used { downloaded_at }
            }
            TokenCheck::Expired { expires_at } => GateState::Expired { expires_at },
            TokenCheck::Invalid { message } => GateState::Invalid { message },
        };
        &self.state
    }

    /// Run the single-use export flow.
    ///
    /// Order of operations is fixed: confirmation first (declining changes
    /// nothing), then the local export, and only after the file exists the
    /// completion report with `metadata` describing the exact customization.
    /// A failed report still counts as a completed download locally.
    pub async fn export<C, F>(
        &mut self,
        confirm: C,
        export_fn: F,
        metadata: serde_json::Value,
    ) -> ExportOutcome
    where
        C: FnOnce() -> bool,
        F: FnOnce() -> PosterResult<PathBuf>,
    {
        if self.exporting {
            return ExportOutcome::InFlight;
        }
        if !self.can_export() {
            return ExportOutcome::NotAllowed;
        }
        if !confirm() {
            return ExportOutcome::Declined;
        }

        self.exporting = true;
        let outcome = match export_fn() {
            Err(err) => {
                tracing::error!(%err, "export failed, token not consumed");
                ExportOutcome::Failed(err)
            }
            Ok(path) => {
                // Strictly after the local file exists, never before.
                let tracked = self.api.mark_downloaded(&self.token, metadata).await;
                self.has_downloaded = true;
                if !tracked {
                    tracing::warn!(
                        token = %self.token,
                        "file saved but server-side tracking failed"
                    );
                }
                ExportOutcome::Completed { path, tracked }
            }
        };
        self.exporting = false;
        outcome
    }
}
