//! Approval state machine rules: statuses, decisions, consent, and tokens.
//!
//! A story version is created `pending` and moves exactly once to `approved`
//! or `rejected`. These helpers encode the legal transitions and the
//! token/consent requirements; the api crate applies the side effects.

use rand::RngCore;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Statuses and decisions
// ---------------------------------------------------------------------------

/// Version awaiting review.
pub const STATUS_PENDING: &str = "pending";

/// Version accepted for publication. Terminal.
pub const STATUS_APPROVED: &str = "approved";

/// Version returned to the creator. Terminal.
pub const STATUS_REJECTED: &str = "rejected";

/// Reviewer accepts the version.
pub const DECISION_APPROVE: &str = "approve";

/// Reviewer declines the version.
pub const DECISION_REJECT: &str = "reject";

/// All valid decision values.
pub const VALID_DECISIONS: &[&str] = &[DECISION_APPROVE, DECISION_REJECT];

/// Ownership status of a story still being drafted by its creator.
pub const OWNERSHIP_CREATOR_DRAFT: &str = "creator_draft";

/// Ownership status while a version awaits review.
pub const OWNERSHIP_PENDING_TRANSFER: &str = "pending_transfer";

/// Ownership status after approval: the platform holds custody.
pub const OWNERSHIP_PLATFORM_OWNED: &str = "platform_owned";

/// Ownership status after rejection: custody returned to the creator.
pub const OWNERSHIP_RETURNED: &str = "returned";

/// Validate that a decision string is one of the accepted values.
pub fn validate_decision(decision: &str) -> Result<(), String> {
    if VALID_DECISIONS.contains(&decision) {
        Ok(())
    } else {
        Err(format!(
            "Invalid decision '{decision}'. Must be one of: {}",
            VALID_DECISIONS.join(", ")
        ))
    }
}

/// The terminal status a decision moves a pending version to.
pub fn decision_status(decision: &str) -> Option<&'static str> {
    match decision {
        DECISION_APPROVE => Some(STATUS_APPROVED),
        DECISION_REJECT => Some(STATUS_REJECTED),
        _ => None,
    }
}

/// Whether a version status is terminal.
pub fn is_terminal(status: &str) -> bool {
    status == STATUS_APPROVED || status == STATUS_REJECTED
}

/// Require that a version is still pending, answering `Conflict` (naming the
/// current status) when it has already been decided.
pub fn ensure_pending(status: &str) -> Result<(), CoreError> {
    if status == STATUS_PENDING {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "version has already been reviewed: status is '{status}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Consent
// ---------------------------------------------------------------------------

/// Two-part ownership acknowledgement captured at submission time.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ConsentAck {
    /// Creator agrees to transfer custody on approval.
    pub transfer: bool,
    /// Creator agrees to be contacted about the submission.
    pub contact: bool,
}

/// Both halves of the acknowledgement are required; refusing either fails
/// the submission.
pub fn validate_consent(consent: &ConsentAck) -> Result<(), CoreError> {
    if !consent.transfer {
        return Err(CoreError::Validation(
            "ownership transfer must be acknowledged before submission".to_string(),
        ));
    }
    if !consent.contact {
        return Err(CoreError::Validation(
            "contact consent must be acknowledged before submission".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Approval tokens
// ---------------------------------------------------------------------------

/// Token lifetime on the parent story.
pub const APPROVAL_TOKEN_TTL_DAYS: i64 = 7;

/// Random bytes per token (hex-encoded to twice this length).
const TOKEN_BYTES: usize = 32;

/// Constant rejection message for any token failure. Deliberately says
/// nothing about *why* the token was refused.
pub const TOKEN_REJECTED_MESSAGE: &str = "invalid approval credentials";

/// Mint a fresh random approval token (64 hex chars).
pub fn mint_approval_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let mut token = String::with_capacity(TOKEN_BYTES * 2);
    for byte in bytes {
        token.push_str(&format!("{byte:02x}"));
    }
    token
}

/// Exact-equality token check. Empty or absent stored tokens never match.
pub fn token_matches(supplied: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) if !stored.is_empty() => supplied == stored,
        _ => false,
    }
}

/// Whether a story-level token has expired. A missing expiry counts as
/// expired: a token without a recorded lifetime is never honored.
pub fn token_expired(expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    match expires_at {
        Some(expires_at) => now > expires_at,
        None => true,
    }
}
