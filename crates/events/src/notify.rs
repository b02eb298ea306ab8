//! Approval notification composition and dispatch.
//!
//! [`Notifier`] holds an optional [`Mailer`] (absent = not configured) plus
//! the injected recipient-domain verification cache. Submission handlers
//! treat [`NotifyOutcome::NotConfigured`] as success-without-delivery and a
//! returned [`EmailError`] as fatal; decision handlers log and move on.

use std::sync::Arc;

use chrono::Utc;
use storyweave_core::cache::{CachedVerification, VerificationCache};

use crate::mailer::{EmailError, Mailer, OutboundEmail};

/// What happened to a notification attempt that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The email was handed to the SMTP transport.
    Sent,
    /// No mailer is configured; nothing was attempted.
    NotConfigured,
}

impl NotifyOutcome {
    pub fn delivered(self) -> bool {
        self == NotifyOutcome::Sent
    }
}

/// Composes and sends the platform's approval emails.
pub struct Notifier {
    mailer: Option<Mailer>,
    domain_cache: Arc<dyn VerificationCache>,
}

impl Notifier {
    pub fn new(mailer: Option<Mailer>, domain_cache: Arc<dyn VerificationCache>) -> Self {
        Self {
            mailer,
            domain_cache,
        }
    }

    /// Whether a mailer is configured at all.
    pub fn is_configured(&self) -> bool {
        self.mailer.is_some()
    }

    /// Send the review-request email with one-click decision links.
    pub async fn send_review_request(
        &self,
        to: &str,
        story_title: &str,
        version_number: i32,
        approve_url: &str,
        reject_url: &str,
    ) -> Result<NotifyOutcome, EmailError> {
        let subject = format!("[Storyweave] Review requested: {story_title} (v{version_number})");
        let text = format!(
            "A new story version is awaiting review.\n\
             \n\
             Story:   {story_title}\n\
             Version: {version_number}\n\
             \n\
             Approve: {approve_url}\n\
             Reject:  {reject_url}\n\
             \n\
             These links are single-use and expire after 7 days.\n"
        );
        self.dispatch(OutboundEmail {
            to: to.to_string(),
            subject,
            text,
            reply_to: None,
        })
        .await
    }

    /// Send the decision notice to the original creator. Callers on the
    /// decision path log failures instead of propagating them.
    pub async fn send_decision_notice(
        &self,
        to: &str,
        story_title: &str,
        version_number: i32,
        approved: bool,
    ) -> Result<NotifyOutcome, EmailError> {
        let verdict = if approved { "approved" } else { "rejected" };
        let subject = format!("[Storyweave] Your story was {verdict}: {story_title}");
        let text = if approved {
            format!(
                "Good news — version {version_number} of \"{story_title}\" was approved.\n\
                 The story is now public and playable on the platform, with your\n\
                 creator credit preserved.\n"
            )
        } else {
            format!(
                "Version {version_number} of \"{story_title}\" was not approved this time.\n\
                 The story has been returned to you; you can revise and resubmit.\n"
            )
        };
        self.dispatch(OutboundEmail {
            to: to.to_string(),
            subject,
            text,
            reply_to: None,
        })
        .await
    }

    async fn dispatch(&self, email: OutboundEmail) -> Result<NotifyOutcome, EmailError> {
        let Some(mailer) = &self.mailer else {
            tracing::warn!(to = %email.to, "Mailer not configured; skipping notification");
            return Ok(NotifyOutcome::NotConfigured);
        };
        self.verify_recipient_domain(&email.to)?;
        mailer.send(&email).await?;
        Ok(NotifyOutcome::Sent)
    }

    /// Syntactic recipient-domain check, memoized through the injected cache.
    fn verify_recipient_domain(&self, address: &str) -> Result<(), EmailError> {
        let domain = address
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or("");

        if let Some(cached) = self.domain_cache.get(domain) {
            return if cached.valid {
                Ok(())
            } else {
                Err(EmailError::Domain(domain.to_string()))
            };
        }

        let valid = domain_looks_valid(domain);
        self.domain_cache.put(
            domain,
            CachedVerification {
                valid,
                checked_at: Utc::now(),
            },
        );
        if valid {
            Ok(())
        } else {
            Err(EmailError::Domain(domain.to_string()))
        }
    }
}

/// A domain must have at least one dot-separated label pair of ASCII
/// alphanumerics/hyphens, none empty.
fn domain_looks_valid(domain: &str) -> bool {
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
