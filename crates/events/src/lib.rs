//! Outbound notification delivery for Storyweave.
//!
//! [`mailer`] wraps the async SMTP transport; [`notify`] composes the
//! approval-review and decision e-mails and distinguishes "mailer not
//! configured" (non-fatal) from "send failed" (fatal for submission).

pub mod mailer;
pub mod notify;

pub use mailer::{EmailConfig, EmailError, Mailer, OutboundEmail};
pub use notify::{Notifier, NotifyOutcome};
