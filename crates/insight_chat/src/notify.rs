//! Notification collaborator.
//!
//! The rendering layer owns how notifications look. The workflow only needs
//! `notify(title, description, variant)`.

use serde::{Deserialize, Serialize};

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyVariant {
    #[default]
    Default,
    Destructive,
}

/// Receiver of user-facing notifications
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str, variant: NotifyVariant);
}

/// Notifier that writes into the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, description: &str, variant: NotifyVariant) {
        match variant {
            NotifyVariant::Default => tracing::info!(title, "{}", description),
            NotifyVariant::Destructive => tracing::warn!(title, "{}", description),
        }
    }
}
