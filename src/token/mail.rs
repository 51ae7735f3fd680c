//! Creation-link delivery seam.
//!
//! Actual email delivery belongs to an external collaborator; the in-tree
//! implementation records the link through tracing so local runs and tests
//! can observe it.

use crate::foundation::error::PosterResult;

/// Sends the buyer their creation link after an order is provisioned.
pub trait Mailer: Send + Sync {
    /// Deliver the deep link embedding `token` to `email`.
    fn send_creation_link(&self, email: &str, name: &str, token: &str) -> PosterResult<()>;
}

/// Mailer that logs the link instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogMailer {
    /// Base URL the token is appended to.
    pub link_base_url: String,
}

impl LogMailer {
    /// Mailer producing links under `link_base_url`.
    pub fn new(link_base_url: impl Into<String>) -> Self {
        Self {
            link_base_url: link_base_url.into(),
        }
    }
}

impl Mailer for LogMailer {
    fn send_creation_link(&self, email: &str, name: &str, token: &str) -> PosterResult<()> {
        let link = format!(
            "{}/create?token={token}",
            self.link_base_url.trim_end_matches('/')
        );
        tracing::info!(%email, %name, %link, "creation link ready");
        Ok(())
    }
}
