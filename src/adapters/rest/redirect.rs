//! Login redirect for a headless host.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::ports::LoginRedirect;

/// Raises a flag the host can poll, and logs, when the session has expired.
#[derive(Debug, Default)]
pub struct FlagLoginRedirect {
    required: AtomicBool,
}

impl FlagLoginRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a 401 has been seen and not yet acknowledged.
    pub fn login_required(&self) -> bool {
        self.required.load(Ordering::SeqCst)
    }

    /// Clears the flag after a fresh login.
    pub fn acknowledge(&self) {
        self.required.store(false, Ordering::SeqCst);
    }
}

impl LoginRedirect for FlagLoginRedirect {
    fn redirect_to_login(&self) {
        if !self.required.swap(true, Ordering::SeqCst) {
            tracing::warn!("Session expired; login required");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_raises_flag_until_acknowledged() {
        let redirect = FlagLoginRedirect::new();
        assert!(!redirect.login_required());

        redirect.redirect_to_login();
        redirect.redirect_to_login();
        assert!(redirect.login_required());

        redirect.acknowledge();
        assert!(!redirect.login_required());
    }
}
