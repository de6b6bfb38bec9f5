//! LoginRedirect port - What the host does when the backend rejects the token.

/// Invoked by the resource client after a 401, once the stored token has
/// been cleared.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}
