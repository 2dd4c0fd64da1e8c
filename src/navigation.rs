use std::cell::Cell;

/// Moves the user agent to the login entry point.
///
/// The API client calls this after a forced logout; hosts decide what "go to
/// login" means for them.
pub trait Navigator {
    fn redirect_to_login(&self);
}

/// Remembers that a login redirect was requested until someone takes it.
#[derive(Debug, Default)]
pub struct LoginRedirect {
    requested: Cell<bool>,
}

impl LoginRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }

    /// Returns whether a redirect was pending, and resets it.
    pub fn take(&self) -> bool {
        self.requested.replace(false)
    }
}

impl Navigator for LoginRedirect {
    fn redirect_to_login(&self) {
        self.requested.set(true);
    }
}
