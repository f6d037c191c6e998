use shared::domain::{AuthStatus, User};

use super::Slice;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub error_message: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    Checking,
    Login(User),
    Logout(Option<String>),
    ClearErrorMessage,
}

impl Slice for AuthState {
    type Action = AuthAction;

    const NAME: &'static str = "auth";

    fn reduce(&mut self, action: AuthAction) {
        match action {
            AuthAction::Checking => {
                self.status = AuthStatus::Checking;
                self.user = None;
                self.error_message = None;
            }
            AuthAction::Login(user) => {
                self.status = AuthStatus::Authenticated;
                self.user = Some(user);
                self.error_message = None;
            }
            AuthAction::Logout(error_message) => {
                self.status = AuthStatus::NotAuthenticated;
                self.user = None;
                self.error_message = error_message;
            }
            AuthAction::ClearErrorMessage => {
                self.error_message = None;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
