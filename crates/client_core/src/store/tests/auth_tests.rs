use super::*;

fn authenticated_state() -> AuthState {
    AuthState {
        status: AuthStatus::Authenticated,
        user: Some(User::new("abc", "test")),
        error_message: None,
    }
}

fn all_prior_states() -> Vec<AuthState> {
    vec![
        AuthState::default(),
        authenticated_state(),
        AuthState {
            status: AuthStatus::NotAuthenticated,
            user: None,
            error_message: Some("Invalid credentials".to_string()),
        },
    ]
}

#[test]
fn initial_state_is_checking_without_user() {
    assert_eq!(
        AuthState::default(),
        AuthState {
            status: AuthStatus::Checking,
            user: None,
            error_message: None,
        }
    );
}

#[test]
fn login_authenticates_from_any_state() {
    let user = User::new("6563098d9aae0aecb24bb4c4", "Test User");
    for mut state in all_prior_states() {
        state.reduce(AuthAction::Login(user.clone()));
        assert_eq!(
            state,
            AuthState {
                status: AuthStatus::Authenticated,
                user: Some(user.clone()),
                error_message: None,
            }
        );
        assert!(state.is_authenticated());
    }
}

#[test]
fn logout_without_message() {
    let mut state = authenticated_state();
    state.reduce(AuthAction::Logout(None));
    assert_eq!(
        state,
        AuthState {
            status: AuthStatus::NotAuthenticated,
            user: None,
            error_message: None,
        }
    );
}

#[test]
fn logout_with_message_from_any_state() {
    for mut state in all_prior_states() {
        state.reduce(AuthAction::Logout(Some("Invalid credentials".to_string())));
        assert_eq!(state.status, AuthStatus::NotAuthenticated);
        assert_eq!(state.user, None);
        assert_eq!(state.error_message.as_deref(), Some("Invalid credentials"));
    }
}

#[test]
fn clear_error_message_keeps_status() {
    let mut state = authenticated_state();
    state.reduce(AuthAction::Logout(Some("Invalid credentials".to_string())));
    state.reduce(AuthAction::ClearErrorMessage);

    assert_eq!(state.error_message, None);
    assert_eq!(state.status, AuthStatus::NotAuthenticated);
}

#[test]
fn checking_resets_user_and_error() {
    let mut state = authenticated_state();
    state.error_message = Some("stale".to_string());
    state.reduce(AuthAction::Checking);
    assert_eq!(state, AuthState::default());
}

#[test]
fn authenticated_iff_user_present() {
    let actions = [
        AuthAction::Checking,
        AuthAction::Login(User::new("abc", "test")),
        AuthAction::ClearErrorMessage,
        AuthAction::Logout(Some("bad".to_string())),
        AuthAction::Login(User::new("def", "other")),
        AuthAction::Logout(None),
    ];
    let mut state = AuthState::default();
    for action in actions {
        state.reduce(action);
        assert_eq!(state.is_authenticated(), state.user.is_some());
    }
}
