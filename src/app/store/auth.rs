use super::Reducer;
use crate::app::types::User;

/// Local mirror of the session. Never authoritative on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthAction {
    LoginStart,
    LoginSuccess(User),
    LoginFailure(String),
    Logout,
}

pub struct AuthReducer;

impl Reducer for AuthReducer {
    type State = AuthState;
    type Action = AuthAction;

    fn reduce(state: Self::State, action: Self::Action) -> Self::State {
        match action {
            AuthAction::LoginStart => AuthState {
                loading: true,
                error: None,
                ..state
            },
            AuthAction::LoginSuccess(user) => AuthState {
                is_authenticated: true,
                user: Some(user),
                loading: false,
                error: None,
            },
            AuthAction::LoginFailure(error) => AuthState {
                loading: false,
                error: Some(error),
                ..state
            },
            AuthAction::Logout => AuthState::default(),
        }
    }
}
