//! Session slice: login, session check, logout

use crate::error::ApiError;
use crate::services::AuthClient;
use crate::services::auth::{normalize_phone, redact_phone};
use freekick_core::environment::{TokenPair, TokenStore};
use freekick_core::{Effect, Reducer, SmallVec, async_effect, smallvec};
use freekick_macros::Action;
use serde_json::Value;
use std::sync::Arc;

const NO_TOKEN_MESSAGE: &str = "No token found";

/// Session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    /// Profile of the signed-in user
    pub user: Option<Value>,
    /// Access token of the session
    pub access_token: Option<String>,
    /// Refresh token of the session
    pub refresh_token: Option<String>,
    /// Set once the server has confirmed the session
    pub is_authenticated: bool,
    /// A session operation is in flight
    pub is_loading: bool,
    /// Message of the last failed login or profile fetch
    pub error: Option<String>,
}

impl AuthState {
    /// Initial state seeded from persisted tokens
    ///
    /// Tokens alone do not authenticate; `CheckAuth` confirms them.
    #[must_use]
    pub fn restore(tokens: &dyn TokenStore) -> Self {
        Self {
            access_token: tokens.access_token(),
            refresh_token: tokens.refresh_token(),
            ..Self::default()
        }
    }

    fn sign_out(&mut self) {
        self.user = None;
        self.access_token = None;
        self.refresh_token = None;
        self.is_authenticated = false;
        self.is_loading = false;
    }
}

/// Session actions
#[derive(Action, Clone, Debug, PartialEq)]
pub enum AuthAction {
    /// Verify persisted tokens against the profile endpoint
    #[intent]
    CheckAuth,
    /// Sign in with phone and password
    #[intent]
    Login {
        /// Phone number in any common notation
        phone: String,
        /// Password
        password: String,
    },
    /// Reload the profile
    #[intent]
    GetCurrentUser,
    /// End the session
    #[intent]
    Logout,

    /// Persisted tokens are valid
    #[outcome]
    Authenticated {
        /// Profile
        user: Value,
    },
    /// Persisted tokens are missing or rejected
    #[outcome]
    CheckFailed {
        /// Reason
        message: String,
    },
    /// Login succeeded
    #[outcome]
    LoggedIn {
        /// Issued tokens
        tokens: TokenPair,
        /// Profile
        user: Value,
    },
    /// Login failed
    #[outcome]
    LoginFailed {
        /// User-facing message
        message: String,
    },
    /// Profile reloaded
    #[outcome]
    UserLoaded {
        /// Profile
        user: Value,
    },
    /// Profile reload failed
    #[outcome]
    UserFailed {
        /// User-facing message
        message: String,
    },
    /// Session ended
    #[outcome]
    LoggedOut,
    /// Server-side logout failed; the local session is gone anyway
    #[outcome]
    LogoutFailed {
        /// User-facing message
        message: String,
    },

    /// Drop the error message
    ClearError,
    /// Adopt a session obtained elsewhere
    SetCredentials {
        /// Profile
        user: Value,
        /// Access token
        token: String,
    },
}

/// Dependencies of the session slice
#[derive(Clone)]
pub struct AuthEnvironment {
    /// Auth endpoints
    pub client: Arc<dyn AuthClient>,
    /// Durable token storage; the only writer is this slice
    pub tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for AuthEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for [`AuthState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthReducer;

impl Reducer for AuthReducer {
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment;

    fn reduce(
        &self,
        state: &mut AuthState,
        action: AuthAction,
        env: &AuthEnvironment,
    ) -> SmallVec<[Effect<AuthAction>; 4]> {
        tracing::trace!(action = action.name(), "Reducing");

        match action {
            AuthAction::CheckAuth => {
                if env.tokens.access_token().is_none() {
                    let rejected = AuthAction::CheckFailed {
                        message: NO_TOKEN_MESSAGE.into(),
                    };
                    return self.reduce(state, rejected, env);
                }

                state.is_loading = true;
                let client = Arc::clone(&env.client);
                let tokens = Arc::clone(&env.tokens);
                smallvec![async_effect! {
                    Some(match client.current_user().await {
                        Ok(user) => AuthAction::Authenticated { user },
                        Err(error) => {
                            tokens.clear();
                            AuthAction::CheckFailed {
                                message: error.user_message("Token verification failed"),
                            }
                        },
                    })
                }]
            },

            AuthAction::Login { phone, password } => {
                let phone = normalize_phone(&phone);
                tracing::info!(phone = %redact_phone(&phone), "Logging in");
                state.is_loading = true;
                state.error = None;

                let client = Arc::clone(&env.client);
                let tokens = Arc::clone(&env.tokens);
                smallvec![async_effect! {
                    let session = async {
                        let pair = client.login(&phone, &password).await?;
                        tokens.store(&pair);
                        let user = client.current_user().await?;
                        Ok::<_, ApiError>((pair, user))
                    }
                    .await;

                    Some(match session {
                        Ok((pair, user)) => AuthAction::LoggedIn { tokens: pair, user },
                        Err(error) => {
                            tokens.clear();
                            AuthAction::LoginFailed {
                                message: error.user_message("Login failed"),
                            }
                        },
                    })
                }]
            },

            AuthAction::GetCurrentUser => {
                state.is_loading = true;
                state.error = None;
                let client = Arc::clone(&env.client);
                smallvec![async_effect! {
                    Some(match client.current_user().await {
                        Ok(user) => AuthAction::UserLoaded { user },
                        Err(error) => AuthAction::UserFailed {
                            message: error.user_message("Failed to get user data"),
                        },
                    })
                }]
            },

            AuthAction::Logout => {
                state.is_loading = true;
                let client = Arc::clone(&env.client);
                let tokens = Arc::clone(&env.tokens);
                smallvec![async_effect! {
                    let result = client.logout().await;
                    tokens.clear();
                    Some(match result {
                        Ok(()) => AuthAction::LoggedOut,
                        Err(error) => AuthAction::LogoutFailed {
                            message: error.user_message("Logout failed"),
                        },
                    })
                }]
            },

            AuthAction::Authenticated { user } => {
                state.is_loading = false;
                state.is_authenticated = true;
                state.user = Some(user);
                state.error = None;
                SmallVec::new()
            },

            AuthAction::CheckFailed { message } => {
                tracing::warn!(%message, "Session check failed");
                state.sign_out();
                SmallVec::new()
            },

            AuthAction::LoggedIn { tokens, user } => {
                tracing::info!("Logged in");
                state.is_loading = false;
                state.is_authenticated = true;
                state.user = Some(user);
                state.access_token = Some(tokens.access);
                state.refresh_token = Some(tokens.refresh);
                state.error = None;
                SmallVec::new()
            },

            AuthAction::LoginFailed { message } => {
                tracing::warn!(%message, "Login failed");
                state.sign_out();
                state.error = Some(message);
                SmallVec::new()
            },

            AuthAction::UserLoaded { user } => {
                state.is_loading = false;
                state.user = Some(user);
                SmallVec::new()
            },

            AuthAction::UserFailed { message } => {
                tracing::warn!(%message, "Profile fetch failed");
                state.is_loading = false;
                state.error = Some(message);
                SmallVec::new()
            },

            AuthAction::LoggedOut => {
                tracing::info!("Logged out");
                state.sign_out();
                state.error = None;
                SmallVec::new()
            },

            AuthAction::LogoutFailed { message } => {
                tracing::warn!(%message, "Server-side logout failed");
                state.sign_out();
                SmallVec::new()
            },

            AuthAction::ClearError => {
                state.error = None;
                SmallVec::new()
            },

            AuthAction::SetCredentials { user, token } => {
                state.user = Some(user);
                state.access_token = Some(token);
                state.is_authenticated = true;
                state.is_loading = false;
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use async_trait::async_trait;
    use freekick_testing::effects::collect_all;
    use freekick_testing::{ReducerTest, assertions, signed_in_tokens, signed_out_tokens, test_tokens};
    use serde_json::json;
    use std::sync::Mutex;

    /// Auth client with canned answers that records the phone it saw
    #[derive(Default)]
    struct CannedAuth {
        reject_login: bool,
        reject_profile: bool,
        seen_phone: Mutex<Option<String>>,
    }

    #[async_trait]
    impl AuthClient for CannedAuth {
        async fn login(&self, phone: &str, _: &str) -> Result<TokenPair, ApiError> {
            *self.seen_phone.lock().unwrap() = Some(phone.to_string());
            if self.reject_login {
                return Err(ApiError::Status {
                    status: 400,
                    body: Some(json!({"message": "Invalid credentials"})),
                });
            }
            Ok(test_tokens())
        }

        async fn current_user(&self) -> Result<Value, ApiError> {
            if self.reject_profile {
                return Err(ApiError::Unauthorized { body: None });
            }
            Ok(json!({"id": 1, "name": "Admin"}))
        }

        async fn logout(&self) -> Result<(), ApiError> {
            Err(ApiError::Network("connection reset".into()))
        }

        async fn refresh(&self, _: &str) -> Result<TokenPair, ApiError> {
            Ok(test_tokens())
        }
    }

    fn env(client: CannedAuth, tokens: Arc<dyn TokenStore>) -> AuthEnvironment {
        AuthEnvironment {
            client: Arc::new(client),
            tokens,
        }
    }

    #[test]
    fn check_auth_without_token_rejects_without_network() {
        ReducerTest::new(AuthReducer)
            .with_env(env(CannedAuth::default(), signed_out_tokens()))
            .given_state(AuthState::default())
            .when_action(AuthAction::CheckAuth)
            .then_state(|state| {
                assert!(!state.is_authenticated);
                assert!(!state.is_loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn check_auth_failure_clears_tokens() {
        let tokens = signed_in_tokens();
        let env = env(
            CannedAuth {
                reject_profile: true,
                ..CannedAuth::default()
            },
            tokens.clone(),
        );
        let mut state = AuthState::restore(tokens.as_ref());

        let effects = AuthReducer.reduce(&mut state, AuthAction::CheckAuth, &env);
        assert!(state.is_loading);

        let outcomes = collect_all(effects).await;
        assert_eq!(
            outcomes,
            vec![AuthAction::CheckFailed {
                message: "Token verification failed".into()
            }]
        );
        assert!(tokens.access_token().is_none());
        assert!(tokens.refresh_token().is_none());
    }

    #[tokio::test]
    async fn login_normalizes_phone_and_persists_tokens() {
        let tokens = signed_out_tokens();
        let client = Arc::new(CannedAuth::default());
        let env = AuthEnvironment {
            client: client.clone(),
            tokens: tokens.clone(),
        };
        let mut state = AuthState::default();

        let effects = AuthReducer.reduce(
            &mut state,
            AuthAction::Login {
                phone: "971 50 123 4567".into(),
                password: "secret".into(),
            },
            &env,
        );
        let outcomes = collect_all(effects).await;

        assert_eq!(client.seen_phone.lock().unwrap().as_deref(), Some("+971501234567"));
        assert_eq!(tokens.access_token(), Some(test_tokens().access));
        assert!(matches!(outcomes.as_slice(), [AuthAction::LoggedIn { .. }]));

        for outcome in outcomes {
            let _ = AuthReducer.reduce(&mut state, outcome, &env);
        }
        assert!(state.is_authenticated);
        assert_eq!(state.refresh_token, Some(test_tokens().refresh));
    }

    #[tokio::test]
    async fn login_failure_sets_error_and_clears_tokens() {
        let tokens = signed_in_tokens();
        let env = env(
            CannedAuth {
                reject_login: true,
                ..CannedAuth::default()
            },
            tokens.clone(),
        );
        let mut state = AuthState::default();

        let effects = AuthReducer.reduce(
            &mut state,
            AuthAction::Login {
                phone: "+971501234567".into(),
                password: "wrong".into(),
            },
            &env,
        );
        for outcome in collect_all(effects).await {
            let _ = AuthReducer.reduce(&mut state, outcome, &env);
        }

        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
        assert!(!state.is_authenticated);
        assert!(!state.is_loading);
        assert!(tokens.access_token().is_none());
    }

    #[tokio::test]
    async fn logout_clears_tokens_even_when_server_fails() {
        let tokens = signed_in_tokens();
        let env = env(CannedAuth::default(), tokens.clone());
        let mut state = AuthState::restore(tokens.as_ref());
        state.is_authenticated = true;

        let effects = AuthReducer.reduce(&mut state, AuthAction::Logout, &env);
        for outcome in collect_all(effects).await {
            let _ = AuthReducer.reduce(&mut state, outcome, &env);
        }

        assert!(tokens.access_token().is_none());
        assert!(!state.is_authenticated);
        assert!(state.access_token.is_none());
    }

    #[tokio::test]
    async fn get_current_user_clears_stale_error_while_loading() {
        let stale = AuthState {
            error: Some("Login failed".into()),
            ..AuthState::default()
        };

        ReducerTest::new(AuthReducer)
            .with_env(env(CannedAuth::default(), signed_in_tokens()))
            .given_state(stale)
            .when_action(AuthAction::GetCurrentUser)
            .then_state(|state| {
                assert!(state.is_loading);
                assert!(state.error.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .then_settled(|state| {
                assert!(!state.is_loading);
                assert_eq!(state.user, Some(json!({"id": 1, "name": "Admin"})));
            })
            .run_settled()
            .await;
    }

    #[tokio::test]
    async fn get_current_user_failure_settles_with_error() {
        let client = CannedAuth {
            reject_profile: true,
            ..CannedAuth::default()
        };

        ReducerTest::new(AuthReducer)
            .with_env(env(client, signed_in_tokens()))
            .given_state(AuthState::default())
            .when_action(AuthAction::GetCurrentUser)
            .then_settled(|state| {
                assert!(!state.is_loading);
                assert_eq!(state.error.as_deref(), Some("Failed to get user data"));
            })
            .run_settled()
            .await;
    }

    #[test]
    fn set_credentials_authenticates() {
        ReducerTest::new(AuthReducer)
            .with_env(env(CannedAuth::default(), signed_out_tokens()))
            .given_state(AuthState::default())
            .when_action(AuthAction::SetCredentials {
                user: json!({"id": 7}),
                token: "external".into(),
            })
            .then_state(|state| {
                assert!(state.is_authenticated);
                assert_eq!(state.access_token.as_deref(), Some("external"));
            })
            .run();
    }
}
