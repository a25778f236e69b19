//! Which screen the dashboard may show for the current auth state.

use vigil_api_client::AuthState;

use crate::app::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// First session probe still running.
    Loading,
    Login,
    Protected(View),
}

/// `requested` is only honoured once the session is confirmed.
pub fn resolve(auth: &AuthState, requested: View) -> Route {
    if auth.loading {
        Route::Loading
    } else if !auth.authenticated {
        Route::Login
    } else {
        Route::Protected(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_api_client::User;

    fn state(authenticated: bool, loading: bool) -> AuthState {
        AuthState {
            authenticated,
            user: authenticated.then(|| User {
                username: "admin".into(),
            }),
            loading,
        }
    }

    #[test]
    fn loading_wins_over_everything() {
        assert_eq!(resolve(&AuthState::initial(), View::Metrics), Route::Loading);
        assert_eq!(resolve(&state(true, true), View::Agents), Route::Loading);
    }

    #[test]
    fn unauthenticated_goes_to_login() {
        assert_eq!(resolve(&state(false, false), View::Metrics), Route::Login);
    }

    #[test]
    fn authenticated_gets_requested_view() {
        assert_eq!(
            resolve(&state(true, false), View::Metrics),
            Route::Protected(View::Metrics)
        );
        assert_eq!(
            resolve(&state(true, false), View::Agents),
            Route::Protected(View::Agents)
        );
    }
}
