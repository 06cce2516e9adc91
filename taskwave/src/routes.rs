//! The navigable-views surface and its session guard.
//!
//! Pure path mapping: what screens exist, which require a session, and
//! where an unauthenticated request lands instead.

use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    ResetPassword,
    Dashboard,
    TaskDetail(TaskId),
}

impl Route {
    /// Map a URL path to a route. The root path lands on the login screen;
    /// unknown paths map to nothing.
    pub fn parse(path: &str) -> Option<Route> {
        match path {
            "/" | "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/reset-password" => Some(Route::ResetPassword),
            "/dashboard" => Some(Route::Dashboard),
            _ => {
                let id = path.strip_prefix("/tasks/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                Some(Route::TaskDetail(TaskId::from(id)))
            }
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Signup => "/signup".to_string(),
            Route::ResetPassword => "/reset-password".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::TaskDetail(id) => format!("/tasks/{id}"),
        }
    }

    /// Whether the route is gated behind an authenticated session.
    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Dashboard | Route::TaskDetail(_))
    }

    /// Apply the session guard: gated routes resolve to the login screen
    /// when there is no session, everything else passes through.
    pub fn resolve(self, authenticated: bool) -> Route {
        if self.requires_session() && !authenticated {
            Route::Login
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Login));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/signup"), Some(Route::Signup));
        assert_eq!(Route::parse("/reset-password"), Some(Route::ResetPassword));
        assert_eq!(Route::parse("/dashboard"), Some(Route::Dashboard));
        assert_eq!(
            Route::parse("/tasks/abc123"),
            Some(Route::TaskDetail(TaskId::from("abc123")))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_paths() {
        assert_eq!(Route::parse("/settings"), None);
        assert_eq!(Route::parse("/tasks/"), None);
        assert_eq!(Route::parse("/tasks/a/b"), None);
    }

    #[test]
    fn test_guard_redirects_unauthenticated_gated_routes() {
        assert_eq!(Route::Dashboard.resolve(false), Route::Login);
        assert_eq!(
            Route::TaskDetail(TaskId::from("x")).resolve(false),
            Route::Login
        );
    }

    #[test]
    fn test_guard_passes_authenticated_and_public_routes() {
        assert_eq!(Route::Dashboard.resolve(true), Route::Dashboard);
        assert_eq!(Route::Signup.resolve(false), Route::Signup);
        assert_eq!(Route::ResetPassword.resolve(false), Route::ResetPassword);
    }

    #[test]
    fn test_path_round_trips() {
        for route in [
            Route::Login,
            Route::Signup,
            Route::ResetPassword,
            Route::Dashboard,
            Route::TaskDetail(TaskId::from("abc")),
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route.clone()));
        }
    }
}
