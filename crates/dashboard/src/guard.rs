//! Route Guard: the checkpoint between navigation and protected views.

use hrdesk_auth::{PermissionSnapshot, User};

use crate::config::DashboardConfig;
use crate::menu::{MenuTree, RouteAccess};
use crate::session::AuthStatus;

/// What the view layer should do for a navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not resolved yet: show a neutral placeholder. Neither the
    /// protected view nor a redirect.
    Loading,
    Render,
    /// Go to `to`; `return_to` is where the visitor was headed.
    Redirect { to: String, return_to: String },
    /// Signed in, but the menu hides this route from the current identity.
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    login_path: String,
    public_paths: Vec<String>,
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>, public_paths: Vec<String>) -> Self {
        Self {
            login_path: login_path.into(),
            public_paths,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.login_path.clone(), config.public_paths.clone())
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn is_public(&self, path: &str) -> bool {
        path == self.login_path || self.public_paths.iter().any(|p| p == path)
    }

    /// Authentication check only.
    pub fn check(&self, status: &AuthStatus, path: &str) -> GuardDecision {
        if self.is_public(path) {
            return GuardDecision::Render;
        }
        match status {
            AuthStatus::Unknown => GuardDecision::Loading,
            AuthStatus::Authenticated(_) => GuardDecision::Render,
            AuthStatus::Anonymous => {
                tracing::debug!(path, "anonymous visit to protected route");
                GuardDecision::Redirect {
                    to: self.login_path.clone(),
                    return_to: path.to_string(),
                }
            }
        }
    }

    /// [`check`](Self::check), then refuse menu routes the permission
    /// snapshot hides.
    pub fn check_route(
        &self,
        status: &AuthStatus,
        path: &str,
        menu: &MenuTree,
        permissions: &PermissionSnapshot,
    ) -> GuardDecision {
        match self.check(status, path) {
            GuardDecision::Render if status.is_authenticated() => {
                match menu.route_access(path, permissions) {
                    RouteAccess::Hidden => GuardDecision::Forbidden,
                    RouteAccess::Visible | RouteAccess::Unlisted => GuardDecision::Render,
                }
            }
            other => other,
        }
    }

    /// Login URL carrying `return_to` as an encoded `redirect` query value.
    pub fn login_url(&self, return_to: &str) -> String {
        format!("{}?redirect={}", self.login_path, urlencoding::encode(return_to))
    }

    /// Where to go after signing in: the requested protected path, else the
    /// role's home.
    pub fn post_login_path(&self, return_to: Option<&str>, user: &User) -> String {
        match return_to {
            Some(path) if path.starts_with('/') && !path.starts_with("//") && !self.is_public(path) => {
                path.to_string()
            }
            _ => user.role.home_path().to_string(),
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use hrdesk_auth::{PermissionPolicy, Role, Session, SessionToken};
    use hrdesk_core::{Email, UserId};

    use super::*;

    fn user(role: Role) -> User {
        User {
            id: UserId::new(),
            email: Email::parse("sam@example.com").unwrap(),
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            role,
            is_active: true,
            last_login: None,
        }
    }

    fn authenticated(role: Role) -> AuthStatus {
        AuthStatus::Authenticated(Session::new(user(role), SessionToken::new("t").unwrap()))
    }

    #[test]
    fn unknown_state_shows_loading_not_content_or_redirect() {
        let guard = RouteGuard::default();
        assert_eq!(guard.check(&AuthStatus::Unknown, "/dashboard"), GuardDecision::Loading);
    }

    #[test]
    fn unknown_then_anonymous_never_renders() {
        let guard = RouteGuard::default();
        let decisions: Vec<_> = [AuthStatus::Unknown, AuthStatus::Anonymous]
            .iter()
            .map(|status| guard.check(status, "/employee/dashboard"))
            .collect();

        assert!(!decisions.contains(&GuardDecision::Render));
        assert_eq!(
            decisions,
            vec![
                GuardDecision::Loading,
                GuardDecision::Redirect {
                    to: "/login".to_string(),
                    return_to: "/employee/dashboard".to_string(),
                },
            ]
        );
    }

    #[test]
    fn authenticated_renders() {
        let guard = RouteGuard::default();
        assert_eq!(guard.check(&authenticated(Role::Employee), "/dashboard"), GuardDecision::Render);
    }

    #[test]
    fn public_paths_always_render() {
        let guard = RouteGuard::default();
        for status in [AuthStatus::Unknown, AuthStatus::Anonymous, authenticated(Role::Hr)] {
            assert_eq!(guard.check(&status, "/login"), GuardDecision::Render);
            assert_eq!(guard.check(&status, "/register"), GuardDecision::Render);
        }
    }

    #[test]
    fn hidden_menu_routes_are_forbidden() {
        let guard = RouteGuard::default();
        let menu = MenuTree::standard();
        let status = authenticated(Role::Employee);
        let permissions = PermissionPolicy::all_installed().snapshot_for(Role::Employee);

        assert_eq!(
            guard.check_route(&status, "/payroll/payslips", &menu, &permissions),
            GuardDecision::Forbidden
        );
        assert_eq!(
            guard.check_route(&status, "/leave/requests", &menu, &permissions),
            GuardDecision::Render
        );
        assert_eq!(
            guard.check_route(&status, "/employee/dashboard", &menu, &permissions),
            GuardDecision::Render
        );
    }

    #[test]
    fn check_route_still_waits_for_rehydration() {
        let guard = RouteGuard::default();
        let decision = guard.check_route(
            &AuthStatus::Unknown,
            "/payroll/payslips",
            &MenuTree::standard(),
            &PermissionSnapshot::empty(),
        );
        assert_eq!(decision, GuardDecision::Loading);
    }

    #[test]
    fn login_url_encodes_the_return_path() {
        let guard = RouteGuard::default();
        assert_eq!(guard.login_url("/reports"), "/login?redirect=%2Freports");
        assert_eq!(
            guard.login_url("/reports?year=2024&q=a b"),
            "/login?redirect=%2Freports%3Fyear%3D2024%26q%3Da%20b"
        );
    }

    #[test]
    fn post_login_prefers_requested_path() {
        let guard = RouteGuard::default();
        let hr = user(Role::Hr);
        assert_eq!(guard.post_login_path(Some("/reports"), &hr), "/reports");
        assert_eq!(guard.post_login_path(None, &hr), "/hr/dashboard");
        assert_eq!(guard.post_login_path(Some("/login"), &hr), "/hr/dashboard");
        assert_eq!(guard.post_login_path(Some("https://evil.example"), &hr), "/hr/dashboard");
        assert_eq!(guard.post_login_path(Some("//evil.example"), &hr), "/hr/dashboard");
    }
}
