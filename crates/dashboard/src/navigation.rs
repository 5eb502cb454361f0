//! Navigation state: current path, its title, and the sidebar toggle.

use crate::title::TitleResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    current_path: String,
    title: String,
    sidebar_collapsed: bool,
    resolver: TitleResolver,
}

impl NavigationState {
    pub fn new(resolver: TitleResolver, path: impl Into<String>) -> Self {
        let current_path = path.into();
        let title = resolver.resolve(&current_path).to_string();
        Self {
            current_path,
            title,
            sidebar_collapsed: false,
            resolver,
        }
    }

    /// Move to `path`. The sidebar state is left alone.
    pub fn navigate(&mut self, path: impl Into<String>) {
        let path = path.into();
        if path == self.current_path {
            return;
        }
        self.title = self.resolver.resolve(&path).to_string();
        tracing::debug!(path = %path, title = %self.title, "navigated");
        self.current_path = path;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
    }

    pub fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.sidebar_collapsed = collapsed;
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::title::DEFAULT_TITLE;

    #[test]
    fn navigate_updates_title() {
        let mut nav = NavigationState::new(TitleResolver::default(), "/login");
        assert_eq!(nav.title(), "Sign In");

        nav.navigate("/employee/dashboard");
        assert_eq!(nav.current_path(), "/employee/dashboard");
        assert_eq!(nav.title(), "Employee Dashboard");

        nav.navigate("/nowhere");
        assert_eq!(nav.title(), DEFAULT_TITLE);
    }

    #[test]
    fn sidebar_survives_navigation() {
        let mut nav = NavigationState::new(TitleResolver::default(), "/dashboard");
        nav.toggle_sidebar();
        nav.navigate("/reports");
        assert!(nav.is_sidebar_collapsed());
        nav.toggle_sidebar();
        assert!(!nav.is_sidebar_collapsed());
    }
}
