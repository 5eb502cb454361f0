//! Leptos application: routing, the protected layout, and the auth forms.

use std::rc::Rc;

use leptos::*;
use leptos_router::*;

use hrdesk_auth::{Credentials, Registration, User};

use crate::backend::AuthBackend;
use crate::config::DashboardConfig;
use crate::error::SessionError;
use crate::frontend::storage::BrowserStore;
use crate::guard::{GuardDecision, RouteGuard};
use crate::menu::{MenuEntry, MenuTree};
use crate::navigation::NavigationState;
use crate::session::{AuthStatus, SessionSnapshot, SessionStore, SubmitOutcome};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::title::TitleResolver;

/// Shared by every component through Leptos context.
#[derive(Clone)]
pub struct SessionContext {
    pub store: SessionStore,
    pub snapshot: ReadSignal<SessionSnapshot>,
    pub guard: Rc<RouteGuard>,
    pub menu: Rc<MenuTree>,
    pub titles: Rc<TitleResolver>,
}

impl SessionContext {
    /// Build the store, mirror its snapshots into a signal, and rehydrate.
    fn install(config: &DashboardConfig) -> Self {
        let store = SessionStore::new(backend(config), storage(), config);

        let (snapshot, set_snapshot) = create_signal(store.snapshot());
        let mut rx = store.subscribe();
        spawn_local(async move {
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                set_snapshot.set(next);
            }
        });

        store.rehydrate();
        let revalidating = store.clone();
        spawn_local(async move {
            revalidating.revalidate().await;
        });

        Self {
            store,
            snapshot,
            guard: Rc::new(RouteGuard::from_config(config)),
            menu: Rc::new(MenuTree::standard()),
            titles: Rc::new(TitleResolver::new(config.default_title.clone())),
        }
    }
}

#[cfg(feature = "http")]
fn backend(config: &DashboardConfig) -> Rc<dyn AuthBackend> {
    Rc::new(crate::backend::HttpAuthBackend::new(config.api_base_url.clone()))
}

#[cfg(not(feature = "http"))]
fn backend(_config: &DashboardConfig) -> Rc<dyn AuthBackend> {
    tracing::warn!("built without the `http` feature; using an empty in-memory directory");
    Rc::new(crate::backend::InMemoryAuthBackend::new())
}

fn storage() -> Rc<dyn KeyValueStore> {
    match BrowserStore::local() {
        Ok(store) => Rc::new(store),
        Err(err) => {
            tracing::warn!(error = %err, "localStorage unavailable; session will not survive reload");
            Rc::new(MemoryStore::new())
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_context(SessionContext::install(&DashboardConfig::default()));

    view! {
        <Router>
            <Routes>
                <Route path="/login" view=LoginPage/>
                <Route path="/register" view=RegisterPage/>
                <Route path="/forgot-password" view=ForgotPasswordPage/>
                <Route path="/" view=HomeRedirect/>
                <Route
                    path="/*any"
                    view=|| {
                        view! {
                            <Protected>
                                <Layout>
                                    <Workspace/>
                                </Layout>
                            </Protected>
                        }
                    }
                />
            </Routes>
        </Router>
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Guarding
// ─────────────────────────────────────────────────────────────────────────────

/// Renders its children only once the guard says so.
#[component]
fn Protected(children: ChildrenFn) -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let location = use_location();
    let guard = ctx.guard.clone();

    let decision = move || {
        let path = location.pathname.get();
        ctx.snapshot.with(|snap| {
            ctx.guard
                .check_route(&snap.status, &path, &ctx.menu, &snap.permissions)
        })
    };

    move || match decision() {
        GuardDecision::Loading => view! { <div class="loading">"Loading..."</div> }.into_view(),
        GuardDecision::Render => children().into_view(),
        GuardDecision::Redirect { return_to, .. } => {
            view! { <Redirect path=guard.login_url(&return_to)/> }.into_view()
        }
        GuardDecision::Forbidden => view! {
            <div class="forbidden">
                <h2>"Access denied"</h2>
                <p>"You do not have permission to view this page."</p>
                <A href="/">"Back to your dashboard"</A>
            </div>
        }
        .into_view(),
    }
}

/// `/` goes to the signed-in role's home, or to the login page.
#[component]
fn HomeRedirect() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let login_path = ctx.guard.login_path().to_string();

    move || {
        ctx.snapshot.with(|snap| match &snap.status {
            AuthStatus::Unknown => view! { <div class="loading">"Loading..."</div> }.into_view(),
            AuthStatus::Anonymous => view! { <Redirect path=login_path.clone()/> }.into_view(),
            AuthStatus::Authenticated(session) => {
                let home = session.user().role.home_path();
                view! { <Redirect path=home/> }.into_view()
            }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────────────

#[component]
fn Layout(children: Children) -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let location = use_location();
    let snapshot = ctx.snapshot;
    let store = ctx.store.clone();

    let nav = create_rw_signal(NavigationState::new(
        (*ctx.titles).clone(),
        location.pathname.get_untracked(),
    ));
    create_effect(move |_| {
        let path = location.pathname.get();
        nav.update(|n| n.navigate(path));
    });

    let collapsed = Signal::derive(move || nav.with(NavigationState::is_sidebar_collapsed));
    let user_name = move || {
        snapshot.with(|s| s.status.user().map(User::display_name).unwrap_or_default())
    };
    let initials = move || snapshot.with(|s| s.status.user().map(User::initials).unwrap_or_default());

    let on_logout = move |_| {
        let store = store.clone();
        spawn_local(async move {
            store.logout().await;
        });
    };

    view! {
        <div class="layout" class:collapsed=move || collapsed.get()>
            <Sidebar collapsed=collapsed/>
            <div class="main">
                <header class="topbar">
                    <button class="sidebar-toggle" on:click=move |_| nav.update(NavigationState::toggle_sidebar)>
                        "☰"
                    </button>
                    <h1>{move || nav.with(|n| n.title().to_string())}</h1>
                    <div class="user">
                        <span class="avatar">{initials}</span>
                        <span class="name">{user_name}</span>
                        <button class="logout" on:click=on_logout>"Sign out"</button>
                    </div>
                </header>
                <main>{children()}</main>
            </div>
        </div>
    }
}

#[component]
fn Sidebar(#[prop(into)] collapsed: Signal<bool>) -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let menu = ctx.menu.clone();
    let snapshot = ctx.snapshot;

    let entries = move || {
        snapshot.with(|snap| {
            menu.filter(&snap.permissions)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
    };

    view! {
        <nav class="sidebar" class:collapsed=move || collapsed.get()>
            <ul>
                {move || {
                    entries()
                        .into_iter()
                        .map(|entry| view! { <MenuGroup entry=entry/> })
                        .collect_view()
                }}
            </ul>
        </nav>
    }
}

#[component]
fn MenuGroup(entry: MenuEntry) -> impl IntoView {
    let icon = entry.icon.to_string();
    let label = entry.label.to_string();

    match entry.route {
        Some(route) => view! {
            <li class="menu-item">
                <A href=route.into_owned()>
                    <span class="icon">{icon}</span>
                    <span class="label">{label}</span>
                </A>
            </li>
        }
        .into_view(),
        None => {
            let open = create_rw_signal(false);
            let items = entry.submenu;
            view! {
                <li class="menu-group" class:open=move || open.get()>
                    <button on:click=move |_| open.update(|o| *o = !*o)>
                        <span class="icon">{icon}</span>
                        <span class="label">{label}</span>
                    </button>
                    <Show when=move || open.get()>
                        <ul class="submenu">
                            {items
                                .iter()
                                .map(|item| {
                                    view! {
                                        <li>
                                            <A href=item.route.to_string()>{item.label.to_string()}</A>
                                        </li>
                                    }
                                })
                                .collect_view()}
                        </ul>
                    </Show>
                </li>
            }
            .into_view()
        }
    }
}

/// Content area. Module pages mount here; for now it names the page.
#[component]
fn Workspace() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let location = use_location();
    let titles = ctx.titles.clone();
    let snapshot = ctx.snapshot;

    view! {
        <section class="workspace">
            <h2>{move || titles.resolve(&location.pathname.get()).to_string()}</h2>
            <p>
                {move || {
                    snapshot
                        .with(|s| s.status.user().map(|u| format!("Welcome, {}", u.first_name)))
                        .unwrap_or_default()
                }}
            </p>
        </section>
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth forms
// ─────────────────────────────────────────────────────────────────────────────

/// Leaves the auth pages as soon as a session exists, honouring `?redirect=`.
fn leave_when_signed_in(ctx: &SessionContext) {
    let snapshot = ctx.snapshot;
    let guard = ctx.guard.clone();
    let query = use_query_map();
    let navigate = use_navigate();

    create_effect(move |_| {
        if let Some(user) = snapshot.with(|s| s.status.user().cloned()) {
            let return_to = query.with_untracked(|q| q.get("redirect").cloned());
            navigate(&guard.post_login_path(return_to.as_deref(), &user), Default::default());
        }
    });
}

#[component]
fn LoginPage() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    leave_when_signed_in(&ctx);

    let snapshot = ctx.snapshot;
    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());

    let clear_error = {
        let store = ctx.store.clone();
        move || {
            if snapshot.with_untracked(|s| s.error.is_some()) {
                store.clear_error();
            }
        }
    };
    let clear_on_password = clear_error.clone();

    let store = ctx.store.clone();
    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if snapshot.with_untracked(|s| s.in_flight) {
            return;
        }
        let credentials = Credentials::new(email.get_untracked(), password.get_untracked());
        let store = store.clone();
        spawn_local(async move {
            match store.login(credentials).await {
                SubmitOutcome::Authenticated(_) => password.set(String::new()),
                SubmitOutcome::Failed { message } => tracing::debug!(%message, "login failed"),
                SubmitOutcome::Discarded => {}
            }
        });
    };

    view! {
        <div class="auth-page">
            <form class="auth-form" on:submit=on_submit>
                <h1>"Sign in"</h1>
                <Show when=move || snapshot.with(|s| s.error.is_some())>
                    <p class="error">{move || snapshot.with(|s| s.error.clone().unwrap_or_default())}</p>
                </Show>
                <label for="email">"Email"</label>
                <input
                    type="email"
                    id="email"
                    prop:value=move || email.get()
                    on:input=move |ev| {
                        email.set(event_target_value(&ev));
                        clear_error();
                    }
                />
                <label for="password">"Password"</label>
                <input
                    type="password"
                    id="password"
                    prop:value=move || password.get()
                    on:input=move |ev| {
                        password.set(event_target_value(&ev));
                        clear_on_password();
                    }
                />
                <button type="submit" disabled=move || snapshot.with(|s| s.in_flight)>
                    {move || if snapshot.with(|s| s.in_flight) { "Signing in..." } else { "Sign in" }}
                </button>
                <div class="links">
                    <A href="/forgot-password">"Forgot password?"</A>
                    <A href="/register">"Create an account"</A>
                </div>
            </form>
        </div>
    }
}

#[component]
fn RegisterPage() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    leave_when_signed_in(&ctx);

    let snapshot = ctx.snapshot;
    let first_name = create_rw_signal(String::new());
    let last_name = create_rw_signal(String::new());
    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let confirmation = create_rw_signal(String::new());
    let local_error = create_rw_signal(None::<String>);

    let store = ctx.store.clone();
    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if snapshot.with_untracked(|s| s.in_flight) {
            return;
        }
        let registration = Registration {
            first_name: first_name.get_untracked(),
            last_name: last_name.get_untracked(),
            email: email.get_untracked(),
            secret: password.get_untracked(),
            secret_confirmation: confirmation.get_untracked(),
        };
        if let Err(err) = registration.check_confirmation() {
            local_error.set(Some(SessionError::from(err).user_message()));
            return;
        }
        local_error.set(None);

        let store = store.clone();
        spawn_local(async move {
            if let SubmitOutcome::Failed { message } = store.register(registration).await {
                tracing::debug!(%message, "registration failed");
            }
        });
    };

    let error = move || local_error.get().or_else(|| snapshot.with(|s| s.error.clone()));
    let field = move |id: &'static str, label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <label for=id>{label}</label>
            <input
                type=kind
                id=id
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
            />
        }
    };

    view! {
        <div class="auth-page">
            <form class="auth-form" on:submit=on_submit>
                <h1>"Create an account"</h1>
                <Show when=move || error().is_some()>
                    <p class="error">{move || error().unwrap_or_default()}</p>
                </Show>
                {field("first-name", "First name", "text", first_name)}
                {field("last-name", "Last name", "text", last_name)}
                {field("email", "Email", "email", email)}
                {field("password", "Password", "password", password)}
                {field("confirm-password", "Confirm password", "password", confirmation)}
                <button type="submit" disabled=move || snapshot.with(|s| s.in_flight)>
                    "Register"
                </button>
                <div class="links">
                    <A href="/login">"Already have an account? Sign in"</A>
                </div>
            </form>
        </div>
    }
}

#[component]
fn ForgotPasswordPage() -> impl IntoView {
    view! {
        <div class="auth-page">
            <div class="auth-form">
                <h1>"Forgot password"</h1>
                <p>"Contact your HR administrator to reset your password."</p>
                <A href="/login">"Back to sign in"</A>
            </div>
        </div>
    }
}
