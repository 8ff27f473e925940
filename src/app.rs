//! Application state management for canteen-tui.
//!
//! `App` is the composition root: it exclusively owns the session
//! state, the user state, the route guard, and the API client, and
//! passes them explicitly to the view layer. Background fetches run on
//! tokio tasks and report back over an mpsc channel; every message is
//! tagged with the session epoch it was issued under so results from a
//! superseded session are dropped instead of mutating fresh state.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::auth::{
    AuthContext, CredentialStore, LocalStore, SessionState, AVATAR_KEY, PERMISSIONS_KEY, USER_KEY,
};
use crate::config::Config;
use crate::guard::{GuardDecision, RouteGuard};
use crate::models::{Notification, ReportPage, UserProfile};
use crate::user::{AvatarHandle, UserState};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// 32 covers a full refresh (4 fetches) with plenty of headroom.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Monthly reports fetched per page.
pub const REPORT_PAGE_SIZE: i64 = 25;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Notifications,
    Reports,
    Profile,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Notifications => "Notifications",
            Tab::Reports => "Reports",
            Tab::Profile => "Profile",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Notifications => Tab::Reports,
            Tab::Reports => Tab::Profile,
            Tab::Profile => Tab::Notifications,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Notifications => Tab::Profile,
            Tab::Reports => Tab::Notifications,
            Tab::Profile => Tab::Reports,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background fetch tasks back to the main loop.
enum FetchResult {
    /// Current user profile and permissions
    CurrentUser(UserProfile, Vec<String>),
    /// Raw avatar bytes
    Avatar(Vec<u8>),
    /// Notification list
    Notifications(Vec<Notification>),
    /// One page of monthly reports
    Reports(ReportPage),
    /// Server confirmed archival of a notification
    NotificationArchived(i64),
    /// A fetch failed; surfaced as a status notification
    Error(String),
}

/// Epoch-tagged envelope for fetch results. `epoch` is the session
/// epoch the request was issued under.
struct FetchMessage {
    epoch: u64,
    result: FetchResult,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    session: SessionState,
    pub user: UserState,
    guard: RouteGuard,
    api: ApiClient,
    data_dir: PathBuf,

    pub state: AppState,
    pub current_tab: Tab,

    pub notifications: Vec<Notification>,
    pub notification_selection: usize,
    pub show_archived: bool,

    pub reports: ReportPage,
    pub report_selection: usize,

    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    pub status_message: Option<String>,
    /// Top-level error boundary: set by an uncaught operation error,
    /// reset by the retry affordance. Resetting does not re-run the
    /// failed operation.
    pub ui_error: Option<String>,
    pub refreshing: bool,

    fetch_rx: mpsc::Receiver<FetchMessage>,
    fetch_tx: mpsc::Sender<FetchMessage>,
}

impl App {
    /// Build the composition root: config, store, session, user state,
    /// guard, and API client, in that order.
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let data_dir = Config::data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
        debug!(?data_dir, "Data directory configured");

        let store = LocalStore::open(data_dir.clone());
        let session = SessionState::new(store);

        let mut api = ApiClient::new(config.resolved_base_url())?;
        if let Some(token) = session.token() {
            api.set_token(token);
            debug!("Token set on API client");
        }

        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Prefill the login form from env vars, config, and keychain
        let login_username = std::env::var("CANTEEN_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var("CANTEEN_PASSWORD")
            .ok()
            .or_else(|| {
                if login_username.is_empty() {
                    None
                } else {
                    CredentialStore::get_password(&login_username).ok()
                }
            })
            .unwrap_or_default();

        let mut app = Self {
            config,
            session,
            user: UserState::new(),
            guard: RouteGuard::new(),
            api,
            data_dir,

            state: AppState::Normal,
            current_tab: Tab::Notifications,

            notifications: Vec::new(),
            notification_selection: 0,
            show_archived: false,

            reports: ReportPage::default(),
            report_selection: 0,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            status_message: None,
            ui_error: None,
            refreshing: false,

            fetch_rx,
            fetch_tx,
        };

        app.load_cached_user();
        Ok(app)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Session access for view code. The root is the one place allowed
    /// to construct an installed context.
    pub fn auth_context(&self) -> AuthContext<'_> {
        AuthContext::installed(&self.session)
    }

    /// Show the login view
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form.
    /// One attempt; failures land in `login_error`.
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.clone();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        self.login_error = None;

        match self.api.login(&username, &password).await {
            Ok(token) => {
                if let Err(e) = CredentialStore::store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.session.login(&token)?;
                self.api.set_token(token);

                self.login_password.clear();
                // Fresh mount of the protected layout
                self.guard.remount();
                self.state = AppState::Normal;
                info!("Login successful");
                self.refresh_all_background();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let text = e.to_string();
                let lower = text.to_lowercase();
                let user_message = if text.contains("401") {
                    "Invalid username or password".to_string()
                } else if lower.contains("network") || lower.contains("connect") {
                    "Unable to connect to server. Check your internet connection.".to_string()
                } else if lower.contains("timeout") {
                    "Connection timed out. Please try again.".to_string()
                } else {
                    format!("Login failed: {}", text)
                };
                self.login_error = Some(user_message);
                Err(e)
            }
        }
    }

    /// Clear the session, the cached keys, the keychain credential,
    /// and the in-memory user state, then return to the login view.
    pub fn logout(&mut self) {
        self.user.clear();
        if let Err(e) = self.session.logout() {
            warn!(error = %e, "Failed to clear session store");
        }
        if let Some(ref username) = self.config.last_username {
            if let Err(e) = CredentialStore::delete(username) {
                warn!(error = %e, "Failed to remove keychain credential");
            }
        }
        self.login_password.clear();
        self.api.clear_token();
        self.notifications.clear();
        self.reports = ReportPage::default();
        self.notification_selection = 0;
        self.report_selection = 0;
        self.guard.remount();
        self.start_login();
        self.status_message = Some("Signed out".to_string());
    }

    /// Evaluate the route guard before the protected layout renders.
    /// On redirect, stale user state is cleared and navigation to the
    /// login view is issued exactly once per mount.
    pub fn enforce_guard(&mut self) {
        if self.state != AppState::Normal {
            return;
        }
        match self.guard.evaluate(self.session.is_authenticated()) {
            GuardDecision::RedirectToLogin => {
                info!("Unauthenticated session, redirecting to login");
                self.user.clear();
                self.start_login();
            }
            GuardDecision::Allow | GuardDecision::Hold => {}
        }
    }

    // =========================================================================
    // Cached user state
    // =========================================================================

    /// Prepopulate the user state from the store so the profile tab is
    /// not empty while the network refresh runs.
    fn load_cached_user(&mut self) {
        if !self.session.is_authenticated() {
            return;
        }
        if let Some(value) = self.session.store().get(USER_KEY) {
            match serde_json::from_value::<UserProfile>(value.clone()) {
                Ok(profile) => {
                    let permissions = self
                        .session
                        .store()
                        .get(PERMISSIONS_KEY)
                        .and_then(|v| serde_json::from_value(v.clone()).ok())
                        .unwrap_or_default();
                    self.user.update_user_info(profile, permissions);
                }
                Err(e) => warn!(error = %e, "Ignoring unparseable cached user"),
            }
        }

        // The avatar file only survives an unclean shutdown; adopt it
        // when it is still there, otherwise drop the stale reference.
        if let Some(reference) = self.session.store().get_string(AVATAR_KEY) {
            match AvatarHandle::adopt(PathBuf::from(&reference)) {
                Ok(handle) => self.user.set_avatar(handle),
                Err(_) => {
                    debug!(%reference, "Dropping stale avatar reference");
                    if let Err(e) = self.session.store_mut().remove(AVATAR_KEY) {
                        warn!(error = %e, "Failed to drop stale avatar reference");
                    }
                }
            }
        }
    }

    // =========================================================================
    // Background fetches
    // =========================================================================

    /// Refresh the user profile, avatar, notifications, and the first
    /// report page in the background.
    pub fn refresh_all_background(&mut self) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        let epoch = self.session.epoch();
        self.refreshing = true;

        tokio::spawn(async move {
            let (user_res, avatar_res, notifications_res, reports_res) = futures::join!(
                api.fetch_current_user(),
                api.fetch_avatar(),
                api.fetch_notifications(),
                api.fetch_monthly_reports(0, REPORT_PAGE_SIZE),
            );

            match user_res {
                Ok(resp) => {
                    Self::send(&tx, epoch, FetchResult::CurrentUser(resp.profile, resp.permissions))
                        .await
                }
                Err(e) => Self::send(&tx, epoch, FetchResult::Error(format!("Profile: {}", e))).await,
            }

            match avatar_res {
                Ok(bytes) => Self::send(&tx, epoch, FetchResult::Avatar(bytes)).await,
                // A missing avatar is common and not worth a notification
                Err(e) => debug!(error = %e, "Avatar fetch failed"),
            }

            match notifications_res {
                Ok(list) => Self::send(&tx, epoch, FetchResult::Notifications(list)).await,
                Err(e) => {
                    Self::send(&tx, epoch, FetchResult::Error(format!("Notifications: {}", e))).await
                }
            }

            match reports_res {
                Ok(page) => Self::send(&tx, epoch, FetchResult::Reports(page)).await,
                Err(e) => Self::send(&tx, epoch, FetchResult::Error(format!("Reports: {}", e))).await,
            }
        });
    }

    /// Fetch a specific report page in the background.
    fn fetch_report_page(&mut self, offset: i64) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        let epoch = self.session.epoch();

        tokio::spawn(async move {
            match api.fetch_monthly_reports(offset, REPORT_PAGE_SIZE).await {
                Ok(page) => Self::send(&tx, epoch, FetchResult::Reports(page)).await,
                Err(e) => Self::send(&tx, epoch, FetchResult::Error(format!("Reports: {}", e))).await,
            }
        });
    }

    pub fn next_report_page(&mut self) {
        if self.reports.has_more() {
            self.fetch_report_page(self.reports.offset + REPORT_PAGE_SIZE);
        }
    }

    pub fn prev_report_page(&mut self) {
        if self.reports.offset > 0 {
            let offset = (self.reports.offset - REPORT_PAGE_SIZE).max(0);
            self.fetch_report_page(offset);
        }
    }

    /// Archive the selected notification on the server. The list is
    /// only updated once the server confirms; nothing is optimistic.
    pub fn archive_selected_notification(&mut self) {
        let Some((id, archived)) = self
            .visible_notifications()
            .get(self.notification_selection)
            .map(|n| (n.id, n.archived))
        else {
            return;
        };
        if archived {
            self.status_message = Some("Already archived".to_string());
            return;
        }

        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        let epoch = self.session.epoch();

        tokio::spawn(async move {
            match api.archive_notification(id).await {
                Ok(()) => Self::send(&tx, epoch, FetchResult::NotificationArchived(id)).await,
                Err(e) => Self::send(&tx, epoch, FetchResult::Error(format!("Archive: {}", e))).await,
            }
        });
    }

    async fn send(tx: &mpsc::Sender<FetchMessage>, epoch: u64, result: FetchResult) {
        if tx.send(FetchMessage { epoch, result }).await.is_err() {
            debug!("Fetch channel closed, dropping result");
        }
    }

    /// Drain completed background tasks, dropping results issued under
    /// a superseded session epoch.
    pub fn check_background_tasks(&mut self) {
        while let Ok(message) = self.fetch_rx.try_recv() {
            if is_stale(message.epoch, self.session.epoch()) {
                debug!(
                    issued = message.epoch,
                    current = self.session.epoch(),
                    "Dropping stale fetch result"
                );
                continue;
            }
            self.apply_result(message.result);
        }
    }

    fn apply_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::CurrentUser(profile, permissions) => {
                // Cache under the fixed store keys for the next boot
                match serde_json::to_value(&profile) {
                    Ok(value) => {
                        if let Err(e) = self.session.store_mut().set(USER_KEY, value) {
                            warn!(error = %e, "Failed to cache user");
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to encode user for cache"),
                }
                if let Err(e) = self
                    .session
                    .store_mut()
                    .set(PERMISSIONS_KEY, serde_json::json!(permissions))
                {
                    warn!(error = %e, "Failed to cache permissions");
                }
                self.user.update_user_info(profile, permissions);
                self.refreshing = false;
            }
            FetchResult::Avatar(bytes) => match AvatarHandle::materialize(&self.data_dir, &bytes) {
                Ok(handle) => {
                    let reference = handle.path().display().to_string();
                    if let Err(e) = self
                        .session
                        .store_mut()
                        .set(AVATAR_KEY, Value::String(reference))
                    {
                        warn!(error = %e, "Failed to cache avatar reference");
                    }
                    self.user.set_avatar(handle);
                }
                Err(e) => {
                    error!(error = %e, "Failed to materialize avatar");
                    self.ui_error = Some(format!("Avatar handling failed: {}", e));
                }
            },
            FetchResult::Notifications(list) => {
                self.notifications = list;
                let visible = self.visible_notifications().len();
                self.notification_selection =
                    self.notification_selection.min(visible.saturating_sub(1));
            }
            FetchResult::Reports(page) => {
                self.reports = page;
                self.report_selection = self
                    .report_selection
                    .min(self.reports.reports.len().saturating_sub(1));
            }
            FetchResult::NotificationArchived(id) => {
                if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
                    n.archived = true;
                }
                let visible = self.visible_notifications().len();
                self.notification_selection =
                    self.notification_selection.min(visible.saturating_sub(1));
                self.status_message = Some("Notification archived".to_string());
            }
            FetchResult::Error(message) => {
                warn!(%message, "Background fetch failed");
                self.refreshing = false;
                self.status_message = Some(message);
            }
        }
    }

    // =========================================================================
    // View helpers
    // =========================================================================

    /// Notifications shown in the list, honoring the archived filter.
    pub fn visible_notifications(&self) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| self.show_archived || !n.archived)
            .collect()
    }

    pub fn selected_notification(&self) -> Option<&Notification> {
        self.visible_notifications()
            .get(self.notification_selection)
            .copied()
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = match self.current_tab {
            Tab::Notifications => self.visible_notifications().len(),
            Tab::Reports => self.reports.reports.len(),
            Tab::Profile => 0,
        };
        if len == 0 {
            return;
        }
        let selection = match self.current_tab {
            Tab::Notifications => &mut self.notification_selection,
            Tab::Reports => &mut self.report_selection,
            Tab::Profile => return,
        };
        let new = selection.saturating_add_signed(delta).min(len - 1);
        *selection = new;
    }
}

/// A result is stale when the session epoch moved on (login or logout)
/// after the request was issued.
fn is_stale(issued_epoch: u64, current_epoch: u64) -> bool {
    issued_epoch != current_epoch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle_round_trips() {
        let mut tab = Tab::Notifications;
        for _ in 0..3 {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::Notifications);
        assert_eq!(Tab::Reports.prev(), Tab::Notifications);
        assert_eq!(Tab::Notifications.prev(), Tab::Profile);
    }

    #[test]
    fn test_results_from_superseded_sessions_are_stale() {
        // Issued before a login/logout bumped the epoch: dropped
        assert!(is_stale(1, 2));
        // A logout-then-login pair also invalidates in-flight work
        assert!(is_stale(2, 4));
        // Same session: applied
        assert!(!is_stale(3, 3));
    }

    #[tokio::test]
    async fn test_check_background_tasks_drops_superseded_results() {
        let mut app = App::new().expect("Failed to build app");
        let current = app.session.epoch();
        let note = Notification {
            id: 1,
            title: "Menu updated".to_string(),
            message: None,
            created_at: None,
            archived: false,
        };

        // Issued under an epoch the session has moved past: dropped
        app.fetch_tx
            .try_send(FetchMessage {
                epoch: current + 1,
                result: FetchResult::Notifications(vec![note.clone()]),
            })
            .expect("Failed to queue fetch result");
        app.check_background_tasks();
        assert!(app.notifications.is_empty());

        // Issued under the live epoch: applied
        app.fetch_tx
            .try_send(FetchMessage {
                epoch: current,
                result: FetchResult::Notifications(vec![note]),
            })
            .expect("Failed to queue fetch result");
        app.check_background_tasks();
        assert_eq!(app.notifications.len(), 1);
    }
}
