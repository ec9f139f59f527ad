//! Host shell collaborators: notification queue, session polling, notification loop, router.
//!
//! The store only triggers these; delivery, polling and navigation belong to the host.

use crate::notify::Notification;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

pub trait NotificationSink: Send + Sync {
    /// Enqueue for display. Fire-and-forget.
    fn queue(&self, notification: Notification);
}

pub trait SessionService: Send + Sync {
    fn init(&self, base_url: &str);
    /// Begin polling the session endpoint.
    fn start_loop(&self);
}

pub trait NotificationLoop: Send + Sync {
    fn start(&self);
}

pub trait Router: Send + Sync {
    /// Base path for both the routing table and the history mechanism.
    fn set_base_path(&self, base_path: &str);
}

#[derive(Clone)]
pub struct Shell {
    pub notifications: Arc<dyn NotificationSink>,
    pub session: Arc<dyn SessionService>,
    pub notification_loop: Arc<dyn NotificationLoop>,
    pub router: Arc<dyn Router>,
}

impl Shell {
    /// Logs every notification; session, loop and router requests are recorded by a [`LocalShell`].
    pub fn logging() -> Self {
        Shell::with_notifications(Arc::new(TracingNotifier))
    }

    pub fn with_notifications(notifications: Arc<dyn NotificationSink>) -> Self {
        let local = Arc::new(LocalShell::default());
        Shell {
            notifications,
            session: local.clone(),
            notification_loop: local.clone(),
            router: local,
        }
    }
}

/// Default sink: notifications go to the log.
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn queue(&self, notification: Notification) {
        match &notification.error {
            Some(error) => tracing::warn!(error = %error, "{}", notification.message),
            None => tracing::info!("{}", notification.message),
        }
    }
}

/// Forwards notifications to an unbounded channel the host drains.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNotifier { tx }, rx)
    }
}

impl NotificationSink for ChannelNotifier {
    fn queue(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}

/// In-process stand-in for the host shell: remembers what it was asked to do.
#[derive(Default)]
pub struct LocalShell {
    inner: RwLock<LocalShellState>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalShellState {
    pub router_base_path: Option<String>,
    pub session_base_url: Option<String>,
    pub session_polling: bool,
    pub notifications_polling: bool,
}

impl LocalShell {
    pub fn snapshot(&self) -> LocalShellState {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update<F: FnOnce(&mut LocalShellState)>(&self, f: F) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}

impl SessionService for LocalShell {
    fn init(&self, base_url: &str) {
        tracing::debug!(base_url = %base_url, "session init");
        self.update(|s| s.session_base_url = Some(base_url.to_string()));
    }

    fn start_loop(&self) {
        self.update(|s| s.session_polling = true);
    }
}

impl NotificationLoop for LocalShell {
    fn start(&self) {
        self.update(|s| s.notifications_polling = true);
    }
}

impl Router for LocalShell {
    fn set_base_path(&self, base_path: &str) {
        tracing::debug!(base_path = %base_path, "router base path");
        self.update(|s| s.router_base_path = Some(base_path.to_string()));
    }
}
