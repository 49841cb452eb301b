//! User-visible alert dispatch.
//!
//! All alerts flow through the [`NotificationGateway`] trait. Dispatch is
//! suppressed entirely while the global mute is on or permission has not
//! been granted, and delivery failures degrade to no-notification; the
//! calling component carries on either way.

use notify_rust::Notification;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Undecided,
    Granted,
    Denied,
    Unsupported,
}

/// One alert to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    /// Stacking key: the OS replaces an on-screen notification carrying
    /// the same tag instead of showing a duplicate.
    pub tag: Option<String>,
    pub icon: Option<String>,
    pub silent: bool,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tag: None,
            icon: None,
            silent: false,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

pub trait NotificationGateway {
    fn permission(&self) -> Permission;

    /// Fire-and-forget permission request; never blocks the tick loop.
    fn request_permission(&mut self) -> Permission;

    fn set_muted(&mut self, muted: bool);

    /// Show an alert, subject to mute and permission suppression.
    fn dispatch(&mut self, notice: &Notice);
}

/// Desktop notifications via the session notification daemon.
///
/// Desktops have no browser-style permission prompt, so a request resolves
/// to `Granted` immediately; `Denied` never occurs here.
#[derive(Debug)]
pub struct DesktopGateway {
    permission: Permission,
    muted: bool,
}

impl DesktopGateway {
    pub fn new(muted: bool) -> Self {
        Self {
            permission: Permission::Undecided,
            muted,
        }
    }
}

impl NotificationGateway for DesktopGateway {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Undecided {
            self.permission = Permission::Granted;
        }
        self.permission
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn dispatch(&mut self, notice: &Notice) {
        if self.muted || self.permission != Permission::Granted {
            return;
        }
        let mut notification = Notification::new();
        notification
            .summary(&notice.title)
            .body(&notice.body)
            .appname("focusflow")
            .icon(notice.icon.as_deref().unwrap_or("alarm-clock"));
        if let Some(tag) = &notice.tag {
            // x-canonical tag dedupes stacked notifications on freedesktop.
            notification.hint(notify_rust::Hint::Custom(
                "x-canonical-private-synchronous".into(),
                tag.clone(),
            ));
        }
        if notice.silent {
            notification.hint(notify_rust::Hint::SuppressSound(true));
        }
        if let Err(e) = notification.show() {
            tracing::warn!(error = %e, "notification delivery failed");
        }
    }
}

/// Gateway that records notices instead of showing them. Used by tests.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    pub permission: Option<Permission>,
    pub muted: bool,
    pub requests: u32,
    pub dispatched: Vec<Notice>,
}

impl NotificationGateway for RecordingGateway {
    fn permission(&self) -> Permission {
        self.permission.unwrap_or(Permission::Undecided)
    }

    fn request_permission(&mut self) -> Permission {
        self.requests += 1;
        if self.permission.is_none() {
            self.permission = Some(Permission::Granted);
        }
        self.permission.unwrap_or(Permission::Undecided)
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn dispatch(&mut self, notice: &Notice) {
        if self.muted || self.permission() != Permission::Granted {
            return;
        }
        self.dispatched.push(notice.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_gateway_suppresses_when_muted() {
        let mut gw = RecordingGateway::default();
        gw.request_permission();
        gw.set_muted(true);
        gw.dispatch(&Notice::new("Title", "Body"));
        assert!(gw.dispatched.is_empty());
        gw.set_muted(false);
        gw.dispatch(&Notice::new("Title", "Body"));
        assert_eq!(gw.dispatched.len(), 1);
    }

    #[test]
    fn undecided_permission_suppresses_dispatch() {
        let mut gw = RecordingGateway::default();
        gw.dispatch(&Notice::new("Title", "Body"));
        assert!(gw.dispatched.is_empty());
    }

    #[test]
    fn notice_builder_sets_tag() {
        let notice = Notice::new("Alarm", "ring").tag("alarm-7-30");
        assert_eq!(notice.tag.as_deref(), Some("alarm-7-30"));
        assert!(!notice.silent);
    }
}
