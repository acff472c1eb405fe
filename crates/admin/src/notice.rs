//! User-visible notifications produced by the reconciler.

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// The user action a notice reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    Load,
    /// The update/delete phase of a save.
    SaveUpdate,
    /// The create phase of a save.
    SaveCreate,
    Save,
    Delete,
}

impl std::fmt::Display for NoticeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NoticeAction::Load => "Load",
            NoticeAction::SaveUpdate => "Save changes",
            NoticeAction::SaveCreate => "Publish new records",
            NoticeAction::Save => "Save",
            NoticeAction::Delete => "Delete",
        };
        f.write_str(label)
    }
}

/// A toast/banner message queued for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub action: NoticeAction,
    pub message: String,
}

impl Notice {
    pub fn info(action: NoticeAction, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            action,
            message: message.into(),
        }
    }

    pub fn warning(action: NoticeAction, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            action,
            message: message.into(),
        }
    }

    pub fn error(action: NoticeAction, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            action,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}
