//! Transaction toasts: one toast per operation, moved through its states
//! as the operation progresses.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use chrono::{DateTime, Utc};

pub type ToastId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Pending,
    Info,
    Approved,
    Success,
    Rejected,
    Failed,
}

impl ToastLevel {
    /// Whether the toast has reached a final state.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ToastLevel::Success | ToastLevel::Rejected | ToastLevel::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub level: ToastLevel,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

pub trait Notifier: Send + Sync {
    fn start(&self, message: &str) -> ToastId;

    fn set(&self, id: ToastId, level: ToastLevel, message: &str);

    fn update(&self, id: ToastId, message: &str) {
        self.set(id, ToastLevel::Info, message);
    }

    fn approve(&self, id: ToastId, message: &str) {
        self.set(id, ToastLevel::Approved, message);
    }

    fn complete(&self, id: ToastId, message: &str) {
        self.set(id, ToastLevel::Success, message);
    }

    fn reject(&self, id: ToastId, message: &str) {
        self.set(id, ToastLevel::Rejected, message);
    }

    fn fail(&self, id: ToastId, message: &str) {
        self.set(id, ToastLevel::Failed, message);
    }
}

/// In-memory toast list, newest last.
#[derive(Debug, Default)]
pub struct ToastBoard {
    next_id: AtomicU64,
    toasts: Mutex<Vec<Toast>>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Drops settled toasts older than `max_age_secs`.
    pub fn prune(&self, now: DateTime<Utc>, max_age_secs: i64) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.retain(|t| {
                !t.level.is_settled() || (now - t.updated_at).num_seconds() < max_age_secs
            });
        }
    }

    pub fn get(&self, id: ToastId) -> Option<Toast> {
        self.toasts
            .lock()
            .ok()
            .and_then(|t| t.iter().find(|t| t.id == id).cloned())
    }
}

impl Notifier for ToastBoard {
    fn start(&self, message: &str) -> ToastId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(Toast {
                id,
                level: ToastLevel::Pending,
                message: message.to_string(),
                updated_at: Utc::now(),
            });
        }
        id
    }

    fn set(&self, id: ToastId, level: ToastLevel, message: &str) {
        let Ok(mut toasts) = self.toasts.lock() else {
            return;
        };
        match toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) => {
                toast.level = level;
                toast.message = message.to_string();
                toast.updated_at = Utc::now();
            }
            None => toasts.push(Toast {
                id,
                level,
                message: message.to_string(),
                updated_at: Utc::now(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn toast_moves_through_states() {
        let board = ToastBoard::new();
        let id = board.start("Initializing buy With ETH transaction...");
        assert_eq!(board.get(id).unwrap().level, ToastLevel::Pending);

        board.update(id, "USDT already approved, proceeding with purchase...");
        assert_eq!(board.get(id).unwrap().level, ToastLevel::Info);

        board.complete(id, "done");
        let toast = board.get(id).unwrap();
        assert_eq!(toast.level, ToastLevel::Success);
        assert_eq!(toast.message, "done");
        assert_eq!(board.snapshot().len(), 1);
    }

    #[test]
    fn ids_are_unique_and_prune_keeps_pending() {
        let board = ToastBoard::new();
        let a = board.start("a");
        let b = board.start("b");
        assert_ne!(a, b);
        board.fail(a, "failed");

        board.prune(Utc::now() + Duration::seconds(60), 10);
        let left = board.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b);
    }
}
