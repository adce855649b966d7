// Session ID Provider Port

/// Names stream sessions in logs and in the `connected` frame
pub trait IdProvider: Send + Sync {
    fn session_id(&self) -> String;
}

/// Random v4 UUIDs, hyphenated
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn session_id(&self) -> String {
        uuid::Uuid::new_v4().hyphenated().to_string()
    }
}

pub mod mocks {
    use super::IdProvider;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// `session-1`, `session-2`, ...
    #[derive(Default)]
    pub struct SequentialIds {
        next: AtomicU64,
    }

    impl IdProvider for SequentialIds {
        fn session_id(&self) -> String {
            format!("session-{}", self.next.fetch_add(1, Ordering::Relaxed) + 1)
        }
    }
}
