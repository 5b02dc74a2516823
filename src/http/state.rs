use crate::storage::StorageInstance;
use std::sync::Arc;

pub const DEFAULT_WINDOW_HOURS: u32 = 24;
pub const MAX_WINDOW_HOURS: u32 = 24 * 365;

#[derive(Clone, Debug)]
pub struct HttpServerState {
    pub storage: Arc<dyn StorageInstance>,
    /// Lookback used when a readings query names no window.
    pub default_window_hours: u32,
    pub max_window_hours: u32,
}

impl HttpServerState {
    pub fn new(storage: Arc<dyn StorageInstance>) -> Self {
        Self {
            storage,
            default_window_hours: DEFAULT_WINDOW_HOURS,
            max_window_hours: MAX_WINDOW_HOURS,
        }
    }

    pub fn with_window_hours(mut self, default_window_hours: u32, max_window_hours: u32) -> Self {
        self.default_window_hours = default_window_hours;
        self.max_window_hours = max_window_hours;
        self
    }
}
