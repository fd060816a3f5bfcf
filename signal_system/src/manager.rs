use crate::event::StatementEvent;
use crate::types::StatementCallback;

/// Fan-out of statement events to registered observers
pub struct SignalManager {
    callbacks: std::sync::RwLock<Vec<StatementCallback>>,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self {
            callbacks: std::sync::RwLock::new(Vec::new()),
        }
    }

    /// Add statement observer
    pub fn add_callback<F>(&self, callback: F)
    where
        F: Fn(&StatementEvent) + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push(Box::new(callback));
        }
    }

    /// Hand the event to every observer in registration order
    pub fn emit(&self, event: StatementEvent) {
        match self.callbacks.read() {
            Ok(callbacks) => {
                for callback in callbacks.iter() {
                    callback(&event);
                }
            }
            Err(_) => tracing::warn!("[SIGNAL] callback registry poisoned, event {} dropped", event.id),
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StatementKind;
    use std::sync::{Arc, Mutex};

    #[test]
    fn emits_to_every_callback_in_order() {
        let manager = SignalManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            manager.add_callback(move |event: &StatementEvent| {
                seen.lock().unwrap().push(format!("{}:{}", tag, event.text));
            });
        }

        manager.emit(StatementEvent::new(
            StatementKind::Query,
            "SELECT 1",
            Vec::new(),
        ));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:SELECT 1".to_string(), "second:SELECT 1".to_string()]
        );
    }

    #[test]
    fn clearing_removes_observers() {
        let manager = SignalManager::new();
        manager.add_callback(|_| {});
        manager.add_callback(|_| {});
        assert_eq!(manager.callback_count(), 2);

        manager.clear_callbacks();
        assert_eq!(manager.callback_count(), 0);
        manager.emit(StatementEvent::new(
            StatementKind::TransactionControl,
            "BEGIN",
            Vec::new(),
        ));
    }

    #[test]
    fn event_counts_parameters() {
        let event = StatementEvent::new(
            StatementKind::Transactional,
            "DELETE FROM public.t WHERE id = $1 RETURNING *",
            vec![serde_json::json!(7)],
        );
        assert_eq!(event.parameter_count(), 1);
        assert_eq!(event.kind, StatementKind::Transactional);
    }
}
