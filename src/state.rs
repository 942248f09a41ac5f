// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use crate::config::Config;
use crate::ledger::LedgerClient;

/// Shared read-only application state. Cloned per request; nothing in it is
/// mutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: LedgerClient,
}

impl AppState {
    pub fn new(config: Config, ledger: LedgerClient) -> Self {
        Self {
            config: Arc::new(config),
            ledger,
        }
    }
}
