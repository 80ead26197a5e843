// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Observable session and wallet state

use tokio::sync::watch;

use crate::wallet::WalletRecord;

/// Session status
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    /// Not yet probed
    Unknown,
    /// No session
    Inactive,
    /// Session exists but login is incomplete
    Active,
    /// Fully logged in
    ActiveLoggedIn,
}

/// Session state and wallet list for a single client session
///
/// Updated by [ParaHandle][crate::ParaHandle] as calls complete,
/// consumers observe via [SessionStore::subscribe_state] and
/// [SessionStore::subscribe_wallets].
#[derive(Debug)]
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    wallets: watch::Sender<Vec<WalletRecord>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: watch::channel(SessionState::Unknown).0,
            wallets: watch::channel(vec![]).0,
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Current wallets
    pub fn wallets(&self) -> Vec<WalletRecord> {
        self.wallets.borrow().clone()
    }

    /// Watch session state changes
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Watch wallet list changes
    pub fn subscribe_wallets(&self) -> watch::Receiver<Vec<WalletRecord>> {
        self.wallets.subscribe()
    }

    pub(crate) fn set_state(&self, s: SessionState) {
        log::debug!("Session state: {}", s);
        self.state.send_replace(s);
    }

    pub(crate) fn set_wallets(&self, w: Vec<WalletRecord>) {
        self.wallets.send_replace(w);
    }

    /// Set the probed state, unless the state was already updated
    pub(crate) fn settle(&self, s: SessionState) -> bool {
        let settled = self.state.send_if_modified(|current| {
            if *current != SessionState::Unknown {
                return false;
            }
            *current = s;
            true
        });

        if settled {
            log::debug!("Session state probed: {}", s);
        }

        settled
    }

    /// Reset to a logged out session
    pub(crate) fn clear(&self) {
        self.set_wallets(vec![]);
        self.set_state(SessionState::Inactive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn observers_see_updates() {
        let s = SessionStore::new();
        let mut rx = s.subscribe_state();
        assert_eq!(s.state(), SessionState::Unknown);

        s.set_state(SessionState::ActiveLoggedIn);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::ActiveLoggedIn);

        s.clear();
        assert_eq!(s.state(), SessionState::Inactive);
        assert!(s.wallets().is_empty());
    }

    #[test]
    fn probe_does_not_override_updates() {
        let s = SessionStore::new();
        assert!(s.settle(SessionState::Active));
        assert_eq!(s.state(), SessionState::Active);

        let s = SessionStore::new();
        s.set_state(SessionState::ActiveLoggedIn);
        assert!(!s.settle(SessionState::Inactive));
        assert_eq!(s.state(), SessionState::ActiveLoggedIn);
        assert!(s.wallets().is_empty());
    }
}
