use super::*;

/// Pending admin forms keyed by Telegram user id. Idle users have no entry.
#[derive(Debug, Default)]
pub(super) struct Sessions {
    by_user: HashMap<u64, Session>,
}

impl Sessions {
    #[cfg(test)]
    pub(super) fn get(&self, user_id: u64) -> Session {
        self.by_user.get(&user_id).cloned().unwrap_or_default()
    }

    pub(super) fn begin_add(&mut self, user_id: u64) {
        self.by_user.insert(user_id, Session::AwaitingAdd);
    }

    pub(super) fn begin_edit(&mut self, user_id: u64, name: &str) {
        self.by_user.insert(
            user_id,
            Session::AwaitingEdit {
                name: name.to_string(),
            },
        );
    }

    /// Removes and returns the pending form; every form is single use.
    pub(super) fn take(&mut self, user_id: u64) -> Session {
        self.by_user.remove(&user_id).unwrap_or_default()
    }
}
