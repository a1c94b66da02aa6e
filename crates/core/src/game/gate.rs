//! Subscription gating for the channel-join modal.

/// Default number of wins after which the modal opens.
pub const DEFAULT_WIN_THRESHOLD: u32 = 4;

/// Decides when the subscribe modal is visible.
#[derive(Debug, Clone)]
pub struct SubscriptionGate {
    threshold: u32,
    subscribed: bool,
    open: bool,
}

impl Default for SubscriptionGate {
    fn default() -> Self {
        Self::new(DEFAULT_WIN_THRESHOLD)
    }
}

impl SubscriptionGate {
    /// Gate opening at `threshold` wins.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            subscribed: false,
            open: false,
        }
    }

    /// Whether the modal is currently shown.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the server reported the user as subscribed.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Record the server-side subscription state. A subscribed user never
    /// sees the modal again this session.
    pub fn set_subscribed(&mut self, subscribed: bool) {
        self.subscribed = subscribed;
        if subscribed {
            self.open = false;
        }
    }

    /// Feed a fresh win count; opens the modal at the threshold unless the
    /// user is already subscribed.
    pub fn record_wins(&mut self, wins: u32) {
        if self.subscribed {
            return;
        }
        if wins >= self.threshold {
            self.open = true;
        }
    }

    /// The user dismissed the modal without subscribing.
    pub fn dismiss(&mut self) {
        self.open = false;
    }

    /// The subscribe action fired. The subscription itself is not verified;
    /// the server state is read again next session.
    pub fn subscribe_clicked(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_exactly_at_threshold() {
        let mut gate = SubscriptionGate::default();
        gate.record_wins(3);
        assert!(!gate.is_open());
        gate.record_wins(4);
        assert!(gate.is_open());
    }

    #[test]
    fn stays_shut_for_subscribers() {
        let mut gate = SubscriptionGate::default();
        gate.set_subscribed(true);
        gate.record_wins(10);
        assert!(!gate.is_open());
    }

    #[test]
    fn subscribing_closes_an_open_gate() {
        let mut gate = SubscriptionGate::default();
        gate.record_wins(5);
        assert!(gate.is_open());
        gate.set_subscribed(true);
        assert!(!gate.is_open());
        // and later win reports no longer reopen it
        gate.record_wins(20);
        assert!(!gate.is_open());
    }

    #[test]
    fn dismissal_closes_but_later_wins_reopen() {
        let mut gate = SubscriptionGate::default();
        gate.record_wins(4);
        gate.dismiss();
        assert!(!gate.is_open());
        gate.record_wins(5);
        assert!(gate.is_open());
    }

    #[test]
    fn subscribe_click_closes_without_marking_subscribed() {
        let mut gate = SubscriptionGate::default();
        gate.record_wins(4);
        gate.subscribe_clicked();
        assert!(!gate.is_open());
        assert!(!gate.is_subscribed());
    }
}
