//! Background synchronisation with the remote services.
//!
//! [`Bootstrap`] pulls the session snapshot (channel, subscription state,
//! balance, win count); [`Settlement`] pushes a resolved round's effects
//! and reads the win counter back. Both run off the UI task and report
//! over an mpsc channel, so a slow or failing service never blocks a tick.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    api::{ApiClient, ApiError},
    config::Identity,
    game::Outcome,
    models::Channel,
};

/// Events emitted by the background synchronisation tasks.
#[derive(Debug)]
pub enum SyncEvent {
    /// Channel metadata arrived.
    Channel(Channel),
    /// Server-side subscription state arrived.
    Subscription(bool),
    /// Server-side balance arrived (bootstrap reconcile).
    Balance(i64),
    /// Server-side win count arrived during bootstrap.
    Wins(u32),
    /// Post-settlement win count, tagged with the round that produced it.
    /// Consumers must drop it when the round is no longer the latest.
    RoundWins {
        /// Round whose settlement produced this count.
        round_id: u64,
        /// The count read back after the increment.
        wins: u32,
    },
    /// A background call failed; the UI surfaces it and moves on.
    Failed {
        /// Which call failed.
        context: &'static str,
        /// The underlying error.
        error: ApiError,
    },
}

/// Fetches the initial session snapshot.
pub struct Bootstrap {
    client: ApiClient,
    identity: Identity,
}

impl Bootstrap {
    /// Bootstrap task for the given user.
    pub fn new(client: ApiClient, identity: Identity) -> Self {
        Self { client, identity }
    }

    /// Run all bootstrap fetches, reporting each result as it lands.
    /// Subscription state is reported before the win count so gate checks
    /// see both in a fixed order.
    pub async fn run(self, sender: mpsc::Sender<SyncEvent>) {
        debug!(user = self.identity.user_id, "bootstrap started");

        match self.client.channel(&self.identity).await {
            Ok(channel) => send(&sender, SyncEvent::Channel(channel)).await,
            Err(error) => {
                send(
                    &sender,
                    SyncEvent::Failed {
                        context: "channel fetch",
                        error,
                    },
                )
                .await
            }
        }

        match self.client.check_subscription(&self.identity).await {
            Ok(subscribed) => send(&sender, SyncEvent::Subscription(subscribed)).await,
            Err(error) => {
                send(
                    &sender,
                    SyncEvent::Failed {
                        context: "subscription check",
                        error,
                    },
                )
                .await
            }
        }

        match self.client.balance(&self.identity).await {
            Ok(balance) => send(&sender, SyncEvent::Balance(balance)).await,
            Err(error) => {
                send(
                    &sender,
                    SyncEvent::Failed {
                        context: "balance fetch",
                        error,
                    },
                )
                .await
            }
        }

        match self.client.wins(&self.identity).await {
            Ok(wins) => send(&sender, SyncEvent::Wins(wins)).await,
            Err(error) => {
                send(
                    &sender,
                    SyncEvent::Failed {
                        context: "wins fetch",
                        error,
                    },
                )
                .await
            }
        }
    }
}

/// Pushes one resolved round's effects to the services.
pub struct Settlement {
    client: ApiClient,
    identity: Identity,
    round_id: u64,
    outcome: Outcome,
    delta: i64,
    subscribed: bool,
}

impl Settlement {
    /// Settlement for round `round_id` with the signed balance `delta`.
    /// `subscribed` decides whether the win-count read-back is needed.
    pub fn new(
        client: ApiClient,
        identity: Identity,
        round_id: u64,
        outcome: Outcome,
        delta: i64,
        subscribed: bool,
    ) -> Self {
        Self {
            client,
            identity,
            round_id,
            outcome,
            delta,
            subscribed,
        }
    }

    /// Balance update, then the unconditional win increment, then, for
    /// unsubscribed users, the win-count read-back driving the gate.
    pub async fn run(self, sender: mpsc::Sender<SyncEvent>) {
        debug!(
            round = self.round_id,
            outcome = ?self.outcome,
            delta = self.delta,
            "settling round"
        );

        if let Err(error) = self.client.update_balance(&self.identity, self.delta).await {
            warn!(round = self.round_id, %error, "balance update failed");
            send(
                &sender,
                SyncEvent::Failed {
                    context: "balance update",
                    error,
                },
            )
            .await;
        }

        if let Err(error) = self.client.increase_wins(&self.identity).await {
            warn!(round = self.round_id, %error, "win increment failed");
            send(
                &sender,
                SyncEvent::Failed {
                    context: "win increment",
                    error,
                },
            )
            .await;
            return;
        }

        if self.subscribed {
            return;
        }

        match self.client.wins(&self.identity).await {
            Ok(wins) => {
                send(
                    &sender,
                    SyncEvent::RoundWins {
                        round_id: self.round_id,
                        wins,
                    },
                )
                .await
            }
            Err(error) => {
                send(
                    &sender,
                    SyncEvent::Failed {
                        context: "wins fetch",
                        error,
                    },
                )
                .await
            }
        }
    }
}

async fn send(sender: &mpsc::Sender<SyncEvent>, event: SyncEvent) {
    // The receiver going away just means the app is shutting down.
    let _ = sender.send(event).await;
}
