//! Push-channel client with auto-reconnection
//!
//! One WebSocket connection per client session. Subscriptions are tracked
//! across reconnects: after the link comes back, every active topic is
//! re-registered before events flow again.

use backoff::{backoff::Backoff, ExponentialBackoff};
use futures::{SinkExt, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::live::events::{PushEvent, Topic, TopicFrame};

#[derive(Error, Debug)]
pub enum PushError {
    #[error("connection error: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("push channel closed")]
    ChannelSend,
}

#[derive(Debug)]
enum PushCommand {
    Subscribe(Topic),
    Unsubscribe(Topic),
    Disconnect,
}

/// Guard for one topic registration. Dropping it unsubscribes, so a torn
/// down view cannot leave a duplicate registration behind on remount.
pub struct Subscription {
    topic: Topic,
    command_tx: mpsc::UnboundedSender<PushCommand>,
}

impl Subscription {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self
            .command_tx
            .send(PushCommand::Unsubscribe(self.topic.clone()));
    }
}

/// Handle to the push connection task.
pub struct PushClient {
    command_tx: mpsc::UnboundedSender<PushCommand>,
    event_rx: broadcast::Receiver<PushEvent>,
}

impl PushClient {
    /// Spawn the connection task and return a handle to it.
    pub fn connect(config: &ClientConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = broadcast::channel(config.event_buffer_size);

        let url = config.push_url.to_string();
        let task_config = config.clone();
        tokio::spawn(async move {
            connection_task(url, task_config, command_rx, event_tx).await;
        });

        Self {
            command_tx,
            event_rx,
        }
    }

    /// Register interest in one topic. The returned guard unsubscribes on
    /// drop.
    pub fn subscribe(&self, topic: Topic) -> Result<Subscription, PushError> {
        self.command_tx
            .send(PushCommand::Subscribe(topic.clone()))
            .map_err(|_| PushError::ChannelSend)?;
        Ok(Subscription {
            topic,
            command_tx: self.command_tx.clone(),
        })
    }

    /// Receiver for incoming push events.
    pub fn events(&self) -> broadcast::Receiver<PushEvent> {
        self.event_rx.resubscribe()
    }

    pub fn disconnect(&self) -> Result<(), PushError> {
        self.command_tx
            .send(PushCommand::Disconnect)
            .map_err(|_| PushError::ChannelSend)
    }
}

/// Reconnection bookkeeping. A successful handshake resets both the delay
/// and the attempt budget, so only consecutive failures count against the
/// configured limit.
struct ReconnectState {
    backoff: ExponentialBackoff,
    attempts: u32,
    max_attempts: u32,
}

impl ReconnectState {
    fn new(config: &ClientConfig) -> Self {
        Self {
            backoff: ExponentialBackoff {
                initial_interval: Duration::from_millis(config.initial_reconnect_delay_ms),
                max_interval: Duration::from_millis(config.max_reconnect_delay_ms),
                max_elapsed_time: None,
                ..Default::default()
            },
            attempts: 0,
            max_attempts: config.max_reconnect_attempts,
        }
    }

    fn connected(&mut self) {
        self.backoff.reset();
        self.attempts = 0;
    }

    /// Delay before the next attempt, or `None` once the budget is spent
    /// (0 = unlimited).
    fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts > 0 && self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        self.backoff.next_backoff()
    }
}

/// Outer reconnection loop. Active topics survive across connections.
async fn connection_task(
    url: String,
    config: ClientConfig,
    mut command_rx: mpsc::UnboundedReceiver<PushCommand>,
    event_tx: broadcast::Sender<PushEvent>,
) {
    let mut active: HashSet<Topic> = HashSet::new();
    let mut reconnect = ReconnectState::new(&config);

    loop {
        match connect_and_run(
            &url,
            &config,
            &mut command_rx,
            &event_tx,
            &mut active,
            &mut reconnect,
        )
        .await
        {
            Ok(()) => {
                info!("push connection closed normally");
                break;
            }
            Err(e) => {
                error!("push connection error: {e}");

                match reconnect.next_delay() {
                    Some(delay) => {
                        warn!(attempt = reconnect.attempts, "reconnecting in {delay:?}");
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        error!("maximum reconnection attempts reached");
                        break;
                    }
                }
            }
        }
    }
}

async fn connect_and_run(
    url: &str,
    config: &ClientConfig,
    command_rx: &mut mpsc::UnboundedReceiver<PushCommand>,
    event_tx: &broadcast::Sender<PushEvent>,
    active: &mut HashSet<Topic>,
    reconnect: &mut ReconnectState,
) -> Result<(), PushError> {
    info!("connecting to push channel: {url}");

    let (ws_stream, response) = connect_async(url).await?;
    let (mut write, mut read) = ws_stream.split();

    info!(status = ?response.status(), "push channel connected");
    reconnect.connected();

    // Re-register everything that was active before the drop.
    for topic in active.iter() {
        let frame = serde_json::to_string(&TopicFrame {
            action: "subscribe",
            topic,
        })?;
        debug!(%topic, "re-subscribing after connect");
        write.send(Message::Text(frame.into())).await?;
    }

    let mut heartbeat = interval(Duration::from_secs(config.heartbeat_interval_secs));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_pong = Instant::now();
    let pong_timeout = Duration::from_secs(config.heartbeat_interval_secs * 2);

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        // Unparseable frames are dropped, never fatal to
                        // the subscription.
                        match serde_json::from_str::<PushEvent>(&text) {
                            Ok(event) => {
                                debug!(event = %event.event, "push event received");
                                if event_tx.send(event).is_err() {
                                    debug!("no push event receivers");
                                }
                            }
                            Err(e) => {
                                warn!("dropping malformed push frame: {e}");
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("push channel closed by server");
                        break;
                    }
                    Some(Err(e)) => {
                        return Err(PushError::Connection(e));
                    }
                    None => {
                        return Err(PushError::Connection(
                            tokio_tungstenite::tungstenite::Error::ConnectionClosed,
                        ));
                    }
                    _ => {
                        // Ignore binary and ping frames
                    }
                }
            }

            cmd = command_rx.recv() => {
                match cmd {
                    Some(PushCommand::Subscribe(topic)) => {
                        if active.insert(topic.clone()) {
                            let frame = serde_json::to_string(&TopicFrame {
                                action: "subscribe",
                                topic: &topic,
                            })?;
                            info!(%topic, "subscribing");
                            write.send(Message::Text(frame.into())).await?;
                        } else {
                            debug!(%topic, "already subscribed");
                        }
                    }
                    Some(PushCommand::Unsubscribe(topic)) => {
                        if active.remove(&topic) {
                            let frame = serde_json::to_string(&TopicFrame {
                                action: "unsubscribe",
                                topic: &topic,
                            })?;
                            info!(%topic, "unsubscribing");
                            write.send(Message::Text(frame.into())).await?;
                        }
                    }
                    Some(PushCommand::Disconnect) => {
                        info!("disconnect requested");
                        write.send(Message::Close(None)).await?;
                        return Ok(());
                    }
                    None => {
                        warn!("push command channel closed");
                        return Ok(());
                    }
                }
            }

            _ = heartbeat.tick() => {
                if last_pong.elapsed() > pong_timeout {
                    warn!("heartbeat timeout, no pong received");
                    return Err(PushError::Connection(
                        tokio_tungstenite::tungstenite::Error::ConnectionClosed,
                    ));
                }
                debug!("sending heartbeat ping");
                write.send(Message::Ping(vec![].into())).await?;
            }
        }
    }

    Err(PushError::Connection(
        tokio_tungstenite::tungstenite::Error::ConnectionClosed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_handle_creation_does_not_block() {
        let config = ClientConfig::default();
        let client = PushClient::connect(&config);
        // The connection itself will fail (nothing is listening), but the
        // handle and its command channel must be usable immediately.
        let sub = client.subscribe(Topic::PortfolioList);
        assert!(sub.is_ok());
    }

    #[test]
    fn reconnect_budget_is_spent_by_consecutive_failures_only() {
        let config = ClientConfig {
            max_reconnect_attempts: 2,
            ..ClientConfig::default()
        };
        let mut reconnect = ReconnectState::new(&config);

        assert!(reconnect.next_delay().is_some());
        assert!(reconnect.next_delay().is_some());
        assert!(reconnect.next_delay().is_none());

        // A successful handshake restores the full budget.
        reconnect.connected();
        assert!(reconnect.next_delay().is_some());
        assert!(reconnect.next_delay().is_some());
        assert!(reconnect.next_delay().is_none());
    }

    #[test]
    fn successful_connection_resets_the_backoff_delay() {
        let config = ClientConfig {
            initial_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 30000,
            ..ClientConfig::default()
        };
        let mut reconnect = ReconnectState::new(&config);

        for _ in 0..20 {
            reconnect.next_delay();
        }
        reconnect.connected();

        // Default randomization is +/-50% of the interval, so a freshly
        // reset backoff stays at or under 1.5x the initial delay.
        let delay = reconnect.next_delay().unwrap();
        assert!(delay <= Duration::from_millis(1500), "delay was {delay:?}");
    }

    #[tokio::test]
    async fn dropping_a_subscription_sends_unsubscribe() {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let sub = Subscription {
            topic: Topic::Stock { id: 3 },
            command_tx,
        };
        drop(sub);

        match command_rx.recv().await {
            Some(PushCommand::Unsubscribe(Topic::Stock { id: 3 })) => {}
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
