// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT client for the bridge side of the TV.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{AsyncClient, EventLoop, LastWill, MqttOptions, QoS};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{BusError, ConfigError, Error};
use crate::protocol::{TopicKind, TopicScheme};
use crate::types::Availability;

/// How long [`BusClient::disconnect`] waits for the event loop to flush.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Status topic suffix carrying the availability payload.
pub(crate) const AVAILABILITY_SUFFIX: &str = "LWT";

/// A message received on one of the command topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Full topic the message arrived on.
    pub topic: String,
    /// UTF-8 payload.
    pub payload: String,
}

/// MQTT client publishing TV state and receiving commands.
///
/// Uses the topic structure of [`TopicScheme`]:
/// - Commands: `<base>/cmnd/<device>/<command>`
/// - State: `<base>/stat/<device>/<suffix>`
///
/// The client is cheap to clone; all clones share one connection.
///
/// # Examples
///
/// ```ignore
/// use lgtv_bridge::protocol::BusClient;
///
/// let (client, mut inbound) = BusClient::builder()
///     .broker("mqtt://192.168.1.50:1883")?
///     .base_topic("gBridge/u2942")
///     .device_name("lg-tv")
///     .build()?;
///
/// client.publish("POWER", "ON", false).await?;
/// while let Some(message) = inbound.recv().await {
///     println!("{} -> {}", message.topic, message.payload);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BusClient {
    client: AsyncClient,
    topics: TopicScheme,
    /// Last published availability, replayed after every reconnect.
    availability: Arc<watch::Sender<Availability>>,
    event_loop: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl BusClient {
    /// Returns a builder for a broker on `localhost:1883`.
    #[must_use]
    pub fn builder() -> BusClientBuilder {
        BusClientBuilder::new()
    }

    /// Returns the topic scheme.
    #[must_use]
    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    /// Subscribes to a command topic.
    ///
    /// Topics passed to the builder are re-subscribed automatically after
    /// every reconnect; topics added here are not.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Mqtt`] if the request cannot be queued.
    pub async fn subscribe(&self, suffix: &str) -> Result<(), BusError> {
        let topic = self.topics.topic(TopicKind::Command, suffix);
        tracing::debug!(topic = %topic, "Subscribing");
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(BusError::Mqtt)
    }

    /// Publishes a payload on a status topic.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Mqtt`] if the request cannot be queued.
    pub async fn publish(&self, suffix: &str, payload: &str, retain: bool) -> Result<(), BusError> {
        let topic = self.topics.topic(TopicKind::Status, suffix);
        tracing::debug!(topic = %topic, payload = %payload, "Publishing MQTT message");
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(BusError::Mqtt)
    }

    /// Publishes without waiting for room in the request queue.
    ///
    /// Usable from synchronous callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Mqtt`] if the request queue is full or closed.
    pub fn try_publish(&self, suffix: &str, payload: &str, retain: bool) -> Result<(), BusError> {
        let topic = self.topics.topic(TopicKind::Status, suffix);
        tracing::debug!(topic = %topic, payload = %payload, "Publishing MQTT message");
        self.client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload)
            .map_err(BusError::Mqtt)
    }

    /// Publishes the availability payload (retained).
    ///
    /// The value is remembered and published again whenever the client
    /// reconnects, since the broker may have sent the `Offline` last will
    /// in between.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Mqtt`] if the request queue is full or closed.
    pub fn try_publish_availability(&self, availability: Availability) -> Result<(), BusError> {
        self.availability.send_replace(availability);
        self.try_publish(AVAILABILITY_SUFFIX, availability.as_str(), true)
    }

    /// Returns the availability last passed to
    /// [`try_publish_availability`](Self::try_publish_availability).
    #[must_use]
    pub fn availability(&self) -> Availability {
        *self.availability.borrow()
    }

    /// Disconnects from the broker and waits for the connection task to
    /// finish sending queued requests.
    ///
    /// A clean disconnect does not trigger the last will; publish
    /// `Offline` first if subscribers should see it.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Mqtt`] if the request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), BusError> {
        self.client.disconnect().await.map_err(BusError::Mqtt)?;

        let task = self.event_loop.lock().take();
        if let Some(task) = task
            && tokio::time::timeout(DISCONNECT_TIMEOUT, task).await.is_err()
        {
            tracing::debug!("MQTT event loop did not stop in time");
        }
        Ok(())
    }
}

/// Builder for [`BusClient`].
#[derive(Debug, Clone)]
pub struct BusClientBuilder {
    host: String,
    port: u16,
    base_topic: String,
    device_name: String,
    command_topics: Vec<String>,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    keep_alive: Duration,
    reconnect_delay: Duration,
}

impl BusClientBuilder {
    /// Default MQTT port.
    pub const DEFAULT_PORT: u16 = 1883;

    /// Creates a builder for a broker on `localhost:1883`, device `lg-tv`,
    /// listening on the `power` command topic.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: "localhost".to_string(),
            port: Self::DEFAULT_PORT,
            base_topic: String::new(),
            device_name: "lg-tv".to_string(),
            command_topics: vec!["power".to_string()],
            username: None,
            password: None,
            client_id: None,
            keep_alive: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
        }
    }

    /// Sets the broker from a URL such as `mqtt://broker:1883`.
    ///
    /// # Errors
    ///
    /// Returns error if the port is not a number.
    pub fn broker(mut self, url: &str) -> Result<Self, Error> {
        let (host, port) = parse_mqtt_url(url)?;
        self.host = host;
        self.port = port;
        Ok(self)
    }

    /// Sets the broker host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the broker port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the topic prefix, e.g. `gBridge/u2942`.
    #[must_use]
    pub fn base_topic(mut self, base: impl Into<String>) -> Self {
        self.base_topic = base.into();
        self
    }

    /// Sets the device segment of every topic.
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Replaces the command topic suffixes to subscribe to.
    #[must_use]
    pub fn command_topics<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_topics = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets authentication credentials for the MQTT broker.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = duration;
        self
    }

    /// Sets the pause between reconnection attempts.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Creates the client and starts its connection task.
    ///
    /// The connection is established in the background; command topics
    /// are subscribed on every successful connect. The broker publishes a
    /// retained `Offline` on the `LWT` topic if the bridge disappears.
    ///
    /// # Errors
    ///
    /// Returns error if the base topic or device name is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn build(self) -> Result<(BusClient, mpsc::Receiver<InboundMessage>), Error> {
        let topics = TopicScheme::new(self.base_topic, self.device_name)?;

        let client_id = self.client_id.unwrap_or_else(|| {
            let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("lgtv_bridge_{}_{}", std::process::id(), counter)
        });

        let mut mqtt_options = MqttOptions::new(&client_id, &self.host, self.port);
        mqtt_options.set_keep_alive(self.keep_alive);
        mqtt_options.set_clean_session(true);
        mqtt_options.set_last_will(LastWill::new(
            topics.topic(TopicKind::Status, AVAILABILITY_SUFFIX),
            Availability::Offline.as_str(),
            QoS::AtLeastOnce,
            true,
        ));

        if let (Some(username), Some(password)) = (self.username, self.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(10);

        let filters: Vec<String> = self
            .command_topics
            .iter()
            .map(|suffix| topics.topic(TopicKind::Command, suffix))
            .collect();

        tracing::info!(
            host = %self.host,
            port = self.port,
            client_id = %client_id,
            "Connecting to MQTT broker"
        );

        let (availability, availability_rx) = watch::channel(Availability::Offline);
        let session = Session {
            client: client.clone(),
            filters,
            availability_topic: topics.topic(TopicKind::Status, AVAILABILITY_SUFFIX),
            availability: availability_rx,
            inbound_tx,
            reconnect_delay: self.reconnect_delay,
        };
        let task = tokio::spawn(handle_bus_events(event_loop, session));

        let bus = BusClient {
            client,
            topics,
            availability: Arc::new(availability),
            event_loop: Arc::new(Mutex::new(Some(task))),
        };
        Ok((bus, inbound_rx))
    }
}

impl Default for BusClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ConfigError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p.parse().map_err(|_| ConfigError::InvalidValue {
            field: "broker".to_string(),
            message: format!("invalid port: {p}"),
        })?;
        (h.to_string(), port)
    } else {
        (url.to_string(), BusClientBuilder::DEFAULT_PORT)
    };

    Ok((host, port))
}

/// Everything the connection task needs besides the event loop.
struct Session {
    client: AsyncClient,
    filters: Vec<String>,
    availability_topic: String,
    availability: watch::Receiver<Availability>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    reconnect_delay: Duration,
}

impl Session {
    /// Subscribes the command topics and restores the retained
    /// availability after a (re)connect.
    ///
    /// Uses the non-blocking request API: the event loop must not await
    /// its own request queue.
    fn on_connected(&self) {
        for filter in &self.filters {
            tracing::debug!(topic = %filter, "Subscribing");
            if let Err(e) = self.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                tracing::warn!(topic = %filter, error = %e, "Subscription request failed");
            }
        }

        let availability = *self.availability.borrow();
        if let Err(e) = self.client.try_publish(
            self.availability_topic.as_str(),
            QoS::AtLeastOnce,
            true,
            availability.as_str(),
        ) {
            tracing::warn!(error = %e, "Failed to restore availability");
        }
    }
}

/// Drives the connection: re-subscribes on connect, forwards publishes,
/// and keeps retrying after connection errors until disconnected.
async fn handle_bus_events(mut event_loop: EventLoop, session: Session) {
    use rumqttc::{Event, Outgoing, Packet};

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::info!(code = ?connack.code, "MQTT connected");
                session.on_connected();
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Ok(payload) = String::from_utf8(publish.payload.to_vec()) else {
                    tracing::warn!(topic = %publish.topic, "Ignoring non UTF-8 payload");
                    continue;
                };
                tracing::debug!(topic = %publish.topic, payload = %payload, "Received MQTT message");

                let message = InboundMessage {
                    topic: publish.topic.clone(),
                    payload,
                };
                if session.inbound_tx.send(message).await.is_err() {
                    tracing::debug!("Inbound receiver dropped, message discarded");
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!("MQTT disconnected");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "MQTT connection error, retrying");
                tokio::time::sleep(session.reconnect_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mqtt_url_with_port() {
        let (host, port) = parse_mqtt_url("mqtt://192.168.1.50:1883").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_default_port() {
        let (host, port) = parse_mqtt_url("mqtt-server").unwrap();
        assert_eq!(host, "mqtt-server");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_invalid_port() {
        assert!(parse_mqtt_url("tcp://broker:abc").is_err());
    }

    #[test]
    fn builder_with_options() {
        let builder = BusClientBuilder::new()
            .broker("tcp://broker.local:8883")
            .unwrap()
            .base_topic("gBridge/u2942/")
            .device_name("lg-tv")
            .command_topics(["power", "POWER"])
            .credentials("user", "pass")
            .client_id("my_client")
            .keep_alive(Duration::from_secs(60));

        assert_eq!(builder.host, "broker.local");
        assert_eq!(builder.port, 8883);
        assert_eq!(builder.command_topics, ["power", "POWER"]);
        assert_eq!(builder.username.as_deref(), Some("user"));
        assert_eq!(builder.client_id.as_deref(), Some("my_client"));
        assert_eq!(builder.keep_alive, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn build_rejects_wildcard_device() {
        let result = BusClientBuilder::new().device_name("tv/#").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
