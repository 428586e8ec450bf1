//! MQTT broker sink.
//!
//! Connects once, waits for the broker's CONNACK, then hands the rumqttc event
//! loop to a background task. Publishing only enqueues on the client; delivery
//! and reconnects are driven by that task. Neither `publish` nor `close` waits
//! on the request queue, so a lost broker surfaces as errors rather than a
//! stalled caller.

use crate::{PublishError, Publisher};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    TlsConfiguration, Transport,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default port for plain MQTT.
pub const DEFAULT_PORT: u16 = 1883;

/// Default port for MQTT over TLS.
pub const DEFAULT_TLS_PORT: u16 = 8883;

/// Capacity of the client's request queue.
const REQUEST_CAPACITY: usize = 64;

/// How long `close` waits for the DISCONNECT to go out.
const DISCONNECT_GRACE: Duration = Duration::from_millis(250);

/// Pause after a connection error before polling again.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Broker host, port and transport parsed from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl FromStr for BrokerAddress {
    type Err = PublishError;

    /// Parse `scheme://host[:port]`. Plain schemes are `tcp` and `mqtt`; TLS
    /// schemes are `ssl`, `tls` and `mqtts`. A missing scheme means `tcp`.
    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PublishError::InvalidBrokerUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim();
        let (scheme, rest) = trimmed.split_once("://").unwrap_or(("tcp", trimmed));
        let tls = match scheme.to_ascii_lowercase().as_str() {
            "tcp" | "mqtt" => false,
            "ssl" | "tls" | "mqtts" => true,
            _ => return Err(invalid("unsupported scheme")),
        };

        let authority = rest.trim_end_matches('/');
        if authority.contains('/') {
            return Err(invalid("unexpected path"));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| invalid("bad port"))?;
                (host, port)
            }
            None if tls => (authority, DEFAULT_TLS_PORT),
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

/// Configuration for [`MqttPublisher`].
#[derive(Clone, Debug)]
pub struct MqttConfig {
    /// Broker URL, e.g. `tcp://localhost:1883`.
    pub broker_url: String,

    /// MQTT client identifier.
    pub client_id: String,

    /// Optional username.
    pub username: Option<String>,

    /// Optional password (only sent with a username).
    pub password: Option<String>,

    /// Accept any server certificate on TLS connections.
    pub insecure_skip_verify: bool,

    /// QoS level for every publish (0, 1 or 2).
    pub qos: u8,

    /// Retain flag for every publish.
    pub retain: bool,

    /// Time allowed for the broker to acknowledge the connection.
    pub connect_timeout: Duration,

    /// Keep-alive interval.
    pub keep_alive: Duration,
}

impl MqttConfig {
    /// Create a configuration for the given broker.
    pub fn new(broker_url: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            client_id: "train-seat-sim".to_string(),
            username: None,
            password: None,
            insecure_skip_verify: false,
            qos: 0,
            retain: false,
            connect_timeout: Duration::from_secs(5),
            keep_alive: Duration::from_secs(30),
        }
    }

    /// Set the client identifier.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set credentials. Blank values are treated as absent.
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        let non_blank = |s: Option<String>| {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        self.username = non_blank(username);
        self.password = non_blank(password);
        self
    }

    /// Read credentials from `MQTT_USERNAME` and `MQTT_PASSWORD`.
    pub fn with_credentials_from_env(self) -> Self {
        self.with_credentials(
            std::env::var("MQTT_USERNAME").ok(),
            std::env::var("MQTT_PASSWORD").ok(),
        )
    }

    /// Skip TLS certificate verification.
    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Set the QoS level.
    pub fn with_qos(mut self, qos: u8) -> Self {
        self.qos = qos;
        self
    }

    /// Set the retain flag.
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Map a numeric QoS level to rumqttc's enum.
pub fn qos_from_level(level: u8) -> Result<QoS, PublishError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(PublishError::InvalidQos(other)),
    }
}

/// Publishes to an MQTT broker.
pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
    retain: bool,
    cancel: CancellationToken,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttPublisher {
    /// Connect to the broker and wait for it to accept the session.
    pub async fn connect(config: MqttConfig) -> Result<Self, PublishError> {
        let address: BrokerAddress = config.broker_url.parse()?;
        let qos = qos_from_level(config.qos)?;

        let mut options = MqttOptions::new(&config.client_id, &address.host, address.port);
        options.set_keep_alive(config.keep_alive);
        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.clone().unwrap_or_default());
        }
        if address.tls {
            options.set_transport(tls_transport(config.insecure_skip_verify));
        }

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        match tokio::time::timeout(config.connect_timeout, wait_for_connack(&mut event_loop)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(PublishError::ConnectTimeout(config.broker_url.clone())),
        }

        info!(
            broker = %config.broker_url,
            client_id = %config.client_id,
            tls = address.tls,
            qos = config.qos,
            retain = config.retain,
            "Connected to MQTT broker"
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(drive_event_loop(event_loop, cancel.clone()));

        Ok(Self {
            client,
            qos,
            retain: config.retain,
            cancel,
            event_loop: Mutex::new(Some(handle)),
        })
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        if self.cancel.is_cancelled() {
            return Err(PublishError::Closed);
        }
        // Fails instead of waiting when the request queue is full, which is
        // the case while the broker is unreachable.
        self.client
            .try_publish(topic, self.qos, self.retain, payload.to_vec())?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        let handle = self.event_loop.lock().take();
        let Some(mut handle) = handle else {
            return Ok(());
        };

        let disconnect = self.client.try_disconnect();

        // Give the event loop a moment to send the DISCONNECT, then stop it.
        if tokio::time::timeout(DISCONNECT_GRACE, &mut handle).await.is_err() {
            debug!("MQTT event loop did not stop within grace period");
        }
        self.cancel.cancel();
        handle.abort();

        disconnect.map_err(PublishError::from)
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<(), ConnectionError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(_)) = event_loop.poll().await? {
            return Ok(());
        }
    }
}

async fn drive_event_loop(mut event_loop: EventLoop, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = event_loop.poll() => match result {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    debug!("MQTT disconnect sent");
                    break;
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("MQTT broker closed the session");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "MQTT connection error");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }
    }
}

fn tls_transport(insecure_skip_verify: bool) -> Transport {
    if !insecure_skip_verify {
        return Transport::tls_with_default_config();
    }

    warn!("TLS certificate verification disabled");
    let config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(danger::SkipServerVerification))
        .with_no_client_auth();
    Transport::tls_with_config(TlsConfiguration::Rustls(Arc::new(config)))
}

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, Error, SignatureScheme};

    /// Accepts every server certificate.
    #[derive(Debug)]
    pub(super) struct SkipServerVerification;

    impl ServerCertVerifier for SkipServerVerification {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            vec![
                SignatureScheme::RSA_PKCS1_SHA256,
                SignatureScheme::RSA_PKCS1_SHA384,
                SignatureScheme::RSA_PKCS1_SHA512,
                SignatureScheme::ECDSA_NISTP256_SHA256,
                SignatureScheme::ECDSA_NISTP384_SHA384,
                SignatureScheme::RSA_PSS_SHA256,
                SignatureScheme::RSA_PSS_SHA384,
                SignatureScheme::RSA_PSS_SHA512,
                SignatureScheme::ED25519,
            ]
        }
    }
}
