//! WebSocket Arena Server
//!
//! Async WebSocket server for the battle arena.
//! Handles identification, battle browsing, and move routing.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::game::engine::MatchConfig;
use crate::game::events::MatchOutcome;
use crate::game::input::MoveSubmission;
use crate::game::state::{MatchId, PlayerId};
use crate::network::protocol::{ClientMessage, ErrorCode, ServerMessage};
use crate::network::session::{SessionConfig, SessionError, SessionManager};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Connections silent for this long are dropped.
    pub idle_timeout: Duration,
    /// Wall-clock length of one turn-clock second.
    pub tick_interval: Duration,
    /// Defaults for new battles.
    pub match_defaults: MatchConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            tick_interval: Duration::from_secs(1),
            match_defaults: MatchConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self, GameServerError> {
        let mut config = Self::default();

        if let Some(addr) = env_var("ARENA_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(max) = env_var("ARENA_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(millis) = env_var::<u64>("ARENA_TICK_MILLIS")? {
            config.tick_interval = Duration::from_millis(millis.max(1));
        }
        if let Some(secs) = env_var("ARENA_TURN_SECS")? {
            config.match_defaults.turn_duration_secs = secs;
        }
        if let Some(limit) = env_var("ARENA_TIMEOUT_LIMIT")? {
            config.match_defaults.timeout_limit = limit;
        }

        config
            .match_defaults
            .validate()
            .map_err(|e| GameServerError::Config(e.to_string()))?;

        Ok(config)
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick_interval: self.tick_interval,
            match_defaults: self.match_defaults.clone(),
            abandoned_timeout: self.idle_timeout,
            ..Default::default()
        }
    }
}

fn env_var<T: FromStr>(key: &str) -> Result<Option<T>, GameServerError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GameServerError::Config(format!("{key}: cannot parse {raw:?}"))),
        Err(_) => Ok(None),
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Connected client state.
struct ConnectedClient {
    /// Player identifier (after hello).
    player_id: Option<PlayerId>,
    /// Battles this connection follows.
    battles: BTreeSet<MatchId>,
    /// Last activity.
    last_activity: Instant,
}

type Clients = Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>;

/// The arena server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Battle registry.
    sessions: Arc<SessionManager>,
    /// Connected clients.
    clients: Clients,
    /// Settlement feed, until claimed.
    outcomes: Mutex<Option<mpsc::Receiver<MatchOutcome>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new arena server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (sessions, outcomes) = SessionManager::new(config.session_config());

        Self {
            config,
            sessions: Arc::new(sessions),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            outcomes: Mutex::new(Some(outcomes)),
            shutdown_tx,
        }
    }

    /// Claim the settlement feed. Returns `None` once claimed.
    pub async fn take_outcomes(&self) -> Option<mpsc::Receiver<MatchOutcome>> {
        self.outcomes.lock().await.take()
    }

    /// Run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Arena server listening on {}", self.config.bind_addr);

        let cleanup_clients = self.clients.clone();
        let cleanup_sessions = self.sessions.clone();
        let idle_timeout = self.config.idle_timeout;

        let cleanup_handle = tokio::spawn(async move {
            Self::run_cleanup_loop(cleanup_clients, cleanup_sessions, idle_timeout).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        cleanup_handle.abort();
        self.sessions.shutdown().await;

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let sessions = self.sessions.clone();
        let version = self.config.version.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            clients.write().await.insert(addr, ConnectedClient {
                player_id: None,
                battles: BTreeSet::new(),
                last_activity: Instant::now(),
            });

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::error(
                                            ErrorCode::InvalidInput,
                                            "Invalid message format",
                                        )).await;
                                        continue;
                                    }
                                };

                                if let Some(client) = clients.write().await.get_mut(&addr) {
                                    client.last_activity = Instant::now();
                                }

                                Self::handle_client_message(
                                    addr,
                                    client_msg,
                                    &clients,
                                    &sessions,
                                    &version,
                                    &msg_tx,
                                ).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            sender_task.abort();

            let removed = clients.write().await.remove(&addr);
            if let Some(client) = removed {
                Self::release_client(&sessions, client).await;
            }

            info!("Client {} cleaned up", addr);
        });
    }

    /// Stop a departed client's battle subscriptions.
    ///
    /// Battles keep running; an absent player loses on timeouts.
    async fn release_client(sessions: &SessionManager, client: ConnectedClient) {
        if let Some(player_id) = client.player_id {
            for match_id in &client.battles {
                sessions.unsubscribe(match_id, &player_id).await;
            }
        }
    }

    /// Handle a client message.
    async fn handle_client_message(
        addr: SocketAddr,
        msg: ClientMessage,
        clients: &Clients,
        sessions: &Arc<SessionManager>,
        version: &str,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if let ClientMessage::Ping { timestamp } = msg {
            let _ = sender.send(ServerMessage::Pong {
                timestamp,
                server_time: Utc::now().timestamp_millis().max(0) as u64,
            }).await;
            return;
        }

        if let ClientMessage::Hello { player_id } = msg {
            Self::handle_hello(addr, player_id, clients, version, sender).await;
            return;
        }

        let player_id = clients.read().await.get(&addr).and_then(|c| c.player_id);
        let Some(player_id) = player_id else {
            let _ = sender.send(ServerMessage::error(
                ErrorCode::NotIdentified,
                "Send hello first",
            )).await;
            return;
        };

        let reply = match msg {
            ClientMessage::CreateBattle(request) => {
                match sessions.create_battle(player_id, &request).await {
                    Ok(summary) => {
                        Self::follow(addr, summary.match_id, player_id, clients, sessions, sender).await;
                        Ok(Some(ServerMessage::BattleCreated(summary)))
                    }
                    Err(e) => Err(e),
                }
            }
            ClientMessage::JoinBattle { match_id } => {
                // Follow first so the joiner sees the opening events
                Self::follow(addr, match_id, player_id, clients, sessions, sender).await;
                sessions.join_battle(match_id, player_id).await.map(|_| None)
            }
            ClientMessage::ListBattles { status } => {
                let battles = sessions.list_battles(status).await;
                Ok(Some(ServerMessage::Battles { battles }))
            }
            ClientMessage::GetBattle { match_id } => {
                match sessions.subscribe(&match_id, player_id, sender.clone()).await {
                    Ok(view) => {
                        if let Some(client) = clients.write().await.get_mut(&addr) {
                            client.battles.insert(match_id);
                        }
                        Ok(Some(ServerMessage::Snapshot(view)))
                    }
                    Err(e) => Err(e),
                }
            }
            ClientMessage::SubmitMove { match_id, amount } => sessions
                .submit_move(MoveSubmission { match_id, player: player_id, amount })
                .await
                .map(|_| None),
            ClientMessage::Resign { match_id } => {
                sessions.forfeit(match_id, player_id).await.map(|result| {
                    // Already completed: nothing was published, answer directly
                    if result.events.is_empty() {
                        result.outcome.map(ServerMessage::MatchEnd)
                    } else {
                        None
                    }
                })
            }
            ClientMessage::Hello { .. } | ClientMessage::Ping { .. } => Ok(None),
        };

        let outgoing = match reply {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(e) => {
                debug!("Request from {} rejected: {}", player_id.short(), e);
                ServerMessage::from_session_error(&e)
            }
        };

        let _ = sender.send(outgoing).await;
    }

    /// Handle identification.
    async fn handle_hello(
        addr: SocketAddr,
        player_id: Option<PlayerId>,
        clients: &Clients,
        version: &str,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let player_id = player_id.unwrap_or_else(PlayerId::random);

        {
            let mut clients = clients.write().await;
            let taken = clients
                .iter()
                .any(|(other, c)| *other != addr && c.player_id == Some(player_id));
            if taken {
                drop(clients);
                warn!("Client {} claimed {}, already connected", addr, player_id.short());
                let _ = sender.send(ServerMessage::error(
                    ErrorCode::PlayerIdTaken,
                    "Player id is in use by another connection",
                )).await;
                return;
            }
            if let Some(client) = clients.get_mut(&addr) {
                client.player_id = Some(player_id);
            }
        }

        info!("Client {} identified as {}", addr, player_id.short());

        let _ = sender.send(ServerMessage::Welcome {
            player_id,
            server_version: version.to_string(),
        }).await;
    }

    /// Subscribe a connection to a battle's updates.
    async fn follow(
        addr: SocketAddr,
        match_id: MatchId,
        player_id: PlayerId,
        clients: &Clients,
        sessions: &SessionManager,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if sessions.subscribe(&match_id, player_id, sender.clone()).await.is_ok() {
            if let Some(client) = clients.write().await.get_mut(&addr) {
                client.battles.insert(match_id);
            }
        }
    }

    /// Run cleanup loop.
    async fn run_cleanup_loop(
        clients: Clients,
        sessions: Arc<SessionManager>,
        idle_timeout: Duration,
    ) {
        let mut interval = interval(Duration::from_secs(60));

        loop {
            interval.tick().await;

            let now = Instant::now();
            let to_remove: Vec<_> = {
                let clients = clients.read().await;
                clients.iter()
                    .filter(|(_, c)| now.duration_since(c.last_activity) > idle_timeout)
                    .map(|(addr, _)| *addr)
                    .collect()
            };

            for addr in to_remove {
                let removed = clients.write().await.remove(&addr);
                if let Some(client) = removed {
                    Self::release_client(&sessions, client).await;
                    info!("Removed idle client {}", addr);
                }
            }

            let evicted = sessions.cleanup().await;
            if evicted > 0 {
                info!("Evicted {} stale battles", evicted);
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get battle count.
    pub async fn session_count(&self) -> usize {
        self.sessions.session_count().await
    }
}
