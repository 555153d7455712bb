//! Battle Session Management
//!
//! Owns every battle the arena hosts, from creation through completion.
//! Each battle sits behind its own lock so moves, timeouts and clock ticks
//! are applied one at a time; each active battle has exactly one turn clock
//! task, which exits when the battle completes and is aborted when the
//! battle is removed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::engine::{GameError, MatchConfig, TurnResult};
use crate::game::events::MatchOutcome;
use crate::game::input::{MatchCommand, MoveSubmission, TimeoutSignal};
use crate::game::mode::{GameMode, ModeError};
use crate::game::state::{MatchId, MatchState, MatchStatus, MatchView, PlayerId};
use crate::network::protocol::{BattleSummary, CreateBattleRequest, ServerMessage};

/// Session manager settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wall-clock length of one turn-clock second.
    pub tick_interval: Duration,
    /// Defaults for new battles.
    pub match_defaults: MatchConfig,
    /// Capacity of the settlement channel.
    pub outcome_buffer: usize,
    /// How long completed battles stay listed.
    pub completed_retention: Duration,
    /// Waiting battles nobody follows are dropped after this long.
    pub abandoned_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            match_defaults: MatchConfig::default(),
            outcome_buffer: 256,
            completed_retention: Duration::from_secs(600),
            abandoned_timeout: Duration::from_secs(300),
        }
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No battle with this id.
    #[error("Battle not found")]
    BattleNotFound,

    /// Battle already has an opponent.
    #[error("Battle is full")]
    BattleFull,

    /// Creator tried to take the opponent seat.
    #[error("Cannot join your own battle")]
    CannotJoinOwnBattle,

    /// Engine rejected the operation.
    #[error(transparent)]
    Game(#[from] GameError),
}

// =============================================================================
// MATCH SESSION
// =============================================================================

/// A battle and the connections following it.
pub struct MatchSession {
    /// Battle identifier.
    pub id: MatchId,
    /// Engine state.
    state: MatchState,
    /// When the battle was opened.
    created_at: DateTime<Utc>,
    /// Last state change or subscription.
    last_activity: Instant,
    /// Connections receiving updates, by player.
    subscribers: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,
}

impl MatchSession {
    /// Wrap a freshly created battle.
    pub fn new(state: MatchState) -> Self {
        Self {
            id: state.match_id,
            state,
            created_at: Utc::now(),
            last_activity: Instant::now(),
            subscribers: BTreeMap::new(),
        }
    }

    /// Follow this battle's updates.
    pub fn subscribe(&mut self, player: PlayerId, sender: mpsc::Sender<ServerMessage>) {
        self.subscribers.insert(player, sender);
        self.last_activity = Instant::now();
    }

    /// Stop following.
    pub fn unsubscribe(&mut self, player: &PlayerId) -> bool {
        self.subscribers.remove(player).is_some()
    }

    /// Number of followers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether the registry may forget this battle.
    ///
    /// Completed battles go after the retention window. Waiting battles go
    /// once nobody has followed them for the abandon timeout. Active
    /// battles always stay; their clock ends them.
    fn is_stale(&self, now: Instant, config: &SessionConfig) -> bool {
        let idle = now.saturating_duration_since(self.last_activity);
        match self.state.status() {
            MatchStatus::Completed => idle >= config.completed_retention,
            MatchStatus::Waiting => self.subscriber_count() == 0 && idle >= config.abandoned_timeout,
            MatchStatus::Active => false,
        }
    }

    /// Browser line for this battle.
    pub fn summary(&self) -> BattleSummary {
        BattleSummary {
            match_id: self.id,
            mode: self.state.mode(),
            status: self.state.status(),
            creator: self.state.creator,
            opponent: self.state.opponent(),
            current_number: self.state.visible_number(),
            round: self.state.round(),
            turn_duration_secs: self.state.clock().turn_duration(),
            winner: self.state.outcome().map(|o| o.winner),
            created_at: self.created_at,
        }
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> MatchView {
        self.state.view()
    }

    /// Send a message to every follower without waiting.
    ///
    /// Slow or closed connections miss the message; the next snapshot
    /// brings them back in sync.
    pub fn broadcast(&self, message: &ServerMessage) {
        for (player, sender) in &self.subscribers {
            if let Err(e) = sender.try_send(message.clone()) {
                debug!("Dropped update for {}: {}", player.short(), e);
            }
        }
    }

    /// Push the results of an engine operation to followers.
    fn publish(&mut self, result: &TurnResult) {
        if result.events.is_empty() {
            return;
        }
        self.last_activity = Instant::now();

        for event in &result.events {
            self.broadcast(&ServerMessage::Event {
                match_id: self.id,
                event: event.clone(),
            });
        }
        self.broadcast(&ServerMessage::Snapshot(self.view()));

        if let Some(outcome) = &result.outcome {
            self.broadcast(&ServerMessage::MatchEnd(outcome.clone()));
        }
    }

    /// Apply an engine command and publish what it produced.
    fn apply(&mut self, command: MatchCommand) -> Result<TurnResult, SessionError> {
        let result = self.state.apply_command(command)?;
        self.publish(&result);
        Ok(result)
    }
}

/// Outcome produced by this operation, if it completed the battle.
///
/// Re-asking a completed battle returns the stored outcome with no events;
/// only the completing operation hands the outcome to settlement.
fn newly_completed(result: &TurnResult) -> Option<MatchOutcome> {
    if result.events.iter().any(|e| e.is_terminal()) {
        result.outcome.clone()
    } else {
        None
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Manages all battles and their turn clocks.
pub struct SessionManager {
    /// Settings.
    config: SessionConfig,
    /// All battles.
    sessions: RwLock<BTreeMap<MatchId, Arc<RwLock<MatchSession>>>>,
    /// Turn clock task per active battle.
    clocks: Mutex<BTreeMap<MatchId, JoinHandle<()>>>,
    /// Settlement channel.
    outcome_tx: mpsc::Sender<MatchOutcome>,
}

impl SessionManager {
    /// Create a manager and the receiving end of its settlement channel.
    pub fn new(config: SessionConfig) -> (Self, mpsc::Receiver<MatchOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::channel(config.outcome_buffer.max(1));

        let manager = Self {
            config,
            sessions: RwLock::new(BTreeMap::new()),
            clocks: Mutex::new(BTreeMap::new()),
            outcome_tx,
        };

        (manager, outcome_rx)
    }

    /// Open a battle in `Waiting`.
    pub async fn create_battle(
        &self,
        creator: PlayerId,
        request: &CreateBattleRequest,
    ) -> Result<BattleSummary, SessionError> {
        let mode: GameMode = request.mode.parse().map_err(GameError::from)?;

        let mut config = self.config.match_defaults.clone();
        if mode.policy().is_hidden() {
            // The secret start is drawn server-side; nobody may pick it
            if request.starting_number.is_some() {
                return Err(GameError::from(ModeError::HiddenStartingNumber).into());
            }
            config.starting_number = None;
            config.seed = None;
        } else if request.starting_number.is_some() {
            config.starting_number = request.starting_number;
        }
        if let Some(secs) = request.turn_duration_secs {
            config.turn_duration_secs = secs;
        }
        if request.max_rounds.is_some() {
            config.max_rounds = request.max_rounds;
        }

        let id = MatchId::random();
        let state = MatchState::new(id, creator, mode, config)?;
        let session = MatchSession::new(state);
        let summary = session.summary();

        self.sessions.write().await.insert(id, Arc::new(RwLock::new(session)));
        info!("Battle {} created by {} ({})", id.short(), creator.short(), mode);

        Ok(summary)
    }

    /// Take the opponent seat and start the battle's turn clock.
    pub async fn join_battle(
        &self,
        match_id: MatchId,
        opponent: PlayerId,
    ) -> Result<MatchView, SessionError> {
        let session = self.get_session(&match_id).await.ok_or(SessionError::BattleNotFound)?;

        let view = {
            let mut s = session.write().await;
            if s.state.status() != MatchStatus::Waiting {
                return Err(SessionError::BattleFull);
            }
            if s.state.creator == opponent {
                return Err(SessionError::CannotJoinOwnBattle);
            }

            let result = s.state.activate(opponent)?;
            s.publish(&result);
            s.view()
        };

        info!("Battle {} joined by {}", match_id.short(), opponent.short());
        self.start_clock(match_id, session).await;

        Ok(view)
    }

    /// Battles, newest first.
    pub async fn list_battles(&self, status: Option<MatchStatus>) -> Vec<BattleSummary> {
        let sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();

        let mut battles = Vec::with_capacity(sessions.len());
        for session in sessions {
            let summary = session.read().await.summary();
            if status.map_or(true, |wanted| summary.status == wanted) {
                battles.push(summary);
            }
        }

        battles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.match_id.cmp(&b.match_id)));
        battles
    }

    /// Snapshot of one battle.
    pub async fn get_view(&self, match_id: &MatchId) -> Result<MatchView, SessionError> {
        let session = self.get_session(match_id).await.ok_or(SessionError::BattleNotFound)?;
        let s = session.read().await;
        Ok(s.view())
    }

    /// Follow a battle's updates; returns the current snapshot.
    pub async fn subscribe(
        &self,
        match_id: &MatchId,
        player: PlayerId,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<MatchView, SessionError> {
        let session = self.get_session(match_id).await.ok_or(SessionError::BattleNotFound)?;
        let mut s = session.write().await;
        s.subscribe(player, sender);
        Ok(s.view())
    }

    /// Stop following a battle.
    pub async fn unsubscribe(&self, match_id: &MatchId, player: &PlayerId) {
        if let Some(session) = self.get_session(match_id).await {
            session.write().await.unsubscribe(player);
        }
    }

    /// Apply a player's move.
    pub async fn submit_move(&self, submission: MoveSubmission) -> Result<TurnResult, SessionError> {
        self.apply_command(MatchCommand::SubmitMove(submission)).await
    }

    /// Apply an externally signalled timeout.
    pub async fn apply_timeout(&self, signal: TimeoutSignal) -> Result<TurnResult, SessionError> {
        self.apply_command(MatchCommand::Timeout(signal)).await
    }

    /// Resign a battle.
    pub async fn forfeit(&self, match_id: MatchId, player: PlayerId) -> Result<TurnResult, SessionError> {
        self.apply_command(MatchCommand::Forfeit { match_id, player }).await
    }

    /// Apply any engine command under the battle's lock.
    pub async fn apply_command(&self, command: MatchCommand) -> Result<TurnResult, SessionError> {
        let match_id = command.match_id();
        let session = self.get_session(&match_id).await.ok_or(SessionError::BattleNotFound)?;

        let result = {
            let mut s = session.write().await;
            s.apply(command)?
        };

        if let Some(outcome) = newly_completed(&result) {
            self.stop_clock(&match_id).await;
            settle(&self.outcome_tx, outcome).await;
        }

        Ok(result)
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &MatchId) -> Option<Arc<RwLock<MatchSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Remove a battle and cancel its clock.
    pub async fn remove_battle(&self, id: &MatchId) -> bool {
        self.stop_clock(id).await;
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Battle {} removed", id.short());
        }
        removed
    }

    /// Get battle count.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    async fn clock_running(&self, id: &MatchId) -> bool {
        self.clocks
            .lock()
            .await
            .get(id)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Evict stale battles and forget clock tasks that already exited.
    ///
    /// Returns the number of battles evicted.
    pub async fn cleanup(&self) -> usize {
        let sessions: Vec<_> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, session)| (*id, session.clone()))
            .collect();

        let now = Instant::now();
        let mut stale = Vec::new();
        for (id, session) in sessions {
            if session.read().await.is_stale(now, &self.config) {
                stale.push(id);
            }
        }

        for id in &stale {
            self.remove_battle(id).await;
        }

        let mut clocks = self.clocks.lock().await;
        clocks.retain(|_, handle| !handle.is_finished());

        stale.len()
    }

    /// Cancel every turn clock.
    pub async fn shutdown(&self) {
        let mut clocks = self.clocks.lock().await;
        for (id, handle) in std::mem::take(&mut *clocks) {
            handle.abort();
            debug!("Clock for battle {} cancelled", id.short());
        }
    }

    async fn start_clock(&self, match_id: MatchId, session: Arc<RwLock<MatchSession>>) {
        let tick_interval = self.config.tick_interval;
        let outcome_tx = self.outcome_tx.clone();

        let handle = tokio::spawn(async move {
            run_turn_clock(session, tick_interval, outcome_tx).await;
        });

        if let Some(previous) = self.clocks.lock().await.insert(match_id, handle) {
            previous.abort();
        }
    }

    async fn stop_clock(&self, match_id: &MatchId) {
        if let Some(handle) = self.clocks.lock().await.remove(match_id) {
            handle.abort();
        }
    }
}

/// Hand a completed battle to settlement.
async fn settle(outcome_tx: &mpsc::Sender<MatchOutcome>, outcome: MatchOutcome) {
    info!(
        "Battle {} completed: winner {} ({:?})",
        outcome.match_id.short(),
        outcome.winner.short(),
        outcome.reason
    );
    if outcome_tx.send(outcome).await.is_err() {
        warn!("Settlement channel closed, outcome dropped");
    }
}

/// Drive one battle's turn clock until the battle leaves `Active`.
async fn run_turn_clock(
    session: Arc<RwLock<MatchSession>>,
    tick_interval: Duration,
    outcome_tx: mpsc::Sender<MatchOutcome>,
) {
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let (completed, active) = {
            let mut s = session.write().await;
            if s.state.status() != MatchStatus::Active {
                break;
            }

            let result = s.state.tick();
            s.broadcast(&ServerMessage::Clock {
                match_id: s.id,
                time_left: s.state.time_left(),
            });

            #[cfg(feature = "debug-tracing")]
            debug!(
                "Battle {} tick: round {}, {}s left",
                s.id.short(),
                s.state.round(),
                s.state.time_left()
            );

            let completed = result.and_then(|r| {
                s.publish(&r);
                newly_completed(&r)
            });
            (completed, s.state.status() == MatchStatus::Active)
        };

        if let Some(outcome) = completed {
            settle(&outcome_tx, outcome).await;
        }
        if !active {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::CompletionReason;
    use crate::game::state::VisibleNumber;

    fn request(mode: &str, start: u64) -> CreateBattleRequest {
        CreateBattleRequest {
            mode: mode.to_string(),
            starting_number: Some(start),
            turn_duration_secs: None,
            max_rounds: None,
        }
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            tick_interval: Duration::from_millis(5),
            match_defaults: MatchConfig {
                turn_duration_secs: 1,
                ..Default::default()
            },
            outcome_buffer: 8,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (manager, _rx) = SessionManager::new(SessionConfig::default());
        let creator = PlayerId::new([1; 16]);

        let summary = manager.create_battle(creator, &request("quick_draw", 23)).await.unwrap();
        assert_eq!(summary.status, MatchStatus::Waiting);
        assert_eq!(summary.creator, creator);
        assert_eq!(manager.session_count().await, 1);

        let waiting = manager.list_battles(Some(MatchStatus::Waiting)).await;
        assert_eq!(waiting.len(), 1);
        let active = manager.list_battles(Some(MatchStatus::Active)).await;
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_mode_rejected() {
        let (manager, _rx) = SessionManager::new(SessionConfig::default());
        let result = manager.create_battle(PlayerId::new([1; 16]), &request("blitz", 10)).await;

        assert!(matches!(
            result,
            Err(SessionError::Game(GameError::Configuration(_)))
        ));
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_join_rules() {
        let (manager, _rx) = SessionManager::new(SessionConfig::default());
        let creator = PlayerId::new([1; 16]);
        let opponent = PlayerId::new([2; 16]);
        let late = PlayerId::new([3; 16]);

        let id = manager.create_battle(creator, &request("strategic", 100)).await.unwrap().match_id;

        assert_eq!(
            manager.join_battle(id, creator).await.unwrap_err(),
            SessionError::CannotJoinOwnBattle
        );

        let view = manager.join_battle(id, opponent).await.unwrap();
        assert_eq!(view.status, MatchStatus::Active);
        assert!(manager.clock_running(&id).await);

        assert_eq!(manager.join_battle(id, late).await.unwrap_err(), SessionError::BattleFull);
        assert_eq!(
            manager.join_battle(MatchId::new([9; 16]), late).await.unwrap_err(),
            SessionError::BattleNotFound
        );

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_winning_move_settles_once() {
        let (manager, mut rx) = SessionManager::new(SessionConfig::default());
        let creator = PlayerId::new([1; 16]);
        let opponent = PlayerId::new([2; 16]);

        let id = manager.create_battle(creator, &request("quick_draw", 1)).await.unwrap().match_id;
        manager.join_battle(id, opponent).await.unwrap();

        let result = manager
            .submit_move(MoveSubmission { match_id: id, player: creator, amount: 1 })
            .await
            .unwrap();
        assert!(result.match_ended);

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.winner, creator);
        assert_eq!(outcome.reason, CompletionReason::ReachedZero);
        assert!(!manager.clock_running(&id).await);

        // Resigning afterwards is idempotent and does not settle again
        let again = manager.forfeit(id, opponent).await.unwrap();
        assert_eq!(again.outcome.map(|o| o.winner), Some(creator));
        assert!(rx.try_recv().is_err());

        let err = manager
            .submit_move(MoveSubmission { match_id: id, player: opponent, amount: 1 })
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Game(GameError::MatchNotActive));
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let (manager, _rx) = SessionManager::new(SessionConfig::default());
        let creator = PlayerId::new([1; 16]);
        let opponent = PlayerId::new([2; 16]);
        let (tx, mut updates) = mpsc::channel(64);

        let id = manager.create_battle(creator, &request("quick_draw", 10)).await.unwrap().match_id;
        let view = manager.subscribe(&id, creator, tx).await.unwrap();
        assert_eq!(view.status, MatchStatus::Waiting);

        manager.join_battle(id, opponent).await.unwrap();

        let mut saw_snapshot = false;
        while let Ok(msg) = updates.try_recv() {
            if let ServerMessage::Snapshot(view) = msg {
                assert_eq!(view.status, MatchStatus::Active);
                saw_snapshot = true;
            }
        }
        assert!(saw_snapshot);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_clock_times_out_absent_players() {
        let (manager, mut rx) = SessionManager::new(fast_config());
        let creator = PlayerId::new([1; 16]);
        let opponent = PlayerId::new([2; 16]);

        let id = manager.create_battle(creator, &request("quick_draw", 10)).await.unwrap().match_id;
        manager.join_battle(id, opponent).await.unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("clock should end the battle")
            .unwrap();

        // Creator times out first and reaches the limit first
        assert_eq!(outcome.reason, CompletionReason::TimeoutLimit);
        assert_eq!(outcome.loser, creator);
        assert_eq!(outcome.winner, opponent);
        assert_eq!(outcome.moves.len(), 3);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!manager.clock_running(&id).await);

        let view = manager.get_view(&id).await.unwrap();
        assert_eq!(view.status, MatchStatus::Completed);
    }

    #[tokio::test]
    async fn test_hidden_start_stays_secret() {
        let (manager, _rx) = SessionManager::new(SessionConfig::default());
        let creator = PlayerId::new([1; 16]);

        let err = manager.create_battle(creator, &request("hardcore_mystery", 64)).await.unwrap_err();
        assert_eq!(err, SessionError::Game(GameError::Configuration(ModeError::HiddenStartingNumber)));

        let open = CreateBattleRequest {
            mode: "pure_mystery".to_string(),
            starting_number: None,
            turn_duration_secs: None,
            max_rounds: None,
        };
        let first = manager.create_battle(creator, &open).await.unwrap();
        let second = manager.create_battle(creator, &open).await.unwrap();
        assert_eq!(first.current_number, VisibleNumber::Hidden);

        // Nothing in the public summary fixes the secret
        let mut seeds = Vec::new();
        for id in [first.match_id, second.match_id] {
            let session = manager.get_session(&id).await.unwrap();
            let seed = session.read().await.state.config.seed;
            seeds.push(seed.unwrap());
        }
        assert_ne!(seeds[0], seeds[1]);
    }

    #[tokio::test]
    async fn test_cleanup_evicts_stale_battles() {
        let config = SessionConfig {
            completed_retention: Duration::ZERO,
            abandoned_timeout: Duration::ZERO,
            ..Default::default()
        };
        let (manager, _rx) = SessionManager::new(config);
        let creator = PlayerId::new([1; 16]);
        let opponent = PlayerId::new([2; 16]);

        // Abandoned: nobody follows it
        let abandoned = manager.create_battle(creator, &request("quick_draw", 10)).await.unwrap().match_id;

        // Followed, still waiting
        let followed = manager.create_battle(creator, &request("quick_draw", 10)).await.unwrap().match_id;
        let (tx, _updates) = mpsc::channel(64);
        manager.subscribe(&followed, creator, tx).await.unwrap();

        // Running
        let running = manager.create_battle(creator, &request("quick_draw", 10)).await.unwrap().match_id;
        manager.join_battle(running, opponent).await.unwrap();

        // Finished
        let finished = manager.create_battle(creator, &request("quick_draw", 1)).await.unwrap().match_id;
        manager.join_battle(finished, opponent).await.unwrap();
        manager
            .submit_move(MoveSubmission { match_id: finished, player: creator, amount: 1 })
            .await
            .unwrap();

        assert_eq!(manager.cleanup().await, 2);
        assert!(manager.get_session(&abandoned).await.is_none());
        assert!(manager.get_session(&finished).await.is_none());
        assert!(manager.get_session(&followed).await.is_some());
        assert!(manager.get_session(&running).await.is_some());
        assert_eq!(manager.list_battles(None).await.len(), 2);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_battles() {
        let (manager, _rx) = SessionManager::new(SessionConfig::default());
        manager.create_battle(PlayerId::new([1; 16]), &request("strategic", 100)).await.unwrap();

        assert_eq!(manager.cleanup().await, 0);
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_battle_cancels_clock() {
        let (manager, _rx) = SessionManager::new(SessionConfig::default());
        let id = manager
            .create_battle(PlayerId::new([1; 16]), &request("quick_draw", 10))
            .await
            .unwrap()
            .match_id;
        manager.join_battle(id, PlayerId::new([2; 16])).await.unwrap();
        assert!(manager.clock_running(&id).await);

        assert!(manager.remove_battle(&id).await);
        assert!(!manager.clock_running(&id).await);
        assert_eq!(manager.session_count().await, 0);
        assert!(!manager.remove_battle(&id).await);
    }
}
