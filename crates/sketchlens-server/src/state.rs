//! Shared application state.

use crate::analysis::{SpeechSynthesizer, VisionAnalyzer};
use crate::config::{DEFAULT_MAX_SESSIONS, ServerConfig};
use crate::error::ApiError;
use crate::openai::OpenAiAnalyzer;
use crate::speech::GoogleTts;
use dashmap::DashMap;
use sketchlens_core::{CanvasConfig, RasterFrame, Session};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How often idle sessions are looked for.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A session plus what the server keeps next to it.
#[derive(Debug)]
pub struct SessionEntry {
    pub session: Session,
    /// Reference image shown beside the canvas.
    pub reference: Option<RasterFrame>,
    /// Last time a request reached this session.
    touched: Instant,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            session,
            reference: None,
            touched: Instant::now(),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    sessions: DashMap<Uuid, SessionEntry>,
    max_sessions: usize,
    pub analyzer: Option<Arc<dyn VisionAnalyzer>>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl AppState {
    pub fn new(
        analyzer: Option<Arc<dyn VisionAnalyzer>>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            analyzer,
            speech,
        }
    }

    /// Cap the number of open sessions.
    pub fn with_session_limit(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Wire up the remote collaborators the configuration enables.
    ///
    /// A collaborator that cannot be built is left out with a warning; the
    /// drawing features keep working without it.
    pub fn from_config(config: &ServerConfig) -> Self {
        let analyzer: Option<Arc<dyn VisionAnalyzer>> = match OpenAiAnalyzer::from_config(config) {
            Ok(Some(analyzer)) => {
                info!("sketch analysis enabled (model {})", config.model);
                Some(Arc::new(analyzer))
            }
            Ok(None) => {
                info!("OPENAI_API_KEY not set, sketch analysis disabled");
                None
            }
            Err(e) => {
                warn!("sketch analysis disabled: {e}");
                None
            }
        };

        let speech: Option<Arc<dyn SpeechSynthesizer>> = if config.speech_enabled {
            match GoogleTts::from_config(config) {
                Ok(tts) => Some(Arc::new(tts)),
                Err(e) => {
                    warn!("speech disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self::new(analyzer, speech).with_session_limit(config.max_sessions)
    }

    /// Start a session and return its id.
    pub fn create_session(&self, config: CanvasConfig) -> Result<Uuid, ApiError> {
        if self.sessions.len() >= self.max_sessions {
            warn!("refusing new session, {} already open", self.sessions.len());
            return Err(ApiError::SessionLimit(self.max_sessions));
        }
        let session = Session::new(config)?;
        let id = Uuid::new_v4();
        self.sessions.insert(id, SessionEntry::new(session));
        info!("session {id} created ({} active)", self.sessions.len());
        Ok(id)
    }

    /// Drop a session. Returns false if it did not exist.
    pub fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Run `f` with exclusive access to one session, marking it as used.
    ///
    /// Only that session's entry is locked; `f` must not await.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionEntry) -> R,
    ) -> Result<R, ApiError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or(ApiError::SessionNotFound(id))?;
        entry.touched = Instant::now();
        Ok(f(entry.value_mut()))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions untouched for longer than `max_idle` as of `now`.
    /// Returns how many were dropped.
    pub fn evict_idle(&self, now: Instant, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.touched) <= max_idle);
        before.saturating_sub(self.sessions.len())
    }
}

/// Periodically evict idle sessions. Runs until the runtime shuts down.
pub async fn sweep_idle_sessions(state: Arc<AppState>, max_idle: Duration) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL.min(max_idle));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let evicted = state.evict_idle(Instant::now(), max_idle);
        if evicted > 0 {
            info!("evicted {evicted} idle sessions ({} active)", state.session_count());
        } else {
            debug!("no idle sessions");
        }
    }
}
