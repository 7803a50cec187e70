mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast, time::MissedTickBehavior};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    engine::{Engine, EngineError, EngineSnapshot, Phase},
    params::ParameterUpdate,
};

/// How long a rejected-reset notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    expires_at: Instant,
}

impl Notice {
    fn new(message: String, now: Instant) -> Self {
        Self {
            message,
            expires_at: now + NOTICE_TTL,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Per-tick payload pushed over SSE. The full history is only served by `/api/state`.
#[derive(Debug, Clone, Serialize)]
pub struct TickFrame {
    pub tick: u64,
    pub population: u64,
    pub delta: f64,
    pub phase: Phase,
    pub carrying_capacity: Option<f64>,
}

impl TickFrame {
    fn from_engine(engine: &Engine) -> Self {
        let latest = engine.state().latest();
        let capacity = engine.carrying_capacity();
        Self {
            tick: latest.tick,
            population: latest.population,
            delta: latest.delta,
            phase: engine.phase(),
            carrying_capacity: capacity.is_finite().then_some(capacity),
        }
    }
}

#[derive(Serialize)]
pub struct StateEnvelope {
    pub snapshot: EngineSnapshot,
    pub notice: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Shared engine plus the bits of UI state the server keeps for the page.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<Engine>>,
    notice: Arc<Mutex<Option<Notice>>>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        let (broadcaster, _) = broadcast::channel(512);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            notice: Arc::new(Mutex::new(None)),
            broadcaster,
        }
    }

    fn engine(&self) -> MutexGuard<'_, Engine> {
        // Engine calls cannot panic halfway through a mutation, so a poisoned lock still
        // guards consistent state.
        self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notice_slot(&self) -> MutexGuard<'_, Option<Notice>> {
        self.notice.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_notice(&self, now: Instant) -> Option<String> {
        let mut slot = self.notice_slot();
        if slot.as_ref().is_some_and(|notice| !notice.is_live(now)) {
            *slot = None;
        }
        slot.as_ref().map(|notice| notice.message.clone())
    }

    fn raise_notice(&self, message: String) {
        *self.notice_slot() = Some(Notice::new(message, Instant::now()));
    }

    fn envelope(&self) -> StateEnvelope {
        let snapshot = self.engine().snapshot();
        StateEnvelope {
            snapshot,
            notice: self.current_notice(Instant::now()),
        }
    }

    fn publish(&self, engine: &Engine) {
        if let Ok(payload) = serde_json::to_string(&TickFrame::from_engine(engine)) {
            let _ = self.broadcaster.send(payload);
        }
    }

    /// One driver beat: advances the engine if it is running.
    pub fn tick(&self) -> Option<TickFrame> {
        let mut engine = self.engine();
        engine.advance_tick()?;
        self.publish(&engine);
        Some(TickFrame::from_engine(&engine))
    }
}

pub struct WebServerConfig {
    pub engine: Engine,
    pub cadence: Duration,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        engine,
        cadence,
        host,
        port,
    } = config;

    let state = AppState::new(engine);
    let driver_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            driver_state.tick();
        }
    });

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, cadence_ms = cadence.as_millis() as u64, "web UI listening");
    println!("Population simulator live at http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(latest_state))
        .route("/api/params", post(update_params))
        .route("/api/start", post(start))
        .route("/api/pause", post(pause))
        .route("/api/reset", post(reset))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down web UI");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        assets::APP_JS,
    )
}

async fn latest_state(State(state): State<AppState>) -> Json<StateEnvelope> {
    Json(state.envelope())
}

fn conflict(err: EngineError) -> Response {
    (
        StatusCode::CONFLICT,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn update_params(
    State(state): State<AppState>,
    payload: Result<Json<ParameterUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "malformed parameter update");
            return (
                rejection.status(),
                Json(ErrorBody {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };
    let result = {
        let mut engine = state.engine();
        let result = engine.configure(update);
        if result.is_ok() {
            state.publish(&engine);
        }
        result
    };
    match result {
        Ok(()) => Json(state.envelope()).into_response(),
        Err(err) => conflict(err),
    }
}

async fn start(State(state): State<AppState>) -> Json<StateEnvelope> {
    set_active(&state, true)
}

async fn pause(State(state): State<AppState>) -> Json<StateEnvelope> {
    set_active(&state, false)
}

fn set_active(state: &AppState, active: bool) -> Json<StateEnvelope> {
    {
        let mut engine = state.engine();
        engine.set_active(active);
        state.publish(&engine);
    }
    Json(state.envelope())
}

async fn reset(State(state): State<AppState>) -> Response {
    let result = {
        let mut engine = state.engine();
        let result = engine.reset();
        if result.is_ok() {
            state.publish(&engine);
        }
        result
    };
    match result {
        Ok(()) => Json(state.envelope()).into_response(),
        Err(err) => {
            warn!("reset requested while running");
            state.raise_notice(err.to_string());
            conflict(err)
        }
    }
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
