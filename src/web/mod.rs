mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use axum::body::Body;
use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    graph::WebSnapshot,
    layout::{spring_layout, PlacedSpecies},
    scenario::Scenario,
    session::{Session, SessionSettings, StepOutcome},
};

const LAYOUT_ITERATIONS: usize = 50;

#[derive(Clone, Serialize)]
pub struct UiFrame {
    pub outcome: StepOutcome,
    pub snapshot: WebSnapshot,
    pub positions: Vec<PlacedSpecies>,
    pub completed: bool,
}

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub total_steps: u64,
    pub frame: Option<UiFrame>,
    pub completed: bool,
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    latest_frame: Arc<Mutex<Option<UiFrame>>>,
    frames: Arc<Mutex<Vec<UiFrame>>>,
    total_steps: u64,
    scenario_name: String,
    session_done: Arc<AtomicBool>,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub extra_extinguish: Vec<String>,
    pub snapshot_every: u64,
    pub snapshot_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        extra_extinguish,
        snapshot_every,
        snapshot_dir,
        host,
        port,
    } = config;

    let scenario_name = scenario.name.clone();
    let layout_seed = scenario.layout_seed;
    let mut web = scenario.build_web()?;
    let commands = scenario.commands(&extra_extinguish);
    let total_steps = commands.len() as u64;

    let mut session = Session::new(SessionSettings {
        scenario_name: scenario_name.clone(),
        snapshot_dir: snapshot_dir.clone(),
        snapshot_every,
    });

    let (tx, _) = broadcast::channel::<String>(512);
    let latest_frame: Arc<Mutex<Option<UiFrame>>> = Arc::new(Mutex::new(None));
    let frames: Arc<Mutex<Vec<UiFrame>>> = Arc::new(Mutex::new(Vec::new()));
    let session_done = Arc::new(AtomicBool::new(false));

    let latest_for_run = latest_frame.clone();
    let frames_for_run = frames.clone();
    let done_for_run = session_done.clone();
    let tx_for_run = tx.clone();
    let scenario_label = scenario_name.clone();

    let run_handle = tokio::task::spawn_blocking(move || -> Result<()> {
        session.run_with_hook(&mut web, &commands, |session_frame| {
            let positions = spring_layout(&session_frame.snapshot, layout_seed, LAYOUT_ITERATIONS);
            let frame = UiFrame {
                outcome: session_frame.outcome,
                snapshot: session_frame.snapshot,
                positions,
                completed: session_frame.completed,
            };
            {
                let mut guard = latest_for_run.lock().expect("latest frame lock poisoned");
                *guard = Some(frame.clone());
            }
            {
                let mut guard = frames_for_run.lock().expect("frames lock poisoned");
                guard.push(frame.clone());
            }
            if let Ok(payload) = serde_json::to_string(&frame) {
                let _ = tx_for_run.send(payload);
            }
        })?;

        done_for_run.store(true, Ordering::SeqCst);
        if snapshot_every > 0 {
            session.write_report(&web)?;
        }
        Ok(())
    });

    let state = Arc::new(AppState {
        broadcaster: tx.clone(),
        latest_frame: latest_frame.clone(),
        frames: frames.clone(),
        total_steps,
        scenario_name: scenario_name.clone(),
        session_done: session_done.clone(),
    });

    tokio::spawn(async move {
        match run_handle.await {
            Ok(Ok(())) => {
                println!("[web] Session completed for '{}'.", scenario_label);
            }
            Ok(Err(err)) => {
                eprintln!("[web] Session error: {err:?}");
            }
            Err(err) => {
                eprintln!("[web] Session task failed: {err:?}");
            }
        }
    });

    let router = Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/favicon.svg", get(favicon))
        .route("/api/state", get(latest_state))
        .route("/api/frames", get(all_frames))
        .route("/api/events", get(stream_events))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("invalid address");

    println!(
        "🕸 TROPHIC viewer live at http://{}:{} (Ctrl+C to stop)",
        host, port
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    println!("Shutting down web viewer...");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/css; charset=utf-8")
        .body(assets::STYLES_CSS.to_string())
        .unwrap()
}

async fn script() -> impl IntoResponse {
    Response::builder()
        .header(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )
        .body(assets::APP_JS.to_string())
        .unwrap()
}

async fn favicon() -> Response {
    Response::builder()
        .header(header::CONTENT_TYPE, "image/svg+xml")
        .body(Body::from(Bytes::from_static(assets::FAVICON_SVG)))
        .unwrap()
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let frame = state
        .latest_frame
        .lock()
        .expect("latest frame lock poisoned")
        .clone();
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        total_steps: state.total_steps,
        frame,
        completed: state.session_done.load(Ordering::SeqCst),
    })
}

#[derive(Serialize)]
struct FramesResponse {
    scenario: String,
    total_steps: u64,
    completed: bool,
    frames: Vec<UiFrame>,
}

async fn all_frames(State(state): State<Arc<AppState>>) -> Json<FramesResponse> {
    let frames = state.frames.lock().expect("frames lock poisoned").clone();
    Json(FramesResponse {
        scenario: state.scenario_name.clone(),
        total_steps: state.total_steps,
        completed: state.session_done.load(Ordering::SeqCst),
        frames,
    })
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
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
