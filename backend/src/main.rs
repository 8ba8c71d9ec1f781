use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use emunits_core::{electromagnetism, Session};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Instrument};

mod commands;
mod config;

use config::ServerConfig;

// Application State
struct AppState {
    session: Arc<RwLock<Session>>,
}

/// Built-in unit table plus any configured scripts
fn build_session(config: &ServerConfig) -> Result<Session, String> {
    let mut session = electromagnetism::load().map_err(|e| format!("unit table: {}", e))?;

    for path in &config.scripts {
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let count = session
            .run_script(&source)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        info!("Loaded {} statements from {}", count, path.display());
    }

    Ok(session)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    let session = match build_session(&config) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load declarations: {}", e);
            return;
        }
    };
    info!("Session ready with {} names", session.table().len());

    let shared_state = Arc::new(AppState {
        session: Arc::new(RwLock::new(session)),
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/table", get(table))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.addr, e);
            return;
        }
    };
    info!("listening on {}", config.addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

async fn root() -> &'static str {
    "emunits session host"
}

async fn table(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.read().unwrap_or_else(|e| e.into_inner());
    Json(session.table().clone())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| {
        let client = uuid::Uuid::new_v4();
        handle_socket(socket, state).instrument(tracing::info_span!("client", %client))
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Client connected");
    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Receive failed: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                info!("Received message: {}", text);
                let reply = commands::handle_command(&state.session, &text);
                if sender.send(Message::Text(reply)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!("Client disconnected");
}
