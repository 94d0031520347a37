// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use lexicards_core::error::Fallible;
use tokio::net::TcpListener;
use tokio::signal;

use crate::cmd::AppEngine;
use crate::cmd::serve::handlers::answer_handler;
use crate::cmd::serve::handlers::create_handler;
use crate::cmd::serve::handlers::delete_card_handler;
use crate::cmd::serve::handlers::delete_user_handler;
use crate::cmd::serve::handlers::due_handler;
use crate::cmd::serve::handlers::get_card_handler;
use crate::cmd::serve::handlers::health_handler;
use crate::cmd::serve::handlers::not_found_handler;
use crate::cmd::serve::handlers::search_handler;
use crate::cmd::serve::handlers::stats_handler;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<AppEngine>,
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub engine: AppEngine,
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/health", get(health_handler));
    let app = app.route("/cards", post(create_handler));
    let app = app.route("/cards/due", get(due_handler));
    let app = app.route("/cards/stats", get(stats_handler));
    let app = app.route("/cards/search", get(search_handler));
    let app = app.route(
        "/cards/{id}",
        get(get_card_handler).delete(delete_card_handler),
    );
    let app = app.route("/cards/{id}/answer", post(answer_handler));
    let app = app.route("/users/{id}", delete(delete_user_handler));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

pub async fn start_server(config: ServerConfig) -> Fallible<()> {
    let state = ServerState {
        engine: Arc::new(config.engine),
    };
    let app = router(state);
    let bind = format!("{}:{}", config.host, config.port);

    // Start the server with graceful shutdown on Ctrl+C.
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    log::info!("Listening on http://{bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => log::debug!("Received Ctrl+C, shutting down gracefully"),
        Err(e) => {
            log::error!("Failed to install Ctrl+C handler: {e}");
            // Without a signal handler, run until killed.
            std::future::pending::<()>().await
        }
    }
}
