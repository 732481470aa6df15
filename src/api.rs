use crate::history_manager::{HistoryManager, parse_since};
use crate::state::StateManager;
use crate::storage::EventQuery;
use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{App, HttpResponse, HttpServer, Result, middleware::Logger, web};
use serde::{Deserialize, Serialize};

const DEFAULT_EVENT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct EventsQuery {
    platform: Option<String>,
    target: Option<String>,
    since: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    message: String,
}

struct AppState {
    history: HistoryManager,
    state: StateManager,
}

// API endpoint to get recent events
async fn get_events(
    data: web::Data<AppState>,
    query: web::Query<EventsQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let since = match query.since.as_deref().map(parse_since).transpose() {
        Ok(since) => since,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse {
                success: false,
                message,
            }));
        }
    };
    let event_query = EventQuery {
        platform: query.platform.map(|p| p.to_ascii_lowercase()),
        target: query.target,
        since,
        limit: Some(query.limit.unwrap_or(DEFAULT_EVENT_LIMIT)),
    };

    match data.history.recent(&event_query) {
        Ok(events) => Ok(HttpResponse::Ok().json(events)),
        Err(e) => {
            tracing::error!("Failed to get events: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse {
                success: false,
                message: format!("Failed to get events: {}", e),
            }))
        }
    }
}

// API endpoint to get dedup state of every tracked entity
async fn get_listeners(data: web::Data<AppState>) -> Result<HttpResponse> {
    match data.state.list() {
        Ok(states) => Ok(HttpResponse::Ok().json(states)),
        Err(e) => {
            tracing::error!("Failed to get listener state: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse {
                success: false,
                message: format!("Failed to get listener state: {}", e),
            }))
        }
    }
}

pub struct ApiServer {
    history: HistoryManager,
    state: StateManager,
    port: u16,
}

impl ApiServer {
    pub fn new(history: HistoryManager, state: StateManager, port: u16) -> Self {
        Self {
            history,
            state,
            port,
        }
    }

    /// サーバーをバインドして起動する。返された Server を spawn して実行する
    pub fn start(&self) -> std::io::Result<Server> {
        let data = web::Data::new(AppState {
            history: self.history.clone(),
            state: self.state.clone(),
        });

        let server = HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET"])
                .allow_any_header();

            App::new()
                .app_data(data.clone())
                .wrap(cors)
                .wrap(Logger::default())
                .configure(routes)
        })
        .workers(1)
        .bind(("127.0.0.1", self.port))?
        .run();

        tracing::info!("API server listening on 127.0.0.1:{}", self.port);
        Ok(server)
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/v1/events", web::get().to(get_events))
        .route("/api/v1/listeners", web::get().to(get_listeners));
}
