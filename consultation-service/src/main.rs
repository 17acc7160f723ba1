mod api;
mod cart;
mod config;
mod models;
mod order_status;
mod selection;
mod steps;
mod wizard;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use step_flow::{
    InMemorySessionStorage, PostgresSessionStorage, Session, SessionStorage, WizardCommand,
    WizardRunner,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::api::{OrderApi, http::HttpBackendClient};
use crate::config::Config;
use crate::models::{OrderStatus, session_keys};
use crate::order_status::{OrderAction, available_actions};
use crate::wizard::{BackendClients, create_consultation_session, create_runner};

#[derive(Clone)]
struct AppState {
    runner: WizardRunner,
    session_storage: Arc<dyn SessionStorage>,
    orders: Arc<dyn OrderApi>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CommandDto {
    Run,
    Next,
    Prev,
}

impl From<CommandDto> for WizardCommand {
    fn from(dto: CommandDto) -> Self {
        match dto {
            CommandDto::Run => WizardCommand::Run,
            CommandDto::Next => WizardCommand::Next,
            CommandDto::Prev => WizardCommand::Prev,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    session_id: Option<String>,
    command: Option<CommandDto>,
    input: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ExecuteResponse {
    session_id: String,
    step: String,
    message: Option<String>,
    status: String,
}

#[derive(Debug, Serialize)]
struct OrderActionsResponse {
    order_id: String,
    status: OrderStatus,
    actions: Vec<OrderAction>,
}

#[derive(Debug, Deserialize)]
struct ChangeStatusRequest {
    action: OrderAction,
}

#[derive(Debug, Serialize)]
struct OrderStatusResponse {
    order_id: String,
    status: OrderStatus,
}

/// Initialize structured tracing based on environment variables
fn init_tracing(log_format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "consultation_service=debug,step_flow=debug,tower_http=debug".into()
    });

    match log_format {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            // Structured JSON logging for production
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Middleware to add a correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    request.headers_mut().insert(
        "x-correlation-id",
        HeaderValue::from_str(&correlation_id).unwrap(),
    );

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_format);

    let session_storage: Arc<dyn SessionStorage> = match &config.database_url {
        Some(database_url) => {
            info!("Using PostgreSQL session storage");
            match PostgresSessionStorage::connect(database_url).await {
                Ok(postgres_storage) => Arc::new(postgres_storage),
                Err(e) => {
                    error!(
                        "Failed to connect to PostgreSQL: {}. Falling back to in-memory storage.",
                        e
                    );
                    Arc::new(InMemorySessionStorage::new())
                }
            }
        }
        None => {
            info!("Using in-memory session storage (set DATABASE_URL to persist sessions)");
            Arc::new(InMemorySessionStorage::new())
        }
    };

    let backend = Arc::new(HttpBackendClient::new(&config.backend_api_url));
    let clients = BackendClients {
        diagnosis: backend.clone(),
        addresses: backend.clone(),
        cart: backend.clone(),
        orders: backend.clone(),
        invoices: backend,
    };

    let app_state = AppState {
        runner: create_runner(&clients, session_storage.clone()),
        session_storage,
        orders: clients.orders.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/wizard/execute", post(execute_wizard))
        .route("/session/{id}", get(get_session))
        .route("/orders/{id}/actions", get(get_order_actions))
        .route("/orders/{id}/status", post(change_order_status))
        .layer(from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn execute_wizard(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, StatusCode> {
    let session_id_provided = request.session_id.is_some();
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if session_id_provided && Uuid::parse_str(&session_id).is_err() {
        error!(session_id = %session_id, "Invalid session ID format");
        return Err(StatusCode::BAD_REQUEST);
    }

    // Get or create the session
    let session = match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            if session_id_provided {
                error!(session_id = %session_id, "Session not found");
                return Err(StatusCode::NOT_FOUND);
            }
            info!(session_id = %session_id, "Creating new consultation session");
            create_consultation_session(session_id.clone())
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to get session");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // Stage the user input for the current step; a command without input
    // clears whatever the previous step consumed.
    match request.input {
        Some(input) => session.context.set(session_keys::USER_INPUT, input).await,
        None => {
            session.context.remove(session_keys::USER_INPUT).await;
        }
    }

    if let Err(e) = state.session_storage.save(session).await {
        error!(session_id = %session_id, error = %e, "Failed to save session");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let command = request.command.map(WizardCommand::from).unwrap_or(WizardCommand::Run);

    let result = match state.runner.apply(&session_id, command).await {
        Ok(result) => result,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to run wizard command");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    info!(
        session_id = %session_id,
        step = %result.current_step_id,
        status = ?result.status,
        "Wizard command completed"
    );

    Ok(Json(ExecuteResponse {
        session_id,
        step: result.current_step_id,
        message: result.message,
        status: format!("{:?}", result.status),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, StatusCode> {
    match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => {
            info!(session_id = %session_id, "Session not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to get session");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Pre-filtered admin actions for an order. Advisory only; the backend is
/// the authority on the transition itself.
async fn get_order_actions(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderActionsResponse>, StatusCode> {
    let status = match state.orders.get_status(&order_id).await {
        Ok(status) => status,
        Err(e) => {
            error!(order_id = %order_id, error = %e, "Failed to get order status");
            return Err(StatusCode::BAD_GATEWAY);
        }
    };

    Ok(Json(OrderActionsResponse {
        order_id,
        status,
        actions: available_actions(status),
    }))
}

/// Forward a transition request and reflect whatever status the backend
/// returns; no client-side enforcement.
async fn change_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<OrderStatusResponse>, StatusCode> {
    let target = request.action.target();
    let status = match state.orders.change_status(&order_id, target).await {
        Ok(status) => status,
        Err(e) => {
            error!(order_id = %order_id, error = %e, "Failed to change order status");
            return Err(StatusCode::BAD_GATEWAY);
        }
    };

    info!(order_id = %order_id, status = ?status, "Order status transition requested");

    Ok(Json(OrderStatusResponse { order_id, status }))
}
