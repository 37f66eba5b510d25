use crate::{
    error::AppError,
    hubspot::{CLOSE_WINDOW_HTML, CallbackParams},
    integration_item::IntegrationItem,
    server::Server,
};
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{Html, Json},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct FlowForm {
    pub user_id: String,
    pub org_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadForm {
    pub credentials: String,
}

pub fn create_hubspot_routes() -> Router<Server> {
    Router::new()
        .route("/authorize", post(authorize_handler))
        .route("/oauth2callback", get(callback_handler))
        .route("/credentials", post(credentials_handler))
        .route("/load", post(load_handler))
}

pub async fn authorize_handler(
    State(server): State<Server>,
    Form(form): Form<FlowForm>,
) -> Result<Json<String>, AppError> {
    let url = server.hubspot.authorize(&form.user_id, &form.org_id).await?;
    Ok(Json(url))
}

pub async fn callback_handler(
    State(server): State<Server>,
    Query(params): Query<CallbackParams>,
) -> Result<Html<&'static str>, AppError> {
    server.hubspot.handle_callback(params).await?;
    Ok(Html(CLOSE_WINDOW_HTML))
}

pub async fn credentials_handler(
    State(server): State<Server>,
    Form(form): Form<FlowForm>,
) -> Result<Json<Value>, AppError> {
    let credentials = server
        .hubspot
        .take_credentials(&form.user_id, &form.org_id)
        .await?;
    Ok(Json(credentials))
}

pub async fn load_handler(
    State(server): State<Server>,
    Form(form): Form<LoadForm>,
) -> Result<Json<Vec<IntegrationItem>>, AppError> {
    let items = server.items.fetch_items(&form.credentials).await?;
    Ok(Json(items))
}
