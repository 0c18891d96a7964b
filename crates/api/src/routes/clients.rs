//! Client endpoints — the minimum needed to have someone to invoice.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use invopay_tenancy::{Client, Clients, NewClient, OrgScope, TenantContext};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

pub async fn list_clients(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<Vec<Client>>> {
    let scope = OrgScope::current(&ctx)?;
    let clients = Clients::new(state.pool.clone());
    Ok(Json(clients.list(&scope).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let scope = OrgScope::current(&ctx)?;
    let clients = Clients::new(state.pool.clone());

    let client = clients
        .create(
            &scope,
            NewClient {
                name: req.name,
                email: req.email,
                address: req.address,
                organization_id: None, // stamped by the scope
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(client)))
}
