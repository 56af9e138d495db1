use axum::{Json, extract::State};
use vm_common::api::analytics::OrganizationAnalytics;
use vm_common::db;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

pub async fn organization_analytics(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<OrganizationAnalytics>, ApiError> {
    let organization_id = auth.organization_id()?;
    let analytics = db::organization_analytics(&state.pool, organization_id).await?;
    Ok(Json(analytics))
}
