use axum::{
    Json,
    extract::{Query, State},
};
use vm_common::api::search::{SearchQuery, SearchResults};
use vm_common::db;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::pagination::validate_pagination;

pub async fn search(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let term = query.term()?;
    let (limit, offset) = validate_pagination(query.limit, query.offset)?;
    let results = db::search(&state.pool, &term, limit, offset).await?;
    Ok(Json(results))
}
