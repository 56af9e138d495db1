use axum::{Json, extract::State, http::StatusCode};
use vm_common::api::profile::{MeResponse, OrganizationProfileRequest, VolunteerProfileRequest};
use vm_common::db;
use vm_common::{Organization, Volunteer};

use crate::SharedState;
use crate::auth::{AuthUser, Role};
use crate::error::ApiError;

pub async fn me(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let response = match auth.role {
        Some(Role::Volunteer) => {
            let profile = db::get_volunteer(&state.pool, &auth.subject)
                .await?
                .ok_or_else(|| ApiError::NotFound("volunteer profile not created yet".into()))?;
            MeResponse::Volunteer { profile }
        }
        Some(Role::Organization) => {
            let profile = db::get_organization(&state.pool, &auth.subject)
                .await?
                .ok_or_else(|| ApiError::NotFound("organization profile not created yet".into()))?;
            MeResponse::Organization { profile }
        }
        Some(Role::Service) => MeResponse::Service,
        None => return Err(ApiError::Forbidden("token carries no role".into())),
    };

    Ok(Json(response))
}

pub async fn create_volunteer(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<VolunteerProfileRequest>,
) -> Result<(StatusCode, Json<Volunteer>), ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let profile = payload.validate()?;
    let volunteer = db::create_volunteer(&state.pool, volunteer_id, &profile).await?;
    Ok((StatusCode::CREATED, Json(volunteer)))
}

pub async fn update_volunteer(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<VolunteerProfileRequest>,
) -> Result<Json<Volunteer>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let profile = payload.validate()?;
    let volunteer = db::update_volunteer(&state.pool, volunteer_id, &profile).await?;
    Ok(Json(volunteer))
}

pub async fn create_organization(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<OrganizationProfileRequest>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    let organization_id = auth.organization_id()?;
    let profile = payload.validate()?;
    let organization = db::create_organization(&state.pool, organization_id, &profile).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}
