use axum::{extract::State, Json};

use sirius_types::{ResolveProfilesRequest, ResolveProfilesResponse};

use super::{ApiError, ApiResult};
use crate::profile::ProfileResolver;
use crate::state::AppState;

/// POST /api/user-profiles - Resolve a batch of user ids to display profiles.
///
/// An empty or missing id list short-circuits to an empty response without
/// touching the store. Ids that resolve nowhere are simply absent.
pub async fn resolve_profiles(
    State(state): State<AppState>,
    Json(payload): Json<ResolveProfilesRequest>,
) -> ApiResult<Json<ResolveProfilesResponse>> {
    if payload.ids.is_empty() {
        return Ok(Json(ResolveProfilesResponse { profiles: vec![] }));
    }

    let resolver = ProfileResolver::new(state.db.pool.clone());
    let resolved = resolver
        .resolve(&payload.ids)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // Preserve request order for the ids that resolved
    let profiles = payload
        .ids
        .iter()
        .filter_map(|id| resolved.get(id).cloned())
        .collect();

    Ok(Json(ResolveProfilesResponse { profiles }))
}
