use axum::{extract::State, Json};
use serde::Serialize;

use sirius_types::ServiceLink;

use super::{ApiError, ApiResult};
use crate::db::repositories::ServiceRepository;
use crate::state::AppState;

/// One directory section as rendered by clients
#[derive(Serialize)]
pub struct ServiceCategory {
    pub category: String,
    pub services: Vec<ServiceLink>,
}

/// GET /services - Campus service links grouped by category
pub async fn get_services(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ServiceCategory>>> {
    let repo = ServiceRepository::new(state.db.pool.clone());
    let links = repo
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // list_all is ordered by (category, name); fold adjacent rows into groups
    let mut groups: Vec<ServiceCategory> = Vec::new();
    for link in links {
        match groups.last_mut() {
            Some(group) if group.category == link.category => group.services.push(link),
            _ => groups.push(ServiceCategory {
                category: link.category.clone(),
                services: vec![link],
            }),
        }
    }

    Ok(Json(groups))
}
