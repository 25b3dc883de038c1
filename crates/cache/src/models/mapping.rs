use serde::Serialize;

/// Associates a portal route with the provider folder that backs it.
///
/// Owned by the surrounding application; the cache only needs it to turn
/// route-based invalidation criteria into mapping ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RouteMapping {
    pub id: i64,
    pub route_type: String,
    pub route_subtype: String,
    pub folder_id: String,
}
