use super::protocol::NodesResponse;
use super::service::FleetView;
use crate::error::CoordError;

use axum::{Extension, Json};

pub async fn handle_list_nodes(
    Extension(fleet): Extension<FleetView>,
) -> Result<Json<NodesResponse>, CoordError> {
    let nodes = fleet.list_nodes().await?;
    tracing::debug!("Listing {} live nodes", nodes.len());
    Ok(Json(NodesResponse { nodes }))
}
