use super::client::BondClient;
use super::model::{BondObject, DevicePayload, GroupPayload, GroupType, ObjectKind};
use crate::error::Result;
use tracing::{debug, warn};

/// Fetch every device and group, sorted for stable output.
///
/// A failing index or object request aborts discovery. State and properties
/// are best-effort.
pub async fn collect_objects(client: &BondClient, include_state: bool) -> Result<Vec<BondObject>> {
    let mut objects = Vec::new();

    for id in client.index(ObjectKind::Device).await? {
        let payload: DevicePayload = client.object(ObjectKind::Device, &id).await?;
        let mut obj = BondObject::from_device(&id, payload);
        if include_state {
            obj.state = client.state(ObjectKind::Device, &id).await;
        }
        obj.properties = client.properties(ObjectKind::Device, &id).await;
        debug!("Fetched device {} ({})", obj.name, obj.id);
        objects.push(obj);
    }

    for id in client.index(ObjectKind::Group).await? {
        let payload: GroupPayload = client.object(ObjectKind::Group, &id).await?;
        if let GroupType::Mixed(types) = GroupType::resolve(&payload.types) {
            warn!(
                "Skipping group {} ({}): mixed types {:?} not supported",
                id,
                payload.name.as_deref().unwrap_or("-"),
                types
            );
            continue;
        }
        let Some(mut obj) = BondObject::from_group(&id, payload) else {
            continue;
        };
        if include_state {
            obj.state = client.state(ObjectKind::Group, &id).await;
        }
        debug!("Fetched group {} ({})", obj.name, obj.id);
        objects.push(obj);
    }

    objects.sort_by_key(BondObject::sort_key);
    Ok(objects)
}
