//! Full-device polls
//!
//! A poll resolves the identity bundle first, then reads the interface listing
//! and every advertised component concurrently. Components that turn out to be
//! unavailable are left out of the snapshot; hard failures fail the poll.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use errors::Result;
use futures::future::join_all;
use netprobe_model::{ComponentKind, ComponentRecord, Interface, Properties};
use serde::Serialize;
use tracing::{debug, info};

use crate::communicator::Communicator;
use crate::query::PollContext;

/// Everything read from one device in one poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub class: String,
    pub properties: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<Interface>>,
    pub components: BTreeMap<ComponentKind, ComponentRecord>,
    pub polled_at: DateTime<Utc>,
}

/// Value of an optional read; unavailable results become `None`
fn available<T>(res: Result<T>) -> Result<Option<T>> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_unavailable() => {
            debug!("skipped: {}", e);
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

/// Poll one device through its communicator
pub async fn poll_device(communicator: &Communicator, ctx: &PollContext) -> Result<DeviceSnapshot> {
    let properties = communicator.identify(ctx).await?;
    let ctx = ctx.with_properties(properties.clone());

    let kinds: Vec<ComponentKind> = communicator
        .available_components()
        .into_iter()
        .filter(|kind| *kind != ComponentKind::Interfaces)
        .collect();

    let (interfaces, records) = tokio::join!(
        communicator.interfaces(&ctx),
        join_all(kinds.iter().map(|kind| communicator.component(&ctx, *kind)))
    );

    let interfaces = available(interfaces)?;
    let mut components = BTreeMap::new();
    for (kind, record) in kinds.into_iter().zip(records) {
        if let Some(record) = available(record)? {
            components.insert(kind, record);
        }
    }

    info!(
        class = %communicator.device_class(),
        interfaces = interfaces.as_ref().map_or(0, Vec::len),
        components = components.len(),
        "Device polled"
    );

    Ok(DeviceSnapshot {
        class: communicator.device_class().to_string(),
        properties,
        interfaces,
        components,
        polled_at: Utc::now(),
    })
}

/// Poll independent devices concurrently, one result per target in input order
pub async fn poll_devices(targets: &[(Communicator, PollContext)]) -> Vec<Result<DeviceSnapshot>> {
    join_all(
        targets
            .iter()
            .map(|(communicator, ctx)| poll_device(communicator, ctx)),
    )
    .await
}
