//! Nokia 7210 SAS (TiMOS) override: service access point counters

use std::sync::Arc;

use async_trait::async_trait;
use errors::{ProbeError, Result};
use netprobe_model::{Interface, SapInterface};
use tracing::{debug, warn};

use crate::communicator::{CommunicatorNode, DeviceCommunicator};
use crate::query::{Oid, PollContext};

/// SAP description column, indexed by `<svc>.<port>.<sub>`
pub const SAP_DESCRIPTION_OID: &str = "1.3.6.1.4.1.6527.3.1.2.4.3.2.1.5";
/// Ingress octet counters per SAP
pub const SAP_INBOUND_OID: &str = "1.3.6.1.4.1.6527.6.2.2.2.8.1.1.1.4";
/// Egress octet counters per SAP
pub const SAP_OUTBOUND_OID: &str = "1.3.6.1.4.1.6527.6.2.2.2.8.1.1.1.6";

/// One SAP as addressed by the description table
#[derive(Debug, Clone, PartialEq, Eq)]
struct SapIndex {
    service: String,
    port: String,
    sub: String,
}

impl SapIndex {
    fn parse(parts: &[&str]) -> Result<Self> {
        match parts {
            [service, port, sub] if [service, port, sub].iter().all(|p| is_number(p)) => Ok(Self {
                service: service.to_string(),
                port: port.to_string(),
                sub: sub.to_string(),
            }),
            _ => Err(ProbeError::decode(format!(
                "unexpected sap index '{}'",
                parts.join(".")
            ))),
        }
    }

    /// Interface index of the SAP: port and sub id concatenated as decimals
    fn interface_index(&self) -> Result<u64> {
        format!("{}{}", self.port, self.sub)
            .parse::<u64>()
            .map_err(|_| {
                ProbeError::decode(format!(
                    "couldn't get index from '{}' and '{}'",
                    self.port, self.sub
                ))
            })
    }

    fn suffix(&self) -> String {
        format!("{}.{}.{}", self.service, self.port, self.sub)
    }
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

/// Counter value, `None` when the device doesn't have it
async fn counter(ctx: &PollContext, column: &str, sap: &SapIndex) -> Result<Option<u64>> {
    let oid = Oid::new(column)?.child(&sap.suffix())?;
    match ctx.get(&oid).await {
        Ok(value) => Ok(Some(u64::try_from(value)?)),
        Err(e) if e.is_not_found() => {
            debug!(oid = %oid, "SAP counter not available");
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

/// Override for class `timos/sas`
///
/// Extends the inherited interface listing with per-SAP inbound and outbound
/// counters. Every other property falls through to the rest of the chain.
pub struct TimosSasCommunicator {
    sub: Option<Arc<CommunicatorNode>>,
}

impl TimosSasCommunicator {
    pub fn new(sub: Option<Arc<CommunicatorNode>>) -> Self {
        Self { sub }
    }

    async fn attach_saps(&self, ctx: &PollContext, mut interfaces: Vec<Interface>) -> Result<Vec<Interface>> {
        let root = Oid::new(SAP_DESCRIPTION_OID)?;
        let saps = match ctx.walk(&root).await {
            Ok(responses) => responses,
            Err(e) if e.is_not_found() => {
                debug!("No SAPs configured");
                return Ok(interfaces);
            },
            Err(e) => return Err(e.context("sap walk failed")),
        };

        for response in saps {
            let parts = root.suffix_of(&response.oid).ok_or_else(|| {
                ProbeError::decode(format!("response '{}' is outside the sap table", response.oid))
            })?;
            let sap = SapIndex::parse(&parts)?;
            let index = sap.interface_index()?;

            let interface = interfaces
                .iter_mut()
                .find(|i| i.if_index == Some(index))
                .ok_or_else(|| {
                    warn!(index, sap = %sap.suffix(), "SAP without matching interface");
                    ProbeError::decode(format!("no interface with index {} found", index))
                })?;

            let (inbound, outbound) = tokio::join!(
                counter(ctx, SAP_INBOUND_OID, &sap),
                counter(ctx, SAP_OUTBOUND_OID, &sap)
            );
            interface.sap = Some(SapInterface {
                inbound: inbound.map_err(|e| e.context("failed to retrieve inbound counter"))?,
                outbound: outbound.map_err(|e| e.context("failed to retrieve outbound counter"))?,
            });
        }

        Ok(interfaces)
    }
}

#[async_trait]
impl DeviceCommunicator for TimosSasCommunicator {
    async fn interfaces(&self, ctx: &PollContext) -> Result<Vec<Interface>> {
        let Some(sub) = &self.sub else {
            return Err(ProbeError::not_implemented(
                "sap interfaces need a parent communicator",
            ));
        };
        let interfaces = sub.interfaces(ctx).await?;
        self.attach_saps(ctx, interfaces).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_index_concatenates_port_and_sub() {
        let sap = SapIndex::parse(&["12", "7", "3"]).unwrap();
        assert_eq!(sap.interface_index().unwrap(), 73);
        assert_eq!(sap.suffix(), "12.7.3");
    }

    #[test]
    fn test_malformed_sap_index() {
        assert!(SapIndex::parse(&["12", "7"]).is_err());
        assert!(SapIndex::parse(&["12", "x", "3"]).is_err());
    }
}
