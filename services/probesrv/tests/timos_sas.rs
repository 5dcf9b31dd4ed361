//! SAP correlation for Nokia 7210 SAS devices

use std::sync::Arc;

use probesrv::query::mock::MockClient;
use probesrv::vendors::timos_sas::{SAP_DESCRIPTION_OID, SAP_INBOUND_OID, SAP_OUTBOUND_OID};
use probesrv::{Communicator, ErrorKind, MemoryCatalog, OverrideRegistry, PollContext};

const CLASSES: &str = r#"
- name: generic
  components:
    interfaces: true
  properties:
    interfaces:
      ifDescr:
        oid: 1.3.6.1.2.1.2.2.1.2
      ifSpeed:
        oid: 1.3.6.1.2.1.2.2.1.5
      ifHighSpeed:
        oid: 1.3.6.1.2.1.31.1.1.1.15
- name: timos
  parent: generic
  properties:
    identify:
      vendor:
        oid: 1.3.6.1.2.1.1.1
- name: timos/sas
  parent: timos
"#;

const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
const IF_SPEED: &str = "1.3.6.1.2.1.2.2.1.5";
const IF_HIGH_SPEED: &str = "1.3.6.1.2.1.31.1.1.1.15";

fn sas() -> Communicator {
    let catalog = MemoryCatalog::from_yaml(CLASSES).unwrap();
    Communicator::from_catalog(&catalog, "timos/sas", &OverrideRegistry::with_defaults()).unwrap()
}

fn interfaces() -> MockClient {
    MockClient::new()
        .with_column(IF_DESCR, [(1, "1/1/1"), (73, "1/1/7:3")])
        .with_column(IF_SPEED, [(1, 4_294_967_295u64)])
        .with_column(IF_HIGH_SPEED, [(1, 10u64)])
}

fn sap(column: &str, suffix: &str) -> String {
    format!("{}.{}", column, suffix)
}

#[tokio::test]
async fn test_sap_counters_attached() {
    let client = interfaces()
        .with_value(&sap(SAP_DESCRIPTION_OID, "12.7.3"), "customer uplink")
        .with_value(&sap(SAP_INBOUND_OID, "12.7.3"), 1000u64)
        .with_value(&sap(SAP_OUTBOUND_OID, "12.7.3"), 2000u64);
    let ctx = PollContext::new(Arc::new(client));

    let interfaces = sas().interfaces(&ctx).await.unwrap();
    assert_eq!(interfaces.len(), 2);
    assert!(interfaces[0].sap.is_none());
    assert_eq!(interfaces[0].if_speed, Some(10_000_000));

    let sap = interfaces[1].sap.as_ref().unwrap();
    assert_eq!(interfaces[1].if_index, Some(73));
    assert_eq!(sap.inbound, Some(1000));
    assert_eq!(sap.outbound, Some(2000));
}

#[tokio::test]
async fn test_missing_counter_left_unset() {
    let client = interfaces()
        .with_value(&sap(SAP_DESCRIPTION_OID, "12.7.3"), "customer uplink")
        .with_value(&sap(SAP_INBOUND_OID, "12.7.3"), 1000u64);
    let ctx = PollContext::new(Arc::new(client));

    let interfaces = sas().interfaces(&ctx).await.unwrap();
    let sap = interfaces[1].sap.as_ref().unwrap();
    assert_eq!(sap.inbound, Some(1000));
    assert_eq!(sap.outbound, None);
}

#[tokio::test]
async fn test_sap_without_interface_fails() {
    let client = interfaces().with_value(&sap(SAP_DESCRIPTION_OID, "12.9.9"), "orphan");
    let ctx = PollContext::new(Arc::new(client));

    let err = sas().interfaces(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(err.to_string().contains("99"));
}

#[tokio::test]
async fn test_counter_transport_failure_aborts() {
    let client = interfaces()
        .with_value(&sap(SAP_DESCRIPTION_OID, "12.7.3"), "customer uplink")
        .with_failure(SAP_INBOUND_OID, ErrorKind::Transport);
    let ctx = PollContext::new(Arc::new(client));

    let err = sas().interfaces(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_no_sap_table_keeps_interfaces() {
    let client = Arc::new(interfaces());
    let ctx = PollContext::new(client.clone());

    let interfaces = sas().interfaces(&ctx).await.unwrap();
    assert_eq!(interfaces.len(), 2);
    assert!(interfaces.iter().all(|i| i.sap.is_none()));
    assert_eq!(client.walk_count(SAP_DESCRIPTION_OID), 1);
}

#[tokio::test]
async fn test_other_properties_fall_through() {
    let client = interfaces().with_value("1.3.6.1.2.1.1.1.0", "TiMOS-B-21.9.R1");
    let ctx = PollContext::new(Arc::new(client));

    let properties = sas().identify(&ctx).await.unwrap();
    assert_eq!(properties.vendor.as_deref(), Some("TiMOS-B-21.9.R1"));
}

fn sas_with_own_properties(properties: &str) -> Communicator {
    let yaml = format!("{}  properties:\n{}", CLASSES, properties);
    let catalog = MemoryCatalog::from_yaml(&yaml).unwrap();
    Communicator::from_catalog(&catalog, "timos/sas", &OverrideRegistry::with_defaults()).unwrap()
}

fn one_sap() -> MockClient {
    interfaces()
        .with_value(&sap(SAP_DESCRIPTION_OID, "12.7.3"), "customer uplink")
        .with_value(&sap(SAP_INBOUND_OID, "12.7.3"), 1000u64)
        .with_value(&sap(SAP_OUTBOUND_OID, "12.7.3"), 2000u64)
}

#[tokio::test]
async fn test_sas_cpu_labels_keep_sap_override() {
    let sas = sas_with_own_properties(
        "    cpu:\n      load:\n        oid: 1.3.6.1.4.1.6527.3.1.2.1.1.1\n",
    );
    let ctx = PollContext::new(Arc::new(one_sap()));

    let interfaces = sas.interfaces(&ctx).await.unwrap();
    assert_eq!(interfaces[1].sap.as_ref().and_then(|s| s.inbound), Some(1000));
}

#[tokio::test]
async fn test_sas_interface_labels_take_precedence_over_override() {
    let sas = sas_with_own_properties(
        "    interfaces:\n      ifAlias:\n        oid: 1.3.6.1.2.1.31.1.1.1.18\n",
    );
    let ctx = PollContext::new(Arc::new(one_sap()));

    let interfaces = sas.interfaces(&ctx).await.unwrap();
    assert_eq!(interfaces.len(), 2);
    assert!(interfaces.iter().all(|i| i.sap.is_none()));
}
