//! Component gating and aggregation

use std::sync::Arc;
use std::time::Duration;

use netprobe_model::{ComponentKind, ComponentRecord};
use probesrv::communicator::DeviceCommunicator;
use probesrv::query::mock::MockClient;
use probesrv::{
    poll_device, poll_devices, ClassOverlay, Communicator, ErrorKind, MemoryCatalog,
    OverrideRegistry, PollContext,
};

const CPU_LOAD: &str = "1.3.6.1.2.1.25.3.3.1.2";
const CPU_TEMP: &str = "1.3.6.1.4.1.2021.13.16.2.1.3";
const SYSTEM_PROCS: &str = "1.3.6.1.2.1.25.1.6";
const SYSTEM_USERS: &str = "1.3.6.1.2.1.25.1.5";
const UPS_VOLTAGE: &str = "1.3.6.1.2.1.33.1.2.5";
const AGENT_HOST: &str = "1.3.6.1.4.1.9148.3.2.1.2.1.1.2";
const AGENT_STATUS: &str = "1.3.6.1.4.1.9148.3.2.1.2.1.1.22";

fn communicator(overlays: Vec<ClassOverlay>, class: &str) -> Communicator {
    let catalog = MemoryCatalog::from_overlays(overlays).unwrap();
    Communicator::from_catalog(&catalog, class, &OverrideRegistry::new()).unwrap()
}

fn server_class() -> ClassOverlay {
    ClassOverlay::new("linux")
        .with_component(ComponentKind::Cpu, true)
        .with_component(ComponentKind::Server, true)
        .with_leaf("identify.vendor", "1.3.6.1.2.1.1.1")
        .with_leaf("cpu.load", CPU_LOAD)
        .with_leaf("cpu.temperature", CPU_TEMP)
        .with_leaf("server.procs", SYSTEM_PROCS)
        .with_leaf("server.users", SYSTEM_USERS)
        .with_leaf("ups.battery_voltage", UPS_VOLTAGE)
}

#[tokio::test]
async fn test_cpu_without_values_is_component_not_found() {
    let communicator = communicator(vec![server_class()], "linux");
    let ctx = PollContext::new(Arc::new(MockClient::new()));

    let err = communicator.cpu(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ComponentNotFound);
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn test_cpu_with_only_load() {
    let communicator = communicator(vec![server_class()], "linux");
    let client = MockClient::new().with_column(CPU_LOAD, [(196609, 12u64), (196608, 3u64)]);
    let ctx = PollContext::new(Arc::new(client));

    let cpu = communicator.cpu(&ctx).await.unwrap();
    assert_eq!(cpu.load, Some(vec![3.0, 12.0]));
    assert_eq!(cpu.temperature, None);
}

#[tokio::test]
async fn test_component_fields_fetched_concurrently() {
    let communicator = communicator(vec![server_class()], "linux");
    let client = Arc::new(
        MockClient::new()
            .with_column(CPU_LOAD, [(1, 12u64)])
            .with_column(CPU_TEMP, [(1, 41u64)])
            .with_delay(Duration::from_millis(20)),
    );

    let cpu = communicator
        .cpu(&PollContext::new(client.clone()))
        .await
        .unwrap();
    assert_eq!(cpu.load, Some(vec![12.0]));
    assert_eq!(cpu.temperature, Some(vec![41.0]));
    assert_eq!(client.peak_in_flight(), 2);

    let limited = Arc::new(
        MockClient::new()
            .with_column(CPU_LOAD, [(1, 12u64)])
            .with_column(CPU_TEMP, [(1, 41u64)])
            .with_delay(Duration::from_millis(20)),
    );
    let ctx = PollContext::new(limited.clone()).with_max_concurrent_reads(1);
    communicator.cpu(&ctx).await.unwrap();
    assert_eq!(limited.peak_in_flight(), 1);
}

#[tokio::test]
async fn test_hard_failure_aborts_component() {
    let communicator = communicator(vec![server_class()], "linux");
    let client = MockClient::new()
        .with_column(CPU_TEMP, [(1, 41u64)])
        .with_failure(CPU_LOAD, ErrorKind::Transport);
    let ctx = PollContext::new(Arc::new(client));

    let err = communicator.cpu(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("cpu load"));
}

#[tokio::test]
async fn test_unadvertised_component_is_gated_without_reads() {
    let communicator = communicator(vec![server_class()], "linux");
    let client = Arc::new(MockClient::new().with_value("1.3.6.1.2.1.33.1.2.5.0", 54u64));
    let ctx = PollContext::new(client.clone());

    let err = communicator.ups(&ctx).await.unwrap_err();
    assert!(err.is_component_not_found());
    let err = communicator.node().ups_battery_voltage(&ctx).await.unwrap_err();
    assert!(err.is_component_not_found());
    assert_eq!(client.total_reads(), 0);
}

#[tokio::test]
async fn test_gating_only_at_head() {
    let communicator = communicator(
        vec![
            ClassOverlay::new("generic").with_leaf("cpu.load", CPU_LOAD),
            ClassOverlay::new("router")
                .with_parent("generic")
                .with_component(ComponentKind::Cpu, true),
        ],
        "router",
    );
    let client = MockClient::new().with_column(CPU_LOAD, [(1, 7u64)]);
    let ctx = PollContext::new(Arc::new(client));

    let cpu = communicator.cpu(&ctx).await.unwrap();
    assert_eq!(cpu.load, Some(vec![7.0]));

    let parent = communicator.node().sub().unwrap();
    assert!(!parent.is_head());
    assert_eq!(parent.cpu_load(&ctx).await.unwrap(), vec![7.0]);
}

#[tokio::test]
async fn test_component_record_by_kind() {
    let communicator = communicator(vec![server_class()], "linux");
    let client = MockClient::new()
        .with_value("1.3.6.1.2.1.25.1.6.0", 212u64)
        .with_value("1.3.6.1.2.1.25.1.5.0", 3u64);
    let ctx = PollContext::new(Arc::new(client));

    let record = communicator
        .component(&ctx, ComponentKind::Server)
        .await
        .unwrap();
    assert_eq!(record.kind(), ComponentKind::Server);
    match record {
        ComponentRecord::Server(server) => {
            assert_eq!(server.procs, Some(212));
            assert_eq!(server.users, Some(3));
        },
        other => panic!("unexpected record {:?}", other),
    }
}

#[tokio::test]
async fn test_sbc_agents_decoded_in_index_order() {
    let communicator = communicator(
        vec![ClassOverlay::new("acme-sbc")
            .with_component(ComponentKind::Sbc, true)
            .with_leaf("sbc.agents.hostname", AGENT_HOST)
            .with_leaf("sbc.agents.status", AGENT_STATUS)],
        "acme-sbc",
    );
    let client = MockClient::new()
        .with_column(AGENT_HOST, [(9, "sip-b"), (4, "sip-a")])
        .with_column(AGENT_STATUS, [(4, 2i64)]);
    let ctx = PollContext::new(Arc::new(client));

    let sbc = communicator.sbc(&ctx).await.unwrap();
    let agents = sbc.agents.unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0].hostname.as_deref(), Some("sip-a"));
    assert_eq!(agents[0].status, Some(2));
    assert_eq!(agents[1].hostname.as_deref(), Some("sip-b"));
    assert_eq!(agents[1].status, None);
    assert_eq!(sbc.realms, None);
}

#[tokio::test]
async fn test_poll_device_skips_unavailable_components() {
    let communicator = communicator(vec![server_class()], "linux");
    let client = MockClient::new()
        .with_value("1.3.6.1.2.1.1.1.0", "Linux")
        .with_column(CPU_LOAD, [(1, 20u64)]);
    let ctx = PollContext::new(Arc::new(client));

    let snapshot = poll_device(&communicator, &ctx).await.unwrap();
    assert_eq!(snapshot.class, "linux");
    assert_eq!(snapshot.properties.vendor.as_deref(), Some("Linux"));
    assert_eq!(snapshot.interfaces, None);
    assert_eq!(snapshot.components.len(), 1);
    assert!(snapshot.components.contains_key(&ComponentKind::Cpu));
}

#[tokio::test]
async fn test_poll_devices_independently() {
    let healthy = (
        communicator(vec![server_class()], "linux"),
        PollContext::new(Arc::new(MockClient::new().with_column(CPU_LOAD, [(1, 5u64)]))),
    );
    let broken = (
        communicator(vec![server_class()], "linux"),
        PollContext::new(Arc::new(
            MockClient::new().with_failure("1.3.6.1.2.1.1.1", ErrorKind::Transport),
        )),
    );

    let results = poll_devices(&[healthy, broken]).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::Transport);
}
