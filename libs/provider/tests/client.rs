//! HTTP client tests against a mock provider API.

use pvs_capacity::{CapacityError, MachineShape, ResourcePool, Role, WorkerSet};
use pvs_provider::{
    validate_capacity, validate_cloud_connection_in_region, validate_dhcp_service, ClientConfig,
    CloudConnectionProvider, PowerClient, PreflightError, ProviderError, SystemPoolProvider,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SVC: &str = "svc-1234";

fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(server.uri());
    config.iam_url = server.uri();
    config
}

async fn client(server: &MockServer) -> PowerClient {
    PowerClient::with_token(&config(server), "test-token").unwrap()
}

async fn mount_pools(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/pcloud/v1/cloud-instances/{SVC}/system-pools")))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_authenticate_exchanges_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(body_string_contains("apikey=secret-key"))
        .and(body_string_contains("grant_type=urn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_pools(&server, json!({})).await;

    let client = PowerClient::authenticate(&config(&server), "secret-key")
        .await
        .unwrap();
    let pools = client.fetch_system_pools(SVC).await.unwrap();
    assert!(pools.is_empty());
}

#[tokio::test]
async fn test_authenticate_rejects_bad_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorCode": "BXNIM0415E",
            "errorMessage": "Provided API key could not be found."
        })))
        .mount(&server)
        .await;

    let err = PowerClient::authenticate(&config(&server), "wrong")
        .await
        .unwrap_err();
    match err {
        ProviderError::Auth(message) => assert!(message.contains("could not be found")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fetch_system_pools() {
    let server = MockServer::start().await;
    mount_pools(
        &server,
        json!({
            "s922": {"type": "s922", "maxCoresAvailable": {"cores": 8.25, "memory": 256}},
            "e980": {"type": "e980", "maxCoresAvailable": {"cores": 10, "memory": 64}}
        }),
    )
    .await;

    let pools = client(&server).await.fetch_system_pools(SVC).await.unwrap();
    assert_eq!(
        pools,
        vec![
            ResourcePool::new("e980", 10.0, 64),
            ResourcePool::new("s922", 8.25, 256),
        ]
    );
}

#[tokio::test]
async fn test_api_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/pcloud/v1/cloud-instances/{SVC}/system-pools")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "description": "user not authorized for this workspace",
            "error": "forbidden"
        })))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch_system_pools(SVC).await.unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "user not authorized for this workspace");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_validate_capacity_over_http() {
    let server = MockServer::start().await;
    mount_pools(
        &server,
        json!({
            "e980": {"type": "e980", "maxCoresAvailable": {"cores": 10, "memory": 64}},
            "s922": {"type": "s922", "maxCoresAvailable": {"cores": 4, "memory": 512}}
        }),
    )
    .await;
    let client = client(&server).await;

    let control_planes = vec![MachineShape::new("e980", "Dedicated", 2, 16); 3];
    let workers = vec![WorkerSet::new(
        "worker",
        4,
        MachineShape::new("s922", "Dedicated", "2.5", 32),
    )];

    let err = validate_capacity(&client, SVC, &control_planes, &workers)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PreflightError::Capacity(CapacityError::InsufficientCores {
            role: Role::Worker,
            ref pool,
            ..
        }) if pool == "s922"
    ));

    let workers = vec![WorkerSet::new(
        "worker",
        4,
        MachineShape::new("s922", "Shared", "2.5", 32),
    )];
    validate_capacity(&client, SVC, &control_planes, &workers)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_validate_capacity_wraps_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/pcloud/v1/cloud-instances/{SVC}/system-pools")))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = validate_capacity(&client(&server).await, SVC, &[], &[])
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to get system pools"));
}

async fn mount_cloud_connections(server: &MockServer, dhcp_managed: bool, cidr: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/pcloud/v1/cloud-instances/{SVC}/cloud-connections")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cloudConnections": [{"cloudConnectionID": "cc-1", "name": "transit"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/pcloud/v1/cloud-instances/{SVC}/cloud-connections/cc-1"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cloudConnectionID": "cc-1",
            "name": "transit",
            "networks": [{"networkID": "net-1", "name": "dhcp-net", "dhcpManaged": dhcp_managed}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/pcloud/v1/cloud-instances/{SVC}/networks/net-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "networkID": "net-1",
            "name": "dhcp-net",
            "cidr": cidr
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cloud_connection_calls() {
    let server = MockServer::start().await;
    mount_cloud_connections(&server, false, "192.168.0.0/24").await;
    let client = client(&server).await;

    let listed = client.list_cloud_connections(SVC).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].networks.is_empty());

    let detail = client.get_cloud_connection(SVC, "cc-1").await.unwrap();
    assert_eq!(detail.networks[0].network_id, "net-1");

    let network = client.get_network(SVC, "net-1").await.unwrap();
    assert_eq!(network.cidr, "192.168.0.0/24");
}

#[tokio::test]
async fn test_topology_validators_over_http() {
    let server = MockServer::start().await;
    mount_cloud_connections(&server, true, "10.0.0.0/24").await;
    let client = client(&server).await;

    let err = validate_dhcp_service(&client, SVC, &["10.0.0.0/16".parse().unwrap()])
        .await
        .unwrap_err();
    assert!(matches!(err, PreflightError::CidrConflict { .. }));

    validate_dhcp_service(&client, SVC, &["172.16.0.0/16".parse().unwrap()])
        .await
        .unwrap();

    let err = validate_cloud_connection_in_region(&client, SVC)
        .await
        .unwrap_err();
    assert!(matches!(err, PreflightError::DhcpCloudConnection { .. }));
}
