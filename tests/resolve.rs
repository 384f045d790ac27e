//! End-to-end resolution against local HTTP backends.

mod common;

use std::sync::Arc;
use std::time::Duration;

use hpass_did_resolver::network::{
    AuthTokenCache, Credentials, DiscoveryMode, EndpointSet, HttpMethod, LoadBalancedClient,
    RequestTemplate, ReqwestTransport,
};
use hpass_did_resolver::{DriverConfig, ErrorKind, ResolutionError, Resolver};
use tokio_util::sync::CancellationToken;

use common::{closed_addr, did, start_backend, DOCUMENT, NETWORK_ID, RESOURCE_ID};

fn transport() -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::new(Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn test_single_static_endpoint() {
    let backend = start_backend(|_| (200, DOCUMENT.to_string())).await;
    let resolver = Resolver::new(DriverConfig::with_nodes(backend.url("/dids/$1"))).unwrap();

    let result = resolver.resolve(&did()).await.unwrap();

    assert_eq!(result.did_document.id, did());
    assert_eq!(result.did_document.verification_method[0].method_type, "JsonWebKey2020");
    assert_eq!(result.method_metadata.created.as_deref(), Some("2020-12-20T19:17:47Z"));
    assert_eq!(result.method_metadata.updated, None);
    assert_eq!(result.metadata.discovery_mode, DiscoveryMode::Static);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, format!("/dids/{}", RESOURCE_ID));
}

#[tokio::test]
async fn test_failover_between_static_endpoints() {
    let failing = start_backend(|_| (500, "{}".to_string())).await;
    let healthy = start_backend(|_| (200, "second".to_string())).await;
    let endpoints = EndpointSet::from_url_list(
        &format!("{},{}", failing.url("/$1"), healthy.url("/$1")),
        HttpMethod::Get,
        DiscoveryMode::Static,
    )
    .unwrap();

    let response = LoadBalancedClient::new(transport())
        .request(&RequestTemplate::new(), "x", &endpoints, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.body, "second");
    assert_eq!(failing.hits(), 1);
    assert_eq!(healthy.hits(), 1);
}

#[tokio::test]
async fn test_connection_refused_fails_over() {
    let dead = closed_addr().await;
    let healthy = start_backend(|_| (200, DOCUMENT.to_string())).await;
    let config = DriverConfig::with_nodes(format!("http://{}/$1,{}", dead, healthy.url("/$1")));

    let result = Resolver::new(config).unwrap().resolve(&did()).await;

    assert!(result.is_ok());
    assert_eq!(healthy.hits(), 1);
}

#[tokio::test]
async fn test_persistent_failure_exhausts_budget() {
    let backend = start_backend(|_| (503, String::new())).await;
    let config = DriverConfig { max_retries: 3, ..DriverConfig::with_nodes(backend.url("/$1")) };

    let err = Resolver::new(config).unwrap().resolve(&did()).await.unwrap_err();

    assert!(matches!(err, ResolutionError::RetryExhausted { attempts: 4, last_status: Some(503), .. }));
    assert_eq!(backend.hits(), 4);
}

#[tokio::test]
async fn test_registry_then_node() {
    let node = start_backend(|_| (200, DOCUMENT.to_string())).await;
    let node_url = node.url("/records/$1");
    let registry = start_backend(move |_| {
        let body = format!(
            r#"{{"payload":{{"environments":[{{"type":"SOAP","metadata":{{"urls":["http://ignored/$1"],"method":"GET"}}}},{{"type":"REST","metadata":{{"urls":["{}"],"method":"GET"}}}}]}}}}"#,
            node_url
        );
        (200, body)
    })
    .await;

    let resolver = Resolver::new(DriverConfig::with_registry(registry.url("/networks/$1"))).unwrap();
    let result = resolver.resolve(&did()).await.unwrap();

    assert_eq!(result.metadata.discovery_mode, DiscoveryMode::Dynamic);
    assert_eq!(registry.requests()[0].path, format!("/networks/did:hpass:{}", NETWORK_ID));
    assert_eq!(node.requests()[0].path, format!("/records/{}", RESOURCE_ID));

    // no cross-call caching of registry answers
    resolver.resolve(&did()).await.unwrap();
    assert_eq!(registry.hits(), 2);
}

#[tokio::test]
async fn test_login_then_authorized_fetch() {
    let backend = start_backend(|request| match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/login") if request.body.contains("\"email\":\"driver\"") => {
            (200, r#"{"access_token":"tok123","expires_in":3600}"#.to_string())
        }
        ("GET", _) if request.header("authorization") == Some("Bearer tok123") => {
            (200, DOCUMENT.to_string())
        }
        _ => (401, String::new()),
    })
    .await;

    let config = DriverConfig {
        auth_enabled: true,
        login_url: backend.url("/login"),
        user: Some("driver".into()),
        password: Some("secret".into()),
        ..DriverConfig::with_nodes(backend.url("/dids/$1"))
    };
    let resolver = Resolver::new(config).unwrap();

    assert!(resolver.resolve(&did()).await.is_ok());

    let requests = backend.requests();
    assert_eq!(requests[0].path, "/login");
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
    assert_eq!(requests[1].header("authorization"), Some("Bearer tok123"));
}

#[tokio::test]
async fn test_login_response_without_token() {
    let backend = start_backend(|_| (200, r#"{"message":"welcome"}"#.to_string())).await;
    let cache = AuthTokenCache::new(
        transport(),
        backend.url("/login"),
        Some(Credentials { user: "u".into(), password: "p".into() }),
    );

    let err = ResolutionError::from(cache.authenticate().await.unwrap_err());
    assert_eq!(err.kind(), ErrorKind::LoginResponseInvalid);
}

#[tokio::test]
async fn test_malformed_identifier_never_reaches_backend() {
    let backend = start_backend(|_| (200, DOCUMENT.to_string())).await;
    let resolver = Resolver::new(DriverConfig::with_nodes(backend.url("/$1"))).unwrap();

    let err = resolver.resolve("did:hpass:xyz:123").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IdentifierMalformed);
    assert_eq!(backend.hits(), 0);
}
