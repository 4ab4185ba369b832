use std::time::{Duration, Instant};

use candid::{IDLArgs, IDLValue, encode_one};
use ciborium::Value;
use httpmock::prelude::*;
use signer_client::{
    ClientFactory, ClientOptions, ConfigError, DeploymentConfig, DeploymentMode, DispatchOptions,
    Error, HttpHeader, HttpRequest, HttpResponse, KEY_ISSUANCE_CONTRACT, RemoteCallError,
    SIGNING_CONTRACT,
};

const SERVICE: &str = "rrkah-fqaaa-aaaaa-aaaaq-cai";
const STATUS: &str = "/api/v2/status";

fn config(server: &MockServer, mode: DeploymentMode) -> DeploymentConfig {
    let mut config = DeploymentConfig::new(SERVICE, mode).unwrap();
    config.network_url = server.base_url().parse().unwrap();
    config
}

/// Mock replicas cannot sign query replies.
fn unverified() -> ClientOptions {
    ClientOptions::default().dispatch(DispatchOptions::default().verify_query_signatures(false))
}

fn cbor(value: &Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).unwrap();
    bytes
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn replied(arg: Vec<u8>) -> Vec<u8> {
    cbor(&Value::Map(vec![
        (text("status"), text("replied")),
        (text("reply"), Value::Map(vec![(text("arg"), Value::Bytes(arg))])),
    ]))
}

fn rejected(code: u8, message: &str) -> Vec<u8> {
    cbor(&Value::Map(vec![
        (text("status"), text("rejected")),
        (text("reject_code"), Value::Integer(code.into())),
        (text("reject_message"), text(message)),
    ]))
}

#[tokio::test]
async fn signs_a_digest_over_query_after_one_bootstrap_attempt() {
    let server = MockServer::start_async().await;
    let status = server
        .mock_async(|when, then| {
            when.method(GET).path(STATUS);
            then.status(503).body("replica starting");
        })
        .await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains(SERVICE)
                .path_contains("/query")
                .body_contains("sign_digest_mpc");
            then.status(200)
                .header("content-type", "application/cbor")
                .body(replied(encode_one("3045022100abcdef").unwrap()));
        })
        .await;
    let call = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/call");
            then.status(500);
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Development))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();
    status.assert_hits_async(1).await;
    assert!(client.bootstrap_warning().is_some());

    let signature = client.sign_digest_mpc("deadbeef", "key-1").await.unwrap();
    assert_eq!(signature, "3045022100abcdef");

    query.assert_hits_async(1).await;
    call.assert_hits_async(0).await;
    status.assert_hits_async(1).await;
}

#[tokio::test]
async fn empty_service_address_makes_no_network_calls() {
    let server = MockServer::start_async().await;
    let anything = server
        .mock_async(|_, then| {
            then.status(200);
        })
        .await;

    for address in ["", "x/../../status"] {
        let mut config = config(&server, DeploymentMode::Development);
        config.service_address = Some(address.to_string());
        let result = ClientFactory::new(&config)
            .create(SIGNING_CONTRACT, ClientOptions::default())
            .await;
        assert!(matches!(
            result,
            Err(Error::Configuration(
                ConfigError::MissingServiceAddress | ConfigError::InvalidServiceAddress { .. }
            ))
        ));
    }
    anything.assert_hits_async(0).await;
}

#[tokio::test]
async fn upgrade_reissues_http_request_as_update() {
    let server = MockServer::start_async().await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/query")
                .body_contains("http_request");
            then.status(200).body(replied(
                encode_one(HttpResponse {
                    status_code: 200,
                    body: b"stale".to_vec(),
                    upgrade: Some(true),
                    ..HttpResponse::default()
                })
                .unwrap(),
            ));
        })
        .await;
    let call = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/call")
                .body_contains("http_request");
            then.status(500).body("update path reached");
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();

    let result = client
        .http_request(HttpRequest::new("POST", "/keys").body(b"{}".to_vec()))
        .await;
    match result {
        Err(Error::RemoteCall(RemoteCallError::Server { status, message })) => {
            assert_eq!(status, 500);
            assert_eq!(message, "update path reached");
        }
        other => panic!("expected the update call to fail, got {other:?}"),
    }

    query.assert_hits_async(1).await;
    assert!(call.hits_async().await >= 1);
}

#[tokio::test]
async fn plain_http_request_stays_a_query() {
    let server = MockServer::start_async().await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/query");
            then.status(200).body(replied(
                encode_one(HttpResponse {
                    status_code: 404,
                    headers: vec![
                        HttpHeader::new("content-type", "text/plain"),
                        HttpHeader::new("x-certified", "1"),
                    ],
                    body: b"missing".to_vec(),
                    upgrade: Some(false),
                    streaming_strategy: None,
                })
                .unwrap(),
            ));
        })
        .await;
    let call = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/call");
            then.status(500);
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();
    let response = client.http_request(HttpRequest::new("GET", "/")).await.unwrap();

    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, b"missing");
    assert_eq!(response.headers[0].name(), "content-type");
    assert_eq!(response.headers[1].name(), "x-certified");
    query.assert_hits_async(1).await;
    call.assert_hits_async(0).await;
}

#[tokio::test]
async fn sign_digest_ic_is_an_update_call() {
    let server = MockServer::start_async().await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/query");
            then.status(200).body(replied(encode_one("sig").unwrap()));
        })
        .await;
    let call = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/call")
                .body_contains("sign_digest_ic");
            then.status(500).body("overloaded");
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();

    match client.sign_digest_ic("deadbeef").await {
        Err(Error::RemoteCall(err @ RemoteCallError::Server { .. })) => {
            assert!(err.is_retryable());
            assert!(err.to_string().contains("overloaded"));
        }
        other => panic!("expected a server error, got {other:?}"),
    }
    assert!(call.hits_async().await >= 1);
    query.assert_hits_async(0).await;
}

#[tokio::test]
async fn unsigned_query_replies_are_refused_by_default() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/query");
            then.status(200).body(replied(encode_one("unsigned").unwrap()));
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, ClientOptions::default())
        .await
        .unwrap();

    let result = client.sign_digest_mpc("deadbeef", "key-1").await;
    assert!(matches!(result, Err(Error::RemoteCall(_))), "{result:?}");
}

#[tokio::test]
async fn mistyped_replies_fail_closed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/query");
            then.status(200)
                .body(replied(encode_one(b"not text".to_vec()).unwrap()));
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();
    let err = client.sign_digest_mpc("deadbeef", "key-1").await.unwrap_err();
    assert!(matches!(err, Error::RemoteCall(RemoteCallError::Contract(_))));
}

#[tokio::test]
async fn doubling_reply_types_are_refused_quickly() {
    let levels = 40u8;
    let mut arg = b"DIDL".to_vec();
    arg.push(levels + 1);
    for i in 0..levels {
        arg.extend_from_slice(&[0x6c, 2, 0, i + 1, 1, i + 1]);
    }
    arg.extend_from_slice(&[0x6c, 0, 1, 0]);

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/query");
            then.status(200).body(replied(arg));
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();

    let started = Instant::now();
    let typed = client.http_request(HttpRequest::new("GET", "/")).await;
    assert!(matches!(typed, Err(Error::RemoteCall(RemoteCallError::Contract(_)))));

    let args = IDLArgs::new(&[IDLValue::Text("00".into()), IDLValue::Text("k".into())]);
    let dynamic = client.call("sign_digest_mpc", &args).await;
    assert!(matches!(dynamic, Err(Error::RemoteCall(RemoteCallError::Contract(_)))));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn rejections_keep_code_and_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/query");
            then.status(200).body(rejected(4, "unknown key id"));
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();

    match client.sign_digest_mpc("deadbeef", "missing").await {
        Err(Error::RemoteCall(RemoteCallError::Rejected { code, message })) => {
            assert_eq!(code, 4);
            assert_eq!(message, "unknown key id");
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn key_issuance_goes_through_update_calls() {
    let server = MockServer::start_async().await;
    let privkey = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/call")
                .body_contains("generate_privkey");
            then.status(500).body("privkey");
        })
        .await;
    let apikey = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/call")
                .body_contains("generate_apikey");
            then.status(500).body("apikey");
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(KEY_ISSUANCE_CONTRACT, unverified())
        .await
        .unwrap();

    assert!(matches!(
        client.generate_privkey().await,
        Err(Error::RemoteCall(RemoteCallError::Server { status: 500, .. }))
    ));
    assert!(matches!(
        client.generate_apikey().await,
        Err(Error::RemoteCall(RemoteCallError::Server { status: 500, .. }))
    ));
    assert!(privkey.hits_async().await >= 1);
    assert!(apikey.hits_async().await >= 1);
}

#[tokio::test]
async fn dynamic_calls_check_the_contract() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/query")
                .body_contains("sign_digest_mpc");
            then.status(200).body(replied(encode_one("sig").unwrap()));
        })
        .await;

    let client = ClientFactory::new(&config(&server, DeploymentMode::Production))
        .create(SIGNING_CONTRACT, unverified())
        .await
        .unwrap();

    assert!(matches!(
        client.call("generate_apikey", &IDLArgs::new(&[])).await,
        Err(Error::RemoteCall(RemoteCallError::UnknownOperation(_)))
    ));
    assert!(matches!(
        client
            .call("sign_digest_ic", &IDLArgs::new(&[IDLValue::Bool(true)]))
            .await,
        Err(Error::RemoteCall(RemoteCallError::Contract(_)))
    ));

    let args = IDLArgs::new(&[IDLValue::Text("00".into()), IDLValue::Text("k".into())]);
    let reply = client.call("sign_digest_mpc", &args).await.unwrap();
    assert_eq!(reply.args, [IDLValue::Text("sig".into())]);
}
