use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::{CallMode, Config},
    errors::{ErrorResponse, RpcError},
    rpc::{envelope::CallEnvelope, registry::Registry},
};

/// One way of getting a call envelope executed.
#[async_trait]
pub trait CallStrategy: Send + Sync {
    fn mode(&self) -> CallMode;
    async fn call(&self, method: &str, data: Vec<Value>) -> Result<Value, RpcError>;
}

/// Runs calls against the in-process registry, bypassing the network.
#[derive(Debug, Clone)]
pub struct DirectStrategy {
    registry: Registry,
}

impl DirectStrategy {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl CallStrategy for DirectStrategy {
    fn mode(&self) -> CallMode {
        CallMode::Direct
    }

    async fn call(&self, method: &str, data: Vec<Value>) -> Result<Value, RpcError> {
        self.registry.invoke(method, data).await
    }
}

/// POSTs call envelopes to a remote dispatcher.
#[derive(Debug, Clone)]
pub struct HttpStrategy {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpStrategy {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_timeout(endpoint, None)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, RpcError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| RpcError::Transport(format!("failed to build http client: {err}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CallStrategy for HttpStrategy {
    fn mode(&self) -> CallMode {
        CallMode::Http
    }

    async fn call(&self, method: &str, data: Vec<Value>) -> Result<Value, RpcError> {
        let envelope = CallEnvelope::new(method, data);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|err| RpcError::Transport(format!("failed to reach {}: {err}", self.endpoint)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| RpcError::Transport(format!("failed to read response body: {err}")))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorResponse>(&body) {
                Ok(error) => RpcError::from_error_response(status.as_u16(), method, error),
                Err(_) => RpcError::RemoteStatus {
                    status: status.as_u16(),
                    message: String::from_utf8_lossy(&body).into_owned(),
                },
            });
        }

        serde_json::from_slice(&body)
            .map_err(|err| RpcError::InvalidResponse(format!("response body is not json: {err}")))
    }
}

/// Presents registry methods as local async calls, whichever strategy backs them.
#[derive(Clone)]
pub struct CallRouter {
    strategy: Arc<dyn CallStrategy>,
}

impl CallRouter {
    pub fn new(strategy: impl CallStrategy + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    pub fn direct(registry: Registry) -> Self {
        Self::new(DirectStrategy::new(registry))
    }

    pub fn http(endpoint: impl Into<String>) -> Result<Self, RpcError> {
        Ok(Self::new(HttpStrategy::new(endpoint)?))
    }

    pub fn from_config(config: &Config, registry: Registry) -> Result<Self, RpcError> {
        match config.call_mode {
            CallMode::Direct => Ok(Self::direct(registry)),
            CallMode::Http => Ok(Self::new(HttpStrategy::with_timeout(
                config.rpc_endpoint.clone(),
                config.rpc_timeout,
            )?)),
        }
    }

    pub fn mode(&self) -> CallMode {
        self.strategy.mode()
    }

    pub async fn call_value(&self, method: &str, data: Vec<Value>) -> Result<Value, RpcError> {
        debug!(method = %method, arg_count = data.len(), mode = ?self.mode(), "routing call");
        self.strategy.call(method, data).await
    }

    pub async fn call<R: DeserializeOwned>(&self, method: &str, data: Vec<Value>) -> Result<R, RpcError> {
        let value = self.call_value(method, data).await?;
        serde_json::from_value(value).map_err(|err| {
            RpcError::InvalidResponse(format!("{method} returned an unexpected value: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{routing::post, Router};
    use serde_json::json;

    use super::*;
    use crate::{
        apis,
        build_app,
        rpc::registry::{MethodError, RegistryBuilder},
        AppState,
    };

    fn registry() -> Registry {
        RegistryBuilder::new()
            .register("add", |a: f64, b: f64| async move { Ok::<_, MethodError>(a + b) })
            .register_sync("echo", |value: Value| Ok::<_, MethodError>(value))
            .register_sync("nothing", || Ok::<_, MethodError>(()))
            .register_sync("boom", || -> Result<i64, MethodError> {
                Err(MethodError::new("secret internal detail"))
            })
            .build()
            .expect("registry")
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server");
        });
        format!("http://{addr}/rpc")
    }

    async fn routers(registry: Registry) -> (CallRouter, CallRouter) {
        let endpoint = serve(build_app(AppState::new(registry.clone()))).await;
        let remote = CallRouter::http(endpoint).expect("http router");
        (remote, CallRouter::direct(registry))
    }

    #[tokio::test]
    async fn remote_and_local_calls_agree() {
        let (remote, local) = routers(registry()).await;
        assert_eq!(remote.mode(), CallMode::Http);
        assert_eq!(local.mode(), CallMode::Direct);

        let cases = vec![
            ("add", vec![json!(1.5), json!(2)]),
            ("echo", vec![json!({"list": [1, "two", null], "flag": true})]),
            ("echo", vec![json!("ünïcödé")]),
            ("nothing", vec![]),
        ];

        for (method, data) in cases {
            let remote_value = remote.call_value(method, data.clone()).await.expect(method);
            let local_value = local.call_value(method, data).await.expect(method);
            assert_eq!(remote_value, local_value, "{method}");
        }
    }

    #[tokio::test]
    async fn unknown_method_is_not_found_on_both_paths() {
        let (remote, local) = routers(registry()).await;

        let remote_err = remote
            .call_value("doesNotExist", vec![])
            .await
            .expect_err("remote");
        let local_err = local
            .call_value("doesNotExist", vec![])
            .await
            .expect_err("local");

        assert!(remote_err.is_not_found());
        assert!(local_err.is_not_found());
    }

    #[tokio::test]
    async fn remote_target_failure_does_not_leak_details() {
        let (remote, _) = routers(registry()).await;

        let err = remote.call_value("boom", vec![]).await.expect_err("boom");
        match err {
            RpcError::TargetFailed { method, message } => {
                assert_eq!(method, "boom");
                assert_eq!(message, "internal server error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_arity_mismatch_is_rejected() {
        let (remote, _) = routers(registry()).await;
        let err = remote
            .call_value("add", vec![json!(1)])
            .await
            .expect_err("arity");
        assert!(matches!(err, RpcError::RemoteRejected { .. }));
    }

    #[tokio::test]
    async fn typed_call_decodes_result() {
        let (remote, local) = routers(apis::registry().expect("api registry")).await;

        let remote_millis: i64 = remote.call(apis::CURRENT_TIME, vec![]).await.expect("remote");
        let local_millis: i64 = local.call(apis::CURRENT_TIME, vec![]).await.expect("local");
        assert!((remote_millis - local_millis).abs() < 60_000);

        let err = local
            .call::<String>(apis::CURRENT_TIME, vec![])
            .await
            .expect_err("number is not a string");
        assert!(matches!(err, RpcError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn non_json_success_body_is_invalid_response() {
        let app = Router::new().route("/rpc", post(|| async { "definitely not json" }));
        let remote = CallRouter::http(serve(app).await).expect("http router");

        let err = remote.call_value("anything", vec![]).await.expect_err("text body");
        assert!(matches!(err, RpcError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn non_dispatcher_error_body_is_remote_status() {
        let app = Router::new().route(
            "/rpc",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let remote = CallRouter::http(serve(app).await).expect("http router");

        let err = remote.call_value("anything", vec![]).await.expect_err("502");
        match err {
            RpcError::RemoteStatus { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let remote = CallRouter::http(format!("http://{addr}/rpc")).expect("http router");
        let err = remote.call_value("anything", vec![]).await.expect_err("closed port");
        assert!(matches!(err, RpcError::Transport(_)));
    }

    #[test]
    fn from_config_selects_strategy() {
        let config = Config::from_lookup(|key| match key {
            "RPC_CALL_MODE" => Some("http".to_string()),
            _ => None,
        })
        .expect("config");
        let router = CallRouter::from_config(&config, registry()).expect("router");
        assert_eq!(router.mode(), CallMode::Http);

        let config = Config::from_lookup(|_| None).expect("config");
        let router = CallRouter::from_config(&config, registry()).expect("router");
        assert_eq!(router.mode(), CallMode::Direct);
    }
}
