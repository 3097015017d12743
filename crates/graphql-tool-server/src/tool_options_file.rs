//! Middleware serving the client tool configuration file
//!
//! Requests for `<mount path>/bcp-config.json` are answered with the JSON
//! [`ToolConfiguration`] built from the ambient options of the request. Everything
//! else is handed to the wrapped service untouched.
//!
//! The configuration is computed on the first matching request and reused for the
//! lifetime of the service. Clones of a service share the cached configuration.

use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use axum::response::{IntoResponse, Response};
use futures::future::{Either, Ready, ready};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Request, StatusCode};
use tower::{Layer, Service};
use tracing::{debug, trace};

use crate::errors::{ServerError, ToolConfigError};
use crate::options::RequestOptionsExt as _;
use crate::tool_config::ToolConfiguration;

/// The path of the configuration file below the mount path
pub const CONFIG_FILE: &str = "/bcp-config.json";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Layer that adds the configuration file endpoint to a service
#[derive(Clone, Debug)]
pub struct ToolOptionsFileLayer {
    match_path: Arc<str>,
}

impl ToolOptionsFileLayer {
    /// Serve the configuration file below `match_path`.
    ///
    /// The path must be empty or absolute. A trailing slash is ignored.
    pub fn new(match_path: impl Into<String>) -> Result<Self, ServerError> {
        let match_path = match_path.into();
        if !match_path.is_empty() && !match_path.starts_with('/') {
            return Err(ServerError::InvalidMountPath(match_path));
        }

        Ok(Self {
            match_path: match_path.trim_end_matches('/').into(),
        })
    }
}

impl<S> Layer<S> for ToolOptionsFileLayer {
    type Service = ToolOptionsFileService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ToolOptionsFileService {
            inner,
            match_path: self.match_path.clone(),
            config: Arc::default(),
        }
    }
}

/// Service answering configuration file requests and forwarding everything else
#[derive(Clone, Debug)]
pub struct ToolOptionsFileService<S> {
    inner: S,
    match_path: Arc<str>,
    config: Arc<OnceLock<ToolConfiguration>>,
}

impl<S> ToolOptionsFileService<S> {
    fn matches<B>(&self, request: &Request<B>) -> bool {
        matches!(*request.method(), Method::GET | Method::HEAD)
            && strip_mount_path(request.uri().path(), &self.match_path) == Some(CONFIG_FILE)
            && request
                .graphql_tool_options()
                .is_none_or(|options| options.enable)
    }

    fn configuration<B>(&self, request: &Request<B>) -> Result<&ToolConfiguration, ToolConfigError> {
        if let Some(config) = self.config.get() {
            return Ok(config);
        }

        // Racing first requests may each compute the configuration. The mapping is
        // pure, so whichever value is stored first is served to everyone.
        let config = ToolConfiguration::from_options(
            request.graphql_endpoint_options(),
            request.graphql_tool_options(),
        )?;
        debug!(?config, "Computed tool configuration");

        Ok(self.config.get_or_init(|| config))
    }

    fn respond<B>(&self, request: &Request<B>) -> Result<Response, ToolConfigError> {
        let body = serde_json::to_vec(self.configuration(request)?)?;
        trace!(path = request.uri().path(), "Serving tool configuration");

        Ok((
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            body,
        )
            .into_response())
    }
}

impl<S, B> Service<Request<B>> for ToolOptionsFileService<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<S::Future, Ready<Result<Response, S::Error>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        if !self.matches(&request) {
            return Either::Left(self.inner.call(request));
        }

        let response = self
            .respond(&request)
            .unwrap_or_else(IntoResponse::into_response);
        Either::Right(ready(Ok(response)))
    }
}

/// Remove the mount path from the front of `path`.
///
/// The mount path matches case-insensitively and only on whole segments. An empty
/// mount path matches everything.
fn strip_mount_path<'a>(path: &'a str, mount_path: &str) -> Option<&'a str> {
    if mount_path.is_empty() {
        return Some(path);
    }

    let prefix = path.get(..mount_path.len())?;
    if !prefix.eq_ignore_ascii_case(mount_path) {
        return None;
    }

    let rest = path.get(mount_path.len()..)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{
        DefaultCredentials, DefaultHttpMethod, GraphQLEndpointOptions, GraphQLToolOptions,
    };
    use axum::body::Body;
    use http::HeaderMap;
    use http_body_util::BodyExt as _;
    use rstest::rstest;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt as _;
    use tracing_test::traced_test;

    /// Wrap a next service that counts how often it was called
    fn responder(
        mount_path: &str,
    ) -> (
        impl Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let next = tower::service_fn(move |_request: Request<Body>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Infallible>(StatusCode::NOT_FOUND.into_response()) }
        });

        let layer = ToolOptionsFileLayer::new(mount_path).unwrap();
        (layer.layer(next), calls)
    }

    fn request(method: Method, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    fn with_options(
        mut request: Request<Body>,
        endpoint_options: Option<GraphQLEndpointOptions>,
        tool_options: Option<GraphQLToolOptions>,
    ) -> Request<Body> {
        if let Some(endpoint_options) = endpoint_options {
            request.extensions_mut().insert(Arc::new(endpoint_options));
        }
        if let Some(tool_options) = tool_options {
            request.extensions_mut().insert(Arc::new(tool_options));
        }
        request
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[rstest]
    #[case("/graphql", "/graphql/bcp-config.json")]
    #[case("/graphql", "/GraphQL/bcp-config.json")]
    #[case("/graphql/", "/graphql/bcp-config.json")]
    #[case("", "/bcp-config.json")]
    #[case("/", "/bcp-config.json")]
    fn it_strips_the_mount_path(#[case] mount_path: &str, #[case] path: &str) {
        let layer = ToolOptionsFileLayer::new(mount_path).unwrap();

        assert_eq!(strip_mount_path(path, &layer.match_path), Some(CONFIG_FILE));
    }

    #[rstest]
    #[case("/graphql", "/graphqlx/bcp-config.json")]
    #[case("/graphql", "/api/bcp-config.json")]
    #[case("/graphql", "/graph")]
    fn it_requires_a_whole_segment_match(#[case] mount_path: &str, #[case] path: &str) {
        assert_eq!(strip_mount_path(path, mount_path), None);
    }

    #[test]
    fn it_rejects_relative_mount_paths() {
        let result = ToolOptionsFileLayer::new("graphql");

        assert!(matches!(result, Err(ServerError::InvalidMountPath(path)) if path == "graphql"));
    }

    #[tokio::test]
    #[rstest]
    #[case(Method::GET, "/graphql")]
    #[case(Method::GET, "/graphql/")]
    #[case(Method::GET, "/graphql/BCP-CONFIG.JSON")]
    #[case(Method::GET, "/graphql/bcp-config.json/extra")]
    #[case(Method::GET, "/bcp-config.json")]
    #[case(Method::POST, "/graphql/bcp-config.json")]
    #[case(Method::PUT, "/graphql/bcp-config.json")]
    #[case(Method::OPTIONS, "/graphql/bcp-config.json")]
    async fn it_forwards_non_matching_requests(#[case] method: Method, #[case] path: &str) {
        let (service, calls) = responder("/graphql");

        let response = service.oneshot(request(method, path)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    const ENDPOINT_ONLY_CONFIG: &str = r#"{"title":null,"useBrowserUrlAsEndpoint":true,"schemaEndpoint":"/graphql","graphQLDocument":null,"credentials":null,"httpHeaders":null,"httpMethod":null,"gaTrackingId":null}"#;

    #[tokio::test]
    #[rstest]
    #[case(Method::GET)]
    #[case(Method::HEAD)]
    async fn it_serves_the_configuration(#[case] method: Method) {
        let (service, calls) = responder("/graphql");

        let response = service
            .oneshot(with_options(
                request(method, "/graphql/bcp-config.json"),
                Some(GraphQLEndpointOptions {
                    graphql_endpoint: Some("/graphql".into()),
                }),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(body_string(response).await, ENDPOINT_ONLY_CONFIG);
    }

    #[tokio::test]
    async fn it_serves_defaults_without_ambient_options() {
        let (service, calls) = responder("/graphql");

        let response = service
            .oneshot(request(Method::GET, "/graphql/bcp-config.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["useBrowserUrlAsEndpoint"], serde_json::Value::Bool(true));
        assert_eq!(body["schemaEndpoint"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn it_forwards_when_the_tool_is_disabled() {
        let (service, calls) = responder("/graphql");

        let response = service
            .oneshot(with_options(
                request(Method::GET, "/graphql/bcp-config.json"),
                None,
                Some(GraphQLToolOptions {
                    enable: false,
                    ..Default::default()
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tool_options_win_over_endpoint_options() {
        let (service, _) = responder("/graphql");

        let response = service
            .oneshot(with_options(
                request(Method::GET, "/graphql/bcp-config.json"),
                Some(GraphQLEndpointOptions {
                    graphql_endpoint: Some("/graphql".into()),
                }),
                Some(GraphQLToolOptions {
                    credentials: Some(DefaultCredentials::Include),
                    http_method: Some(DefaultHttpMethod::Post),
                    graphql_endpoint: Some("/api".into()),
                    ..Default::default()
                }),
            ))
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["schemaEndpoint"], "/api");
        assert_eq!(body["credentials"], "include");
        assert_eq!(body["httpMethod"], "POST");
    }

    #[tokio::test]
    #[traced_test]
    async fn it_computes_the_configuration_once() {
        let (service, calls) = responder("/graphql");

        let first = service
            .clone()
            .oneshot(with_options(
                request(Method::GET, "/graphql/bcp-config.json"),
                None,
                Some(GraphQLToolOptions {
                    title: Some("first".into()),
                    ..Default::default()
                }),
            ))
            .await
            .unwrap();
        let first = body_string(first).await;

        for title in ["second", "third"] {
            let response = service
                .clone()
                .oneshot(with_options(
                    request(Method::GET, "/graphql/bcp-config.json"),
                    None,
                    Some(GraphQLToolOptions {
                        title: Some(title.into()),
                        ..Default::default()
                    }),
                ))
                .await
                .unwrap();

            assert_eq!(body_string(response).await, first);
        }

        assert!(first.contains(r#""title":"first""#));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("Computed tool configuration"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("Expected the configuration to be computed once, got {n}")),
            }
        });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_first_requests_get_the_same_configuration() {
        let service = ToolOptionsFileLayer::new("/graphql")
            .unwrap()
            .layer(tower::service_fn(|_request: Request<Body>| async {
                Ok::<_, Infallible>(StatusCode::NOT_FOUND.into_response())
            }));

        let requests = (0..8).map(|index| {
            let service = service.clone();
            tokio::spawn(async move {
                let response = service
                    .oneshot(with_options(
                        request(Method::GET, "/graphql/bcp-config.json"),
                        None,
                        Some(GraphQLToolOptions {
                            title: Some(format!("title {index}")),
                            ..Default::default()
                        }),
                    ))
                    .await
                    .unwrap();
                body_string(response).await
            })
        });
        let bodies = futures::future::try_join_all(requests).await.unwrap();

        let first = &bodies[0];
        assert!(bodies.iter().all(|body| body == first));
        assert!((0..8).any(|index| first.contains(&format!(r#""title":"title {index}""#))));
    }

    #[tokio::test]
    async fn each_layered_service_has_its_own_cache() {
        let layer = ToolOptionsFileLayer::new("/graphql").unwrap();
        let next = tower::service_fn(|_request: Request<Body>| async {
            Ok::<_, Infallible>(StatusCode::NOT_FOUND.into_response())
        });

        for title in ["one", "two"] {
            let response = layer
                .layer(next.clone())
                .oneshot(with_options(
                    request(Method::GET, "/graphql/bcp-config.json"),
                    None,
                    Some(GraphQLToolOptions {
                        title: Some(title.into()),
                        ..Default::default()
                    }),
                ))
                .await
                .unwrap();

            assert!(body_string(response).await.contains(title));
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn it_fails_with_a_server_error_for_unrenderable_headers() {
        let (service, calls) = responder("/graphql");
        let mut headers = HeaderMap::new();
        headers.insert("x-name", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let response = service
            .oneshot(with_options(
                request(Method::GET, "/graphql/bcp-config.json"),
                None,
                Some(GraphQLToolOptions {
                    http_headers: Some(headers),
                    ..Default::default()
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(logs_contain("Failed to build the tool configuration"));
    }
}
