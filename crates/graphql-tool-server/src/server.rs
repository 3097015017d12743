use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{Json, Router, http::StatusCode};
use bon::bon;
use serde_json::json;
use tower_http::add_extension::AddExtensionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::ServerError;
use crate::options::{GraphQLEndpointOptions, GraphQLToolOptions};
use crate::tool_options_file::{CONFIG_FILE, ToolOptionsFileLayer};

/// An HTTP server exposing the client tool configuration
pub struct Server {
    address: IpAddr,
    port: u16,
    mount_path: String,
    endpoint_options: Option<GraphQLEndpointOptions>,
    tool_options: Option<GraphQLToolOptions>,
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        address: IpAddr,
        port: u16,
        #[builder(into)] mount_path: String,
        endpoint_options: Option<GraphQLEndpointOptions>,
        tool_options: Option<GraphQLToolOptions>,
    ) -> Self {
        Self {
            address,
            port,
            mount_path,
            endpoint_options,
            tool_options,
        }
    }

    /// Build the router serving the configuration file in front of the fallback handler.
    ///
    /// Without explicit endpoint options, the mount path is announced as the endpoint.
    pub fn router(&self) -> Result<Router, ServerError> {
        let endpoint_options = self.endpoint_options.clone().unwrap_or_else(|| {
            GraphQLEndpointOptions {
                graphql_endpoint: Some(if self.mount_path.is_empty() {
                    "/".to_string()
                } else {
                    self.mount_path.clone()
                }),
            }
        });

        let mut router = Router::new()
            .fallback(not_found)
            .layer(ToolOptionsFileLayer::new(self.mount_path.clone())?)
            .layer(AddExtensionLayer::new(Arc::new(endpoint_options)));

        if let Some(tool_options) = &self.tool_options {
            router = router.layer(AddExtensionLayer::new(Arc::new(tool_options.clone())));
        }

        Ok(router.layer(TraceLayer::new_for_http()))
    }

    pub async fn start(self) -> Result<(), ServerError> {
        let router = self.router()?;
        let listen_address = SocketAddr::new(self.address, self.port);

        info!(
            address = ?self.address,
            port = ?self.port,
            config_file = %format!("{}{CONFIG_FILE}", self.mount_path.trim_end_matches('/')),
            "Starting GraphQL tool server"
        );

        let listener = tokio::net::TcpListener::bind(listen_address).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("GraphQL tool server stopped");
        Ok(())
    }
}

/// Handler for every request the tool middleware does not answer
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found" })),
    )
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
