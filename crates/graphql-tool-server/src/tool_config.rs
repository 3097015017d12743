//! The configuration document served to the GraphQL client tool

use http::HeaderMap;
use indexmap::IndexMap;
use serde::Serialize;

use crate::errors::ToolConfigError;
use crate::options::{GraphQLEndpointOptions, GraphQLToolOptions};

/// Configuration consumed by the client tool on startup.
///
/// Absent values are serialized as `null`, the tool expects every key to be present.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfiguration {
    pub title: Option<String>,
    pub use_browser_url_as_endpoint: bool,
    pub schema_endpoint: Option<String>,
    #[serde(rename = "graphQLDocument")]
    pub graphql_document: Option<String>,
    pub credentials: Option<&'static str>,
    pub http_headers: Option<IndexMap<String, String>>,
    pub http_method: Option<&'static str>,
    pub ga_tracking_id: Option<String>,
}

impl Default for ToolConfiguration {
    fn default() -> Self {
        Self {
            title: None,
            use_browser_url_as_endpoint: true,
            schema_endpoint: None,
            graphql_document: None,
            credentials: None,
            http_headers: None,
            http_method: None,
            ga_tracking_id: None,
        }
    }
}

impl ToolConfiguration {
    /// Map the ambient options into a tool configuration.
    ///
    /// The endpoint options are applied first and the tool options override them.
    pub fn from_options(
        endpoint_options: Option<&GraphQLEndpointOptions>,
        tool_options: Option<&GraphQLToolOptions>,
    ) -> Result<Self, ToolConfigError> {
        let mut config = Self::default();

        if let Some(endpoint_options) = endpoint_options {
            config.use_browser_url_as_endpoint = true;
            config.schema_endpoint = endpoint_options.graphql_endpoint.clone();
        }

        if let Some(options) = tool_options {
            config.title = options.title.clone();
            config.graphql_document = options.document.clone();
            config.use_browser_url_as_endpoint = options.use_browser_url_as_graphql_endpoint;

            if let Some(endpoint) = &options.graphql_endpoint {
                config.schema_endpoint = Some(endpoint.clone());
            }

            config.credentials = options.credentials.map(|credentials| credentials.as_str());
            config.http_headers = options
                .http_headers
                .as_ref()
                .map(flatten_headers)
                .transpose()?;
            config.http_method = options.http_method.map(|method| method.as_str());
            config.ga_tracking_id = options.ga_tracking_id.clone();
        }

        Ok(config)
    }
}

/// Render every header as a single string, joining repeated values with a comma.
///
/// Names come out in the lowercase form `http` stores them in. Values are rendered as
/// UTF-8, so anything the config parser accepted as a header value renders as well.
fn flatten_headers(headers: &HeaderMap) -> Result<IndexMap<String, String>, ToolConfigError> {
    let mut flattened = IndexMap::with_capacity(headers.keys_len());

    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| {
                std::str::from_utf8(value.as_bytes()).map_err(|source| ToolConfigError::HeaderValue {
                    name: name.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        flattened.insert(name.to_string(), values.join(","));
    }

    Ok(flattened)
}
