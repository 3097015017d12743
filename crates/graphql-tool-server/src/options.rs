//! Ambient options for the GraphQL client tool
//!
//! The options are attached to every request as extensions (usually through
//! [`tower_http::add_extension::AddExtensionLayer`]) so that middleware can read
//! them without having them passed in explicitly.

use std::sync::Arc;

use http::HeaderMap;
use schemars::JsonSchema;
use serde::Deserialize;

/// The credentials mode the client tool uses for its requests
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DefaultCredentials {
    /// Always send credentials, even for cross-origin requests
    Include,
    /// Never send credentials
    Omit,
    /// Only send credentials to the same origin
    #[serde(alias = "same-origin")]
    SameOrigin,
}

impl DefaultCredentials {
    pub fn as_str(self) -> &'static str {
        match self {
            DefaultCredentials::Include => "include",
            DefaultCredentials::Omit => "omit",
            DefaultCredentials::SameOrigin => "same-origin",
        }
    }
}

/// The HTTP method the client tool uses to send operations
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DefaultHttpMethod {
    #[serde(alias = "GET")]
    Get,
    #[serde(alias = "POST")]
    Post,
}

impl DefaultHttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DefaultHttpMethod::Get => "GET",
            DefaultHttpMethod::Post => "POST",
        }
    }
}

/// Options for the GraphQL client tool
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct GraphQLToolOptions {
    /// Set to false to stop serving the tool and its configuration
    pub enable: bool,

    /// The title shown by the tool
    pub title: Option<String>,

    /// The GraphQL document the tool opens with
    pub document: Option<String>,

    /// Use the URL the tool was loaded from as the GraphQL endpoint
    pub use_browser_url_as_graphql_endpoint: bool,

    /// The GraphQL endpoint the tool talks to. Takes precedence over the endpoint options.
    pub graphql_endpoint: Option<String>,

    /// The credentials mode for the tool's requests
    pub credentials: Option<DefaultCredentials>,

    /// Headers the tool adds to every request.
    /// A header may be given a single value or a list of values.
    #[serde(deserialize_with = "parsers::optional_header_map")]
    #[schemars(schema_with = "parsers::header_map_schema")]
    pub http_headers: Option<HeaderMap>,

    /// The HTTP method the tool sends operations with
    pub http_method: Option<DefaultHttpMethod>,

    /// Google Analytics tracking id for the tool
    pub ga_tracking_id: Option<String>,
}

impl Default for GraphQLToolOptions {
    fn default() -> Self {
        Self {
            enable: true,
            title: None,
            document: None,
            use_browser_url_as_graphql_endpoint: true,
            graphql_endpoint: None,
            credentials: None,
            http_headers: None,
            http_method: None,
            ga_tracking_id: None,
        }
    }
}

/// Options of the GraphQL endpoint the tool is mounted next to
#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct GraphQLEndpointOptions {
    /// The path or URL of the GraphQL endpoint
    pub graphql_endpoint: Option<String>,
}

/// Access to the ambient options attached to a request
pub trait RequestOptionsExt {
    fn graphql_tool_options(&self) -> Option<&GraphQLToolOptions>;

    fn graphql_endpoint_options(&self) -> Option<&GraphQLEndpointOptions>;
}

impl<B> RequestOptionsExt for http::Request<B> {
    fn graphql_tool_options(&self) -> Option<&GraphQLToolOptions> {
        self.extensions()
            .get::<Arc<GraphQLToolOptions>>()
            .map(Arc::as_ref)
    }

    fn graphql_endpoint_options(&self) -> Option<&GraphQLEndpointOptions> {
        self.extensions()
            .get::<Arc<GraphQLEndpointOptions>>()
            .map(Arc::as_ref)
    }
}

mod parsers {
    use std::collections::HashMap;
    use std::str::FromStr;

    use http::{HeaderMap, HeaderName, HeaderValue};
    use indexmap::IndexMap;
    use schemars::JsonSchema;
    use serde::{Deserialize, Deserializer, de::Error as _};

    #[derive(Deserialize, JsonSchema)]
    #[serde(untagged)]
    pub(super) enum HeaderValues {
        One(String),
        Many(Vec<String>),
    }

    pub(super) fn optional_header_map<'de, D>(deserializer: D) -> Result<Option<HeaderMap>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<IndexMap<String, HeaderValues>>::deserialize(deserializer)? else {
            return Ok(None);
        };

        let mut parsed = HeaderMap::with_capacity(raw.len());
        for (name, values) in raw {
            let name = HeaderName::from_str(&name).map_err(|e| D::Error::custom(e.to_string()))?;
            let values = match values {
                HeaderValues::One(value) => vec![value],
                HeaderValues::Many(values) => values,
            };

            for value in values {
                let value =
                    HeaderValue::from_str(&value).map_err(|e| D::Error::custom(e.to_string()))?;
                parsed.append(&name, value);
            }
        }

        Ok(Some(parsed))
    }

    pub(super) fn header_map_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        Option::<HashMap<String, HeaderValues>>::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;
    use rstest::rstest;

    #[test]
    fn it_defaults_to_an_enabled_tool() {
        let options = GraphQLToolOptions::default();

        assert!(options.enable);
        assert!(options.use_browser_url_as_graphql_endpoint);
        assert!(options.http_headers.is_none());
    }

    #[test]
    fn it_parses_single_and_multi_value_headers() {
        let options: GraphQLToolOptions = serde_json::from_value(serde_json::json!({
            "http_headers": {
                "Authorization": "Bearer 1234",
                "x-tenant": ["a", "b"],
            }
        }))
        .unwrap();

        let headers = options.http_headers.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer 1234");
        assert_eq!(
            headers
                .get_all("x-tenant")
                .iter()
                .map(|value| value.to_str().unwrap())
                .collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn it_rejects_invalid_header_names() {
        let result = serde_json::from_value::<GraphQLToolOptions>(serde_json::json!({
            "http_headers": { "invalid header": "value" }
        }));

        assert!(result.is_err());
    }

    #[rstest]
    #[case("\"include\"", DefaultCredentials::Include, "include")]
    #[case("\"omit\"", DefaultCredentials::Omit, "omit")]
    #[case("\"same_origin\"", DefaultCredentials::SameOrigin, "same-origin")]
    #[case("\"same-origin\"", DefaultCredentials::SameOrigin, "same-origin")]
    fn it_maps_credentials(
        #[case] raw: &str,
        #[case] expected: DefaultCredentials,
        #[case] rendered: &str,
    ) {
        let credentials: DefaultCredentials = serde_json::from_str(raw).unwrap();

        assert_eq!(credentials, expected);
        assert_eq!(credentials.as_str(), rendered);
    }

    #[rstest]
    #[case("\"get\"", DefaultHttpMethod::Get, "GET")]
    #[case("\"POST\"", DefaultHttpMethod::Post, "POST")]
    fn it_maps_http_methods(
        #[case] raw: &str,
        #[case] expected: DefaultHttpMethod,
        #[case] rendered: &str,
    ) {
        let method: DefaultHttpMethod = serde_json::from_str(raw).unwrap();

        assert_eq!(method, expected);
        assert_eq!(method.as_str(), rendered);
    }

    #[test]
    fn it_reads_options_from_request_extensions() {
        let mut request = http::Request::new(());
        assert!(request.graphql_tool_options().is_none());
        assert!(request.graphql_endpoint_options().is_none());

        request.extensions_mut().insert(Arc::new(GraphQLEndpointOptions {
            graphql_endpoint: Some("/graphql".into()),
        }));

        assert_eq!(
            request
                .graphql_endpoint_options()
                .and_then(|options| options.graphql_endpoint.as_deref()),
            Some("/graphql")
        );
    }
}
