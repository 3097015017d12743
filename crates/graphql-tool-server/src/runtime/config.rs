use std::net::{IpAddr, Ipv4Addr};

use graphql_tool_server::options::{GraphQLEndpointOptions, GraphQLToolOptions};
use schemars::JsonSchema;
use serde::Deserialize;

use super::logging::Logging;

/// Configuration for the GraphQL tool server
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// The IP address to bind the server to
    pub address: IpAddr,

    /// The port to bind the server to
    pub port: u16,

    /// The path the GraphQL endpoint and its tool are mounted at
    pub path: String,

    /// Options of the GraphQL endpoint. Derived from `path` when not set.
    pub endpoint: Option<GraphQLEndpointOptions>,

    /// Options of the GraphQL client tool
    pub tool: Option<GraphQLToolOptions>,

    /// Logging configuration
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            path: "/graphql".to_string(),
            endpoint: None,
            tool: None,
            logging: Logging::default(),
        }
    }
}
