pub mod errors;
pub mod options;
pub mod server;
pub mod tool_config;
pub mod tool_options_file;
