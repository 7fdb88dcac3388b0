pub mod config;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod individual_sponsors;
pub mod modal;
pub mod page;
pub mod render;
pub mod site;
pub mod sponsors;
