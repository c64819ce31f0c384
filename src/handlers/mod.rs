//! Built-in handlers.
//!
//! # Responsibilities
//! - Serve configured static assets (favicon, login/register pages, fonts,
//!   images, optional main page)
//! - Forward page requests to the page-request service
//! - Build the standard route table from the asset manifest
//!
//! Login/registration processing and page rendering are supplied by the
//! embedding application through `RouteTableBuilder`.

pub mod pagereq;
pub mod static_file;

use std::sync::Arc;

use crate::config::{AssetConfig, ServerConfig};
use crate::routing::{names, RouteTableBuilder};

pub use pagereq::PagereqHandler;
pub use static_file::StaticFile;

impl RouteTableBuilder {
    /// Register every entry of an asset manifest as a static file route.
    pub fn assets(mut self, manifest: &AssetConfig) -> Self {
        let pages = [
            (names::FAVICON, &manifest.favicon),
            (names::MAIN, &manifest.main_page),
            (names::LOGIN, &manifest.login_page),
            (names::REGISTER, &manifest.register_page),
        ];
        for (name, path) in pages {
            if let Some(path) = path {
                self = self.read(name, Arc::new(StaticFile::new(path)));
            }
        }
        for (name, path) in &manifest.fonts {
            self = self.font(name, Arc::new(StaticFile::new(path)));
        }
        for (name, path) in &manifest.images {
            self = self.image(name, Arc::new(StaticFile::new(path)));
        }
        self
    }
}

/// Route table builder preloaded with the built-in handlers `config` asks for.
pub fn standard_routes(config: &ServerConfig) -> Result<RouteTableBuilder, reqwest::Error> {
    let mut builder = RouteTableBuilder::default().assets(&config.assets);
    if let Some(upstream) = &config.services.pagereq {
        let handler = PagereqHandler::from_config(upstream, &config.timeouts)?;
        builder = builder.write(names::PAGEREQ, Arc::new(handler));
    }
    Ok(builder)
}
