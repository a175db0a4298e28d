//! HTTP control surface.
//!
//! Registers the bridge's JSON routes and the browser front end on the
//! ESP-IDF HTTP server. JSON handlers split the request URI, lock the shared
//! [`BridgeService`] and write the body it returns; the front end is
//! compiled into the image from `web/`. Host builds get the same request
//! handling without a socket so it can be tested directly.

use std::borrow::Cow;
use std::sync::Mutex;

use log::{debug, warn};

use crate::app::ports::RequestPort;
use crate::app::service::BridgeService;

/// Every JSON path the bridge answers.
pub const ROUTES: [&str; 5] = ["/status", "/images", "/nextImage", "/image", "/eject"];

pub const JSON: &str = "application/json";

/// A file of the browser front end.
pub struct Asset {
    pub path: &'static str,
    pub content_type: &'static str,
    pub body: &'static str,
}

/// The browser front end. `/` serves the first entry.
pub static ASSETS: [Asset; 4] = [
    Asset {
        path: "/index.html",
        content_type: "text/html",
        body: include_str!("../../web/index.html"),
    },
    Asset {
        path: "/control.js",
        content_type: "application/javascript",
        body: include_str!("../../web/control.js"),
    },
    Asset {
        path: "/control2.js",
        content_type: "application/javascript",
        body: include_str!("../../web/control2.js"),
    },
    Asset {
        path: "/style.css",
        content_type: "text/css",
        body: include_str!("../../web/style.css"),
    },
];

/// A response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Cow<'static, str>,
}

impl Reply {
    fn json(status: u16, body: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            content_type: JSON,
            body: body.into(),
        }
    }
}

/// Split `uri` into its path and query string.
pub fn split_uri(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    }
}

/// The front-end file served at `path`, if any.
pub fn asset(path: &str) -> Option<&'static Asset> {
    let path = if path == "/" { ASSETS[0].path } else { path };
    ASSETS.iter().find(|a| a.path == path)
}

/// Reply for `uri`.
pub fn handle<R: RequestPort + ?Sized>(service: &Mutex<BridgeService<'_, R>>, uri: &str) -> Reply {
    let (path, query) = split_uri(uri);
    debug!("http: GET {}", uri);

    if let Some(file) = asset(path) {
        return Reply {
            status: 200,
            content_type: file.content_type,
            body: Cow::Borrowed(file.body),
        };
    }

    let Ok(mut svc) = service.lock() else {
        warn!("http: service lock poisoned");
        return Reply::json(500, crate::app::routes::ERROR_BODY);
    };
    match svc.serve(path, query) {
        Some(body) => Reply::json(200, body),
        None => Reply::json(404, ""),
    }
}

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::{Arc, Mutex};

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::Write;
    use esp_idf_svc::sys::EspError;
    use log::info;

    use super::{ASSETS, ROUTES, handle};
    use crate::app::service::BridgeService;
    use crate::link::Link;

    pub type SharedService = Arc<Mutex<BridgeService<'static, Link>>>;

    /// Running server; dropping it stops serving.
    pub struct HttpServer {
        _server: EspHttpServer<'static>,
    }

    impl HttpServer {
        pub fn start(service: SharedService) -> Result<Self, EspError> {
            let mut server = EspHttpServer::new(&Configuration::default())?;
            let paths = ROUTES.into_iter().chain(ASSETS.iter().map(|a| a.path)).chain(["/"]);
            for path in paths {
                let service = service.clone();
                server.fn_handler(path, Method::Get, move |req| -> Result<(), EspError> {
                    let reply = handle(&service, req.uri());
                    let headers = [("Content-Type", reply.content_type)];
                    let mut resp = req.into_response(reply.status, None, &headers)?;
                    resp.write_all(reply.body.as_bytes())?;
                    Ok(())
                })?;
            }
            info!("http: serving {} routes and {} files", ROUTES.len(), ASSETS.len());
            Ok(Self { _server: server })
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{HttpServer, SharedService};
