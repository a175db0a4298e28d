//! HTTP request → controller request mapping.
//!
//! | Path         | Effect                                     | Reply                  |
//! |--------------|--------------------------------------------|------------------------|
//! | `/status`    | none                                       | status document        |
//! | `/images`    | first call requests the full listing       | `wait`, then listing   |
//! | `/nextImage` | requests entries one at a time             | `wait`, entry, `done`  |
//! | `/image`     | mounts `imageName`                         | `ok` / `error`         |
//! | `/eject`     | ejects the current image                   | `ok` / `error`         |

use log::{info, warn};

use super::images::{ImageCache, ImageCacheState};
use super::ports::RequestPort;
use crate::protocol::ClientRequest;

pub const OK_BODY: &str = r#"{"status": "ok"}"#;
pub const WAIT_BODY: &str = r#"{"status": "wait"}"#;
pub const DONE_BODY: &str = r#"{"status": "done"}"#;
pub const ERROR_BODY: &str = r#"{"status": "error"}"#;

/// What to send back for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The latest status document.
    Status,
    /// The assembled image listing.
    Listing,
    /// One image entry from an iteration.
    Image(String),
    Wait,
    Done,
    Ok,
    Error,
    NotFound,
}

impl Response {
    /// Body for replies that do not depend on cached documents.
    pub fn static_body(&self) -> Option<&'static str> {
        match self {
            Self::Wait => Some(WAIT_BODY),
            Self::Done => Some(DONE_BODY),
            Self::Ok => Some(OK_BODY),
            Self::Error => Some(ERROR_BODY),
            _ => None,
        }
    }
}

/// Resolve `path` (without query string) and its `query`.
pub fn resolve<R: RequestPort + ?Sized>(
    path: &str,
    query: Option<&str>,
    images: &mut ImageCache,
    requests: &R,
) -> Response {
    match path {
        "/status" => Response::Status,
        "/images" => images_listing(images, requests),
        "/nextImage" => next_image(images, requests),
        "/image" => load_image(query, requests),
        "/eject" => match requests.request(ClientRequest::EjectImage) {
            Ok(()) => Response::Ok,
            Err(e) => {
                warn!("http: eject not queued: {}", e);
                Response::Error
            }
        },
        _ => Response::NotFound,
    }
}

fn images_listing<R: RequestPort + ?Sized>(images: &mut ImageCache, requests: &R) -> Response {
    match images.state() {
        ImageCacheState::Idle => {
            match requests.request(ClientRequest::FetchImagesJson) {
                Ok(()) => images.begin_fetch(),
                Err(e) => warn!("http: image listing not requested: {}", e),
            }
            Response::Wait
        }
        ImageCacheState::Fetching => Response::Wait,
        _ => Response::Listing,
    }
}

fn next_image<R: RequestPort + ?Sized>(images: &mut ImageCache, requests: &R) -> Response {
    match images.state() {
        ImageCacheState::Idle | ImageCacheState::Full => {
            match requests.request(ClientRequest::FetchNextImage) {
                Ok(()) => images.begin_iteration(),
                Err(e) => warn!("http: image iteration not started: {}", e),
            }
            Response::Wait
        }
        ImageCacheState::Fetching => Response::Wait,
        ImageCacheState::Iterating => match images.take_ready() {
            Some(entry) => {
                // Ask for the next entry now so it is ready for the next call.
                if let Err(e) = requests.request(ClientRequest::FetchNextImage) {
                    warn!("http: next image not requested: {}", e);
                }
                Response::Image(entry)
            }
            None => Response::Wait,
        },
        ImageCacheState::IteratingFinished => {
            images.finish_iteration();
            Response::Done
        }
    }
}

fn load_image<R: RequestPort + ?Sized>(query: Option<&str>, requests: &R) -> Response {
    let Some(name) = query.and_then(|q| query_param(q, "imageName")) else {
        return Response::Error;
    };
    info!("http: setting image to {}", name);
    match requests.request_with(ClientRequest::LoadImage, &name) {
        Ok(()) => Response::Ok,
        Err(e) => {
            warn!("http: load image not queued: {}", e);
            Response::Error
        }
    }
}

/// Find `key` in a `k=v&k=v` query string and URL-decode its value.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| url_decode(v))
}

/// Decode `%XX` escapes and `+` as space. Malformed escapes pass through.
pub fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(h), Some(l)) => {
                        out.push(h << 4 | l);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
