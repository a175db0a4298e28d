//! [`RequestPort`] over the framing link.

use crate::app::ports::RequestPort;
use crate::error::LinkError;
use crate::link::Link;
use crate::protocol::ClientRequest;

impl RequestPort for Link {
    fn request(&self, request: ClientRequest) -> Result<(), LinkError> {
        self.enqueue_request(request.id())
    }

    fn request_with(&self, request: ClientRequest, text: &str) -> Result<(), LinkError> {
        self.enqueue_request_with(request.id(), text)
    }
}
