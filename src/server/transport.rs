use super::request::Request;
use super::response::Response;
use std::collections::VecDeque;

/// Moves requests in and responses out. Wire encoding lives behind it.
pub trait Transport {
    /// Next request, or `None` once the transport is exhausted.
    fn receive(&mut self) -> Option<Request>;

    /// Emit the response for the request last received.
    fn send(&mut self, response: Response);
}

/// In-memory [`Transport`]: replays queued requests and records responses.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pending: VecDeque<Request>,
    sent: Vec<Response>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new(requests: impl IntoIterator<Item = Request>) -> Self {
        Self {
            pending: requests.into_iter().collect(),
            sent: Vec::new(),
        }
    }

    pub fn push(&mut self, request: Request) {
        self.pending.push_back(request);
    }

    /// Responses sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> &[Response] {
        &self.sent
    }

    #[must_use]
    pub fn into_sent(self) -> Vec<Response> {
        self.sent
    }
}

impl Transport for MemoryTransport {
    fn receive(&mut self) -> Option<Request> {
        self.pending.pop_front()
    }

    fn send(&mut self, response: Response) {
        self.sent.push(response);
    }
}
