//! Test doubles
//!
//! [`QueueTransport`] replays queued bodies in order, one queued entry per request.

use crate::error::NetworkError;
use crate::request::Request;
use crate::transport::{decode_response, ResponseSequence, Transport};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Event {
    Body(String),
    Failure(NetworkError),
}

#[derive(Debug, Clone)]
enum Entry {
    Events(Vec<Event>),
    /// Never completes; for exercising cancellation
    Pending,
}

/// Transport answering each request with the next queued entry
#[derive(Default)]
pub struct QueueTransport {
    queue: Mutex<VecDeque<Entry>>,
    requests: Mutex<Vec<String>>,
}

impl QueueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response body for the next request
    pub fn offer(&self, body: impl Into<String>) {
        self.queue
            .lock()
            .push_back(Entry::Events(vec![Event::Body(body.into())]));
    }

    /// Queue `{"data": data}` for the next request
    pub fn offer_data(&self, data: Value) {
        self.offer(serde_json::json!({ "data": data }).to_string());
    }

    /// Queue a transport failure for the next request
    pub fn offer_failure(&self, error: NetworkError) {
        self.queue
            .lock()
            .push_back(Entry::Events(vec![Event::Failure(error)]));
    }

    /// Queue several bodies answered together, as a subscription would
    pub fn offer_events<I, S>(&self, bodies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events = bodies.into_iter().map(|b| Event::Body(b.into())).collect();
        self.queue.lock().push_back(Entry::Events(events));
    }

    /// Queue several bodies followed by a terminal failure
    pub fn offer_events_then_failure<I, S>(&self, bodies: I, error: NetworkError)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut events: Vec<Event> = bodies.into_iter().map(|b| Event::Body(b.into())).collect();
        events.push(Event::Failure(error));
        self.queue.lock().push_back(Entry::Events(events));
    }

    /// Queue a response that never arrives
    pub fn offer_pending(&self) {
        self.queue.lock().push_back(Entry::Pending);
    }

    /// Number of requests that reached the transport
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Operation names of the requests that reached the transport, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn pending_entries(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Transport for QueueTransport {
    fn proceed(&self, request: Request) -> ResponseSequence {
        self.requests.lock().push(request.operation.name.clone());
        let entry = self.queue.lock().pop_front();
        match entry {
            None => {
                let error = NetworkError::Transport(format!(
                    "no response queued for {}",
                    request.operation.name
                ));
                stream::once(async move { Err(error) }).boxed()
            }
            Some(Entry::Pending) => stream::pending().boxed(),
            Some(Entry::Events(events)) => stream::iter(events)
                .map(move |event| match event {
                    Event::Body(body) => decode_response(&request, &body),
                    Event::Failure(error) => Err(error),
                })
                .boxed(),
        }
    }
}
