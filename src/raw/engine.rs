//! Request/response engine
//!
//! One request per call, moving strictly through
//! `Building -> Signed -> Dispatched -> HeadersReceived` and then into one of
//! `StreamingBody`, `ErrorBody` or `NoBody` before `Done`. Each step awaits the
//! previous one: signing finishes before anything is traced or sent, and no
//! body decision is made until the status line and headers are in.
//!
//! HTTP error statuses are reported, not raised: the error body is printed
//! and the call still returns `Ok`.

use futures::StreamExt;
use std::io::Write;
use tracing::debug;

use super::error::Result;
use super::request::{Method, RequestSpec};
use super::trace;
use super::{Signer, Sinks, Transport};
use crate::s3::{ErrorBody, ResponseBody};

/// Where an invocation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Building,
    Signed,
    Dispatched,
    HeadersReceived,
    StreamingBody,
    ErrorBody,
    NoBody,
    Done,
}

/// Which trace output the user asked for
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceOptions {
    /// Request and response trace on the trace sink
    pub verbose: bool,
    /// Response header block on the primary sink
    pub include: bool,
}

/// How a request that completed was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// HEAD: headers only, body never touched
    HeadersOnly { status: u16 },
    /// Status >= 400: the pre-read error body was printed
    ErrorReported { status: u16 },
    /// Body streamed to the primary sink
    Streamed { status: u16, bytes: u64 },
}

impl Outcome {
    pub fn status(&self) -> u16 {
        match *self {
            Outcome::HeadersOnly { status }
            | Outcome::ErrorReported { status }
            | Outcome::Streamed { status, .. } => status,
        }
    }
}

struct Progress {
    phase: Phase,
}

impl Progress {
    fn enter(&mut self, next: Phase) {
        debug!(from = ?self.phase, to = ?next, "raw request phase");
        self.phase = next;
    }
}

/// Sign, send and report one request.
pub async fn execute<S, T>(
    signer: &S,
    transport: &T,
    mut request: RequestSpec,
    options: TraceOptions,
    sinks: &mut Sinks<'_>,
) -> Result<Outcome>
where
    S: Signer,
    T: Transport,
{
    let mut progress = Progress {
        phase: Phase::Building,
    };

    signer.sign(&mut request).await?;
    let request = request;
    progress.enter(Phase::Signed);

    if options.verbose {
        sinks
            .trace
            .write_all(trace::request_trace(&request).as_bytes())?;
        sinks.trace.flush()?;
    }

    let envelope = transport.dispatch(&request).await?;
    progress.enter(Phase::Dispatched);

    let head = envelope.head;
    let status = head.status;
    progress.enter(Phase::HeadersReceived);
    debug!(
        method = %request.method,
        path = %request.path,
        status,
        "response headers received"
    );

    let header_block = trace::response_trace(&head);
    if options.verbose {
        sinks.trace.write_all(header_block.as_bytes())?;
        sinks.trace.flush()?;
    }
    if options.include || request.method == Method::Head {
        sinks.primary.write_all(header_block.as_bytes())?;
        sinks.primary.flush()?;
    }

    if request.method == Method::Head {
        progress.enter(Phase::NoBody);
        progress.enter(Phase::Done);
        return Ok(Outcome::HeadersOnly { status });
    }

    let outcome = match envelope.body {
        ResponseBody::Error(body) => {
            progress.enter(Phase::ErrorBody);
            write_error_body(sinks.primary, body.as_ref())?;
            Outcome::ErrorReported { status }
        }
        ResponseBody::Stream(mut chunks) => {
            progress.enter(Phase::StreamingBody);
            let mut bytes = 0u64;
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                sinks.primary.write_all(&chunk)?;
                sinks.primary.flush()?;
                bytes += chunk.len() as u64;
            }
            Outcome::Streamed { status, bytes }
        }
        ResponseBody::Empty => {
            progress.enter(Phase::NoBody);
            Outcome::Streamed { status, bytes: 0 }
        }
    };

    progress.enter(Phase::Done);
    Ok(outcome)
}

fn write_error_body(out: &mut dyn Write, body: Option<&ErrorBody>) -> std::io::Result<()> {
    match body {
        Some(ErrorBody::Structured(value)) => out.write_all(value.to_string().as_bytes())?,
        Some(ErrorBody::Raw(bytes)) => out.write_all(bytes)?,
        None => {}
    }
    out.flush()
}
