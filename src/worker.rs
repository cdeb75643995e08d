// Background worker for the two whole-image jobs: decoding an upload and
// compositing the export. The interaction thread only sends requests and
// polls replies, so pointer handling never waits on them.
//
// Every request gets a ticket. The newest ticket per kind is the only one
// that counts: the worker skips requests already superseded when it picks
// them up, and `poll`/`wait` drop replies that went stale while in flight.
// A new upload supersedes pending decodes and exports; a new export only
// supersedes older exports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::compositor;
use crate::error::{Error, Result};
use crate::mask::MaskSnapshot;
use crate::source::SourceImage;

/// Source plus a copy-on-write mask snapshot; owns everything the export needs.
#[derive(Clone, Debug)]
pub struct ExportJob {
    pub source: Arc<SourceImage>,
    pub mask: MaskSnapshot,
}

#[derive(Debug)]
pub enum Reply {
    Decoded(Result<SourceImage>),
    Exported(Result<RgbaImage>),
}

enum Request {
    Decode { ticket: u64, bytes: Vec<u8>, max_pixels: u64 },
    Export { ticket: u64, job: ExportJob },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Decode,
    Export,
}

#[derive(Default)]
struct Tickets {
    decode: AtomicU64,
    export: AtomicU64,
}

impl Tickets {
    fn counter(&self, kind: Kind) -> &AtomicU64 {
        match kind {
            Kind::Decode => &self.decode,
            Kind::Export => &self.export,
        }
    }

    fn next(&self, kind: Kind) -> u64 {
        self.counter(kind).fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, kind: Kind, ticket: u64) -> bool {
        self.counter(kind).load(Ordering::SeqCst) == ticket
    }
}

pub struct Worker {
    requests: Option<Sender<Request>>,
    replies: Receiver<(Kind, u64, Reply)>,
    tickets: Arc<Tickets>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn() -> Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (rep_tx, rep_rx) = mpsc::channel();
        let tickets = Arc::new(Tickets::default());
        let shared = Arc::clone(&tickets);

        let handle = thread::Builder::new()
            .name("photo-mask-worker".into())
            .spawn(move || run(req_rx, rep_tx, shared))?;

        Ok(Self { requests: Some(req_tx), replies: rep_rx, tickets, handle: Some(handle) })
    }

    /// Queue an upload for decoding. Invalidates pending decodes and exports.
    pub fn decode(&self, bytes: Vec<u8>, max_pixels: u64) -> Result<u64> {
        self.tickets.next(Kind::Export);
        let ticket = self.tickets.next(Kind::Decode);
        if !self.send(Request::Decode { ticket, bytes, max_pixels }) {
            return Err(Error::ImageDecode("worker stopped".into()));
        }
        Ok(ticket)
    }

    /// Queue an export. Invalidates older exports.
    pub fn export(&self, job: ExportJob) -> Result<u64> {
        let ticket = self.tickets.next(Kind::Export);
        if !self.send(Request::Export { ticket, job }) {
            return Err(Error::Export("worker stopped".into()));
        }
        Ok(ticket)
    }

    /// Drop whatever is in flight; e.g. an image arrived by another route.
    pub fn cancel_all(&self) {
        self.tickets.next(Kind::Decode);
        self.tickets.next(Kind::Export);
    }

    /// Next current reply, if one is ready. Never blocks.
    pub fn poll(&self) -> Option<Reply> {
        while let Ok((kind, ticket, reply)) = self.replies.try_recv() {
            if self.tickets.is_current(kind, ticket) {
                return Some(reply);
            }
            log::debug!("dropping stale {kind:?} reply #{ticket}");
        }
        None
    }

    /// Block up to `timeout` for the next current reply.
    pub fn wait(&self, timeout: Duration) -> Option<Reply> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(left) {
                Ok((kind, ticket, reply)) => {
                    if self.tickets.is_current(kind, ticket) {
                        return Some(reply);
                    }
                    log::debug!("dropping stale {kind:?} reply #{ticket}");
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn send(&self, request: Request) -> bool {
        self.requests.as_ref().is_some_and(|tx| tx.send(request).is_ok())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
    }
}

fn run(requests: Receiver<Request>, replies: Sender<(Kind, u64, Reply)>, tickets: Arc<Tickets>) {
    while let Ok(request) = requests.recv() {
        let (kind, ticket, reply) = match request {
            Request::Decode { ticket, bytes, max_pixels } => {
                if !tickets.is_current(Kind::Decode, ticket) {
                    log::debug!("skipping superseded decode #{ticket}");
                    continue;
                }
                (Kind::Decode, ticket, Reply::Decoded(SourceImage::decode(&bytes, max_pixels)))
            }
            Request::Export { ticket, job } => {
                if !tickets.is_current(Kind::Export, ticket) {
                    log::debug!("skipping superseded export #{ticket}");
                    continue;
                }
                let started = Instant::now();
                let result = compositor::export_result(&job.source, &job.mask);
                log::debug!("export #{ticket} took {:?}", started.elapsed());
                (Kind::Export, ticket, Reply::Exported(result))
            }
        };
        if replies.send((kind, ticket, reply)).is_err() {
            break;
        }
    }
}
