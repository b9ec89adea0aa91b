#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use harvest_core::ImageElement;
use harvest_engine::{
    DecodeError, DimensionDecoder, EngineEvent, FailureKind, FetchError, FetchMetadata,
    FetchOutput, ImageDimensions, ImageFetcher, PageDriver, PageError, ProgressSink,
};

/// Canned response for one URL.
#[derive(Clone)]
pub enum Canned {
    Body {
        bytes: Vec<u8>,
        content_type: Option<&'static str>,
    },
    Fail(FailureKind),
}

impl Canned {
    pub fn body(len: usize, content_type: &'static str) -> Self {
        Canned::Body {
            bytes: vec![0xAB; len],
            content_type: Some(content_type),
        }
    }
}

/// In-memory fetcher that counts calls and tracks peak concurrency.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Canned>,
    fallback: Option<Canned>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, canned: Canned) -> Self {
        self.responses.insert(url.to_string(), canned);
        self
    }

    pub fn with_fallback(mut self, canned: Canned) -> Self {
        self.fallback = Some(canned);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let canned = self
            .responses
            .get(url)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or(Canned::Fail(FailureKind::HttpStatus(404)));
        match canned {
            Canned::Body {
                bytes,
                content_type,
            } => Ok(FetchOutput {
                metadata: FetchMetadata {
                    original_url: url.to_string(),
                    final_url: url.to_string(),
                    status: 200,
                    content_type: content_type.map(str::to_string),
                    byte_len: bytes.len() as u64,
                },
                bytes: Bytes::from(bytes),
            }),
            Canned::Fail(kind) => Err(FetchError::new(kind, format!("canned failure for {url}"))),
        }
    }
}

/// Reports the same dimensions (or error) for every body.
pub struct FixedDecoder(pub Result<ImageDimensions, DecodeError>);

impl DimensionDecoder for FixedDecoder {
    fn dimensions(&self, _bytes: &[u8]) -> Result<ImageDimensions, DecodeError> {
        self.0.clone()
    }
}

/// Keeps every event for later inspection.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Page whose DOM snapshots are scripted per round. Once the script runs
/// out, the last snapshot repeats.
#[derive(Default)]
pub struct ScriptedPage {
    snapshots: VecDeque<Vec<ImageElement>>,
    last: Vec<ImageElement>,
    pub fail_navigation: bool,
    pub navigated: Vec<String>,
    pub grow_calls: u32,
    pub closed: u32,
}

impl ScriptedPage {
    pub fn new(snapshots: Vec<Vec<ImageElement>>) -> Self {
        Self {
            snapshots: snapshots.into(),
            ..Self::default()
        }
    }

    pub fn failing_navigation() -> Self {
        Self {
            fail_navigation: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl PageDriver for ScriptedPage {
    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.navigated.push(url.to_string());
        if self.fail_navigation {
            return Err(PageError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        Ok(())
    }

    async fn image_elements(&mut self) -> Result<Vec<ImageElement>, PageError> {
        if let Some(next) = self.snapshots.pop_front() {
            self.last = next;
        }
        Ok(self.last.clone())
    }

    async fn grow(&mut self) -> Result<(), PageError> {
        self.grow_calls += 1;
        Ok(())
    }

    async fn settle(&mut self, _duration: Duration) {}

    async fn close(&mut self) -> Result<(), PageError> {
        self.closed += 1;
        Ok(())
    }
}

pub fn img(src: &str) -> ImageElement {
    ImageElement::new(Some(src), None)
}

pub fn img_srcset(src: &str, srcset: &str) -> ImageElement {
    ImageElement::new(Some(src), Some(srcset))
}
