//! Fakes shared by the controller tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{LineId, ProductId, Severity},
    protocol::{
        BreedData, CartUpdateResponse, ClassificationResponse, Confidence, Recommendation,
    },
};
use tokio::sync::{mpsc, oneshot};

use crate::{
    error::RequestError,
    transport::StorefrontBackend,
    types::ImageFile,
    view::{CartLineView, CartTotalsView, CartView, Notifier, UploadView, UploadViewModel},
};

struct Step<T> {
    release: Option<oneshot::Receiver<()>>,
    result: Result<T, RequestError>,
}

/// Backend whose answers are queued up front. A gated step does not resolve
/// until the test fires the returned sender.
pub(crate) struct ScriptedBackend {
    classify_steps: StdMutex<VecDeque<Step<ClassificationResponse>>>,
    cart_steps: StdMutex<VecDeque<Step<CartUpdateResponse>>>,
    classify_calls: AtomicUsize,
    cart_calls: StdMutex<Vec<(LineId, u32)>>,
    in_flight: StdMutex<HashMap<LineId, usize>>,
    max_in_flight: StdMutex<HashMap<LineId, usize>>,
    started_tx: mpsc::UnboundedSender<(LineId, u32)>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<(LineId, u32)>) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        (
            Self {
                classify_steps: StdMutex::new(VecDeque::new()),
                cart_steps: StdMutex::new(VecDeque::new()),
                classify_calls: AtomicUsize::new(0),
                cart_calls: StdMutex::new(Vec::new()),
                in_flight: StdMutex::new(HashMap::new()),
                max_in_flight: StdMutex::new(HashMap::new()),
                started_tx,
            },
            started_rx,
        )
    }

    pub(crate) fn push_classify(&self, result: Result<ClassificationResponse, RequestError>) {
        self.classify_steps.lock().expect("lock").push_back(Step {
            release: None,
            result,
        });
    }

    pub(crate) fn push_classify_gated(
        &self,
        result: Result<ClassificationResponse, RequestError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.classify_steps.lock().expect("lock").push_back(Step {
            release: Some(rx),
            result,
        });
        tx
    }

    pub(crate) fn push_cart(&self, result: Result<CartUpdateResponse, RequestError>) {
        self.cart_steps.lock().expect("lock").push_back(Step {
            release: None,
            result,
        });
    }

    pub(crate) fn push_cart_gated(
        &self,
        result: Result<CartUpdateResponse, RequestError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.cart_steps.lock().expect("lock").push_back(Step {
            release: Some(rx),
            result,
        });
        tx
    }

    pub(crate) fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cart_calls(&self) -> Vec<(LineId, u32)> {
        self.cart_calls.lock().expect("lock").clone()
    }

    pub(crate) fn max_in_flight(&self, line_id: LineId) -> usize {
        self.max_in_flight
            .lock()
            .expect("lock")
            .get(&line_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl StorefrontBackend for ScriptedBackend {
    async fn classify_image(
        &self,
        _file: &ImageFile,
    ) -> Result<ClassificationResponse, RequestError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .classify_steps
            .lock()
            .expect("lock")
            .pop_front()
            .expect("unscripted classify call");
        if let Some(release) = step.release {
            let _ = release.await;
        }
        step.result
    }

    async fn update_cart_line(
        &self,
        line_id: LineId,
        quantity: u32,
    ) -> Result<CartUpdateResponse, RequestError> {
        self.cart_calls
            .lock()
            .expect("lock")
            .push((line_id, quantity));
        {
            let mut in_flight = self.in_flight.lock().expect("lock");
            let count = in_flight.entry(line_id).or_insert(0);
            *count += 1;
            let current = *count;
            let mut max = self.max_in_flight.lock().expect("lock");
            let peak = max.entry(line_id).or_insert(0);
            *peak = (*peak).max(current);
        }
        let step = self
            .cart_steps
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Step {
                release: None,
                result: Ok(cart_ok(i64::from(quantity) * 100, i64::from(quantity) * 100)),
            });
        let _ = self.started_tx.send((line_id, quantity));
        if let Some(release) = step.release {
            let _ = release.await;
        }
        *self
            .in_flight
            .lock()
            .expect("lock")
            .entry(line_id)
            .or_insert(1) -= 1;
        step.result
    }
}

#[derive(Default)]
pub(crate) struct RecordingUploadView {
    renders: StdMutex<Vec<UploadViewModel>>,
}

impl RecordingUploadView {
    pub(crate) fn last(&self) -> UploadViewModel {
        self.renders
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("at least one render")
    }

    pub(crate) fn render_count(&self) -> usize {
        self.renders.lock().expect("lock").len()
    }
}

impl UploadView for RecordingUploadView {
    fn render(&self, model: &UploadViewModel) {
        self.renders.lock().expect("lock").push(model.clone());
    }
}

#[derive(Default)]
pub(crate) struct RecordingCartView {
    lines: StdMutex<Vec<CartLineView>>,
    totals: StdMutex<Vec<CartTotalsView>>,
    reloads: AtomicUsize,
}

impl RecordingCartView {
    pub(crate) fn last_line(&self, line_id: LineId) -> CartLineView {
        self.lines
            .lock()
            .expect("lock")
            .iter()
            .rev()
            .find(|line| line.line_id == line_id)
            .cloned()
            .expect("line rendered")
    }

    pub(crate) fn last_totals(&self) -> Option<CartTotalsView> {
        self.totals.lock().expect("lock").last().cloned()
    }

    pub(crate) fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl CartView for RecordingCartView {
    fn render_line(&self, line: &CartLineView) {
        self.lines.lock().expect("lock").push(line.clone());
    }

    fn render_totals(&self, totals: &CartTotalsView) {
        self.totals.lock().expect("lock").push(totals.clone());
    }

    fn reload_page(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notes: StdMutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub(crate) fn notes(&self) -> Vec<(String, Severity)> {
        self.notes.lock().expect("lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.notes
            .lock()
            .expect("lock")
            .push((message.to_string(), severity));
    }
}

pub(crate) fn png(size: usize) -> ImageFile {
    ImageFile::new("pet.png", "image/png", vec![0x89u8; size])
}

pub(crate) fn cart_ok(item_total: i64, cart_total: i64) -> CartUpdateResponse {
    CartUpdateResponse {
        success: true,
        item_total: Some(item_total),
        cart_total: Some(cart_total),
        message: None,
    }
}

pub(crate) fn classification_ok(recommendations: Vec<Recommendation>) -> ClassificationResponse {
    ClassificationResponse {
        success: true,
        breed_data: Some(BreedData {
            pet_type: Some("dog".into()),
            breed_name: "Labrador Retriever".into(),
            confidence: Confidence::Text("95%".into()),
            description: "Friendly and outgoing.".into(),
        }),
        recommendations,
        recommendation_title: Some("Labrador Retriever".into()),
        message: None,
    }
}

pub(crate) fn recommendation(id: i64, price: i64) -> Recommendation {
    Recommendation {
        id: ProductId(id),
        name: format!("Product {id}"),
        price,
        image: format!("/static/img/{id}.jpg"),
        url: format!("/product/{id}"),
    }
}
