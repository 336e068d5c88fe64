use std::{collections::HashMap, sync::Arc};

use shared::{domain::LineId, domain::Severity, protocol::CartUpdateResponse};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::{CartError, RequestError, CART_CONNECTIVITY_ERROR, CART_UPDATE_FAILED},
    pricing::PriceFormatter,
    transport::StorefrontBackend,
    validation::{clamp_quantity, validate_quantity},
    view::{CartLineView, CartTotalsView, CartView, Notifier},
};

pub const CART_UPDATED_MESSAGE: &str = "Cart updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Pending,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Send this quantity now.
    Issue(u32),
    /// A request is in flight; the value becomes the next target.
    Queued,
    /// Already confirmed by the server.
    Unchanged,
}

/// Quantity state for one line item. Pure; the controller drives the I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    line_id: LineId,
    displayed: u32,
    confirmed: u32,
    sync_state: SyncState,
    queued: Option<u32>,
    item_total: Option<i64>,
}

impl CartLine {
    pub fn new(line_id: LineId, initial_quantity: u32) -> Self {
        let quantity = initial_quantity.max(1);
        Self {
            line_id,
            displayed: quantity,
            confirmed: quantity,
            sync_state: SyncState::Idle,
            queued: None,
            item_total: None,
        }
    }

    pub fn line_id(&self) -> LineId {
        self.line_id
    }

    pub fn displayed_quantity(&self) -> u32 {
        self.displayed
    }

    pub fn confirmed_quantity(&self) -> u32 {
        self.confirmed
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn queued_target(&self) -> Option<u32> {
        self.queued
    }

    pub fn item_total(&self) -> Option<i64> {
        self.item_total
    }

    pub fn request_change(&mut self, quantity: u32) -> SyncDecision {
        let quantity = quantity.max(1);
        self.displayed = quantity;

        if self.sync_state == SyncState::Pending {
            self.queued = Some(quantity);
            return SyncDecision::Queued;
        }
        self.issue_if_changed(quantity)
    }

    /// Records a server acknowledgement and returns the next quantity to send, if any.
    pub fn confirm(&mut self, quantity: u32, item_total: Option<i64>) -> Option<u32> {
        self.confirmed = quantity;
        self.item_total = item_total;
        self.sync_state = SyncState::Idle;

        match self.queued.take() {
            Some(next) => match self.issue_if_changed(next) {
                SyncDecision::Issue(next) => Some(next),
                SyncDecision::Queued | SyncDecision::Unchanged => None,
            },
            None => None,
        }
    }

    pub fn fail(&mut self) {
        self.sync_state = SyncState::Error;
        self.queued = None;
    }

    fn issue_if_changed(&mut self, quantity: u32) -> SyncDecision {
        if quantity == self.confirmed {
            self.sync_state = SyncState::Idle;
            return SyncDecision::Unchanged;
        }
        self.sync_state = SyncState::Pending;
        SyncDecision::Issue(quantity)
    }
}

/// Cart-wide amounts, always copied from the latest server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: i64,
    pub grand_total: i64,
}

impl CartTotals {
    pub fn from_response(response: &CartUpdateResponse) -> Self {
        let cart_total = response.cart_total.unwrap_or(0);
        Self {
            subtotal: cart_total,
            grand_total: cart_total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    Unchanged,
    Queued,
    Synced { confirmed: u32, requests: usize },
    Failed { message: String },
}

#[derive(Default)]
struct CartState {
    lines: HashMap<LineId, CartLine>,
    totals: Option<CartTotals>,
}

pub struct QuantitySyncController {
    backend: Arc<dyn StorefrontBackend>,
    view: Arc<dyn CartView>,
    notifier: Arc<dyn Notifier>,
    formatter: Arc<dyn PriceFormatter>,
    state: Mutex<CartState>,
}

impl QuantitySyncController {
    pub fn new(
        backend: Arc<dyn StorefrontBackend>,
        view: Arc<dyn CartView>,
        notifier: Arc<dyn Notifier>,
        formatter: Arc<dyn PriceFormatter>,
    ) -> Self {
        Self {
            backend,
            view,
            notifier,
            formatter,
            state: Mutex::new(CartState::default()),
        }
    }

    /// Adds a line from the server-rendered page. A line that is already known
    /// keeps its state, including any request in flight.
    pub async fn register_line(&self, line_id: LineId, initial_quantity: u32) {
        let mut state = self.state.lock().await;
        if state.lines.contains_key(&line_id) {
            debug!(line_id = %line_id, "cart: line already registered");
        }
        let line = state
            .lines
            .entry(line_id)
            .or_insert_with(|| CartLine::new(line_id, initial_quantity));
        self.render_line(line);
    }

    pub async fn line(&self, line_id: LineId) -> Option<CartLine> {
        self.state.lock().await.lines.get(&line_id).cloned()
    }

    pub async fn totals(&self) -> Option<CartTotals> {
        self.state.lock().await.totals
    }

    pub async fn increment(&self, line_id: LineId) -> Result<ChangeOutcome, CartError> {
        self.change_by(line_id, 1).await
    }

    pub async fn decrement(&self, line_id: LineId) -> Result<ChangeOutcome, CartError> {
        self.change_by(line_id, -1).await
    }

    /// Direct edit of the quantity field.
    pub async fn edit(&self, line_id: LineId, raw: &str) -> Result<ChangeOutcome, CartError> {
        let quantity = validate_quantity(raw);
        self.request_change(line_id, i64::from(quantity)).await
    }

    /// Applies a change optimistically and syncs it, one request per line at a time.
    ///
    /// The caller that starts a request keeps driving the line until no queued
    /// target remains; concurrent callers for the same line only leave a target.
    pub async fn request_change(
        &self,
        line_id: LineId,
        quantity: i64,
    ) -> Result<ChangeOutcome, CartError> {
        self.apply_change(line_id, |_| quantity).await
    }

    /// Steps from the displayed quantity read under the same lock that applies it.
    async fn change_by(&self, line_id: LineId, delta: i64) -> Result<ChangeOutcome, CartError> {
        self.apply_change(line_id, |line| {
            i64::from(line.displayed_quantity()).saturating_add(delta)
        })
        .await
    }

    async fn apply_change(
        &self,
        line_id: LineId,
        target_of: impl FnOnce(&CartLine) -> i64 + Send,
    ) -> Result<ChangeOutcome, CartError> {
        let (quantity, decision) = {
            let mut state = self.state.lock().await;
            let line = state
                .lines
                .get_mut(&line_id)
                .ok_or(CartError::UnknownLine(line_id))?;
            let quantity = clamp_quantity(target_of(line));
            let decision = line.request_change(quantity);
            self.render_line(line);
            (quantity, decision)
        };

        let mut target = match decision {
            SyncDecision::Issue(target) => target,
            SyncDecision::Queued => {
                debug!(line_id = %line_id, quantity, "cart: change queued behind in-flight request");
                return Ok(ChangeOutcome::Queued);
            }
            SyncDecision::Unchanged => {
                debug!(line_id = %line_id, quantity, "cart: change matches confirmed quantity");
                return Ok(ChangeOutcome::Unchanged);
            }
        };

        let mut requests = 0;
        loop {
            requests += 1;
            info!(line_id = %line_id, quantity = target, "cart: update request issued");
            let outcome = self.backend.update_cart_line(line_id, target).await;

            match accepted(outcome) {
                Ok(response) => {
                    let next = self.apply_success(line_id, target, &response).await?;
                    match next {
                        Some(next) => target = next,
                        None => {
                            return Ok(ChangeOutcome::Synced {
                                confirmed: target,
                                requests,
                            })
                        }
                    }
                }
                Err(err) => {
                    let message = self.apply_failure(line_id, &err).await?;
                    return Ok(ChangeOutcome::Failed { message });
                }
            }
        }
    }

    async fn apply_success(
        &self,
        line_id: LineId,
        quantity: u32,
        response: &CartUpdateResponse,
    ) -> Result<Option<u32>, CartError> {
        let mut state = self.state.lock().await;
        let totals = CartTotals::from_response(response);
        state.totals = Some(totals);
        let line = state
            .lines
            .get_mut(&line_id)
            .ok_or(CartError::UnknownLine(line_id))?;
        let next = line.confirm(quantity, Some(response.item_total.unwrap_or(0)));
        info!(
            line_id = %line_id,
            confirmed = quantity,
            cart_total = totals.grand_total,
            "cart: update confirmed"
        );
        self.render_line(line);
        self.view.render_totals(&CartTotalsView {
            subtotal_label: self.formatter.format(totals.subtotal),
            grand_total_label: self.formatter.format(totals.grand_total),
        });
        self.notifier.notify(CART_UPDATED_MESSAGE, Severity::Success);
        Ok(next)
    }

    async fn apply_failure(&self, line_id: LineId, err: &RequestError) -> Result<String, CartError> {
        let message = match err {
            RequestError::Transport { .. } => CART_CONNECTIVITY_ERROR.to_string(),
            RequestError::Application { .. } => err
                .server_message()
                .unwrap_or(CART_UPDATE_FAILED)
                .to_string(),
        };
        {
            let mut state = self.state.lock().await;
            let line = state
                .lines
                .get_mut(&line_id)
                .ok_or(CartError::UnknownLine(line_id))?;
            line.fail();
            self.render_line(line);
        }
        warn!(line_id = %line_id, "cart: update failed, reloading: {err}");
        self.notifier.notify(&message, Severity::Danger);
        self.view.reload_page();
        Ok(message)
    }

    fn render_line(&self, line: &CartLine) {
        self.view.render_line(&CartLineView {
            line_id: line.line_id(),
            quantity: line.displayed_quantity(),
            sync_state: line.sync_state(),
            item_total_label: line.item_total().map(|total| self.formatter.format(total)),
        });
    }
}

/// A 2xx body carrying `success: false` is still an application failure.
fn accepted(
    outcome: Result<CartUpdateResponse, RequestError>,
) -> Result<CartUpdateResponse, RequestError> {
    let response = outcome?;
    if response.success {
        Ok(response)
    } else {
        Err(RequestError::Application {
            status: 200,
            message: response.message.filter(|message| !message.trim().is_empty()),
        })
    }
}

#[cfg(test)]
#[path = "tests/cart_tests.rs"]
mod tests;
