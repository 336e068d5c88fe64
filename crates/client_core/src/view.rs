//! Sink side of the controllers.
//!
//! Controllers hand fully-projected view models to these traits after every
//! transition. Implementations only translate them into visible updates; they
//! never call back into a controller while rendering.

use shared::domain::{LineId, ProductId, Severity};

use crate::cart::SyncState;

pub trait UploadView: Send + Sync {
    fn render(&self, model: &UploadViewModel);
}

pub trait CartView: Send + Sync {
    fn render_line(&self, line: &CartLineView);
    fn render_totals(&self, totals: &CartTotalsView);
    /// Hard reset after a failed sync. The page reloads from server state.
    fn reload_page(&self);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhaseKind {
    Empty,
    Selected,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadViewModel {
    pub phase: UploadPhaseKind,
    pub file_name: Option<String>,
    pub drop_area_visible: bool,
    pub preview_visible: bool,
    pub analyze_enabled: bool,
    pub spinner_visible: bool,
    pub message: Option<String>,
    pub results: Option<ResultsView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub breed_name: String,
    pub confidence: String,
    pub description: String,
    pub recommendation_title: String,
    /// `None` hides the recommendations block entirely.
    pub recommendations: Option<Vec<RecommendationCard>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationCard {
    pub id: ProductId,
    pub name: String,
    pub price_label: String,
    pub image: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub line_id: LineId,
    pub quantity: u32,
    pub sync_state: SyncState,
    pub item_total_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartTotalsView {
    pub subtotal_label: String,
    pub grand_total_label: String,
}
