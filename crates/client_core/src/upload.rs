use std::sync::Arc;

use shared::protocol::{ClassificationResponse, Recommendation};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::{
        RequestError, ValidationError, BREED_NOT_DETECTED, GENERIC_CONNECTIVITY_ERROR,
        GENERIC_SERVER_ERROR,
    },
    pricing::PriceFormatter,
    transport::StorefrontBackend,
    types::{ImageFile, SelectionSource},
    validation::{validate_file_with_limit, MAX_UPLOAD_BYTES},
    view::{
        RecommendationCard, ResultsView, UploadPhaseKind, UploadView, UploadViewModel,
    },
};

const DEFAULT_RECOMMENDATION_TITLE: &str = "your pet";

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub pet_type: Option<String>,
    pub breed_name: String,
    pub confidence: String,
    pub description: String,
    pub recommendation_title: Option<String>,
    pub recommendations: Vec<Recommendation>,
}

/// The selected file travels with the phase, so "no file" and `Empty` coincide.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadPhase {
    Empty,
    Selected {
        file: ImageFile,
    },
    Submitting {
        file: ImageFile,
        attempt: u64,
    },
    Succeeded {
        file: ImageFile,
        result: ClassificationResult,
    },
    Failed {
        file: ImageFile,
        message: String,
    },
}

impl UploadPhase {
    pub fn kind(&self) -> UploadPhaseKind {
        match self {
            UploadPhase::Empty => UploadPhaseKind::Empty,
            UploadPhase::Selected { .. } => UploadPhaseKind::Selected,
            UploadPhase::Submitting { .. } => UploadPhaseKind::Submitting,
            UploadPhase::Succeeded { .. } => UploadPhaseKind::Succeeded,
            UploadPhase::Failed { .. } => UploadPhaseKind::Failed,
        }
    }

    pub fn file(&self) -> Option<&ImageFile> {
        match self {
            UploadPhase::Empty => None,
            UploadPhase::Selected { file }
            | UploadPhase::Submitting { file, .. }
            | UploadPhase::Succeeded { file, .. }
            | UploadPhase::Failed { file, .. } => Some(file),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub attempt: u64,
    pub file: ImageFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The attempt was abandoned by a clear or a new selection.
    Stale,
}

/// Pure state machine for one image-analysis workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSession {
    phase: UploadPhase,
    last_attempt: u64,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            phase: UploadPhase::Empty,
            last_attempt: 0,
        }
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    pub fn selected_file(&self) -> Option<&ImageFile> {
        self.phase.file()
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        match &self.phase {
            UploadPhase::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            UploadPhase::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// A rejected file always leaves the session `Empty`.
    pub fn select(&mut self, file: ImageFile, limit: u64) -> Result<(), ValidationError> {
        match validate_file_with_limit(&file, limit) {
            Ok(()) => {
                self.phase = UploadPhase::Selected { file };
                Ok(())
            }
            Err(err) => {
                self.phase = UploadPhase::Empty;
                Err(err)
            }
        }
    }

    pub fn clear(&mut self) {
        self.phase = UploadPhase::Empty;
    }

    /// Moves `Selected` to `Submitting`. Any other phase is left untouched.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        let UploadPhase::Selected { file } = &self.phase else {
            return None;
        };
        let file = file.clone();
        self.last_attempt += 1;
        let attempt = self.last_attempt;
        self.phase = UploadPhase::Submitting {
            file: file.clone(),
            attempt,
        };
        Some(Submission { attempt, file })
    }

    pub fn resolve(
        &mut self,
        attempt: u64,
        outcome: Result<ClassificationResponse, RequestError>,
    ) -> Resolution {
        let file = match &self.phase {
            UploadPhase::Submitting {
                file,
                attempt: current,
            } if *current == attempt => file.clone(),
            _ => return Resolution::Stale,
        };

        self.phase = match outcome {
            Ok(body) => match succeeded_result(body) {
                Ok(result) => UploadPhase::Succeeded { file, result },
                Err(message) => UploadPhase::Failed { file, message },
            },
            Err(err) => UploadPhase::Failed {
                file,
                message: failure_message(&err),
            },
        };
        Resolution::Applied
    }
}

fn succeeded_result(body: ClassificationResponse) -> Result<ClassificationResult, String> {
    if !body.success {
        return Err(visible(body.message).unwrap_or_else(|| BREED_NOT_DETECTED.to_string()));
    }
    let Some(breed) = body.breed_data else {
        return Err(GENERIC_SERVER_ERROR.to_string());
    };
    Ok(ClassificationResult {
        pet_type: breed.pet_type,
        breed_name: breed.breed_name,
        confidence: breed.confidence.to_string(),
        description: breed.description,
        recommendation_title: visible(body.recommendation_title),
        recommendations: body.recommendations,
    })
}

fn failure_message(err: &RequestError) -> String {
    match err {
        RequestError::Transport { .. } => GENERIC_CONNECTIVITY_ERROR.to_string(),
        RequestError::Application { .. } => err
            .server_message()
            .unwrap_or(GENERIC_SERVER_ERROR)
            .to_string(),
    }
}

fn visible(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}

impl UploadViewModel {
    pub fn project(
        session: &UploadSession,
        notice: Option<&str>,
        formatter: &dyn PriceFormatter,
    ) -> Self {
        let phase = session.phase();
        let kind = phase.kind();
        let has_file = phase.file().is_some();
        let results = session.result().map(|result| ResultsView {
            breed_name: result.breed_name.clone(),
            confidence: result.confidence.clone(),
            description: result.description.clone(),
            recommendation_title: result
                .recommendation_title
                .clone()
                .unwrap_or_else(|| DEFAULT_RECOMMENDATION_TITLE.to_string()),
            recommendations: (!result.recommendations.is_empty()).then(|| {
                result
                    .recommendations
                    .iter()
                    .map(|item| RecommendationCard {
                        id: item.id,
                        name: item.name.clone(),
                        price_label: formatter.format(item.price),
                        image: item.image.clone(),
                        url: item.url.clone(),
                    })
                    .collect()
            }),
        });

        Self {
            phase: kind,
            file_name: phase.file().map(|file| file.name().to_string()),
            drop_area_visible: !has_file,
            preview_visible: has_file,
            analyze_enabled: kind == UploadPhaseKind::Selected,
            spinner_visible: kind == UploadPhaseKind::Submitting,
            message: session
                .error_message()
                .map(str::to_string)
                .or_else(|| notice.map(str::to_string)),
            results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was selected; no request went out.
    Skipped,
    Succeeded,
    Failed,
    /// The response arrived after the user moved on and was dropped.
    Superseded,
}

struct UploadState {
    session: UploadSession,
    /// Validation text shown until the next transition.
    notice: Option<String>,
}

pub struct UploadController {
    backend: Arc<dyn StorefrontBackend>,
    view: Arc<dyn UploadView>,
    formatter: Arc<dyn PriceFormatter>,
    max_upload_bytes: u64,
    state: Mutex<UploadState>,
}

impl UploadController {
    pub fn new(
        backend: Arc<dyn StorefrontBackend>,
        view: Arc<dyn UploadView>,
        formatter: Arc<dyn PriceFormatter>,
    ) -> Self {
        Self {
            backend,
            view,
            formatter,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            state: Mutex::new(UploadState {
                session: UploadSession::new(),
                notice: None,
            }),
        }
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Renders the initial empty view.
    pub async fn mount(&self) {
        let state = self.state.lock().await;
        self.render(&state);
    }

    pub async fn phase(&self) -> UploadPhase {
        self.state.lock().await.session.phase().clone()
    }

    /// Single entry point for file acquisition, whatever the input modality.
    pub async fn select(
        &self,
        file: ImageFile,
        source: SelectionSource,
    ) -> Result<(), ValidationError> {
        let mut state = self.state.lock().await;
        let name = file.name().to_string();
        let size = file.size();
        let outcome = state.session.select(file, self.max_upload_bytes);
        match &outcome {
            Ok(()) => {
                info!(file = %name, size, source = source.as_str(), "upload: file selected");
                state.notice = None;
            }
            Err(err) => {
                warn!(file = %name, size, source = source.as_str(), "upload: file rejected: {err}");
                state.notice = Some(err.user_message());
            }
        }
        self.render(&state);
        outcome
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.session.clear();
        state.notice = None;
        info!("upload: selection cleared");
        self.render(&state);
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let submission = {
            let mut state = self.state.lock().await;
            let Some(submission) = state.session.begin_submit() else {
                info!("upload: submit ignored without a selected file");
                return SubmitOutcome::Skipped;
            };
            state.notice = None;
            self.render(&state);
            submission
        };

        info!(
            attempt = submission.attempt,
            file = %submission.file.name(),
            "upload: classification requested"
        );
        let outcome = self.backend.classify_image(&submission.file).await;
        if let Err(err) = &outcome {
            warn!(attempt = submission.attempt, "upload: classification failed: {err}");
        }

        let mut state = self.state.lock().await;
        match state.session.resolve(submission.attempt, outcome) {
            Resolution::Stale => {
                info!(attempt = submission.attempt, "upload: dropping stale response");
                SubmitOutcome::Superseded
            }
            Resolution::Applied => {
                self.render(&state);
                match state.session.phase() {
                    UploadPhase::Succeeded { .. } => SubmitOutcome::Succeeded,
                    _ => SubmitOutcome::Failed,
                }
            }
        }
    }

    fn render(&self, state: &UploadState) {
        let model = UploadViewModel::project(
            &state.session,
            state.notice.as_deref(),
            self.formatter.as_ref(),
        );
        self.view.render(&model);
    }
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
