// Webhook delivery: builds the multipart submission for one intake and sends it
// with a bounded number of retries. Each attempt redoes collage + upload as a unit.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use thiserror::Error;

use super::config::AppConfig;
use super::form::{FormError, PatientForm};
use super::progress::{ProgressSink, ProgressStep, RetryInfo};
use super::session::IntakeSession;
use crate::collage::{self, CollageError};

pub const IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no images to send")]
    NoImages,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Collage(#[from] CollageError),

    #[error("invalid webhook url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },

    #[error("could not send after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<SubmitError>,
    },
}

/// Everything posted for one intake.
#[derive(Debug, Clone)]
pub struct Submission {
    pub fields: Vec<(&'static str, String)>,
    pub image: Vec<u8>,
    pub filename: String,
}

impl Submission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Deliver one submission; returns the response body.
    async fn send(&self, submission: &Submission) -> Result<String, SubmitError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: url::Url,
}

impl HttpTransport {
    pub fn new(url: url::Url) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("derm-intake/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SubmitError> {
        Self::new(config.webhook()?)
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn send(&self, submission: &Submission) -> Result<String, SubmitError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &submission.fields {
            form = form.text(*name, value.clone());
        }
        let part = reqwest::multipart::Part::bytes(submission.image.clone())
            .file_name(submission.filename.clone())
            .mime_str(IMAGE_MIME)?;
        form = form.part("image_file", part);

        let resp = self
            .client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        log::info!("webhook: response status {}", status);
        if !status.is_success() {
            return Err(SubmitError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// `patient_<id>_<collage|image>_<unix millis>.jpg`, non-alphanumerics in the id become `_`.
pub fn attachment_filename(patient_id: &str, image_count: usize, at: DateTime<Local>) -> String {
    let id: String = patient_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let kind = if image_count > 1 { "collage" } else { "image" };
    format!("patient_{}_{}_{}.jpg", id, kind, at.timestamp_millis())
}

fn clamp_percent(p: u32) -> u8 {
    p.min(100) as u8
}

// Progress shown while waiting to start `attempt`.
fn retry_percent(attempt: u32) -> u8 {
    clamp_percent(attempt.saturating_mul(10).saturating_add(20))
}

// Progress shown after `attempt` failed with attempts left.
fn failure_percent(attempt: u32) -> u8 {
    clamp_percent(attempt.saturating_mul(15).saturating_add(30))
}

async fn attempt_once(
    session: &IntakeSession,
    form: &PatientForm,
    config: &AppConfig,
    transport: &dyn WebhookTransport,
    progress: &dyn ProgressSink,
) -> Result<String, SubmitError> {
    progress.step(ProgressStep::Collecting);
    let at = Local::now();
    let mut fields = form.to_fields(session.doctor(), &config.portal_source, at);

    progress.step(ProgressStep::ProcessingImages);
    let count = session.present_count();
    if count == 0 {
        return Err(SubmitError::NoImages);
    }

    log::info!("Creating collage from {} image(s)...", count);
    progress.update(
        ProgressStep::CreatingCollage.percent(),
        &format!(
            "Creating image collage ({} image{})...",
            count,
            if count > 1 { "s" } else { "" }
        ),
        None,
    );
    let image = collage::compose(session.images()).await?;

    progress.step(ProgressStep::PreparingUpload);
    let filename = attachment_filename(&form.patient_id, count, at);
    let is_collage = if count > 1 { "Yes" } else { "No" };
    fields.push(("image_filename", filename.clone()));
    fields.push(("image_mime_type", IMAGE_MIME.to_string()));
    fields.push(("image_count", count.to_string()));
    fields.push(("is_collage", is_collage.to_string()));
    fields.push(("images_attached", "Yes".to_string()));

    let submission = Submission {
        fields,
        image,
        filename,
    };

    log::info!(
        "Sending {}...",
        if count > 1 { "collage" } else { "single image" }
    );
    progress.step(ProgressStep::Uploading);
    let body = transport.send(&submission).await?;
    progress.step(ProgressStep::ProcessingResponse);
    Ok(body)
}

/// Validate, compose and deliver one intake, retrying the whole unit up to
/// `config.max_retries` times. On success the session's images are cleared.
pub async fn submit_with_retry(
    session: &mut IntakeSession,
    form: &PatientForm,
    config: &AppConfig,
    transport: &dyn WebhookTransport,
    progress: &dyn ProgressSink,
) -> Result<String, SubmitError> {
    if !session.has_image() {
        return Err(SubmitError::NoImages);
    }
    form.validate()?;
    progress.step(ProgressStep::Validating);

    let total = config.max_retries.saturating_add(1);
    let mut last_err = None;

    for attempt in 0..total {
        let retry = (attempt > 0).then_some(RetryInfo { attempt, total });
        if attempt > 0 {
            progress.update(retry_percent(attempt), "Retrying connection...", retry);
            tokio::time::sleep(config.retry_delay()).await;
        }

        match attempt_once(session, form, config, transport, progress).await {
            Ok(body) => {
                log::info!("Submission accepted: {}", body);
                progress.step(ProgressStep::Complete);
                session.reset();
                return Ok(body);
            }
            Err(e) => {
                log::error!("Attempt {} failed: {}", attempt + 1, e);
                if attempt + 1 < total {
                    log::info!(
                        "Retrying in {} ms... ({}/{})",
                        config.retry_delay_ms,
                        attempt + 1,
                        total
                    );
                    progress.update(
                        failure_percent(attempt),
                        "Connection issue detected, preparing retry...",
                        retry,
                    );
                } else {
                    log::error!("All retry attempts failed");
                }
                last_err = Some(e);
            }
        }
    }

    Err(SubmitError::Exhausted {
        attempts: total,
        last: Box::new(last_err.unwrap_or(SubmitError::NoImages)),
    })
}
