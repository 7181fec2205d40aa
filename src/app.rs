// Intake flow around the compositor: config, access-code gating, the per-intake
// session, form mapping, progress and webhook delivery. main.rs only parses
// arguments and hands over to the helpers below.

use std::path::{Path, PathBuf};

pub mod auth;
pub mod config;
pub mod form;
pub mod progress;
pub mod session;
pub mod submit;

mod runtime;
pub use runtime::rt;

use crate::collage::ImageSource;
use auth::DoctorsRegistry;
use session::IntakeSession;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Auth(#[from] auth::AuthError),

    #[error(transparent)]
    Slot(#[from] session::SlotError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Collage(#[from] crate::collage::CollageError),

    #[error("malformed patient form {path}: {source}")]
    Form {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Submit(#[from] submit::SubmitError),
}

/// Read photos from disk, keeping their order.
pub async fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageSource>, IntakeError> {
    let mut out = Vec::with_capacity(paths.len());
    for p in paths {
        let src = ImageSource::from_path(p)
            .await
            .map_err(|source| IntakeError::Read {
                path: p.clone(),
                source,
            })?;
        log::debug!("read image {} ({} bytes)", p.to_string_lossy(), src.len());
        out.push(src);
    }
    Ok(out)
}

/// Authenticate against the registry and open a session holding `images`.
pub async fn open_session(
    cfg: &config::AppConfig,
    access_code: &str,
    images: Vec<ImageSource>,
) -> Result<IntakeSession, IntakeError> {
    let registry = DoctorsRegistry::load(&cfg.doctors_path).await?;
    let doctor = registry.authenticate(access_code)?;
    let mut session = IntakeSession::new(doctor, cfg.max_images);
    for img in images {
        session.push_image(img)?;
    }
    Ok(session)
}

pub async fn load_form(path: &Path) -> Result<form::PatientForm, IntakeError> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IntakeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&data).map_err(|source| IntakeError::Form {
        path: path.to_path_buf(),
        source,
    })
}
