// Access-code gating against the doctors registry (doctors.json).

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("please enter an access code")]
    EmptyCode,

    #[error("incorrect access code")]
    InvalidCode,

    #[error("doctors registry has no doctors")]
    NoDoctors,

    #[error("cannot read doctors registry {path}: {source}")]
    Registry {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed doctors registry: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Getters, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    name: String,
    email: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    active: bool,
}

impl Doctor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            access_token: String::new(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorsRegistry {
    #[serde(default)]
    pub doctors: Vec<Doctor>,
    #[serde(default)]
    pub admin_tokens: Vec<String>,
}

impl DoctorsRegistry {
    pub fn from_json(data: &str) -> Result<Self, AuthError> {
        Ok(serde_json::from_str(data)?)
    }

    pub async fn load(path: &Path) -> Result<Self, AuthError> {
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AuthError::Registry {
                path: path.to_string_lossy().to_string(),
                source,
            })?;
        let reg = Self::from_json(&data)?;
        log::info!(
            "Doctors registry loaded from {} ({} doctors)",
            path.to_string_lossy(),
            reg.doctors.len()
        );
        Ok(reg)
    }

    /// Resolve an access code to the doctor the intake is sent to.
    ///
    /// Admin tokens act as the first active doctor (or the first doctor at all).
    /// Doctor tokens only match active doctors.
    pub fn authenticate(&self, code: &str) -> Result<Doctor, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::EmptyCode);
        }

        if self.admin_tokens.iter().any(|t| t == code) {
            let doctor = self
                .doctors
                .iter()
                .find(|d| d.active)
                .or_else(|| self.doctors.first())
                .cloned()
                .ok_or(AuthError::NoDoctors)?;
            log::info!("auth: admin access as {}", doctor.name);
            return Ok(doctor);
        }

        match self
            .doctors
            .iter()
            .find(|d| d.active && d.access_token == code)
        {
            Some(d) => {
                log::info!("auth: access granted for {}", d.name);
                Ok(d.clone())
            }
            None => {
                log::warn!("auth: rejected access code");
                Err(AuthError::InvalidCode)
            }
        }
    }
}
