// Patient form: input record and its mapping onto the webhook's field names.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::auth::Doctor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub patient_id: String,
    #[serde(default)]
    pub patient_email: String,
    #[serde(default)]
    pub patient_age: String,
    #[serde(default)]
    pub patient_gender: String,
    #[serde(default)]
    pub lesion_duration: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub symptom_types: Vec<String>,
    #[serde(default)]
    pub lesion_change: String,
    #[serde(default)]
    pub family_history: String,
    #[serde(default)]
    pub sun_exposure: String,
    #[serde(default)]
    pub previous_treatments: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

pub type Fields = Vec<(&'static str, String)>;

// Only a missing or empty answer gets the default; anything typed is sent as-is.
fn or_default(v: &Option<String>, default: &str) -> String {
    match v.as_deref() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

impl PatientForm {
    pub fn validate(&self) -> Result<(), FormError> {
        let required = [
            ("patientId", &self.patient_id),
            ("patientEmail", &self.patient_email),
            ("patientAge", &self.patient_age),
            ("patientGender", &self.patient_gender),
            ("lesionDuration", &self.lesion_duration),
            ("symptoms", &self.symptoms),
            ("lesionChange", &self.lesion_change),
            ("familyHistory", &self.family_history),
            ("sunExposure", &self.sun_exposure),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(FormError::MissingField(name));
            }
        }
        Ok(())
    }

    /// Ordered text fields of one submission.
    pub fn to_fields(&self, doctor: &Doctor, portal_source: &str, at: DateTime<Local>) -> Fields {
        let symptom_types = if self.symptom_types.is_empty() {
            "None".to_string()
        } else {
            self.symptom_types.join(", ")
        };

        vec![
            ("recipient_email", doctor.email().clone()),
            (
                "subject",
                format!("Dermatological Assessment - Patient: {}", self.patient_id),
            ),
            ("doctor_name", doctor.name().clone()),
            ("doctor_email", doctor.email().clone()),
            ("patient_id", self.patient_id.clone()),
            ("patient_email", self.patient_email.clone()),
            ("patient_age", self.patient_age.clone()),
            ("patient_gender", self.patient_gender.clone()),
            ("lesion_duration", self.lesion_duration.replace('-', " ")),
            ("symptoms_present", self.symptoms.clone()),
            ("symptom_types", symptom_types),
            ("lesion_appearance_changes", self.lesion_change.clone()),
            ("family_history", self.family_history.clone()),
            ("sun_exposure_level", self.sun_exposure.clone()),
            (
                "previous_treatments",
                or_default(&self.previous_treatments, "None reported"),
            ),
            (
                "additional_notes",
                or_default(&self.additional_notes, "No additional observations"),
            ),
            (
                "timestamp",
                at.with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            ("report_date", at.format("%m/%d/%Y").to_string()),
            ("report_time", at.format("%-I:%M:%S %p").to_string()),
            ("portal_source", portal_source.to_string()),
        ]
    }
}
