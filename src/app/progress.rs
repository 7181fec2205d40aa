// Submission progress reporting.

#[derive(strum::EnumCount, strum::EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Validating,
    Collecting,
    ProcessingImages,
    CreatingCollage,
    PreparingUpload,
    Uploading,
    ProcessingResponse,
    Complete,
}

impl ProgressStep {
    pub fn percent(&self) -> u8 {
        use ProgressStep::*;
        match self {
            Validating => 10,
            Collecting => 20,
            ProcessingImages => 40,
            CreatingCollage => 50,
            PreparingUpload => 70,
            Uploading => 80,
            ProcessingResponse => 90,
            Complete => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        use ProgressStep::*;
        match self {
            Validating => "Validating form data...",
            Collecting => "Collecting patient information...",
            ProcessingImages => "Processing images...",
            CreatingCollage => "Creating image collage...",
            PreparingUpload => "Preparing upload...",
            Uploading => "Uploading to server...",
            ProcessingResponse => "Processing response...",
            Complete => "Successfully sent!",
        }
    }
}

/// Which attempt is running when a retry is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryInfo {
    pub attempt: u32,
    pub total: u32,
}

impl std::fmt::Display for RetryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Attempt {} of {} - Retrying...", self.attempt + 1, self.total)
    }
}

pub trait ProgressSink: Send + Sync {
    fn update(&self, percent: u8, status: &str, retry: Option<RetryInfo>);

    fn step(&self, step: ProgressStep) {
        self.update(step.percent(), step.message(), None);
    }
}

/// Reports progress through the logger.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&self, percent: u8, status: &str, retry: Option<RetryInfo>) {
        match retry {
            Some(r) => log::warn!("[{:>3}%] {} ({})", percent, status, r),
            None => log::info!("[{:>3}%] {}", percent, status),
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every update for assertions.
    #[derive(Default)]
    pub struct RecordingProgress {
        pub updates: Mutex<Vec<(u8, String, Option<RetryInfo>)>>,
    }

    impl RecordingProgress {
        pub fn percents(&self) -> Vec<u8> {
            self.updates.lock().unwrap().iter().map(|u| u.0).collect()
        }
    }

    impl ProgressSink for RecordingProgress {
        fn update(&self, percent: u8, status: &str, retry: Option<RetryInfo>) {
            self.updates
                .lock()
                .unwrap()
                .push((percent, status.to_string(), retry));
        }
    }
}
