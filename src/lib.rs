// Dermatology intake client: photo collage compositor plus the submission flow
// that delivers it to a webhook.

pub mod app;
pub mod collage;
pub mod logger;
