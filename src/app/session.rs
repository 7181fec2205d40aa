// Per-intake context: the authenticated doctor and the ordered photo slots.

use super::auth::Doctor;
use crate::collage::ImageSource;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("at most {0} images per intake")]
    Full(usize),
    #[error("no image slot {0}")]
    NoSuchSlot(usize),
    #[error("the first image slot cannot be removed")]
    Required,
}

#[derive(Debug, Clone)]
pub struct IntakeSession {
    doctor: Doctor,
    slots: Vec<Option<ImageSource>>,
    max_images: usize,
}

impl IntakeSession {
    pub fn new(doctor: Doctor, max_images: usize) -> Self {
        Self {
            doctor,
            slots: vec![None],
            max_images: max_images.max(1),
        }
    }

    pub fn doctor(&self) -> &Doctor {
        &self.doctor
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn can_add_slot(&self) -> bool {
        self.slots.len() < self.max_images
    }

    /// Opens a new empty slot and returns its index.
    pub fn add_slot(&mut self) -> Result<usize, SlotError> {
        if !self.can_add_slot() {
            return Err(SlotError::Full(self.max_images));
        }
        self.slots.push(None);
        Ok(self.slots.len() - 1)
    }

    /// Drops slot `index` (never the first). Later slots move up by one.
    pub fn remove_slot(&mut self, index: usize) -> Result<Option<ImageSource>, SlotError> {
        if index == 0 {
            return Err(SlotError::Required);
        }
        if index >= self.slots.len() {
            return Err(SlotError::NoSuchSlot(index));
        }
        Ok(self.slots.remove(index))
    }

    /// Puts a photo into slot `index`, replacing any previous one.
    pub fn set_image(&mut self, index: usize, source: ImageSource) -> Result<(), SlotError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SlotError::NoSuchSlot(index))?;
        *slot = Some(source);
        Ok(())
    }

    /// Fills the next free slot, opening one if needed.
    pub fn push_image(&mut self, source: ImageSource) -> Result<usize, SlotError> {
        let idx = match self.slots.iter().position(Option::is_none) {
            Some(i) => i,
            None => self.add_slot()?,
        };
        self.set_image(idx, source)?;
        Ok(idx)
    }

    pub fn has_image(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    pub fn present_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Ordered slots including empty ones, as the compositor takes them.
    pub fn images(&self) -> &[Option<ImageSource>] {
        &self.slots
    }

    /// Back to a single empty slot; the doctor stays signed in.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.slots.push(None);
    }
}
