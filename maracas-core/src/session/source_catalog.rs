use std::collections::VecDeque;
use std::rc::Rc;

use crate::models::audio_models::AudioSourceDescriptor;
use crate::models::error::RecorderError;
use crate::traits::engine_delegate::EngineDelegate;

/// Input sources reported by the most recent enumeration.
///
/// Reports accumulate newest-first while an enumeration runs; completing it
/// reverses them back into device order and freezes the list. Index lookups
/// only ever see the frozen list, so indices stay stable until the next
/// `begin_enumeration`.
#[derive(Default)]
pub struct SourceCatalog {
    pending: VecDeque<AudioSourceDescriptor>,
    frozen: Vec<AudioSourceDescriptor>,
    enumerating: bool,
    delegate: Option<Rc<dyn EngineDelegate>>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_delegate(&mut self, delegate: Rc<dyn EngineDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Discard every known source and start accumulating a new list.
    pub fn begin_enumeration(&mut self) {
        self.pending.clear();
        self.frozen.clear();
        self.enumerating = true;
        self.notify();
    }

    pub fn on_source_reported(&mut self, descriptor: AudioSourceDescriptor) {
        if !self.enumerating {
            log::warn!("source {} reported outside an enumeration, ignoring", descriptor.id);
            return;
        }
        log::debug!("source reported: {} ({})", descriptor.id, descriptor.display_name);
        self.pending.push_front(descriptor);
    }

    pub fn on_enumeration_complete(&mut self) {
        if !self.enumerating {
            log::warn!("enumeration completed without having begun, ignoring");
            return;
        }
        self.enumerating = false;
        self.frozen = self.pending.drain(..).rev().collect();
        log::info!("{} input source(s) available", self.frozen.len());
        self.notify();
    }

    /// Abort the running enumeration; the catalog stays empty.
    pub fn on_enumeration_failed(&mut self, reason: &str) {
        log::error!("source enumeration failed: {}", reason);
        self.pending.clear();
        self.enumerating = false;
    }

    pub fn select_by_index(&self, index: usize) -> Result<&AudioSourceDescriptor, RecorderError> {
        self.frozen.get(index).ok_or(RecorderError::SourceOutOfRange {
            index,
            len: self.frozen.len(),
        })
    }

    /// Index the UI should preselect: the first source, if any.
    pub fn default_index(&self) -> Option<usize> {
        if self.frozen.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn sources(&self) -> &[AudioSourceDescriptor] {
        &self.frozen
    }

    pub fn is_enumerating(&self) -> bool {
        self.enumerating
    }

    pub fn len(&self) -> usize {
        self.frozen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frozen.is_empty()
    }

    fn notify(&self) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_source_list_changed(&self.frozen);
        }
    }
}
