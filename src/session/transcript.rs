/// Accumulates recognized speech for a dictation session.
///
/// Final results are persisted as fragments; at most one interim result
/// is held at a time and is replaced or discarded as recognition refines
/// it. A final result always supersedes the pending interim.
#[derive(Debug, Clone, Default)]
pub struct TranscriptAccumulator {
    fragments: Vec<String>,
    interim: Option<String>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a final result. Clears any pending interim, since the engine
    /// promotes the interim into the final it refines to.
    pub fn append_final(&mut self, text: &str) {
        self.interim = None;
        let text = text.trim();
        if !text.is_empty() {
            self.fragments.push(text.to_string());
        }
    }

    /// Replace the pending interim result. Whitespace-only text clears it.
    pub fn set_interim(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.interim = None;
        } else {
            self.interim = Some(text.to_string());
        }
    }

    /// Discard the pending interim without touching persisted fragments
    pub fn clear_interim(&mut self) {
        self.interim = None;
    }

    /// Drop everything accumulated so far
    pub fn reset(&mut self) {
        self.fragments.clear();
        self.interim = None;
    }

    /// The persisted transcription: final fragments joined by single spaces
    pub fn transcription(&self) -> String {
        self.fragments.join(" ")
    }

    /// The transcription with the pending interim appended, for live display
    pub fn live_preview(&self) -> String {
        match &self.interim {
            Some(interim) if self.fragments.is_empty() => interim.clone(),
            Some(interim) => format!("{} {}", self.transcription(), interim),
            None => self.transcription(),
        }
    }

    /// The pending interim result, if any
    pub fn interim(&self) -> Option<&str> {
        self.interim.as_deref()
    }

    /// Number of persisted final fragments
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// True when nothing has been accumulated, interim included
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty() && self.interim.is_none()
    }
}
