//! Effects produced by state transitions

use super::state::Notice;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the question to the responder (spawns as background task)
    RequestResponse { request_id: u64, input_text: String },

    /// Empty the UI's input field
    ClearInput,

    /// Show an informational notice
    ShowNotice { notice: Notice },

    /// Publish the new view to observers
    PublishView,
}

impl Effect {
    pub fn request_response(request_id: u64, input_text: impl Into<String>) -> Self {
        Effect::RequestResponse {
            request_id,
            input_text: input_text.into(),
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Effect::ShowNotice { notice }
    }
}
