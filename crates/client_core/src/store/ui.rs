use super::Slice;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiState {
    pub is_date_modal_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    OpenDateModal,
    CloseDateModal,
}

impl Slice for UiState {
    type Action = UiAction;

    const NAME: &'static str = "ui";

    fn reduce(&mut self, action: UiAction) {
        self.is_date_modal_open = matches!(action, UiAction::OpenDateModal);
    }
}
