//! Commit message confirmation.

/// Gives the caller the last word on a commit message.
///
/// Implementations may show the proposal, let it be edited, or replace it.
/// Whatever is returned is committed; a blank answer keeps the proposal.
pub trait MessageConfirmer: Send + Sync {
    fn confirm(&self, proposed: &str) -> String;
}

/// Accepts every proposal unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAccept;

impl MessageConfirmer for AutoAccept {
    fn confirm(&self, proposed: &str) -> String {
        proposed.to_string()
    }
}
