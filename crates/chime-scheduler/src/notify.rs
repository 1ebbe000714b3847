//! Presenters: where fired notifications go.

use chime_core::traits::Presenter;
use chime_core::types::Notification;
use tokio::sync::mpsc;

/// Forwards fired notifications onto a channel, for embedding and tests.
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Presenter for ChannelPresenter {
    fn present(&self, notification: &Notification) {
        if self.tx.send(notification.clone()).is_err() {
            tracing::debug!("Presenter receiver closed, dropping notification {}", notification.notification_id);
        }
    }
}
