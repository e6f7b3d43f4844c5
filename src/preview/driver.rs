//! Tokio host for [`PreviewController`]

use super::{PreviewController, PreviewEvent, PreviewParams, PreviewRenderer};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Run the controller on the current task until `updates` closes.
///
/// Parameter changes arrive on `updates`; events are forwarded to `events`
/// (dropped silently once the receiver is gone). A refresh still scheduled
/// when `updates` closes is flushed before the controller is handed back.
pub async fn drive<R: PreviewRenderer>(
    mut controller: PreviewController<R>,
    mut updates: mpsc::Receiver<PreviewParams>,
    events: mpsc::Sender<PreviewEvent>,
) -> PreviewController<R> {
    loop {
        let deadline = controller.next_deadline();

        tokio::select! {
            update = updates.recv() => match update {
                Some(params) => {
                    if let Some(event) = controller.on_parameter_changed(params, Instant::now()) {
                        let _ = events.send(event).await;
                    }
                }
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(event) = controller.poll(Instant::now()) {
                    let _ = events.send(event).await;
                }
            }
        }
    }

    if let Some(deadline) = controller.next_deadline() {
        sleep_until(deadline).await;
        if let Some(event) = controller.poll(Instant::now()) {
            let _ = events.send(event).await;
        }
    }

    tracing::debug!("Preview driver stopped");
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::tests::{RecordingRenderer, params};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_renders_once_with_final_text() {
        let controller = PreviewController::new(RecordingRenderer::default());
        let (tx, rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);

        let typing = async move {
            let mut text = String::new();
            for ch in "HELLO".chars() {
                text.push(ch);
                tx.send(params(&text)).await.unwrap();
                sleep(Duration::from_millis(20)).await;
            }
            // idle long enough for the debounce window to close
            sleep(Duration::from_millis(500)).await;
        };

        let (controller, ()) = tokio::join!(drive(controller, rx, event_tx), typing);

        assert_eq!(controller.renderer().calls, vec![params("HELLO")]);
        assert_eq!(
            event_rx.recv().await,
            Some(PreviewEvent::Rendered {
                designator: "M2-L:HELLO".to_string()
            })
        );
        assert_eq!(event_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_refresh_is_flushed_on_close() {
        let controller = PreviewController::new(RecordingRenderer::default());
        let (tx, rx) = mpsc::channel(4);
        let (event_tx, _event_rx) = mpsc::channel(4);

        tx.send(params("LAST")).await.unwrap();
        drop(tx);

        let controller = drive(controller, rx, event_tx).await;
        assert_eq!(controller.renderer().calls, vec![params("LAST")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_data_reports_needs_input() {
        let controller = PreviewController::new(RecordingRenderer::default());
        let (tx, rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);

        tx.send(params("X")).await.unwrap();
        tx.send(params("")).await.unwrap();
        drop(tx);

        let controller = drive(controller, rx, event_tx).await;
        assert!(controller.renderer().calls.is_empty());
        assert_eq!(event_rx.recv().await, Some(PreviewEvent::NeedsInput));
    }
}
