use super::super::renderer::Renderer;
use super::{ConversationController, Turn, TurnUpdate, TurnUpdateKind};
use crate::api::{decode_stream, ChatClient};
use crate::error::SubmitRejected;
use crate::types::ChatEvent;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

impl<R: Renderer> ConversationController<R> {
    /// Start a turn for `text` and spawn its stream pump.
    ///
    /// Must be called from within a tokio runtime. Returns the new turn id.
    pub fn submit(&mut self, text: &str) -> Result<u64, SubmitRejected> {
        let message = text.trim();
        if message.is_empty() {
            return Err(SubmitRejected::Empty);
        }
        if self.is_busy() {
            tracing::debug!("submit rejected: turn in progress");
            return Err(SubmitRejected::Busy);
        }

        self.next_turn_id += 1;
        let turn_id = self.next_turn_id;
        self.turn = Some(Turn::new(turn_id, message.to_string()));
        self.renderer.clear_plan();
        self.renderer.show_user_message(message);

        let cancel_token = CancellationToken::new();
        self.cancel_token = Some(cancel_token.clone());
        self.pump_task = Some(tokio::spawn(pump_turn_stream(
            Arc::clone(&self.client),
            message.to_string(),
            turn_id,
            self.update_tx.clone(),
            cancel_token,
        )));
        tracing::info!(turn_id, "turn started");

        Ok(turn_id)
    }

    /// Apply one pump update. Updates from turns that already ended are dropped.
    pub fn handle_update(&mut self, update: TurnUpdate) {
        if !self.is_active_turn(update.turn_id) {
            tracing::debug!(turn_id = update.turn_id, "dropping update for stale turn");
            return;
        }

        match update.kind {
            TurnUpdateKind::Event(event) => self.apply_event(event),
            TurnUpdateKind::Failed(error) => self.on_transport_failure(&error),
            TurnUpdateKind::Closed => {
                tracing::warn!(
                    turn_id = update.turn_id,
                    "stream closed without a done record"
                );
                self.finish_turn();
            }
        }
    }

    /// Drive updates until the current turn is over.
    pub async fn run_until_idle(&mut self, update_rx: &mut mpsc::UnboundedReceiver<TurnUpdate>) {
        while self.is_busy() {
            match update_rx.recv().await {
                Some(update) => self.handle_update(update),
                None => break,
            }
        }
    }

    /// Like `run_until_idle`, but cancels the turn if `interrupt` resolves
    /// first. Returns true when the turn was cancelled.
    pub async fn run_until_idle_or<F>(
        &mut self,
        update_rx: &mut mpsc::UnboundedReceiver<TurnUpdate>,
        interrupt: F,
    ) -> bool
    where
        F: Future,
    {
        let interrupted = tokio::select! {
            _ = self.run_until_idle(update_rx) => false,
            _ = interrupt => true,
        };
        interrupted && self.cancel()
    }

    /// Abandon the active turn. The pump drops its transport and whatever it
    /// had buffered; nothing is flushed. Returns false when idle.
    pub fn cancel(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        if let Some(turn) = self.turn.as_ref() {
            tracing::info!(turn_id = turn.id, "turn cancelled");
        }
        self.finish_turn();
        true
    }

    pub(super) fn finish_turn(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(task) = self.pump_task.take() {
            task.abort();
        }
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        if turn.finished {
            return;
        }
        if turn.status.take().is_some() {
            self.renderer.clear_status();
        }
        turn.finished = true;
        tracing::info!(turn_id = turn.id, "turn finished");
        self.renderer.turn_finished();
    }
}

fn emit_turn_update(
    update_tx: &mpsc::UnboundedSender<TurnUpdate>,
    turn_id: u64,
    kind: TurnUpdateKind,
) -> bool {
    update_tx.send(TurnUpdate { turn_id, kind }).is_ok()
}

async fn pump_turn_stream(
    client: Arc<ChatClient>,
    message: String,
    turn_id: u64,
    update_tx: mpsc::UnboundedSender<TurnUpdate>,
    cancel_token: CancellationToken,
) {
    let opened = tokio::select! {
        _ = cancel_token.cancelled() => return,
        opened = client.open_stream(&message) => opened,
    };
    let bytes = match opened {
        Ok(bytes) => bytes,
        Err(error) => {
            emit_turn_update(&update_tx, turn_id, TurnUpdateKind::Failed(error));
            return;
        }
    };

    let mut events = decode_stream(bytes);
    loop {
        let next = tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::debug!(turn_id, "pump cancelled; dropping stream");
                return;
            }
            next = events.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                let is_end = matches!(event, ChatEvent::StreamEnd);
                if !emit_turn_update(&update_tx, turn_id, TurnUpdateKind::Event(event)) || is_end
                {
                    return;
                }
            }
            Some(Err(error)) => {
                emit_turn_update(&update_tx, turn_id, TurnUpdateKind::Failed(error));
                return;
            }
            None => {
                emit_turn_update(&update_tx, turn_id, TurnUpdateKind::Closed);
                return;
            }
        }
    }
}
