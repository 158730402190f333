//! UseCase: 受信イベントの振り分け
//!
//! 会話ごとにワーカータスクとキューを 1 つ持ち、同じ会話のイベントは到着順に
//! リレーする。異なる会話のイベントは並行に処理される。
//!
//! ワーカーは一定時間イベントがなければ終了し、マップから自分のキューを削除する。
//! キューへの送信と削除はどちらもマップのロックを保持して行うので、
//! 削除の瞬間に届いたイベントが失われることはない。

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{Mutex, mpsc};

use crate::domain::{ConversationId, InboundMessageEvent};

use super::relay_suggestion::RelaySuggestionUseCase;

type EventQueues = Arc<Mutex<HashMap<ConversationId, mpsc::UnboundedSender<InboundMessageEvent>>>>;

/// 受信イベントのディスパッチャー
pub struct InboundEventDispatcher {
    relay: Arc<RelaySuggestionUseCase>,
    queues: EventQueues,
    idle_timeout: Duration,
}

impl InboundEventDispatcher {
    pub fn new(relay: Arc<RelaySuggestionUseCase>, idle_timeout: Duration) -> Self {
        Self {
            relay,
            queues: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// イベントを会話のキューに積む（処理の完了は待たない）
    pub async fn dispatch(&self, event: InboundMessageEvent) {
        let mut queues = self.queues.lock().await;
        let conversation_id = event.conversation_id.clone();

        let event = match queues.get(&conversation_id) {
            Some(queue) => match queue.send(event) {
                Ok(()) => return,
                // ワーカーが異常終了していた場合は作り直す
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // rx は直後に spawn するワーカーが保持しているので、ここでの送信は失敗しない
        let _ = tx.send(event);
        queues.insert(conversation_id.clone(), tx);
        tracing::debug!("Started relay worker for conversation '{}'", conversation_id);

        tokio::spawn(run_worker(
            conversation_id,
            rx,
            self.relay.clone(),
            self.queues.clone(),
            self.idle_timeout,
        ));
    }

    /// 稼働中のワーカー数
    pub async fn active_workers(&self) -> usize {
        self.queues.lock().await.len()
    }
}

async fn run_worker(
    conversation_id: ConversationId,
    mut rx: mpsc::UnboundedReceiver<InboundMessageEvent>,
    relay: Arc<RelaySuggestionUseCase>,
    queues: EventQueues,
    idle_timeout: Duration,
) {
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => {
                relay.execute(event).await;
            }
            Ok(None) => break,
            Err(_) => {
                let mut queues = queues.lock().await;
                if rx.is_empty() {
                    queues.remove(&conversation_id);
                    tracing::debug!(
                        "Relay worker for conversation '{}' idle, stopping",
                        conversation_id
                    );
                    break;
                }
            }
        }
    }
}
