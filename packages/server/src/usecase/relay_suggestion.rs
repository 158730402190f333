//! UseCase: 提案のリレー（ファンアウト）
//!
//! ## 処理の流れ
//!
//! 1. 顧客の MESSAGE 以外のイベントは破棄（外部呼び出しもプッシュもしない）
//! 2. 提案生成関数を呼ぶ。失敗はすべてセンチネル文言に置き換える
//! 3. 会話 ID で接続を検索。0 件なら何もしない（エラーではない）
//! 4. 各接続へ個別にプッシュ。1 件の失敗が他の配信を妨げない
//!
//! 送信に失敗した接続はベストエフォートでレジストリから削除する。
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：1 接続への配信、複数接続へのファンアウト
//! - 異常系：生成関数の失敗、レジストリ障害、一部接続への送信失敗
//! - エッジケース：購読者 0 件、対象外イベント

use std::{collections::BTreeSet, sync::Arc};

use crate::domain::{
    ConnectionId, ConnectionRegistry, InboundMessageEvent, MessagePushError, MessagePusher,
    SuggestionGenerator, SuggestionResult,
};

/// 1 接続への配信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub connection_id: ConnectionId,
    pub outcome: Result<(), MessagePushError>,
}

/// 1 イベントのリレー結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayReport {
    /// 顧客の MESSAGE ではないため破棄した
    Filtered,
    /// 購読している接続がなかった
    NoSubscribers { suggestion: SuggestionResult },
    /// 接続ごとの配信結果
    Fanout {
        suggestion: SuggestionResult,
        deliveries: Vec<Delivery>,
    },
}

impl RelayReport {
    pub fn delivered_count(&self) -> usize {
        match self {
            Self::Fanout { deliveries, .. } => {
                deliveries.iter().filter(|d| d.outcome.is_ok()).count()
            }
            _ => 0,
        }
    }

    pub fn failed_count(&self) -> usize {
        match self {
            Self::Fanout { deliveries, .. } => {
                deliveries.iter().filter(|d| d.outcome.is_err()).count()
            }
            _ => 0,
        }
    }
}

/// 提案リレーのユースケース
pub struct RelaySuggestionUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    generator: Arc<dyn SuggestionGenerator>,
}

impl RelaySuggestionUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        generator: Arc<dyn SuggestionGenerator>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            generator,
        }
    }

    /// 1 イベントをリレーする。どの失敗も呼び出し側には伝播しない。
    pub async fn execute(&self, event: InboundMessageEvent) -> RelayReport {
        if !event.is_actionable() {
            tracing::debug!(
                "Ignoring {} {} event for conversation '{}'",
                event.participant_role.as_str(),
                event.kind.as_str(),
                event.conversation_id
            );
            return RelayReport::Filtered;
        }

        let suggestion = self.generate(&event).await;
        let targets = self.lookup_targets(&event).await;
        if targets.is_empty() {
            tracing::info!(
                "No connection subscribed to conversation '{}', dropping suggestion",
                event.conversation_id
            );
            return RelayReport::NoSubscribers { suggestion };
        }

        let mut deliveries = Vec::with_capacity(targets.len());
        for connection_id in targets {
            let outcome = self
                .message_pusher
                .push_suggestion(&connection_id, &suggestion)
                .await;
            if let Err(e) = &outcome {
                tracing::warn!(
                    "Failed to push suggestion to connection '{}': {}",
                    connection_id,
                    e
                );
                self.reap(&connection_id).await;
            }
            deliveries.push(Delivery {
                connection_id,
                outcome,
            });
        }

        let report = RelayReport::Fanout {
            suggestion,
            deliveries,
        };
        tracing::info!(
            "Relayed suggestion for conversation '{}' (delivered: {}, failed: {})",
            event.conversation_id,
            report.delivered_count(),
            report.failed_count()
        );
        report
    }

    async fn generate(&self, event: &InboundMessageEvent) -> SuggestionResult {
        let result = self.generator.generate(&event.content).await;
        if let Err(e) = &result {
            tracing::warn!(
                "Suggestion generation failed for conversation '{}': {}",
                event.conversation_id,
                e
            );
        }
        SuggestionResult::from_generator(result)
    }

    async fn lookup_targets(&self, event: &InboundMessageEvent) -> BTreeSet<ConnectionId> {
        match self
            .registry
            .lookup_by_conversation(&event.conversation_id)
            .await
        {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(
                    "Registry lookup failed for conversation '{}': {}",
                    event.conversation_id,
                    e
                );
                BTreeSet::new()
            }
        }
    }

    /// 古い接続の削除（ベストエフォート）
    async fn reap(&self, connection_id: &ConnectionId) {
        self.message_pusher.unregister_client(connection_id).await;
        if let Err(e) = self.registry.deregister(connection_id).await {
            tracing::debug!("Failed to reap stale connection '{}': {}", connection_id, e);
        }
    }
}
