use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ConsumerConfig;
use crate::service::IngestionProcessor;

/// 消费结束时的计数, 恒有 `received == ingested + dead_lettered`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: usize,
    pub ingested: usize,
    pub dead_lettered: usize,
}

impl ConsumerStats {
    fn merge(&mut self, other: ConsumerStats) {
        self.received += other.received;
        self.ingested += other.ingested;
        self.dead_lettered += other.dead_lettered;
    }
}

/// 按行读取 JSON 事件并分发给分区 worker
///
/// 同一事件 id 总是落在同一分区, 同一笔交易的重投按到达顺序生效.
pub struct EventConsumer {
    processor: Arc<IngestionProcessor>,
    config: ConsumerConfig,
    backpressure: usize,
}

impl EventConsumer {
    pub fn new(processor: Arc<IngestionProcessor>, config: ConsumerConfig) -> Self {
        Self {
            processor,
            config,
            backpressure: 256,
        }
    }

    /// 消费 `source` 直到 EOF, 然后等待所有分区处理完毕
    pub async fn run<R>(&self, source: R) -> ConsumerStats
    where
        R: AsyncBufRead + Unpin,
    {
        let partitions = self.config.partitions.max(1);
        let mut senders = Vec::with_capacity(partitions);
        let mut workers = Vec::with_capacity(partitions);

        for partition in 0..partitions {
            let (sender, receiver) = mpsc::channel::<String>(self.backpressure);
            senders.push(sender);
            workers.push(self.spawn_partition(partition, receiver));
        }

        let mut stats = ConsumerStats::default();
        let mut lines = source.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("Event source read failed, stopping consumer: {}", e);
                    break;
                }
            };

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            stats.received += 1;
            let partition = partition_for(message, partitions);
            if senders[partition].send(message.to_string()).await.is_err() {
                error!("Partition {} is gone, dead-lettering message: {}", partition, message);
                stats.dead_lettered += 1;
            }
        }

        // 关闭通道, worker 处理完队列后退出
        drop(senders);

        for result in join_all(workers).await {
            match result {
                Ok(partition_stats) => stats.merge(partition_stats),
                Err(e) => error!("A partition worker did not finish gracefully: {:?}", e),
            }
        }

        // 随崩溃的 worker 一起丢失的消息
        let lost = stats
            .received
            .saturating_sub(stats.ingested + stats.dead_lettered);
        if lost > 0 {
            error!("{} message(s) lost with a crashed partition, counted as dead-lettered", lost);
            stats.dead_lettered += lost;
        }

        info!(
            "Consumer drained: received={}, ingested={}, dead_lettered={}",
            stats.received, stats.ingested, stats.dead_lettered
        );
        stats
    }

    fn spawn_partition(&self, partition: usize, mut receiver: mpsc::Receiver<String>) -> JoinHandle<ConsumerStats> {
        let processor = self.processor.clone();
        let max_attempts = self.config.max_attempts.max(1);
        let backoff = Duration::from_millis(self.config.retry_backoff_ms);

        tokio::spawn(async move {
            let mut stats = ConsumerStats::default();

            while let Some(message) = receiver.recv().await {
                let mut attempt = 1;

                loop {
                    match processor.ingest_message(&message).await {
                        Ok(_) => {
                            stats.ingested += 1;
                            break;
                        }
                        Err(e) if e.is_retryable() && attempt < max_attempts => {
                            warn!(
                                "Partition {}: attempt {}/{} failed, retrying in {:?}: {}",
                                partition, attempt, max_attempts, backoff, e
                            );
                            tokio::time::sleep(backoff).await;
                            attempt += 1;
                        }
                        Err(e) => {
                            error!(
                                "Partition {}: dead-lettering message after {} attempt(s): {}: {}",
                                partition, attempt, e, message
                            );
                            stats.dead_lettered += 1;
                            break;
                        }
                    }
                }
            }

            stats
        })
    }
}

/// 按消息的 `id` 分区, 没有 id 时按整条消息
fn partition_for(message: &str, partitions: usize) -> usize {
    let id = serde_json::from_str::<serde_json::Value>(message)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_owned));

    let mut hasher = DefaultHasher::new();
    match &id {
        Some(id) => id.hash(&mut hasher),
        None => message.hash(&mut hasher),
    }
    (hasher.finish() % partitions as u64) as usize
}
