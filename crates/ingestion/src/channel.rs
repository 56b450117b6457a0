//! 通知通道传输
//!
//! 无线栈的通知回调通过 `NotificationSender` 推送原始字节，
//! 采集会话通过 `ChannelTransport` 读取。回调侧从不阻塞：
//! 通道满时按 `DropPolicy` 丢弃通知。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use bytes::Bytes;
use contracts::{DropPolicy, RawChunk, Transport};
use tracing::{debug, trace, warn};

use crate::config::{BackpressureConfig, IngestionMetrics};

/// Create a connected sender/transport pair
pub fn notification_channel(
    name: impl Into<String>,
    config: BackpressureConfig,
) -> (NotificationSender, ChannelTransport) {
    let name = name.into();
    let (tx, rx) = async_channel::bounded(config.channel_capacity.max(1));
    let metrics = Arc::new(IngestionMetrics::new());
    let connected = Arc::new(AtomicBool::new(true));

    let sender = NotificationSender {
        name: name.clone(),
        tx,
        evict: rx.clone(),
        drop_policy: config.drop_policy,
        metrics: metrics.clone(),
        connected: connected.clone(),
    };
    let transport = ChannelTransport {
        name,
        rx,
        metrics,
        connected,
    };
    (sender, transport)
}

/// Callback-side handle
///
/// Cloneable; the link counts as disconnected once `disconnect` is called or
/// every sender is dropped.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    name: String,
    tx: Sender<Bytes>,
    evict: Receiver<Bytes>,
    drop_policy: DropPolicy,
    metrics: Arc<IngestionMetrics>,
    connected: Arc<AtomicBool>,
}

impl NotificationSender {
    /// Push one notification payload; never blocks
    ///
    /// Returns `false` if the notification (or an older one, under
    /// `DropOldest`) had to be dropped, or the link is down.
    #[inline]
    pub fn notify(&self, payload: impl Into<Bytes>) -> bool {
        let payload = payload.into();
        if !self.connected.load(Ordering::Relaxed) {
            return false;
        }

        match self.tx.try_send(payload) {
            Ok(()) => {
                self.metrics.update_queue_len(self.tx.len());
                trace!(transport = %self.name, "notification queued");
                true
            }
            Err(TrySendError::Full(payload)) => {
                self.metrics.record_dropped();
                observability::record_notification_dropped(&self.name);
                match self.drop_policy {
                    DropPolicy::DropNewest => {
                        trace!(transport = %self.name, "notification dropped (newest)");
                    }
                    DropPolicy::DropOldest => {
                        let _ = self.evict.try_recv();
                        if self.tx.try_send(payload).is_err() {
                            trace!(transport = %self.name, "notification dropped (queue refilled)");
                        } else {
                            trace!(transport = %self.name, "notification dropped (oldest)");
                        }
                    }
                }
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(transport = %self.name, "notification channel closed");
                false
            }
        }
    }

    /// Signal link loss; buffered notifications are still delivered
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!(transport = %self.name, "link disconnected");
            self.tx.close();
        }
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }
}

/// Receiving side of the notification channel
#[derive(Debug)]
pub struct ChannelTransport {
    name: String,
    rx: Receiver<Bytes>,
    metrics: Arc<IngestionMetrics>,
    connected: Arc<AtomicBool>,
}

impl ChannelTransport {
    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }
}

impl Transport for ChannelTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_chunk(&mut self) -> Option<RawChunk> {
        match self.rx.recv().await {
            Ok(bytes) => {
                self.metrics.record_received(bytes.len());
                self.metrics.update_queue_len(self.rx.len());
                Some(RawChunk::new(bytes))
            }
            Err(_) => {
                self.connected.store(false, Ordering::SeqCst);
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed) && !self.rx.is_closed()
    }
}
