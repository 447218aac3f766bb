//! 日志专用环形缓冲区

use crate::logger::LogSink;
use crate::record::Record;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// 环形缓冲区统计信息
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RingBufferStats {
    pub record_count: usize,
    /// 因缓冲区满而丢弃的记录数
    pub dropped_count: usize,
    pub capacity: usize,
}

/// 日志环形缓冲区
///
/// 当缓冲区满时，新记录会覆盖最旧的记录（FIFO）
pub struct LogRingBuffer {
    inner: Mutex<VecDeque<Record>>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(LogRingBuffer {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicUsize::new(0),
        })
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<Record>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, record: Record) {
        let mut inner = self.records();
        if inner.len() >= self.capacity {
            inner.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        inner.push_back(record);
    }

    /// 获取当前所有记录（按时间顺序）
    pub fn dump_records(&self) -> Vec<Record> {
        self.records().iter().cloned().collect()
    }

    /// 将日志转储到字符串
    pub fn dump(&self) -> String {
        self.records()
            .iter()
            .map(Record::format)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 是否有任何记录的消息包含 `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|r| r.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records().clear();
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RingBufferStats {
        RingBufferStats {
            record_count: self.len(),
            dropped_count: self.dropped_count(),
            capacity: self.capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for LogRingBuffer {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

impl LogSink for Arc<LogRingBuffer> {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    #[test]
    fn test_overflow_behavior() {
        let buffer = LogRingBuffer::new(3);

        for i in 0..5 {
            buffer.push(Record::new(Level::Info, "test", format!("msg{i}")));
        }

        assert_eq!(buffer.len(), 3);

        let records = buffer.dump_records();
        assert_eq!(records[0].message, "msg2");
        assert_eq!(records[2].message, "msg4");
        assert_eq!(buffer.dropped_count(), 2);
    }

    #[test]
    fn test_contains_and_dump() {
        let buffer = LogRingBuffer::new(10);

        buffer.push(Record::new(Level::Info, "test", "stage0 built"));
        buffer.push(Record::new(Level::Warn, "test", "add: stage1 failed"));

        assert!(buffer.contains("stage1 failed"));
        assert!(!buffer.contains("stage2"));

        let dump = buffer.dump();
        assert!(dump.contains("INFO"));
        assert!(dump.contains("WARN"));
    }

    #[test]
    fn test_clear_and_stats() {
        let buffer = LogRingBuffer::new(2);
        for i in 0..4 {
            buffer.push(Record::new(Level::Info, "test", format!("msg{i}")));
        }

        let stats = buffer.stats();
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.dropped_count, 2);
        assert_eq!(stats.capacity, 2);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.dropped_count(), 0);
    }
}
