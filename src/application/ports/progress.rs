//! Progress Sink Port - 进度上报抽象
//!
//! 回调按 (current, total, message) 同步调用，类型上不可失败，
//! 调用方的任何行为都不会影响分割流程

/// 进度上报接口
///
/// current 单调递增；total 对窗口类策略是估计值，对逐章枚举是精确值
pub trait ProgressSink: Send + Sync {
    fn report(&self, current: usize, total: usize, message: &str);
}

/// 丢弃进度的空实现
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _current: usize, _total: usize, _message: &str) {}
}

/// 通过 tracing 输出进度
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, current: usize, total: usize, message: &str) {
        tracing::info!(current, total, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingProgress {
        events: Mutex<Vec<(usize, usize, String)>>,
    }

    impl ProgressSink for RecordingProgress {
        fn report(&self, current: usize, total: usize, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push((current, total, message.to_string()));
        }
    }

    #[test]
    fn test_null_progress_is_silent() {
        NullProgress.report(1, 10, "ignored");
    }

    #[test]
    fn test_sink_receives_reports_in_order() {
        let sink = RecordingProgress {
            events: Mutex::new(Vec::new()),
        };
        sink.report(1, 3, "window 1");
        sink.report(2, 3, "window 2");

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 1);
        assert_eq!(events[1].0, 2);
    }
}
