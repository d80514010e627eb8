//! Pacing Policy Port - 外部服务调用节流抽象
//!
//! 固定节奏的自我限速策略（非自适应背压），
//! 从分割算法中剥离出来注入，测试可用空实现避免真实等待

use async_trait::async_trait;
use std::time::Duration;

/// 节流策略接口
///
/// completed 为已完成的调用数，策略自行决定是否暂停
#[async_trait]
pub trait PacingPolicy: Send + Sync {
    async fn pause(&self, completed: usize);
}

/// 固定间隔节流：每 every 次调用后暂停 pause_ms 毫秒
pub struct IntervalPacing {
    pub every: usize,
    pub pause_ms: u64,
}

impl IntervalPacing {
    pub fn new(every: usize, pause_ms: u64) -> Self {
        Self { every, pause_ms }
    }
}

#[async_trait]
impl PacingPolicy for IntervalPacing {
    async fn pause(&self, completed: usize) {
        if self.every > 0 && completed > 0 && completed % self.every == 0 {
            tracing::debug!(completed, pause_ms = self.pause_ms, "Pacing pause");
            tokio::time::sleep(Duration::from_millis(self.pause_ms)).await;
        }
    }
}

/// 不节流（测试用）
pub struct NoPacing;

#[async_trait]
impl PacingPolicy for NoPacing {
    async fn pause(&self, _completed: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_no_pacing_returns_immediately() {
        let start = Instant::now();
        NoPacing.pause(100).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_interval_pacing_skips_off_beat() {
        let pacing = IntervalPacing::new(3, 1000);
        let start = Instant::now();
        pacing.pause(1).await;
        pacing.pause(2).await;
        pacing.pause(4).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_pacing_pauses_on_beat() {
        let pacing = IntervalPacing::new(3, 200);
        let start = Instant::now();
        pacing.pause(3).await;
        // start_paused 模式下 sleep 被虚拟时钟立即推进
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
