#[cfg(test)]
mod dispatch_loop_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use campaign_dispatcher::DispatchLoop;
    use campaign_domain::{DispatchStats, ScheduleDispatchService, SchedulerResult};

    /// 只计数的派发服务，用于观察tick驱动
    #[derive(Default)]
    struct CountingDispatchService {
        ticks: AtomicUsize,
    }

    #[async_trait]
    impl ScheduleDispatchService for CountingDispatchService {
        async fn scan_and_dispatch(&self) -> SchedulerResult<DispatchStats> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            Ok(DispatchStats::default())
        }
    }

    #[tokio::test]
    async fn test_loop_ticks_until_stopped() {
        let service = Arc::new(CountingDispatchService::default());
        let dispatch_loop =
            DispatchLoop::new(service.clone(), Duration::from_millis(10));

        dispatch_loop.start().await;
        assert!(dispatch_loop.is_running().await);
        tokio::time::sleep(Duration::from_millis(55)).await;
        dispatch_loop.stop().await;
        assert!(!dispatch_loop.is_running().await);

        let ticks = service.ticks.load(Ordering::SeqCst);
        assert!(ticks >= 2, "期望至少2个tick, 实际{ticks}");

        // 停止后不再产生新的tick
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(service.ticks.load(Ordering::SeqCst), ticks);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let service = Arc::new(CountingDispatchService::default());
        let dispatch_loop =
            DispatchLoop::new(service.clone(), Duration::from_millis(10));

        dispatch_loop.start().await;
        dispatch_loop.start().await;
        tokio::time::sleep(Duration::from_millis(35)).await;
        dispatch_loop.stop().await;

        // 只有一个定时器在跑，tick数不会翻倍
        let ticks = service.ticks.load(Ordering::SeqCst);
        assert!(ticks <= 6, "重复start不应产生并行的tick循环, 实际{ticks}");
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let service = Arc::new(CountingDispatchService::default());
        let dispatch_loop = DispatchLoop::new(service, Duration::from_millis(10));
        dispatch_loop.stop().await;
        assert!(!dispatch_loop.is_running().await);
    }
}
