use std::fmt::Debug;
use std::time::Instant;

/// 現在時刻を得るためのポート
///
/// カウンタの有効期限判定をテストから制御できるようにする
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// `Instant::now()` を返す実装
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
