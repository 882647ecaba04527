//! 防抖策略
//!
//! 四种策略实现同一个接口，编排侧对策略无感知。时间全部由调用方传入（now），
//! 策略自身不读时钟，便于测试。

use std::time::{Duration, Instant};

/// 防抖策略接口
///
/// allow 只做判定不改状态；on_triggered 在触发被接受后调用；
/// on_completed 在对应异步操作结束后调用（与时间型策略无关，TaskBased 靠它重新放行）。
pub trait GatePolicy: Send {
    fn allow(&self, now: Instant) -> bool;
    fn on_triggered(&mut self, now: Instant);
    fn on_completed(&mut self, now: Instant);
}

/// 纯时间锁：触发后固定封锁一段时间，不关心操作何时完成
#[derive(Debug)]
pub struct Disabled {
    window: Duration,
    last_trigger: Option<Instant>,
}

impl Disabled {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_trigger: None,
        }
    }
}

impl GatePolicy for Disabled {
    fn allow(&self, now: Instant) -> bool {
        match self.last_trigger {
            Some(t) => now.saturating_duration_since(t) >= self.window,
            None => true,
        }
    }

    fn on_triggered(&mut self, now: Instant) {
        self.last_trigger = Some(now);
    }

    fn on_completed(&mut self, _now: Instant) {}
}

/// 任务型：操作在途期间拒绝新触发，完成后立即放行
#[derive(Debug, Default)]
pub struct TaskBased {
    outstanding: bool,
}

impl TaskBased {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GatePolicy for TaskBased {
    fn allow(&self, _now: Instant) -> bool {
        !self.outstanding
    }

    fn on_triggered(&mut self, _now: Instant) {
        self.outstanding = true;
    }

    fn on_completed(&mut self, _now: Instant) {
        self.outstanding = false;
    }
}

/// 冷却型：机制与 Disabled 相同，单独成名以便冷却时长独立配置
#[derive(Debug)]
pub struct Cooldown {
    cooldown: Duration,
    last_trigger: Option<Instant>,
}

impl Cooldown {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_trigger: None,
        }
    }
}

impl GatePolicy for Cooldown {
    fn allow(&self, now: Instant) -> bool {
        match self.last_trigger {
            Some(t) => now.saturating_duration_since(t) >= self.cooldown,
            None => true,
        }
    }

    fn on_triggered(&mut self, now: Instant) {
        self.last_trigger = Some(now);
    }

    fn on_completed(&mut self, _now: Instant) {}
}

/// 合并型（first-wins）：第一次被接受的触发开窗，窗口内的后续触发静默丢弃。
/// 被拒绝的触发不会重置窗口，窗口只由被接受的那次触发决定。
#[derive(Debug)]
pub struct Combine {
    window: Duration,
    window_start: Option<Instant>,
}

impl Combine {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
        }
    }
}

impl GatePolicy for Combine {
    fn allow(&self, now: Instant) -> bool {
        match self.window_start {
            Some(t) => now.saturating_duration_since(t) >= self.window,
            None => true,
        }
    }

    fn on_triggered(&mut self, now: Instant) {
        self.window_start = Some(now);
    }

    fn on_completed(&mut self, _now: Instant) {}
}
