//! 动作防抖门
//!
//! 一个用户动作（重试按钮、入口点击）配一把门，策略可插拔。
//! 散落在各调用点的 ad hoc 防抖标志统一收敛到这里。

pub mod policy;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub use policy::{Combine, Cooldown, Disabled, GatePolicy, TaskBased};

/// 防抖门：持有一个策略实例，多处共享时整体加锁
pub struct ActionGate {
    policy: Mutex<Box<dyn GatePolicy>>,
}

impl ActionGate {
    pub fn new(policy: impl GatePolicy + 'static) -> Self {
        Self {
            policy: Mutex::new(Box::new(policy)),
        }
    }

    pub fn disabled(window: Duration) -> Self {
        Self::new(Disabled::new(window))
    }

    pub fn task_based() -> Self {
        Self::new(TaskBased::new())
    }

    pub fn cooldown(cooldown: Duration) -> Self {
        Self::new(Cooldown::new(cooldown))
    }

    pub fn combine(window: Duration) -> Self {
        Self::new(Combine::new(window))
    }

    // 策略方法不会 panic，锁中毒时取回内层值继续用
    fn lock(&self) -> MutexGuard<'_, Box<dyn GatePolicy>> {
        self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 判定并登记一次触发。适用于时间型策略（无需完成回调）。
    pub fn try_fire(&self, now: Instant) -> bool {
        let mut policy = self.lock();
        if policy.allow(now) {
            policy.on_triggered(now);
            true
        } else {
            false
        }
    }

    /// 判定并登记触发，返回 RAII 凭证；凭证 drop 时自动回调 on_completed。
    /// TaskBased 必须走这条路，否则门会永远关着。
    pub fn try_acquire(&self, now: Instant) -> Option<GatePermit<'_>> {
        if self.try_fire(now) {
            Some(GatePermit { gate: self })
        } else {
            None
        }
    }

    /// 手动通知完成（与 try_fire 配对使用时）
    pub fn complete(&self, now: Instant) {
        self.lock().on_completed(now);
    }
}

/// 触发凭证：存活期间代表对应操作在途
pub struct GatePermit<'a> {
    gate: &'a ActionGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.complete(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_fire_registers_trigger() {
        let gate = ActionGate::disabled(Duration::from_millis(300));
        let t0 = Instant::now();
        assert!(gate.try_fire(t0));
        assert!(!gate.try_fire(t0 + Duration::from_millis(100)));
        assert!(gate.try_fire(t0 + Duration::from_millis(300)));
    }

    #[test]
    fn test_permit_reopens_task_gate_on_drop() {
        let gate = ActionGate::task_based();
        let t0 = Instant::now();

        let permit = gate.try_acquire(t0);
        assert!(permit.is_some());
        // 在途期间第二次触发拿不到凭证
        assert!(gate.try_acquire(t0).is_none());

        drop(permit);
        assert!(gate.try_acquire(t0).is_some());
    }

    #[test]
    fn test_manual_complete_pairs_with_try_fire() {
        let gate = ActionGate::task_based();
        let t0 = Instant::now();
        assert!(gate.try_fire(t0));
        assert!(!gate.try_fire(t0));
        gate.complete(t0);
        assert!(gate.try_fire(t0));
    }

    #[test]
    fn test_every_policy_blocks_immediate_duplicate() {
        let t0 = Instant::now();
        for gate in [
            ActionGate::disabled(Duration::from_millis(100)),
            ActionGate::task_based(),
            ActionGate::cooldown(Duration::from_millis(100)),
            ActionGate::combine(Duration::from_millis(100)),
        ] {
            assert!(gate.try_fire(t0));
            assert!(!gate.try_fire(t0));
        }
    }
}
