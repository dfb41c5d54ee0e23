//! 启动门控
//!
//! 声音提示需要一次用户交互后才能播放，所以在交互前不建立订阅，
//! 否则第一条新订单的提示音会丢失。

/// 用户交互门控
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartGate {
    /// 等待第一次按键
    #[default]
    AwaitingInteraction,
    /// 已交互，订阅已建立
    Unlocked,
}

impl StartGate {
    /// 解锁，状态发生变化时返回 true
    pub fn unlock(&mut self) -> bool {
        let changed = *self == Self::AwaitingInteraction;
        *self = Self::Unlocked;
        changed
    }

    /// 重新锁定，状态发生变化时返回 true
    pub fn lock(&mut self) -> bool {
        let changed = *self == Self::Unlocked;
        *self = Self::AwaitingInteraction;
        changed
    }

    pub fn is_unlocked(&self) -> bool {
        *self == Self::Unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_transitions() {
        let mut gate = StartGate::default();
        assert!(!gate.is_unlocked());
        assert!(gate.unlock());
        assert!(!gate.unlock());
        assert!(gate.is_unlocked());
        assert!(gate.lock());
        assert!(!gate.lock());
        assert!(!gate.is_unlocked());
    }
}
