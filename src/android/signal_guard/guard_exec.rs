// 守卫区间的执行逻辑：建立检查点 -> 武装 -> 执行闭包 -> 无条件解除武装

use crate::errno::Errno;
use crate::log;
use std::sync::atomic::Ordering;

use super::abi;
use super::handlers::decode_signal_info;
use super::{CHECKPOINT, sigsetjmp};

pub(super) fn with_guard_impl<T, F>(f: F) -> Result<T, Errno>
where
    F: FnOnce() -> T,
{
    // RAII 守卫：无论正常返回还是跳回检查点都解除武装
    struct Disarm;

    impl Drop for Disarm {
        fn drop(&mut self) {
            CHECKPOINT.owner_tid.store(0, Ordering::Release);
            CHECKPOINT.armed.store(false, Ordering::Release);
        }
    }

    // RAII 信号掩码守卫：构造时屏蔽 SIGSEGV，drop 时恢复
    struct SignalMaskGuard {
        prev_mask: libc::sigset_t,
        active: bool,
    }

    impl SignalMaskGuard {
        fn block() -> Result<Self, Errno> {
            let mut prev_mask: libc::sigset_t = unsafe { std::mem::zeroed() };
            abi::block_fault_signal(&mut prev_mask)?;
            Ok(Self {
                prev_mask,
                active: true,
            })
        }

        fn restore(&mut self) {
            if !self.active {
                return;
            }
            abi::restore_signal_mask(&self.prev_mask);
            self.active = false;
        }
    }

    impl Drop for SignalMaskGuard {
        fn drop(&mut self) {
            self.restore();
        }
    }

    // 检查点只有一个槽位，嵌套或并发武装会覆盖前一个调用依赖的上下文
    if CHECKPOINT
        .armed
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        log::warn(format_args!("fault checkpoint already armed"));
        return Err(Errno::GuardBusy);
    }
    let _disarm = Disarm;

    let mut signal_guard = SignalMaskGuard::block()?;
    CHECKPOINT.last_signal.store(0, Ordering::Release);
    CHECKPOINT
        .owner_tid
        .store(abi::current_thread_id(), Ordering::Release);

    unsafe {
        if sigsetjmp(CHECKPOINT.env_ptr(), 1) == 0 {
            signal_guard.restore();
            Ok(f())
        } else {
            // siglongjmp 恢复的是检查点时刻的掩码（SIGSEGV 仍被屏蔽），
            // active 标志在跳转前已被清除，这里直接按保存的掩码恢复
            abi::restore_signal_mask(&signal_guard.prev_mask);
            let signal_info = CHECKPOINT.last_signal.load(Ordering::Acquire);
            if signal_info != 0 {
                let (signum, code) = decode_signal_info(signal_info);
                log::debug(format_args!(
                    "guard caught signal signum={} code={}",
                    signum, code
                ));
            }
            Err(Errno::SegvErr)
        }
    }
}
