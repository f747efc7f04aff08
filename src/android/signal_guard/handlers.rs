// SIGSEGV 处理器：武装窗口内跳回检查点，否则交还给原处理器

use std::ptr;
use std::sync::atomic::Ordering;

use super::abi;
use super::{CHECKPOINT, HANDLER_INSTALLED, load_sigsegv_old_action, siglongjmp};

// 将信号号和 si_code 编码为单个 usize：高 16 位为 signum，低 16 位为 code
pub(super) fn encode_signal_info(signum: libc::c_int, code: libc::c_int) -> usize {
    let signum_u16 = (signum.max(0) as u16) as usize;
    let code_u16 = (code as i16 as u16) as usize;
    (signum_u16 << 16) | code_u16
}

pub(super) fn decode_signal_info(encoded: usize) -> (libc::c_int, libc::c_int) {
    let signum = ((encoded >> 16) & 0xFFFF) as i32;
    let code = (encoded as u16 as i16) as i32;
    (signum, code)
}

// 恢复原始 action。处理器返回后故障指令重新执行，由原处理器接手；
// kill/tgkill 投递的信号（si_code <= 0）不会自行重现，需要重新投递
unsafe fn hand_back_to_previous(sig: libc::c_int, info: *mut libc::siginfo_t) {
    let old = load_sigsegv_old_action();
    if old.is_null() {
        let mut dfl_action: libc::sigaction = std::mem::zeroed();
        dfl_action.sa_sigaction = libc::SIG_DFL;
        libc::sigemptyset(&mut dfl_action.sa_mask);
        let _ = abi::raw_sigaction(sig, &dfl_action, ptr::null_mut());
    } else {
        let _ = abi::raw_sigaction(sig, old, ptr::null_mut());
    }
    HANDLER_INSTALLED.store(false, Ordering::Release);

    if !info.is_null() && (*info).si_code <= 0 {
        let _ = libc::raise(sig);
    }
}

// 在信号上下文中执行，只使用 async-signal-safe 操作
pub(super) extern "C" fn sigsegv_handler(
    sig: libc::c_int,
    info: *mut libc::siginfo_t,
    _ucontext: *mut libc::c_void,
) {
    if CHECKPOINT.armed.load(Ordering::Acquire)
        && CHECKPOINT.owner_tid.load(Ordering::Acquire) == abi::current_thread_id()
    {
        unsafe {
            let code = if info.is_null() { 0 } else { (*info).si_code };
            CHECKPOINT
                .last_signal
                .store(encode_signal_info(sig, code), Ordering::Release);
            siglongjmp(CHECKPOINT.env_ptr(), 1);
        }
    }

    unsafe {
        hand_back_to_previous(sig, info);
    }
}
