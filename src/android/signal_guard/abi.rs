// 信号相关系统调用的底层封装

use crate::errno::Errno;
use std::ptr;

// EINTR 重试上限
const EINTR_RETRY_LIMIT: usize = 4;

fn last_errno() -> libc::c_int {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or_default() as libc::c_int
}

// 带 EINTR 重试的 C 函数调用包装
#[inline]
unsafe fn retry_c_int_call<F>(mut call: F) -> libc::c_int
where
    F: FnMut() -> libc::c_int,
{
    let mut result = call();
    let mut retries = 0usize;
    while result != 0 && retries < EINTR_RETRY_LIMIT && last_errno() == libc::EINTR {
        retries = retries.saturating_add(1);
        result = call();
    }
    result
}

#[inline]
pub(super) unsafe fn raw_sigaction(
    signum: libc::c_int,
    new_action: *const libc::sigaction,
    old_action: *mut libc::sigaction,
) -> libc::c_int {
    retry_c_int_call(|| libc::sigaction(signum, new_action, old_action))
}

#[inline]
pub(super) unsafe fn raw_sigprocmask(
    how: libc::c_int,
    new_set: *const libc::sigset_t,
    old_set: *mut libc::sigset_t,
) -> libc::c_int {
    retry_c_int_call(|| libc::pthread_sigmask(how, new_set, old_set))
}

// 建立检查点期间屏蔽 SIGSEGV，返回之前的信号掩码
pub(super) fn block_fault_signal(prev_mask: &mut libc::sigset_t) -> Result<(), Errno> {
    let mut block_mask: libc::sigset_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::sigemptyset(&mut block_mask);
        libc::sigaddset(&mut block_mask, libc::SIGSEGV);
        if raw_sigprocmask(libc::SIG_BLOCK, &block_mask, prev_mask) != 0 {
            return Err(Errno::SegvErr);
        }
    }
    Ok(())
}

pub(super) fn restore_signal_mask(prev_mask: &libc::sigset_t) {
    unsafe {
        let _ = raw_sigprocmask(libc::SIG_SETMASK, prev_mask, ptr::null_mut());
    }
}

pub(super) fn current_thread_id() -> usize {
    unsafe { libc::syscall(libc::SYS_gettid) as usize }
}
