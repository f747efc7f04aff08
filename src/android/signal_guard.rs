// 信号守卫模块：拦截 SIGSEGV 并通过 sigsetjmp/siglongjmp 从 Dalvik 私有入口的崩溃中恢复
//
// 守卫区间只包住对私有入口的调用。被 siglongjmp 跳过的栈帧不会执行析构，
// 这些帧只持有临时缓冲与文件映射，泄漏它们不影响进程后续的正确性。

use crate::errno::Errno;
use crate::log;
use crate::runtime::MutexPoisonRecover;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};

mod abi;
mod guard_exec;
mod handlers;


// 覆盖 bionic（arm: 65 个 long）与 glibc（x86_64: 200 字节，aarch64: 312 字节）的 sigjmp_buf
const SIGJMP_BUF_WORDS: usize = 64;

#[repr(C, align(16))]
struct SigJmpBuf([u64; SIGJMP_BUF_WORDS]);

unsafe extern "C" {
    // glibc 只导出 __sigsetjmp，sigsetjmp 是宏
    #[cfg_attr(all(target_os = "linux", target_env = "gnu"), link_name = "__sigsetjmp")]
    fn sigsetjmp(env: *mut SigJmpBuf, savemask: libc::c_int) -> libc::c_int;
    fn siglongjmp(env: *mut SigJmpBuf, val: libc::c_int) -> !;
}

// 进程唯一的故障检查点：armed 为真时 owner_tid 与 env 有效
struct FaultCheckpoint {
    armed: AtomicBool,
    owner_tid: AtomicUsize,
    last_signal: AtomicUsize,
    env: UnsafeCell<MaybeUninit<SigJmpBuf>>,
}

unsafe impl Sync for FaultCheckpoint {}

impl FaultCheckpoint {
    const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            owner_tid: AtomicUsize::new(0),
            last_signal: AtomicUsize::new(0),
            env: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    #[inline]
    unsafe fn env_ptr(&self) -> *mut SigJmpBuf {
        (*self.env.get()).as_mut_ptr()
    }
}

static CHECKPOINT: FaultCheckpoint = FaultCheckpoint::new();
static HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);
// 被替换的原始 sigaction，用于未武装时回退与 uninstall 恢复
static SIGSEGV_OLD_ACTION: AtomicPtr<libc::sigaction> = AtomicPtr::new(ptr::null_mut());

fn handler_lock() -> &'static Mutex<()> {
    static HANDLER_LOCK: Mutex<()> = Mutex::new(());
    &HANDLER_LOCK
}

// 旧 action 只分配一次，之后原地覆盖，信号处理器读到的指针始终有效
fn store_old_action(action: libc::sigaction) {
    let current = SIGSEGV_OLD_ACTION.load(Ordering::Acquire);
    if current.is_null() {
        SIGSEGV_OLD_ACTION.store(Box::into_raw(Box::new(action)), Ordering::Release);
    } else {
        unsafe {
            ptr::write(current, action);
        }
    }
}

pub(super) fn load_sigsegv_old_action() -> *const libc::sigaction {
    SIGSEGV_OLD_ACTION.load(Ordering::Acquire) as *const libc::sigaction
}

pub fn is_installed() -> bool {
    HANDLER_INSTALLED.load(Ordering::Acquire)
}

pub fn is_armed() -> bool {
    CHECKPOINT.armed.load(Ordering::Acquire)
}

// 安装 SIGSEGV 处理器并保存原始 action，已安装时直接返回
pub fn install() -> Result<(), Errno> {
    let _handler_lock = handler_lock().lock_or_poison();
    if is_installed() {
        return Ok(());
    }

    unsafe {
        let mut act: libc::sigaction = std::mem::zeroed();
        act.sa_sigaction = handlers::sigsegv_handler as *const () as usize;
        act.sa_flags = libc::SA_SIGINFO | libc::SA_ONSTACK;
        if libc::sigemptyset(&mut act.sa_mask) != 0 {
            log::error(format_args!("fail set empty mask of action"));
            return Err(Errno::SigHandler);
        }

        let mut old_segv: libc::sigaction = std::mem::zeroed();
        if abi::raw_sigaction(libc::SIGSEGV, &act, &mut old_segv) != 0 {
            log::error(format_args!(
                "fail set action, err={}",
                std::io::Error::last_os_error()
            ));
            return Err(Errno::SigHandler);
        }
        store_old_action(old_segv);
    }

    HANDLER_INSTALLED.store(true, Ordering::Release);
    log::info(format_args!("set action successfully"));
    Ok(())
}

// 恢复安装前的 SIGSEGV action；未安装或已恢复时为空操作
pub fn uninstall() {
    let _handler_lock = handler_lock().lock_or_poison();
    if !HANDLER_INSTALLED.swap(false, Ordering::AcqRel) {
        return;
    }

    let old = load_sigsegv_old_action();
    if !old.is_null() {
        unsafe {
            let _ = abi::raw_sigaction(libc::SIGSEGV, old, ptr::null_mut());
        }
    }
    log::info(format_args!("restored previous SIGSEGV action"));
}

// 在守卫区间内执行闭包，区间内发生 SIGSEGV 时返回 Err(SegvErr)
pub fn with_guard<T, F>(f: F) -> Result<T, Errno>
where
    F: FnOnce() -> T,
{
    guard_exec::with_guard_impl(f)
}
