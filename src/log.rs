use std::ffi::CStr;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

pub const ANDROID_LOG_DEBUG: i32 = 3;
pub const ANDROID_LOG_INFO: i32 = 4;
pub const ANDROID_LOG_WARN: i32 = 5;
pub const ANDROID_LOG_ERROR: i32 = 6;

const LOG_TAG: &CStr = c"BOOST_MULTIDEX.NATIVE";

static LOG_PRIORITY: AtomicI32 = AtomicI32::new(ANDROID_LOG_WARN);

#[cfg(target_os = "android")]
#[link(name = "log")]
unsafe extern "C" {
    fn __android_log_write(prio: i32, tag: *const libc::c_char, text: *const libc::c_char) -> i32;
}

// 设置日志级别，启用时输出 DEBUG 及以上，禁用时仅输出 WARN 及以上
pub fn set_debug_enabled(enabled: bool) {
    let priority = if enabled {
        ANDROID_LOG_DEBUG
    } else {
        ANDROID_LOG_WARN
    };
    LOG_PRIORITY.store(priority, Ordering::SeqCst);
}

fn enabled(priority: i32) -> bool {
    LOG_PRIORITY.load(Ordering::Relaxed) <= priority
}

#[cfg(target_os = "android")]
fn emit(priority: i32, text: String) {
    let mut text = text.into_bytes();
    for byte in &mut text {
        if *byte == 0 {
            *byte = b' ';
        }
    }
    text.push(0);

    unsafe {
        __android_log_write(
            priority,
            LOG_TAG.as_ptr(),
            text.as_ptr() as *const libc::c_char,
        );
    }
}

// 非 Android 目标（host 上的 test/clippy）输出到 stderr
#[cfg(not(target_os = "android"))]
fn emit(priority: i32, text: String) {
    eprintln!("{}", host_line(priority, &text));
}

#[cfg(not(target_os = "android"))]
fn host_line(priority: i32, text: &str) -> String {
    let level = match priority {
        ANDROID_LOG_DEBUG => 'D',
        ANDROID_LOG_INFO => 'I',
        ANDROID_LOG_WARN => 'W',
        _ => 'E',
    };
    format!("{level}/{}: {text}", LOG_TAG.to_string_lossy())
}

fn write_log(priority: i32, args: fmt::Arguments) {
    if !enabled(priority) {
        return;
    }
    emit(priority, format!("{args}"));
}

pub(crate) fn info(args: fmt::Arguments) {
    write_log(ANDROID_LOG_INFO, args);
}

pub(crate) fn debug(args: fmt::Arguments) {
    write_log(ANDROID_LOG_DEBUG, args);
}

pub(crate) fn warn(args: fmt::Arguments) {
    write_log(ANDROID_LOG_WARN, args);
}

pub(crate) fn error(args: fmt::Arguments) {
    write_log(ANDROID_LOG_ERROR, args);
}
