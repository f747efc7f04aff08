// 系统属性读取，用于厂商识别与虚拟机探测

#[cfg(target_os = "android")]
use std::ffi::{CString, c_char};

// PROP_VALUE_MAX
#[cfg(target_os = "android")]
const SYSTEM_PROP_VALUE_MAX: usize = 92;

#[cfg(target_os = "android")]
unsafe extern "C" {
    fn __system_property_get(name: *const c_char, value: *mut c_char) -> libc::c_int;
}

// 属性来源抽象，测试中以内存表替代
pub trait PropertySource {
    // 属性不存在或为空时返回 None
    fn get(&self, name: &str) -> Option<String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProperties;

impl PropertySource for SystemProperties {
    #[cfg(target_os = "android")]
    fn get(&self, name: &str) -> Option<String> {
        let c_name = CString::new(name).ok()?;
        let mut value = [0u8; SYSTEM_PROP_VALUE_MAX];
        let len = unsafe {
            __system_property_get(c_name.as_ptr(), value.as_mut_ptr() as *mut c_char)
        };
        if len <= 0 {
            return None;
        }
        let len = (len as usize).min(SYSTEM_PROP_VALUE_MAX);
        Some(String::from_utf8_lossy(&value[..len]).into_owned())
    }

    #[cfg(not(target_os = "android"))]
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
}
