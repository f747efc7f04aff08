// 运行时共享库的符号查找
use crate::log;
use std::ffi::{CStr, c_void};
use std::ptr;

pub trait RuntimeLibrary {
    // 符号不存在时返回空指针
    fn symbol(&self, name: &CStr) -> *mut c_void;
}

// dlopen 得到的句柄。libdvm 在进程内常驻，解析出的指针在整个生命周期使用，不 dlclose
pub struct DlLibrary {
    handle: *mut c_void,
}

impl DlLibrary {
    pub fn open(name: &CStr) -> Option<Self> {
        let handle = unsafe { libc::dlopen(name.as_ptr(), libc::RTLD_NOW) };
        if handle.is_null() {
            log::error(format_args!("fail to dlopen {}", name.to_string_lossy()));
            return None;
        }
        Some(Self { handle })
    }
}

impl RuntimeLibrary for DlLibrary {
    fn symbol(&self, name: &CStr) -> *mut c_void {
        if self.handle.is_null() {
            return ptr::null_mut();
        }
        unsafe { libc::dlsym(self.handle, name.as_ptr()) }
    }
}
