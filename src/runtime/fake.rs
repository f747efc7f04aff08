// 测试替身：记录调用的托管运行时、按名称返回指针的运行时库，以及模拟 Dalvik 私有入口
use super::host::{DexCookie, DexRuntime};
use super::layout::{ArrayObject, DexOrJar, DvmDex, RawDexFile};
use super::library::RuntimeLibrary;
use crate::errno::Errno;
use crate::runtime::MutexPoisonRecover;
use std::collections::HashMap;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr;
use std::sync::Mutex;

pub(crate) const FAKE_DEX_OBJECT: usize = 0xd0d0;
pub(crate) const FAKE_LEGACY_COOKIE: DexCookie = 0x4242;

#[derive(Debug, Default)]
pub(crate) struct FakeBindings {
    pub legacy_open: bool,
    pub dex_wrapper: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FakeDexFile {
    pub cookie: DexCookie,
    pub file_name: Option<String>,
    pub guard: bool,
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub fail_result_type: bool,
    pub legacy_available: bool,
    pub fail_dex_wrapper: bool,
    pub legacy_throws: bool,
    pub pending_exception: bool,
    pub calls: Vec<&'static str>,
    pub legacy_payloads: Vec<Vec<u8>>,
    pub wrapper_payloads: Vec<Vec<u8>>,
}

impl FakeRuntime {
    pub(crate) fn called(&self, name: &str) -> bool {
        self.calls.iter().any(|call| *call == name)
    }
}

impl DexRuntime for FakeRuntime {
    type Bindings = FakeBindings;
    type Path = String;
    type Bytes = Vec<u8>;
    type Object = FakeDexFile;

    fn bind_result_type(&mut self) -> Result<FakeBindings, Errno> {
        self.calls.push("bind_result_type");
        if self.fail_result_type {
            return Err(Errno::PendingException);
        }
        Ok(FakeBindings::default())
    }

    fn bind_legacy_open(&mut self, bindings: &mut FakeBindings) -> bool {
        self.calls.push("bind_legacy_open");
        bindings.legacy_open = self.legacy_available;
        self.legacy_available
    }

    fn bind_dex_wrapper(&mut self, bindings: &mut FakeBindings) -> Result<(), Errno> {
        self.calls.push("bind_dex_wrapper");
        if self.fail_dex_wrapper {
            return Err(Errno::ClassMissing);
        }
        bindings.dex_wrapper = true;
        Ok(())
    }

    fn path_string(&mut self, path: &String) -> Result<String, Errno> {
        Ok(path.clone())
    }

    fn new_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>, Errno> {
        self.calls.push("new_bytes");
        Ok(data.to_vec())
    }

    fn with_bytes_critical<T>(
        &mut self,
        bytes: &Vec<u8>,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, Errno> {
        self.calls.push("bytes_critical");
        Ok(f(bytes))
    }

    fn call_legacy_open(
        &mut self,
        bindings: &FakeBindings,
        bytes: &Vec<u8>,
    ) -> Result<DexCookie, Errno> {
        self.calls.push("legacy_open");
        assert!(bindings.legacy_open);
        self.legacy_payloads.push(bytes.clone());
        if self.legacy_throws {
            self.pending_exception = true;
            return Err(Errno::PendingException);
        }
        Ok(FAKE_LEGACY_COOKIE)
    }

    fn exception_pending(&mut self) -> bool {
        self.pending_exception
    }

    fn new_dex_wrapper(
        &mut self,
        bindings: &FakeBindings,
        bytes: &Vec<u8>,
    ) -> Result<*mut c_void, Errno> {
        self.calls.push("new_dex_wrapper");
        assert!(bindings.dex_wrapper);
        self.wrapper_payloads.push(bytes.clone());
        Ok(FAKE_DEX_OBJECT as *mut c_void)
    }

    fn new_result_object(
        &mut self,
        _bindings: &FakeBindings,
        cookie: DexCookie,
        path: Option<&String>,
    ) -> Result<FakeDexFile, Errno> {
        self.calls.push("new_result_object");
        Ok(FakeDexFile {
            cookie,
            file_name: path.cloned(),
            guard: true,
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeLibrary(HashMap<Vec<u8>, usize>);

impl FakeLibrary {
    pub(crate) fn with_symbol(mut self, name: &CStr, addr: usize) -> Self {
        self.0.insert(name.to_bytes().to_vec(), addr);
        self
    }
}

impl RuntimeLibrary for FakeLibrary {
    fn symbol(&self, name: &CStr) -> *mut c_void {
        self.0
            .get(name.to_bytes())
            .map_or(ptr::null_mut(), |addr| *addr as *mut c_void)
    }
}

static OPENED_PAYLOADS: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

pub(crate) fn take_opened_payloads() -> Vec<Vec<u8>> {
    std::mem::take(&mut *OPENED_PAYLOADS.lock_or_poison())
}

// 按 Dalvik 的方式读取 ArrayObject 参数，返回一条新分配的 DexOrJar 记录
pub(crate) unsafe extern "C" fn fake_open_dex_file_bytes(args: *const usize, result: *mut u64) {
    let array = *args as *const ArrayObject;
    let length = (*array).length as usize;
    let contents = ptr::addr_of!((*array).contents) as *const u8;
    OPENED_PAYLOADS
        .lock_or_poison()
        .push(std::slice::from_raw_parts(contents, length).to_vec());

    let dvm_dex: &'static mut DvmDex = Box::leak(Box::new(std::mem::zeroed()));
    let raw: &'static mut RawDexFile = Box::leak(Box::new(RawDexFile {
        cache_file_name: ptr::null_mut(),
        p_dvm_dex: dvm_dex,
    }));
    let dex_or_jar: &'static mut DexOrJar = Box::leak(Box::new(DexOrJar {
        file_name: ptr::null_mut(),
        is_dex: true,
        okay_to_free: true,
        p_raw_dex_file: raw,
        p_jar_file: ptr::null_mut(),
        p_dex_memory: ptr::null_mut(),
    }));
    *result = dex_or_jar as *mut DexOrJar as u64;
}

// 模拟布局猜错：在运行时内部写坏内存
pub(crate) unsafe extern "C" fn faulting_open_dex_file_bytes(_args: *const usize, _result: *mut u64) {
    fault_now();
}

pub(crate) unsafe extern "C" fn fake_raw_dex_open(
    file_name: *const c_char,
    odex_output_name: *const c_char,
    pp_raw_dex_file: *mut *mut c_void,
    _is_bootstrap: bool,
) -> c_int {
    let file_name = CStr::from_ptr(file_name).to_bytes();
    let odex_output_name = CStr::from_ptr(odex_output_name).to_bytes();
    if !file_name.ends_with(b".dex") || odex_output_name.is_empty() {
        return -1;
    }
    *pp_raw_dex_file = FAKE_DEX_OBJECT as *mut c_void;
    0
}

pub(crate) unsafe extern "C" fn faulting_raw_dex_open(
    _file_name: *const c_char,
    _odex_output_name: *const c_char,
    _pp_raw_dex_file: *mut *mut c_void,
    _is_bootstrap: bool,
) -> c_int {
    fault_now();
    0
}

pub(crate) unsafe fn dvm_dex_of(cookie: DexCookie) -> &'static DvmDex {
    let dex_or_jar = cookie as *const DexOrJar;
    &*(*(*dex_or_jar).p_raw_dex_file).p_dvm_dex
}

// 写一页 PROT_NONE 内存，必然触发 SIGSEGV
pub(crate) fn fault_now() {
    unsafe {
        let page = libc::mmap(
            ptr::null_mut(),
            4096,
            libc::PROT_NONE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        );
        assert_ne!(page, libc::MAP_FAILED);
        ptr::write_volatile(page as *mut u32, 0xdead_beef);
    }
}
