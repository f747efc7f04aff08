use std::collections::HashMap;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use boost_multidex::{
    ArgumentLayout, BoostErrno, DexContext, DexCookie, DexRuntime, EntryPoint, PropertySource,
    RuntimeProfile, VendorQuirk,
};

pub const STUB_COOKIE: DexCookie = 0x5a5a;

pub static STUB_OPEN_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static STUB_RAW_OPEN_COUNT: AtomicUsize = AtomicUsize::new(0);

// 不依赖 JVM 的运行时：路径是字符串，字节数组是 Vec，结果对象就是 cookie
#[derive(Default)]
pub struct NullRuntime {
    pub result_paths: Vec<Option<String>>,
}

impl DexRuntime for NullRuntime {
    type Bindings = ();
    type Path = String;
    type Bytes = Vec<u8>;
    type Object = DexCookie;

    fn bind_result_type(&mut self) -> Result<(), BoostErrno> {
        Ok(())
    }

    fn bind_legacy_open(&mut self, _bindings: &mut ()) -> bool {
        false
    }

    fn bind_dex_wrapper(&mut self, _bindings: &mut ()) -> Result<(), BoostErrno> {
        Err(BoostErrno::ClassMissing)
    }

    fn path_string(&mut self, path: &String) -> Result<String, BoostErrno> {
        Ok(path.clone())
    }

    fn new_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>, BoostErrno> {
        Ok(data.to_vec())
    }

    fn with_bytes_critical<T>(
        &mut self,
        bytes: &Vec<u8>,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, BoostErrno> {
        Ok(f(bytes))
    }

    fn call_legacy_open(&mut self, _bindings: &(), _bytes: &Vec<u8>) -> Result<DexCookie, BoostErrno> {
        Err(BoostErrno::MethodMissing)
    }

    fn exception_pending(&mut self) -> bool {
        false
    }

    fn new_dex_wrapper(&mut self, _bindings: &(), _bytes: &Vec<u8>) -> Result<*mut c_void, BoostErrno> {
        Err(BoostErrno::ClassMissing)
    }

    fn new_result_object(
        &mut self,
        _bindings: &(),
        cookie: DexCookie,
        path: Option<&String>,
    ) -> Result<DexCookie, BoostErrno> {
        self.result_paths.push(path.cloned());
        Ok(cookie)
    }
}

pub struct StaticProps(HashMap<&'static str, &'static str>);

impl StaticProps {
    pub fn with(entries: &[(&'static str, &'static str)]) -> Self {
        Self(entries.iter().copied().collect())
    }
}

impl PropertySource for StaticProps {
    fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).map(|value| value.to_string())
    }
}

pub unsafe extern "C" fn stub_open_dex_file_bytes(args: *const usize, result: *mut u64) {
    STUB_OPEN_COUNT.fetch_add(1, Ordering::Relaxed);
    if args.is_null() || *args == 0 {
        *result = 0;
        return;
    }
    *result = STUB_COOKIE as u64;
}

pub unsafe extern "C" fn stub_raw_dex_open(
    file_name: *const c_char,
    _odex_output_name: *const c_char,
    _pp_raw_dex_file: *mut *mut c_void,
    _is_bootstrap: bool,
) -> c_int {
    STUB_RAW_OPEN_COUNT.fetch_add(1, Ordering::Relaxed);
    let name = CStr::from_ptr(file_name).to_string_lossy();
    if name.ends_with(".dex") { 0 } else { -1 }
}

pub fn stub_context(with_raw_open: bool) -> DexContext<()> {
    let profile = RuntimeProfile {
        sdk_version: 19,
        vendor_quirk: VendorQuirk::None,
        entry_point: EntryPoint::PrivateSymbol(stub_open_dex_file_bytes),
        layout: ArgumentLayout::DalvikArrayObject,
        raw_dex_open: if with_raw_open {
            Some(stub_raw_dex_open)
        } else {
            None
        },
    };
    DexContext::new(profile, ())
}

pub fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dex_test_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir failed");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write scratch file failed");
    path
}

pub fn scratch_missing(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("dex_test_{}", std::process::id()))
        .join(name)
}
