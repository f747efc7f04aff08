// 解析结果：进程生命周期内只生成一次，之后只读
use super::layout::ArgumentLayout;
use std::ffi::{c_char, c_int, c_void};

// Dalvik native 方法的调用约定：void (*)(const u4* args, JValue* pResult)
// Dalvik 只运行在 32 位进程中，u4 参数槽与指针同宽
pub type OpenDexFileBytesFn = unsafe extern "C" fn(args: *const usize, result: *mut u64);

// int dvmRawDexFileOpen(const char*, const char*, RawDexFile**, bool)
pub type RawDexFileOpenFn = unsafe extern "C" fn(
    file_name: *const c_char,
    odex_output_name: *const c_char,
    pp_raw_dex_file: *mut *mut c_void,
    is_bootstrap: bool,
) -> c_int;

// dvmRawDexFileOpen 的失败返回值
pub const RAW_DEX_OPEN_FAILED: c_int = -1;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VendorQuirk {
    None,
    // HTC 固件在 DvmDex 中多出一个 Dex 对象字段，两者都要回填
    Htc,
}

// 直接加载时使用的入口，三者互斥，解析后不再变化
#[derive(Copy, Clone, Debug)]
pub enum EntryPoint {
    // SDK < 19 的公开静态方法 DexFile.openDexFile([B)I，方法 ID 保存在 bindings 中
    LegacyMethod,
    // 私有 native 方法，无需回填 Dex 对象
    PrivateSymbol(OpenDexFileBytesFn),
    // 私有 native 方法 + 用 com.android.dex.Dex(byte[]) 构造对象回填 DvmDex
    NewConstructor(OpenDexFileBytesFn),
}

impl EntryPoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LegacyMethod => "legacy-method",
            Self::PrivateSymbol(_) => "private-symbol",
            Self::NewConstructor(_) => "new-constructor",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RuntimeProfile {
    pub sdk_version: i32,
    pub vendor_quirk: VendorQuirk,
    pub entry_point: EntryPoint,
    pub layout: ArgumentLayout,
    // 预生成 odex 用，缺失时 make_opt_dex_file 直接失败
    pub raw_dex_open: Option<RawDexFileOpenFn>,
}
