// 一次性解析：确定 SDK/厂商差异、私有入口与参数布局，并安装信号守卫

use super::host::DexRuntime;
use super::layout::ArgumentLayout;
use super::library::RuntimeLibrary;
use super::probe;
use super::profile::{EntryPoint, OpenDexFileBytesFn, RawDexFileOpenFn, RuntimeProfile, VendorQuirk};
use super::DexContext;
use crate::android::signal_guard;
use crate::android::system_props::PropertySource;
use crate::config::ResolverConfig;
use crate::errno::Errno;
use crate::log;
use crate::version;
use jni::sys::JNINativeMethod;
use regex::Regex;
use std::ffi::CStr;

const OPEN_DEX_FILE_NAME: &CStr = c"openDexFile";
const OPEN_DEX_FILE_SIGNATURE: &CStr = c"([B)I";
const BRAND_PROPERTY: &str = "ro.product.brand";
const MANUFACTURER_PROPERTY: &str = "ro.product.manufacturer";

pub(crate) fn resolve<R, L, P>(
    runtime: &mut R,
    config: &ResolverConfig,
    library: Option<&L>,
    props: &P,
) -> Result<DexContext<R::Bindings>, Errno>
where
    R: DexRuntime,
    L: RuntimeLibrary + ?Sized,
    P: PropertySource + ?Sized,
{
    probe::check_support(config, props)?;
    log::info(format_args!(
        "{} resolving runtime for sdk {}",
        version::version_str_full(),
        config.sdk_version
    ));

    let mut bindings = runtime.bind_result_type()?;

    let Some(library) = library else {
        log::error(format_args!(
            "runtime module {} not found",
            config.runtime_library.to_string_lossy()
        ));
        return Err(Errno::RuntimeNotFound);
    };

    let raw_dex_open = resolve_raw_dex_open(library, config);

    let mut legacy_method = false;
    let mut vendor_quirk = VendorQuirk::None;
    if config.uses_legacy_method() {
        legacy_method = runtime.bind_legacy_open(&mut bindings);
    } else {
        runtime.bind_dex_wrapper(&mut bindings)?;
        vendor_quirk = detect_vendor_quirk(props, &config.vendor_brand);
    }

    let entry_point = if legacy_method {
        EntryPoint::LegacyMethod
    } else {
        let open = resolve_open_dex_file_bytes(library, config)?;
        if config.uses_legacy_method() {
            EntryPoint::PrivateSymbol(open)
        } else {
            EntryPoint::NewConstructor(open)
        }
    };

    if let Err(errno) = signal_guard::install() {
        log::error(format_args!("fail to set signal handler"));
        return Err(errno);
    }

    log::info(format_args!(
        "runtime resolved entry={} quirk={:?} opt={}",
        entry_point.name(),
        vendor_quirk,
        raw_dex_open.is_some()
    ));

    Ok(DexContext::new(
        RuntimeProfile {
            sdk_version: config.sdk_version,
            vendor_quirk,
            entry_point,
            layout: ArgumentLayout::DalvikArrayObject,
            raw_dex_open,
        },
        bindings,
    ))
}

// 仅用于预生成 odex，缺失不影响主加载路径
fn resolve_raw_dex_open<L>(library: &L, config: &ResolverConfig) -> Option<RawDexFileOpenFn>
where
    L: RuntimeLibrary + ?Sized,
{
    let symbol = library.symbol(config.raw_dex_open_symbol);
    if symbol.is_null() {
        log::warn(format_args!("fail to get dvm func"));
        return None;
    }
    Some(unsafe { std::mem::transmute::<*mut libc::c_void, RawDexFileOpenFn>(symbol) })
}

fn resolve_open_dex_file_bytes<L>(
    library: &L,
    config: &ResolverConfig,
) -> Result<OpenDexFileBytesFn, Errno>
where
    L: RuntimeLibrary + ?Sized,
{
    let table = library.symbol(config.native_table_symbol) as *const JNINativeMethod;
    if table.is_null() {
        log::error(format_args!(
            "fail to find {}",
            config.native_table_symbol.to_string_lossy()
        ));
        return Err(Errno::SymbolMissing);
    }

    unsafe { find_native_method(table, OPEN_DEX_FILE_NAME, OPEN_DEX_FILE_SIGNATURE) }.ok_or_else(
        || {
            log::error(format_args!("openDexFile([B)I not in native table"));
            Errno::MethodMissing
        },
    )
}

// 线性扫描以空名称结尾的 native 方法表，取第一个匹配项。
// 与 Dalvik 上一直使用的探测方式保持一致：名称与签名都只比较目标名称长度的前缀，
// 因此 openDexFileNative 之类同前缀的条目在签名也匹配时会被命中
pub(super) unsafe fn find_native_method(
    table: *const JNINativeMethod,
    name: &CStr,
    signature: &CStr,
) -> Option<OpenDexFileBytesFn> {
    let len_name = name.to_bytes().len();
    let mut entry = table;
    while !(*entry).name.is_null() {
        if libc::strncmp(name.as_ptr(), (*entry).name, len_name) == 0
            && libc::strncmp(signature.as_ptr(), (*entry).signature, len_name) == 0
        {
            if (*entry).fnPtr.is_null() {
                return None;
            }
            return Some(std::mem::transmute::<*mut libc::c_void, OpenDexFileBytesFn>(
                (*entry).fnPtr,
            ));
        }
        entry = entry.add(1);
    }
    None
}

// 品牌或制造商以指定前缀开头（不区分大小写）时启用厂商差异
pub(super) fn detect_vendor_quirk<P>(props: &P, brand: &str) -> VendorQuirk
where
    P: PropertySource + ?Sized,
{
    if brand.is_empty() {
        return VendorQuirk::None;
    }
    let Ok(pattern) = Regex::new(&format!("(?i)^{}", regex::escape(brand))) else {
        return VendorQuirk::None;
    };

    for property in [BRAND_PROPERTY, MANUFACTURER_PROPERTY] {
        if let Some(value) = props.get(property)
            && pattern.is_match(&value)
        {
            log::info(format_args!("vendor quirk matched {property}={value}"));
            return VendorQuirk::Htc;
        }
    }
    VendorQuirk::None
}

#[cfg(test)]
mod tests;
