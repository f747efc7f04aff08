// 直接加载：在信号守卫保护下把 dex 字节交给 Dalvik，并补齐公开 API 通常会填写的字段

use super::host::{DexCookie, DexRuntime};
use super::layout::{self, InternalByteBuffer};
use super::profile::{EntryPoint, OpenDexFileBytesFn, RAW_DEX_OPEN_FAILED};
use super::DexContext;
use crate::android::mapped_file::MappedFile;
use crate::android::signal_guard;
use crate::errno::Errno;
use crate::log;
use std::ffi::{CString, c_void};
use std::ptr;

// path 与 bytes 至少提供一个；bytes 为空时从 path 映射文件，path 为空表示 zip 内的 dex
pub(crate) fn load_direct<R>(
    runtime: &mut R,
    context: &DexContext<R::Bindings>,
    path: Option<&R::Path>,
    bytes: Option<&R::Bytes>,
) -> Option<R::Object>
where
    R: DexRuntime,
{
    let result = signal_guard::with_guard(|| load_unguarded(runtime, context, path, bytes));
    match result {
        Ok(Ok(dex_file)) => Some(dex_file),
        Ok(Err(errno)) => {
            log::error(format_args!(
                "fail to load dex directly, errno={}",
                errno.as_i32()
            ));
            None
        }
        Err(Errno::SegvErr) => {
            log::error(format_args!("recover and skip crash"));
            None
        }
        Err(errno) => {
            log::error(format_args!(
                "fail to enter guarded load, errno={}",
                errno.as_i32()
            ));
            None
        }
    }
}

fn load_unguarded<R>(
    runtime: &mut R,
    context: &DexContext<R::Bindings>,
    path: Option<&R::Path>,
    bytes: Option<&R::Bytes>,
) -> Result<R::Object, Errno>
where
    R: DexRuntime,
{
    if path.is_none() && bytes.is_none() {
        return Err(Errno::InvalidArg);
    }

    let profile = context.profile();
    let cookie = match profile.entry_point {
        EntryPoint::LegacyMethod => open_with_legacy_method(runtime, context, path, bytes)?,
        EntryPoint::PrivateSymbol(open) => {
            open_with_private_symbol(runtime, context, open, path, bytes, false)?
        }
        EntryPoint::NewConstructor(open) => {
            open_with_private_symbol(runtime, context, open, path, bytes, true)?
        }
    };

    runtime.new_result_object(context.bindings(), cookie, path)
}

fn map_path<R>(runtime: &mut R, path: Option<&R::Path>) -> Result<MappedFile, Errno>
where
    R: DexRuntime,
{
    let path = path.ok_or(Errno::InvalidArg)?;
    let path = runtime.path_string(path)?;
    MappedFile::open(&path)
}

fn open_with_legacy_method<R>(
    runtime: &mut R,
    context: &DexContext<R::Bindings>,
    path: Option<&R::Path>,
    bytes: Option<&R::Bytes>,
) -> Result<DexCookie, Errno>
where
    R: DexRuntime,
{
    let created;
    let bytes = match bytes {
        Some(bytes) => bytes,
        None => {
            let mapped = map_path(runtime, path)?;
            created = runtime.new_bytes(mapped.as_slice())?;
            &created
        }
    };

    // 异常保持 pending，由 Java 层处理
    runtime.call_legacy_open(context.bindings(), bytes)
}

fn open_with_private_symbol<R>(
    runtime: &mut R,
    context: &DexContext<R::Bindings>,
    open: OpenDexFileBytesFn,
    path: Option<&R::Path>,
    bytes: Option<&R::Bytes>,
    backfill: bool,
) -> Result<DexCookie, Errno>
where
    R: DexRuntime,
{
    let layout = context.profile().layout;
    let buffer = match bytes {
        Some(bytes) => {
            runtime.with_bytes_critical(bytes, |data| layout::build_argument_buffer(layout, data))??
        }
        None => {
            let mapped = map_path(runtime, path)?;
            layout::build_argument_buffer(layout, mapped.as_slice())?
        }
    };

    let cookie = unsafe { invoke_open_dex_file_bytes(open, &buffer) };
    if runtime.exception_pending() {
        return Err(Errno::PendingException);
    }

    if backfill {
        let created;
        let wrapper_bytes = match bytes {
            Some(bytes) => bytes,
            None => {
                created = runtime.new_bytes(buffer.payload())?;
                &created
            }
        };
        let dex_object = runtime.new_dex_wrapper(context.bindings(), wrapper_bytes)?;
        unsafe {
            layout::backfill_dex_object(cookie, dex_object, context.profile().vendor_quirk)?;
        }
    }

    Ok(cookie)
}

// Dalvik 会复制参数数组中的数据，调用返回后缓冲区即可释放
unsafe fn invoke_open_dex_file_bytes(
    open: OpenDexFileBytesFn,
    buffer: &InternalByteBuffer,
) -> DexCookie {
    let args: [usize; 1] = [buffer.as_array_object() as usize];
    let mut result: u64 = 0;
    open(args.as_ptr(), &mut result);
    result as DexCookie
}

// 调用 dvmRawDexFileOpen 预生成 odex 文件
pub(crate) fn make_opt_dex_file<B>(context: &DexContext<B>, path: &str, opt_path: &str) -> bool {
    let Some(raw_dex_open) = context.profile().raw_dex_open else {
        return false;
    };
    let (Ok(file_name), Ok(odex_output_name)) = (CString::new(path), CString::new(opt_path)) else {
        return false;
    };

    let result = signal_guard::with_guard(|| {
        let mut raw_dex_file: *mut c_void = ptr::null_mut();
        unsafe {
            raw_dex_open(
                file_name.as_ptr(),
                odex_output_name.as_ptr(),
                &mut raw_dex_file,
                false,
            )
        }
    });

    match result {
        Ok(code) => code != RAW_DEX_OPEN_FAILED,
        Err(Errno::SegvErr) => {
            log::error(format_args!("recover and skip crash"));
            false
        }
        Err(errno) => {
            log::error(format_args!(
                "fail to enter guarded opt, errno={}",
                errno.as_i32()
            ));
            false
        }
    }
}
