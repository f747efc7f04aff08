#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]

#[cfg(all(not(target_os = "android"), not(any(clippy, test, doc))))]
compile_error!("boost_multidex supports Android only (use cargo clippy/test/doc on host for development)");

#[cfg(all(target_os = "android", not(any(target_arch = "arm", target_arch = "x86"))))]
compile_error!("boost_multidex targets the Dalvik VM, which only ships on 32-bit arm and x86");

// 公共 API 层：校验和、初始化、直接加载 dex、恢复信号处理
mod api;
// JNI 导出函数与 JNIEnv 上的运行时实现
mod bridge;
// 校验和服务：mmap 文件后计算 Adler-32
mod checksum;
// 解析阶段的可配置项
mod config;
// 错误码定义
mod errno;
// 日志输出，使用 Android logcat
mod log;
// Android 相关：文件映射、系统属性与信号守卫
mod android;
// Dalvik 运行时 ABI 解析与直接加载
mod runtime;
// 版本信息
mod version;

pub use android::system_props::{PropertySource, SystemProperties};
pub use api::{
    initialize, load_direct_dex, make_opt_dex_file, obtain_checksum, recover_action, set_debug,
};
pub use config::ResolverConfig;
pub use errno::Errno as BoostErrno;
pub use runtime::{
    ArgumentLayout, DexContext, DexCookie, DexRuntime, EntryPoint, RuntimeProfile, VendorQuirk,
};
