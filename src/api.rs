use crate::android::signal_guard;
use crate::android::system_props::PropertySource;
use crate::checksum;
use crate::config::ResolverConfig;
use crate::errno::Errno;
use crate::log;
use crate::runtime::{self, DexContext, DexRuntime, DlLibrary};

// 启用时输出 DEBUG 日志
pub fn set_debug(debug: bool) {
    log::set_debug_enabled(debug);
}

// 文件的 Adler-32，失败时为 0
pub fn obtain_checksum(path: &str) -> i64 {
    checksum::compute_checksum(path)
}

// 一次性解析运行时 ABI 并安装信号守卫，必须先于任何加载操作调用，调用方负责串行化
pub fn initialize<R, P>(
    runtime: &mut R,
    config: &ResolverConfig,
    props: &P,
) -> Result<DexContext<R::Bindings>, Errno>
where
    R: DexRuntime,
    P: PropertySource + ?Sized,
{
    let library = DlLibrary::open(config.runtime_library);
    runtime::resolve(runtime, config, library.as_ref(), props)
}

// 绕过公开 API 直接把 dex 交给 Dalvik，失败（含被拦截的崩溃）时返回 None
pub fn load_direct_dex<R>(
    runtime: &mut R,
    context: &DexContext<R::Bindings>,
    path: Option<&R::Path>,
    bytes: Option<&R::Bytes>,
) -> Option<R::Object>
where
    R: DexRuntime,
{
    runtime::load_direct(runtime, context, path, bytes)
}

// 预生成 odex，符号缺失、返回失败或崩溃被拦截时为 false
pub fn make_opt_dex_file<B>(context: &DexContext<B>, path: &str, opt_path: &str) -> bool {
    runtime::make_opt_dex_file(context, path, opt_path)
}

// 把 SIGSEGV 处理交还给安装前的处理器（例如崩溃收集），可重复调用
pub fn recover_action() {
    signal_guard::uninstall();
}
