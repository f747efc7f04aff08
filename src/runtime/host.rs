// 托管运行时一侧的操作抽象：解析与加载逻辑只通过该 trait 访问 Java 层
//
// JNI 实现见 bridge::env_runtime，测试中以记录调用的假实现替代。

use crate::errno::Errno;
use std::ffi::c_void;

// Dalvik 为新打开的 dex 生成的内部记录句柄（DexOrJar*）
pub type DexCookie = usize;

pub trait DexRuntime {
    // initialize 阶段缓存的类、字段与方法句柄，进程生命周期内有效
    type Bindings;
    type Path;
    type Bytes;
    type Object;

    // dalvik.system.DexFile 的 mCookie/mFileName/guard 字段与 CloseGuard.get()
    fn bind_result_type(&mut self) -> Result<Self::Bindings, Errno>;
    // DexFile.openDexFile([B)I，解析失败时清除异常并返回 false
    fn bind_legacy_open(&mut self, bindings: &mut Self::Bindings) -> bool;
    // com.android.dex.Dex 及其 (byte[]) 构造函数
    fn bind_dex_wrapper(&mut self, bindings: &mut Self::Bindings) -> Result<(), Errno>;

    fn path_string(&mut self, path: &Self::Path) -> Result<String, Errno>;
    fn new_bytes(&mut self, data: &[u8]) -> Result<Self::Bytes, Errno>;
    // 在临界区内访问托管字节数组，闭包中不得回调运行时
    fn with_bytes_critical<T>(
        &mut self,
        bytes: &Self::Bytes,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, Errno>;

    fn call_legacy_open(
        &mut self,
        bindings: &Self::Bindings,
        bytes: &Self::Bytes,
    ) -> Result<DexCookie, Errno>;
    fn exception_pending(&mut self) -> bool;
    // 构造 Dex 对象并返回其全局引用，引用的所有权转交给 Dalvik 的 DvmDex
    fn new_dex_wrapper(
        &mut self,
        bindings: &Self::Bindings,
        bytes: &Self::Bytes,
    ) -> Result<*mut c_void, Errno>;
    // 分配 DexFile 并填充 cookie、文件名与 CloseGuard
    fn new_result_object(
        &mut self,
        bindings: &Self::Bindings,
        cookie: DexCookie,
        path: Option<&Self::Path>,
    ) -> Result<Self::Object, Errno>;
}
