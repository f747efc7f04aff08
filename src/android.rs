// Android 平台相关功能的模块入口

// 只读文件映射：open + lseek + mmap，drop 时 munmap
pub mod mapped_file;
// 信号守卫：sigsetjmp/siglongjmp 保护对 Dalvik 私有入口的调用
pub mod signal_guard;
// 系统属性读取（ro.product.brand 等）
pub mod system_props;
