// 运行时 ABI 解析所需的配置项，默认值对应原生 Dalvik 构建
use std::ffi::CStr;
use std::path::PathBuf;

// SDK 19 起 DexFile.openDexFile([B)I 不再可用，改走私有符号 + com.android.dex.Dex
pub const LEGACY_SDK_THRESHOLD: i32 = 19;

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub sdk_version: i32,
    pub runtime_library: &'static CStr,
    // Dalvik 为 dalvik.system.DexFile 注册的 native 方法表
    pub native_table_symbol: &'static CStr,
    // dvmRawDexFileOpen(const char*, const char*, RawDexFile**, bool)
    pub raw_dex_open_symbol: &'static CStr,
    pub legacy_sdk_threshold: i32,
    // 需要同时回填两个 Dex 对象字段的厂商前缀（不区分大小写）
    pub vendor_brand: String,
    // YunOS 自带的虚拟机库，存在时放弃快速加载
    pub yunos_marker_path: PathBuf,
}

impl ResolverConfig {
    pub fn for_sdk(sdk_version: i32) -> Self {
        Self {
            sdk_version,
            ..Self::default()
        }
    }

    pub fn uses_legacy_method(&self) -> bool {
        self.sdk_version < self.legacy_sdk_threshold
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            sdk_version: 0,
            runtime_library: c"libdvm.so",
            native_table_symbol: c"dvm_dalvik_system_DexFile",
            raw_dex_open_symbol: c"_Z17dvmRawDexFileOpenPKcS0_PP10RawDexFileb",
            legacy_sdk_threshold: LEGACY_SDK_THRESHOLD,
            vendor_brand: "htc".to_string(),
            yunos_marker_path: PathBuf::from("/system/lib/libvmkid_lemur.so"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResolverConfig;

    #[test]
    fn threshold_splits_legacy_and_new_paths() {
        assert!(ResolverConfig::for_sdk(14).uses_legacy_method());
        assert!(ResolverConfig::for_sdk(18).uses_legacy_method());
        assert!(!ResolverConfig::for_sdk(19).uses_legacy_method());
        assert!(!ResolverConfig::for_sdk(20).uses_legacy_method());
    }

    #[test]
    fn defaults_target_libdvm() {
        let config = ResolverConfig::for_sdk(17);
        assert_eq!(config.runtime_library.to_bytes(), b"libdvm.so");
        assert_eq!(config.vendor_brand, "htc");
        assert_eq!(config.sdk_version, 17);
    }
}
