const VERSION_STR: &str = env!("CARGO_PKG_VERSION");

#[cfg(target_arch = "arm")]
const VERSION_ARCH: &str = "arm";
#[cfg(target_arch = "x86")]
const VERSION_ARCH: &str = "x86";
#[cfg(not(any(target_arch = "arm", target_arch = "x86")))]
const VERSION_ARCH: &str = "host";

pub fn version_str() -> &'static str {
    VERSION_STR
}

// 返回包含库名和架构的完整版本字符串
pub fn version_str_full() -> String {
    format!("boost_multidex {} ({})", version_str(), VERSION_ARCH)
}
