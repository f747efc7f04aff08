// 快速加载的前置探测：ART 与 YunOS 上不存在可用的 Dalvik 私有入口
use crate::android::system_props::PropertySource;
use crate::config::{LEGACY_SDK_THRESHOLD, ResolverConfig};
use crate::errno::Errno;
use crate::log;

const VM_LIB_PROPERTY: &str = "persist.sys.dalvik.vm.lib";
const ART_LIB_NAME: &str = "libart.so";
const YUNOS_VERSION_PROPERTY: &str = "ro.yunos.version";

pub fn check_support<P>(config: &ResolverConfig, props: &P) -> Result<(), Errno>
where
    P: PropertySource + ?Sized,
{
    // SDK 19 可以在设置中切换到 ART
    if config.sdk_version >= LEGACY_SDK_THRESHOLD {
        let vm_lib = props.get(VM_LIB_PROPERTY);
        log::info(format_args!("VM lib is {}", vm_lib.as_deref().unwrap_or("")));
        if vm_lib.as_deref() == Some(ART_LIB_NAME) {
            log::warn(format_args!("VM lib is art, skip!"));
            return Err(Errno::UnsupportedVm);
        }
    }

    let yunos_version = props.get(YUNOS_VERSION_PROPERTY);
    if yunos_version.is_some() || config.yunos_marker_path.exists() {
        log::warn(format_args!(
            "Yun os is {}, skip boost!",
            yunos_version.as_deref().unwrap_or("")
        ));
        return Err(Errno::UnsupportedVm);
    }

    Ok(())
}
