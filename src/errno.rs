// 操作错误码，仅在 JNI 边界被转换为布尔值、空对象或异常
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Errno {
    Uninit = 1,           // 未初始化
    InvalidArg = 2,       // 参数无效
    RuntimeNotFound = 3,  // libdvm.so 打开失败
    SymbolMissing = 4,    // 私有符号或 native 方法表缺失
    MethodMissing = 5,    // 方法表中找不到 openDexFile([B)I
    ClassMissing = 6,     // Java 类或成员解析失败
    UnsupportedVm = 7,    // 当前虚拟机不支持快速加载
    SigHandler = 8,       // 信号处理器安装失败
    OpenFile = 9,         // 打开文件失败
    MapFile = 10,         // 映射文件失败
    NoMem = 11,           // 内存分配失败
    PendingException = 12, // Java 层存在未处理异常
    GuardBusy = 13,       // 守卫已处于武装状态
    Jni = 14,             // 其他 JNI 调用失败
    SegvErr = 15,         // 信号保护触发
}

impl Errno {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    // 初始化阶段需要以调用方异常类抛出的错误及其描述
    pub const fn exception_message(self) -> Option<&'static str> {
        match self {
            Self::RuntimeNotFound => Some("Fail to find dvm"),
            Self::SymbolMissing => Some("Fail to find DexFile symbols"),
            _ => None,
        }
    }
}

impl From<Errno> for i32 {
    fn from(value: Errno) -> Self {
        value as i32
    }
}

impl From<jni::errors::Error> for Errno {
    fn from(value: jni::errors::Error) -> Self {
        match value {
            jni::errors::Error::JavaException => Self::PendingException,
            jni::errors::Error::MethodNotFound { .. } | jni::errors::Error::FieldNotFound { .. } => {
                Self::ClassMissing
            }
            _ => Self::Jni,
        }
    }
}
