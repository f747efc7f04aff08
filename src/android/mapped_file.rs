// 文件的只读共享映射，映射成功后立即关闭 fd，由映射本身保持数据有效

use crate::errno::Errno;
use crate::log;
use std::ffi::{CString, c_void};
use std::ptr;

// 对被信号打断的系统调用透明重试，等价于 TEMP_FAILURE_RETRY
fn retry_eintr<T, F>(mut call: F) -> T
where
    T: PartialEq + From<i8>,
    F: FnMut() -> T,
{
    loop {
        let result = call();
        if result != T::from(-1) || last_errno() != libc::EINTR {
            return result;
        }
    }
}

// mmap 以 MAP_FAILED 表示失败，单独处理
fn retry_eintr_mmap<F>(mut call: F) -> *mut c_void
where
    F: FnMut() -> *mut c_void,
{
    loop {
        let base = call();
        if base != libc::MAP_FAILED || last_errno() != libc::EINTR {
            return base;
        }
    }
}

fn last_errno() -> libc::c_int {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or_default()
}

pub struct MappedFile {
    base: *mut c_void,
    len: usize,
}

impl MappedFile {
    pub fn open(path: &str) -> Result<Self, Errno> {
        let c_path = CString::new(path).map_err(|_| Errno::InvalidArg)?;

        let fd = retry_eintr(|| unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC) });
        if fd == -1 {
            log::error(format_args!("fail to open {path}"));
            return Err(Errno::OpenFile);
        }

        let end = retry_eintr(|| unsafe { libc::lseek(fd, 0, libc::SEEK_END) });
        if end < 0 {
            log::error(format_args!("fail to seek {path}"));
            unsafe {
                libc::close(fd);
            }
            return Err(Errno::OpenFile);
        }
        let len = end as usize;
        log::debug(format_args!("mapping file size is {len}"));

        // 长度为 0 时 mmap 返回 EINVAL，空文件直接视为空映射
        if len == 0 {
            unsafe {
                libc::close(fd);
            }
            return Ok(Self {
                base: ptr::null_mut(),
                len: 0,
            });
        }

        let base = retry_eintr_mmap(|| unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                fd,
                0,
            )
        });
        // close 在 EINTR 后 fd 状态未定义，不重试
        unsafe {
            libc::close(fd);
        }

        if base == libc::MAP_FAILED {
            log::error(format_args!("fail to map file {path}"));
            return Err(Errno::MapFile);
        }

        Ok(Self { base, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.base as *const u8, self.len) }
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        unsafe {
            libc::munmap(self.base, self.len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MappedFile, retry_eintr_mmap};
    use crate::errno::Errno;
    use std::ffi::c_void;
    use std::io::Write;

    fn set_errno(value: libc::c_int) {
        unsafe {
            #[cfg(target_os = "android")]
            {
                *libc::__errno() = value;
            }
            #[cfg(not(target_os = "android"))]
            {
                *libc::__errno_location() = value;
            }
        }
    }

    #[test]
    fn mmap_is_retried_after_eintr() {
        let mut attempts = 0;
        let base = retry_eintr_mmap(|| {
            attempts += 1;
            if attempts < 3 {
                set_errno(libc::EINTR);
                libc::MAP_FAILED
            } else {
                0x1000 as *mut c_void
            }
        });
        assert_eq!(base, 0x1000 as *mut c_void);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn mmap_failure_other_than_eintr_is_not_retried() {
        let mut attempts = 0;
        let base = retry_eintr_mmap(|| {
            attempts += 1;
            set_errno(libc::ENOMEM);
            libc::MAP_FAILED
        });
        assert_eq!(base, libc::MAP_FAILED);
        assert_eq!(attempts, 1);
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("boost_multidex_map_{}_{name}", std::process::id()))
    }

    #[test]
    fn maps_whole_file_contents() {
        let path = temp_path("contents.dex");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"dex\n035\0payload").unwrap();
        drop(file);

        let mapped = MappedFile::open(path.to_str().unwrap()).expect("map should succeed");
        assert_eq!(mapped.len(), 15);
        assert_eq!(mapped.as_slice(), b"dex\n035\0payload");
        drop(mapped);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_file_maps_to_empty_slice() {
        let path = temp_path("empty.dex");
        std::fs::File::create(&path).unwrap();

        let mapped = MappedFile::open(path.to_str().unwrap()).expect("empty file is not an error");
        assert!(mapped.is_empty());
        assert!(mapped.as_slice().is_empty());
        drop(mapped);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_reports_open_error() {
        let path = temp_path("missing.dex");
        assert_eq!(
            MappedFile::open(path.to_str().unwrap()).err(),
            Some(Errno::OpenFile)
        );
    }

    #[test]
    fn interior_nul_is_invalid_arg() {
        assert_eq!(MappedFile::open("bad\0path").err(), Some(Errno::InvalidArg));
    }
}
