// 校验和服务：映射文件后流式计算 Adler-32，用于缓存校验
use crate::android::mapped_file::MappedFile;
use adler::Adler32;

// 每次喂给 Adler32 的块大小
const CHECKSUM_CHUNK: usize = 0x2000;

// 打开或映射失败时返回 0，调用方据此认为缓存无效
pub fn compute_checksum(path: &str) -> i64 {
    let Ok(mapped) = MappedFile::open(path) else {
        return 0;
    };

    let mut adler = Adler32::new();
    for chunk in mapped.as_slice().chunks(CHECKSUM_CHUNK) {
        adler.write_slice(chunk);
    }
    i64::from(adler.checksum())
}
