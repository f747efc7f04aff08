use boost_multidex::obtain_checksum;

use crate::test_ctx::{scratch_file, scratch_missing};

pub unsafe fn scenario_checksum_reference() {
    let path = scratch_file("wikipedia.txt", b"Wikipedia");
    let sum = obtain_checksum(path.to_str().expect("utf8 path"));
    assert_eq!(sum, 0x11E6_0398, "adler32 mismatch");

    // 跨越多个分块的大文件与一次性计算结果一致
    let data: Vec<u8> = (0..0x9000u32).map(|i| (i * 7 + 3) as u8).collect();
    let path = scratch_file("chunked.bin", &data);
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for byte in &data {
        a = (a + *byte as u32) % 65521;
        b = (b + a) % 65521;
    }
    let expected = ((b << 16) | a) as i64;
    assert_eq!(
        obtain_checksum(path.to_str().expect("utf8 path")),
        expected,
        "chunked adler32 mismatch"
    );
}

pub unsafe fn scenario_checksum_edge_files() {
    let path = scratch_file("empty.bin", b"");
    assert_eq!(obtain_checksum(path.to_str().expect("utf8 path")), 1);

    let path = scratch_missing("absent.bin");
    assert_eq!(obtain_checksum(path.to_str().expect("utf8 path")), 0);
}
