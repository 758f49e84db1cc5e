use serde::Deserialize;

/// 多字节数值在线上的字节序。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// 网络字节序，与对端默认约定一致。
    #[default]
    BigEndian,
    LittleEndian,
}

/// `BufferOptions` 描述传输缓冲的尺寸与字节序。
///
/// # 契约说明（What）
/// - `capacity`：缓冲可同时容纳的最大字节数，必须大于 0；序列化时单个定长字段不得超过该值；
/// - `byte_order`：写入与读取多字节数值所使用的字节序；
/// - `read_chunk`：拉取型数据源单次补充的最大字节数。
///
/// 缺省值为 16 KiB 容量、大端、4 KiB 拉取块。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferOptions {
    pub capacity: usize,
    pub byte_order: ByteOrder,
    pub read_chunk: usize,
}

impl BufferOptions {
    pub const DEFAULT_CAPACITY: usize = 16 * 1024;
    pub const DEFAULT_READ_CHUNK: usize = 4 * 1024;
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            byte_order: ByteOrder::default(),
            read_chunk: Self::DEFAULT_READ_CHUNK,
        }
    }
}
