//! 结构数组与传输缓冲的配置。
//!
//! # 契约说明（What）
//! - 配置以 TOML 表达，未出现的键取缺省值，未知键视为错误；
//! - `[array]` 对应 [`ArrayOptions`]，`[buffer]` 对应 [`BufferOptions`]。
//!
//! ```toml
//! [array]
//! capacity_mutable = true
//! immutable = false
//! put_policy = "atomic"
//! initial_capacity = 0
//!
//! [buffer]
//! capacity = 16384
//! byte_order = "big_endian"
//! read_chunk = 4096
//! ```

use pvdata_buffer::BufferOptions;
use serde::Deserialize;

use crate::error::OptionsError;

/// `put` 遇到类型不符元素时的行为。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutPolicy {
    /// 先校验全部源元素，任何不符都不修改容器。
    #[default]
    Atomic,
    /// 逐个写入，遇到不符立即中止；此前写入的槽位保持已写状态。
    Legacy,
}

/// 容器构造参数。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrayOptions {
    pub capacity_mutable: bool,
    pub immutable: bool,
    pub put_policy: PutPolicy,
    /// 构造时预分配的空槽数量。
    pub initial_capacity: usize,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            capacity_mutable: true,
            immutable: false,
            put_policy: PutPolicy::default(),
            initial_capacity: 0,
        }
    }
}

/// 顶层配置。
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvDataOptions {
    pub array: ArrayOptions,
    pub buffer: BufferOptions,
}

impl PvDataOptions {
    /// 解析 TOML 并校验取值；`buffer.capacity` 为 0 时返回 [`OptionsError::Invalid`]。
    pub fn from_toml_str(source: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.buffer.capacity == 0 {
            return Err(OptionsError::Invalid {
                key: "buffer.capacity",
                reason: "must be greater than 0",
            });
        }
        Ok(())
    }
}
