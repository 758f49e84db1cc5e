//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 以结构化错误值取代“向字段消息通道写一段人类可读字符串”的做法，调用方直接匹配错误种类；
//! - 区分可恢复的局部条件（只读、容量固定、越界）与必须中止当前操作的条件（类型不符、传输失败）。
//!
//! ## 设计要求（What）
//! - 所有错误派生 `thiserror::Error`；
//! - `code()` 返回 `<领域>.<语义>` 形式的稳定码值，与日志字段对齐；
//! - `is_recoverable()` 为批量调用方提供“是否可以继续下一项”的判定。

use pvdata_buffer::CodecError;
use thiserror::Error;

use crate::structure::ScalarType;

/// 结构数组容器的错误域。
#[derive(Debug, Error)]
pub enum ArrayError {
    /// 对只读容器执行了变更操作，操作没有产生任何效果。
    #[error("structure array is immutable; `{operation}` rejected")]
    ImmutableViolation { operation: &'static str },

    /// 容量被冻结时尝试改变容量。
    #[error("structure array capacity is not mutable: requested {requested}, current {capacity}")]
    CapacityFixed { requested: usize, capacity: usize },

    /// 传入元素的结构类型与容器绑定的类型不一致。
    ///
    /// `index` 为出错元素在源序列中的下标。
    #[error("element {index} has structure `{actual}`, expected `{expected}`")]
    TypeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    /// 访问区间 `[offset, offset + count)` 超出 `bound`。
    #[error("range {offset}+{count} exceeds bound {bound}")]
    OutOfBounds {
        offset: usize,
        count: usize,
        bound: usize,
    },

    /// 扩容时无法为 `requested` 个槽位分配槽位表，容器状态不变。
    ///
    /// 常见于对端发送了超出进程内存能力的尺寸头。
    #[error("cannot allocate structure array slot table for {requested} slots")]
    Allocation { requested: usize },

    /// 编解码过程中的缓冲、协议或传输错误。
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ArrayError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            ArrayError::ImmutableViolation { .. } => "array.immutable",
            ArrayError::CapacityFixed { .. } => "array.capacity_fixed",
            ArrayError::TypeMismatch { .. } => "array.type_mismatch",
            ArrayError::OutOfBounds { .. } => "array.out_of_bounds",
            ArrayError::Allocation { .. } => "array.allocation",
            ArrayError::Codec(err) => err.code(),
        }
    }

    /// 局部且无副作用的拒绝返回 `true`；类型不符、分配失败与传输错误会中止操作，返回 `false`。
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArrayError::ImmutableViolation { .. }
                | ArrayError::CapacityFixed { .. }
                | ArrayError::OutOfBounds { .. }
        )
    }
}

/// 结构描述与字段访问错误。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("structure `{structure}` declares field `{field}` twice")]
    DuplicateField { structure: String, field: String },

    #[error("structure `{structure}` has no field `{field}`")]
    UnknownField { structure: String, field: String },

    #[error("field `{field}` holds {expected:?}, got {actual:?}")]
    ValueTypeMismatch {
        field: String,
        expected: ScalarType,
        actual: ScalarType,
    },
}

/// 配置解析错误。
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid pvdata options: {0}")]
    Parse(#[from] toml::de::Error),

    /// 语法正确但取值不合法。
    #[error("invalid pvdata option `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}
