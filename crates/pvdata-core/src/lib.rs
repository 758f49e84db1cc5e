//! `pvdata-core` 提供结构类型描述、结构元素以及可变长结构数组容器。
//!
//! # 模块定位（Why）
//! - 结构数组是 pvData 中“元素为结构”的数组字段：槽位可以为空，整体可以扩缩容、压缩与按窗口读写；
//! - 线格式（尺寸头 + 存在标记 + 元素负载）需要在有界缓冲上流式完成，依赖 `pvdata-buffer` 的流控钩子。
//!
//! # 设计概要（How）
//! - [`structure`](crate::Structure)：字段描述与类型相等判定；
//! - [`PvStructure`]/[`ElementFactory`]：默认元素实现与构造职责；
//! - [`StructureArray`]：槽位表、容量/长度管理、压缩、`get`/`put` 与编解码；
//! - [`PvDataOptions`]：TOML 配置入口。
//!
//! # 契约说明（What）
//! - 容器不做内部同步，变更操作需要调用方保证独占；
//! - 拒绝类错误（只读、容量冻结、越界）不修改状态，并以 `warn` 级别记录一条 `tracing` 事件。

mod array;
mod element;
mod error;
mod options;
mod scalar;
mod structure;

pub use array::{ElementWindow, PostPutObserver, StructureArray};
pub use element::{DefaultElementFactory, ElementFactory, PvStructure, StructureElement};
pub use error::{ArrayError, OptionsError, StructureError};
pub use options::{ArrayOptions, PutPolicy, PvDataOptions};
pub use scalar::ScalarValue;
pub use structure::{FieldDesc, ScalarType, Structure, StructureBuilder};

pub use pvdata_buffer;
