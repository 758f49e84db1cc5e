//! 结构类型描述。
//!
//! # 设计背景（Why）
//! - 结构数组中的每个元素都是同一记录布局的独立实例，布局由 [`Structure`] 描述并以 `Arc` 共享；
//! - 容器在写入元素时依赖 [`Structure::same_type`] 判定类型是否一致。
//!
//! # 契约说明（What）
//! - 字段名在同一结构内唯一，由 [`StructureBuilder::build`] 校验；
//! - 类型一致性：同一 `Arc` 或 `id` 与字段列表逐项相等。

use std::sync::Arc;

use crate::error::StructureError;

/// 字段可承载的标量类型。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    UByte,
    UShort,
    UInt,
    ULong,
    Float,
    Double,
    String,
}

impl ScalarType {
    /// 定长类型在线上的字节数；字符串为变长，返回 `None`。
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            ScalarType::Boolean | ScalarType::Byte | ScalarType::UByte => Some(1),
            ScalarType::Short | ScalarType::UShort => Some(2),
            ScalarType::Int | ScalarType::UInt | ScalarType::Float => Some(4),
            ScalarType::Long | ScalarType::ULong | ScalarType::Double => Some(8),
            ScalarType::String => None,
        }
    }
}

/// 单个字段的描述。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    name: String,
    scalar_type: ScalarType,
}

impl FieldDesc {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }
}

/// 记录布局描述，元素工厂据此构造默认实例。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Structure {
    id: String,
    fields: Vec<FieldDesc>,
}

impl Structure {
    /// 类型标识，例如 `epics:nt/NTScalar:1.0`。
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// 判定两个描述是否为同一结构类型。
    pub fn same_type(left: &Arc<Structure>, right: &Arc<Structure>) -> bool {
        Arc::ptr_eq(left, right) || left == right
    }
}

/// 以链式调用声明字段的构建器。
///
/// ```rust
/// use pvdata_core::{ScalarType, StructureBuilder};
///
/// let structure = StructureBuilder::new("point")
///     .add("x", ScalarType::Double)
///     .add("y", ScalarType::Double)
///     .build()
///     .expect("字段名唯一");
/// assert_eq!(structure.fields().len(), 2);
/// ```
#[derive(Debug)]
pub struct StructureBuilder {
    id: String,
    fields: Vec<FieldDesc>,
}

impl StructureBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn add(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            scalar_type,
        });
        self
    }

    /// 校验字段名唯一并生成共享描述。
    pub fn build(self) -> Result<Arc<Structure>, StructureError> {
        for (index, field) in self.fields.iter().enumerate() {
            if self.fields[..index].iter().any(|prior| prior.name == field.name) {
                return Err(StructureError::DuplicateField {
                    structure: self.id,
                    field: field.name.clone(),
                });
            }
        }
        Ok(Arc::new(Structure {
            id: self.id,
            fields: self.fields,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_field_names_are_rejected() {
        let err = StructureBuilder::new("dup")
            .add("value", ScalarType::Int)
            .add("value", ScalarType::Long)
            .build()
            .expect_err("重复字段");
        assert_eq!(
            err,
            StructureError::DuplicateField {
                structure: "dup".into(),
                field: "value".into()
            }
        );
    }

    #[test]
    fn structural_equality_counts_as_same_type() {
        let build = || {
            StructureBuilder::new("sample")
                .add("value", ScalarType::Double)
                .build()
                .expect("合法结构")
        };
        let left = build();
        let right = build();
        assert!(!Arc::ptr_eq(&left, &right));
        assert!(Structure::same_type(&left, &right));

        let other = StructureBuilder::new("sample")
            .add("value", ScalarType::Float)
            .build()
            .expect("合法结构");
        assert!(!Structure::same_type(&left, &other));
        assert_eq!(left.field_index("value"), Some(0));
        assert_eq!(left.field_index("missing"), None);
    }
}
