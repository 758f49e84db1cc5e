//! 结构元素与元素工厂。
//!
//! # 设计背景（Why）
//! - 结构数组不关心元素内部的线格式，只要求元素能报告自身类型并完成自己的编解码；
//! - 数组扩容与解码空槽时需要按结构描述构造默认元素，这一职责由 [`ElementFactory`] 承担。
//!
//! # 契约说明（What）
//! - [`StructureElement::structure`] 返回的描述在元素生命周期内不变；
//! - [`StructureElement::deserialize`] 必须就地覆盖元素内容，以便容器在反复解码时复用已有实例；
//! - [`ElementFactory::create`] 返回的元素类型必须等于传入的描述。

use std::sync::Arc;

use pvdata_buffer::{ByteBuffer, CodecError, DeserializableControl, SerializableControl};

use crate::{
    error::StructureError,
    scalar::ScalarValue,
    structure::Structure,
};

/// 可放入结构数组的元素。
pub trait StructureElement {
    /// 元素的结构类型。
    fn structure(&self) -> &Arc<Structure>;

    /// 将元素内容写入缓冲，空间不足时通过 `control` 刷新。
    fn serialize(
        &self,
        buffer: &mut ByteBuffer,
        control: &mut dyn SerializableControl,
    ) -> Result<(), CodecError>;

    /// 从缓冲读取元素内容并就地覆盖，数据不足时通过 `control` 拉取。
    fn deserialize(
        &mut self,
        buffer: &mut ByteBuffer,
        control: &mut dyn DeserializableControl,
    ) -> Result<(), CodecError>;
}

/// 按结构描述构造默认元素。
pub trait ElementFactory<E> {
    fn create(&self, structure: &Arc<Structure>) -> E;
}

/// 闭包即工厂，便于测试或自定义元素类型。
impl<E, F> ElementFactory<E> for F
where
    F: Fn(&Arc<Structure>) -> E,
{
    fn create(&self, structure: &Arc<Structure>) -> E {
        self(structure)
    }
}

/// `PvStructure` 是按字段顺序保存标量值的通用结构实例。
///
/// # 线格式（What）
/// - 字段按声明顺序依次编码，定长数值使用缓冲字节序，字符串为尺寸头 + UTF-8 字节；
/// - 不携带字段名或类型信息，双方需共享同一 [`Structure`] 描述。
#[derive(Clone, Debug, PartialEq)]
pub struct PvStructure {
    structure: Arc<Structure>,
    values: Vec<ScalarValue>,
}

impl PvStructure {
    /// 构造所有字段为默认值的实例。
    pub fn new(structure: Arc<Structure>) -> Self {
        let values = structure
            .fields()
            .iter()
            .map(|field| ScalarValue::default_for(field.scalar_type()))
            .collect();
        Self { structure, values }
    }

    /// 按声明顺序排列的字段值。
    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }

    pub fn get(&self, field: &str) -> Result<&ScalarValue, StructureError> {
        let index = self.index_of(field)?;
        Ok(&self.values[index])
    }

    /// 覆盖字段值；值类型必须与字段声明一致。
    pub fn set(&mut self, field: &str, value: ScalarValue) -> Result<(), StructureError> {
        let index = self.index_of(field)?;
        let expected = self.structure.fields()[index].scalar_type();
        if value.scalar_type() != expected {
            return Err(StructureError::ValueTypeMismatch {
                field: field.to_owned(),
                expected,
                actual: value.scalar_type(),
            });
        }
        self.values[index] = value;
        Ok(())
    }

    /// 链式写入，便于在测试与示例中构造数据。
    pub fn with(mut self, field: &str, value: ScalarValue) -> Result<Self, StructureError> {
        self.set(field, value)?;
        Ok(self)
    }

    fn index_of(&self, field: &str) -> Result<usize, StructureError> {
        self.structure
            .field_index(field)
            .ok_or_else(|| StructureError::UnknownField {
                structure: self.structure.id().to_owned(),
                field: field.to_owned(),
            })
    }
}

impl StructureElement for PvStructure {
    fn structure(&self) -> &Arc<Structure> {
        &self.structure
    }

    fn serialize(
        &self,
        buffer: &mut ByteBuffer,
        control: &mut dyn SerializableControl,
    ) -> Result<(), CodecError> {
        self.values
            .iter()
            .try_for_each(|value| value.serialize(buffer, control))
    }

    fn deserialize(
        &mut self,
        buffer: &mut ByteBuffer,
        control: &mut dyn DeserializableControl,
    ) -> Result<(), CodecError> {
        for (slot, field) in self.values.iter_mut().zip(self.structure.fields()) {
            *slot = ScalarValue::deserialize(field.scalar_type(), buffer, control)?;
        }
        Ok(())
    }
}

/// 构造 [`PvStructure`] 默认实例的工厂。
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultElementFactory;

impl ElementFactory<PvStructure> for DefaultElementFactory {
    fn create(&self, structure: &Arc<Structure>) -> PvStructure {
        PvStructure::new(Arc::clone(structure))
    }
}

#[cfg(test)]
mod tests {
    use pvdata_buffer::{SliceFeeder, VecFlusher};

    use super::*;
    use crate::structure::{ScalarType, StructureBuilder};

    fn sample() -> Arc<Structure> {
        StructureBuilder::new("sample")
            .add("flag", ScalarType::Boolean)
            .add("count", ScalarType::UShort)
            .add("value", ScalarType::Double)
            .add("label", ScalarType::String)
            .build()
            .expect("合法结构")
    }

    #[test]
    fn set_rejects_wrong_value_type_and_unknown_field() {
        let mut element = PvStructure::new(sample());
        assert!(matches!(
            element.set("value", ScalarValue::Int(1)),
            Err(StructureError::ValueTypeMismatch {
                expected: ScalarType::Double,
                actual: ScalarType::Int,
                ..
            })
        ));
        assert!(matches!(
            element.set("nope", ScalarValue::Int(1)),
            Err(StructureError::UnknownField { .. })
        ));
        element
            .set("label", ScalarValue::String("ok".into()))
            .expect("类型一致");
        assert_eq!(
            element.get("label").expect("字段存在"),
            &ScalarValue::String("ok".into())
        );
    }

    #[test]
    fn payload_round_trips_in_field_order() {
        let element = PvStructure::new(sample())
            .with("flag", ScalarValue::Boolean(true))
            .and_then(|e| e.with("count", ScalarValue::UShort(513)))
            .and_then(|e| e.with("value", ScalarValue::Double(-2.5)))
            .and_then(|e| e.with("label", ScalarValue::String("motor".into())))
            .expect("构造示例元素");

        let mut buffer = ByteBuffer::new(8);
        let mut flusher = VecFlusher::new();
        element
            .serialize(&mut buffer, &mut flusher)
            .expect("序列化元素");
        let bytes = flusher.finish(&mut buffer);
        assert_eq!(&bytes[..3], &[1, 2, 1]);
        assert_eq!(bytes.len(), 1 + 2 + 8 + 1 + 5);

        let mut decoded = DefaultElementFactory.create(&sample());
        let mut buffer = ByteBuffer::new(8);
        let mut feeder = SliceFeeder::new(&bytes, 3);
        decoded
            .deserialize(&mut buffer, &mut feeder)
            .expect("反序列化元素");
        assert_eq!(decoded, element);
    }

    #[test]
    fn closures_act_as_factories() {
        let factory = |structure: &Arc<Structure>| PvStructure::new(Arc::clone(structure));
        let element = factory.create(&sample());
        assert_eq!(element.values().len(), 4);
    }
}
