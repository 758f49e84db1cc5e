use pvdata_buffer::{ByteBuffer, CodecError, DeserializableControl, SerializableControl, wire};

use crate::structure::ScalarType;

/// 字段取值，变体与 [`ScalarType`] 一一对应。
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    UByte(u8),
    UShort(u16),
    UInt(u32),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(String),
}

impl ScalarValue {
    /// 给定类型的默认值：数值为零、布尔为 `false`、字符串为空。
    pub fn default_for(scalar_type: ScalarType) -> Self {
        match scalar_type {
            ScalarType::Boolean => ScalarValue::Boolean(false),
            ScalarType::Byte => ScalarValue::Byte(0),
            ScalarType::Short => ScalarValue::Short(0),
            ScalarType::Int => ScalarValue::Int(0),
            ScalarType::Long => ScalarValue::Long(0),
            ScalarType::UByte => ScalarValue::UByte(0),
            ScalarType::UShort => ScalarValue::UShort(0),
            ScalarType::UInt => ScalarValue::UInt(0),
            ScalarType::ULong => ScalarValue::ULong(0),
            ScalarType::Float => ScalarValue::Float(0.0),
            ScalarType::Double => ScalarValue::Double(0.0),
            ScalarType::String => ScalarValue::String(String::new()),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarValue::Boolean(_) => ScalarType::Boolean,
            ScalarValue::Byte(_) => ScalarType::Byte,
            ScalarValue::Short(_) => ScalarType::Short,
            ScalarValue::Int(_) => ScalarType::Int,
            ScalarValue::Long(_) => ScalarType::Long,
            ScalarValue::UByte(_) => ScalarType::UByte,
            ScalarValue::UShort(_) => ScalarType::UShort,
            ScalarValue::UInt(_) => ScalarType::UInt,
            ScalarValue::ULong(_) => ScalarType::ULong,
            ScalarValue::Float(_) => ScalarType::Float,
            ScalarValue::Double(_) => ScalarType::Double,
            ScalarValue::String(_) => ScalarType::String,
        }
    }

    /// 写入线格式：定长数值先确保缓冲空间，字符串交给 [`wire::write_string`] 分片写出。
    pub(crate) fn serialize(
        &self,
        buffer: &mut ByteBuffer,
        control: &mut dyn SerializableControl,
    ) -> Result<(), CodecError> {
        if let Some(width) = self.scalar_type().fixed_width() {
            control.ensure_buffer(buffer, width)?;
        }
        match self {
            ScalarValue::Boolean(value) => buffer.put_bool(*value),
            ScalarValue::Byte(value) => buffer.put_i8(*value),
            ScalarValue::Short(value) => buffer.put_i16(*value),
            ScalarValue::Int(value) => buffer.put_i32(*value),
            ScalarValue::Long(value) => buffer.put_i64(*value),
            ScalarValue::UByte(value) => buffer.put_u8(*value),
            ScalarValue::UShort(value) => buffer.put_u16(*value),
            ScalarValue::UInt(value) => buffer.put_u32(*value),
            ScalarValue::ULong(value) => buffer.put_u64(*value),
            ScalarValue::Float(value) => buffer.put_f32(*value),
            ScalarValue::Double(value) => buffer.put_f64(*value),
            ScalarValue::String(text) => wire::write_string(text, buffer, control),
        }
    }

    /// 按 `scalar_type` 从线格式读取一个值。
    pub(crate) fn deserialize(
        scalar_type: ScalarType,
        buffer: &mut ByteBuffer,
        control: &mut dyn DeserializableControl,
    ) -> Result<Self, CodecError> {
        if let Some(width) = scalar_type.fixed_width() {
            control.ensure_data(buffer, width)?;
        }
        Ok(match scalar_type {
            ScalarType::Boolean => ScalarValue::Boolean(buffer.get_bool()?),
            ScalarType::Byte => ScalarValue::Byte(buffer.get_i8()?),
            ScalarType::Short => ScalarValue::Short(buffer.get_i16()?),
            ScalarType::Int => ScalarValue::Int(buffer.get_i32()?),
            ScalarType::Long => ScalarValue::Long(buffer.get_i64()?),
            ScalarType::UByte => ScalarValue::UByte(buffer.get_u8()?),
            ScalarType::UShort => ScalarValue::UShort(buffer.get_u16()?),
            ScalarType::UInt => ScalarValue::UInt(buffer.get_u32()?),
            ScalarType::ULong => ScalarValue::ULong(buffer.get_u64()?),
            ScalarType::Float => ScalarValue::Float(buffer.get_f32()?),
            ScalarType::Double => ScalarValue::Double(buffer.get_f64()?),
            ScalarType::String => ScalarValue::String(wire::read_string(buffer, control)?),
        })
    }
}
