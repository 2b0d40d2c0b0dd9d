mod ack;
mod error;
mod reader;
mod writer;

pub use ack::Ack;
pub use error::ProtocolViolation;
pub use reader::UpdateReader;
pub use writer::UpdateWriter;

use propnet_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

use crate::{
    codec::WireValue,
    entity::EntityHandle,
    types::{ClassId, PropertyIndex, Tick},
};

/// Whether a record carries every property of its class or only changes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Delta,
    Full,
}

impl Serde for UpdateKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self == UpdateKind::Full);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(UpdateKind::Full)
        } else {
            Ok(UpdateKind::Delta)
        }
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl ConstBitLength for UpdateKind {
    fn const_bit_length() -> u32 {
        1
    }
}

/// One entity's record in an update packet: the changed property indices
/// (strictly increasing) and their quantized values, index for index. A
/// full record lists every index of the schema.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingDelta {
    pub tick: Tick,
    pub entity: EntityHandle,
    pub class_id: ClassId,
    pub kind: UpdateKind,
    pub changed: Vec<PropertyIndex>,
    pub values: Vec<WireValue>,
}

impl PendingDelta {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// A parsed update packet
#[derive(Clone, Debug, PartialEq)]
pub struct UpdatePacket {
    pub tick: Tick,
    pub removals: Vec<EntityHandle>,
    pub updates: Vec<PendingDelta>,
}
