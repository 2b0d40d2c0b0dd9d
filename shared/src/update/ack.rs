use propnet_serde::{BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr};

use crate::types::Tick;

/// Sent by a client for every update packet it applies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ack {
    pub tick: Tick,
}

impl Ack {
    pub fn new(tick: Tick) -> Self {
        Self { tick }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::with_capacity(2);
        self.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = BitReader::new(bytes);
        Self::de(&mut reader)
    }
}

impl Serde for Ack {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.tick.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            tick: Tick::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        Self::const_bit_length()
    }
}

impl ConstBitLength for Ack {
    fn const_bit_length() -> u32 {
        Tick::const_bit_length()
    }
}
