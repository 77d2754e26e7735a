//! Byte-level helpers for packed little-endian HID reports.

use crate::{HidCommonError, HidCommonResult};

/// Sequential little-endian reader over a raw report buffer.
pub struct ReportParser<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ReportParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`HidCommonError::InvalidReport`] past the end of the buffer.
    pub fn read_u8(&mut self) -> HidCommonResult<u8> {
        let value = self
            .buffer
            .get(self.position)
            .copied()
            .ok_or_else(|| HidCommonError::InvalidReport("unexpected end of report".into()))?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> HidCommonResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16_le(&mut self) -> HidCommonResult<u16> {
        let lo = self.read_u8()? as u16;
        let hi = self.read_u8()? as u16;
        Ok(lo | (hi << 8))
    }

    pub fn read_i16_le(&mut self) -> HidCommonResult<i16> {
        Ok(self.read_u16_le()? as i16)
    }

    pub fn read_u32_le(&mut self) -> HidCommonResult<u32> {
        let lo = self.read_u16_le()? as u32;
        let hi = self.read_u16_le()? as u32;
        Ok(lo | (hi << 16))
    }

    pub fn skip(&mut self, count: usize) {
        self.position = (self.position + count).min(self.buffer.len());
    }
}

/// Sequential little-endian writer producing a raw report buffer.
pub struct ReportBuilder {
    buffer: Vec<u8>,
}

impl ReportBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_i8(&mut self, value: i8) -> &mut Self {
        self.write_u8(value as u8)
    }

    pub fn write_u16_le(&mut self, value: u16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i16_le(&mut self, value: i16) -> &mut Self {
        self.write_u16_le(value as u16)
    }

    pub fn write_u32_le(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(data);
        self
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}
