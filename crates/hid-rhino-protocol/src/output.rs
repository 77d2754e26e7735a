//! Output and feature report encoders.
//!
//! Every encoder writes the packed little-endian layout the firmware expects,
//! first byte = report id. Force, coefficient and saturation fields are
//! clamped to their hardware ranges during encode; in-range values round-trip
//! bit-exactly through `decode`.

use crate::ids::*;
use crate::types::{DeviceControlCommand, EffectOp, EffectType, LoadStatus};
use crate::{RhinoProtocolError, RhinoProtocolResult};
use openflight_hid_common::{ReportBuilder, ReportParser};
use serde::{Deserialize, Serialize};

fn check_header(
    data: &[u8],
    expected_id: u8,
    expected_len: usize,
) -> RhinoProtocolResult<ReportParser<'_>> {
    if data.len() < expected_len {
        return Err(RhinoProtocolError::InvalidReportSize {
            expected: expected_len,
            actual: data.len(),
        });
    }
    let mut parser = ReportParser::new(data);
    let id = parser.read_u8()?;
    if id != expected_id {
        return Err(RhinoProtocolError::UnexpectedReportId {
            expected: expected_id,
            actual: id,
        });
    }
    Ok(parser)
}

fn clamp_force(value: i16) -> i16 {
    value.clamp(-4096, 4096)
}

fn clamp_unsigned(value: u16) -> u16 {
    value.min(4096)
}

/// Effect definition report (id 101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEffectReport {
    pub effect_block_index: u8,
    pub effect_type: EffectType,
    /// Total effect duration in ms; 0 means infinite.
    pub duration: u16,
    pub trigger_repeat_interval: u16,
    pub sample_period: u16,
    /// Per-effect gain, 0..4096.
    pub gain: u16,
    pub trigger_button: u8,
    /// Bit 0: X axis, bit 1: Y axis, bit 2: polar direction.
    pub axes_enable: u8,
    /// Direction byte, 0..255 ≙ 0..360°.
    pub direction_x: u8,
    pub direction_y: u8,
    pub start_delay: u16,
}

impl SetEffectReport {
    pub const SIZE: usize = 17;

    pub fn new(effect_block_index: u8, effect_type: EffectType) -> Self {
        Self {
            effect_block_index,
            effect_type,
            duration: 0,
            trigger_repeat_interval: 0,
            sample_period: 0,
            gain: 4096,
            trigger_button: 0,
            axes_enable: AXIS_ENABLE_X | AXIS_ENABLE_Y,
            direction_x: 0,
            direction_y: 0,
            start_delay: 0,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut b = ReportBuilder::with_capacity(Self::SIZE);
        b.write_u8(HID_REPORT_ID_SET_EFFECT)
            .write_u8(self.effect_block_index)
            .write_u8(self.effect_type as u8)
            .write_u16_le(self.duration)
            .write_u16_le(self.trigger_repeat_interval)
            .write_u16_le(self.sample_period)
            .write_u16_le(clamp_unsigned(self.gain))
            .write_u8(self.trigger_button)
            .write_u8(self.axes_enable)
            .write_u8(self.direction_x)
            .write_u8(self.direction_y)
            .write_u16_le(self.start_delay);
        b.into_inner()
    }

    /// Decodes an encoded report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer, wrong report id, or unknown effect type.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        let mut p = check_header(data, HID_REPORT_ID_SET_EFFECT, Self::SIZE)?;
        Ok(Self {
            effect_block_index: p.read_u8()?,
            effect_type: EffectType::try_from(p.read_u8()?)?,
            duration: p.read_u16_le()?,
            trigger_repeat_interval: p.read_u16_le()?,
            sample_period: p.read_u16_le()?,
            gain: p.read_u16_le()?,
            trigger_button: p.read_u8()?,
            axes_enable: p.read_u8()?,
            direction_x: p.read_u8()?,
            direction_y: p.read_u8()?,
            start_delay: p.read_u16_le()?,
        })
    }
}

/// Periodic waveform parameters (id 104).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetPeriodicReport {
    pub effect_block_index: u8,
    /// Waveform amplitude, 0..4096.
    pub magnitude: u16,
    /// Waveform DC offset, -4096..4096.
    pub offset: i16,
    pub phase: u8,
    /// Waveform period in ms; 0 means flat.
    pub period: u16,
}

impl SetPeriodicReport {
    pub const SIZE: usize = 9;

    pub fn encode(&self) -> Vec<u8> {
        let mut b = ReportBuilder::with_capacity(Self::SIZE);
        b.write_u8(HID_REPORT_ID_SET_PERIODIC)
            .write_u8(self.effect_block_index)
            .write_u16_le(clamp_unsigned(self.magnitude))
            .write_i16_le(clamp_force(self.offset))
            .write_u8(self.phase)
            .write_u16_le(self.period);
        b.into_inner()
    }

    /// Decodes an encoded report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer or wrong report id.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        let mut p = check_header(data, HID_REPORT_ID_SET_PERIODIC, Self::SIZE)?;
        Ok(Self {
            effect_block_index: p.read_u8()?,
            magnitude: p.read_u16_le()?,
            offset: p.read_i16_le()?,
            phase: p.read_u8()?,
            period: p.read_u16_le()?,
        })
    }
}

/// Constant force magnitude (id 105).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetConstantForceReport {
    pub effect_block_index: u8,
    /// Signed force, -4096..4096.
    pub magnitude: i16,
}

impl SetConstantForceReport {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        let mut b = ReportBuilder::with_capacity(Self::SIZE);
        b.write_u8(HID_REPORT_ID_SET_CONSTANT_FORCE)
            .write_u8(self.effect_block_index)
            .write_i16_le(clamp_force(self.magnitude));
        b.into_inner()
    }

    /// Decodes an encoded report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer or wrong report id.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        let mut p = check_header(data, HID_REPORT_ID_SET_CONSTANT_FORCE, Self::SIZE)?;
        Ok(Self {
            effect_block_index: p.read_u8()?,
            magnitude: p.read_i16_le()?,
        })
    }
}

/// Per-axis condition block (id 103) for spring/damper/friction/inertia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetConditionReport {
    pub effect_block_index: u8,
    /// Condition axis: 0 = X, 1 = Y.
    pub parameter_block_offset: u8,
    /// Center-point offset, -4096..4096.
    pub cp_offset: i16,
    /// Coefficient applied on the positive side, -4096..4096.
    pub positive_coefficient: i16,
    /// Coefficient applied on the negative side, -4096..4096.
    pub negative_coefficient: i16,
    /// Force cap on the positive side, 0..4096.
    pub positive_saturation: u16,
    /// Force cap on the negative side, 0..4096.
    pub negative_saturation: u16,
    /// Inactive band around the center point, 0..4096.
    pub dead_band: u16,
}

impl SetConditionReport {
    pub const SIZE: usize = 15;

    /// Condition for one axis with a symmetric coefficient.
    pub fn symmetric(axis: u8, coefficient: i16) -> Self {
        Self {
            parameter_block_offset: axis,
            positive_coefficient: coefficient,
            negative_coefficient: coefficient,
            ..Self::default()
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut b = ReportBuilder::with_capacity(Self::SIZE);
        b.write_u8(HID_REPORT_ID_SET_CONDITION)
            .write_u8(self.effect_block_index)
            .write_u8(self.parameter_block_offset)
            .write_i16_le(clamp_force(self.cp_offset))
            .write_i16_le(clamp_force(self.positive_coefficient))
            .write_i16_le(clamp_force(self.negative_coefficient))
            .write_u16_le(clamp_unsigned(self.positive_saturation))
            .write_u16_le(clamp_unsigned(self.negative_saturation))
            .write_u16_le(clamp_unsigned(self.dead_band));
        b.into_inner()
    }

    /// Decodes an encoded report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer or wrong report id.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        let mut p = check_header(data, HID_REPORT_ID_SET_CONDITION, Self::SIZE)?;
        Ok(Self {
            effect_block_index: p.read_u8()?,
            parameter_block_offset: p.read_u8()?,
            cp_offset: p.read_i16_le()?,
            positive_coefficient: p.read_i16_le()?,
            negative_coefficient: p.read_i16_le()?,
            positive_saturation: p.read_u16_le()?,
            negative_saturation: p.read_u16_le()?,
            dead_band: p.read_u16_le()?,
        })
    }
}

/// Start/stop one effect (id 110).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectOperationReport {
    pub effect_block_index: u8,
    pub operation: EffectOp,
    pub loop_count: u8,
}

impl EffectOperationReport {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        let mut b = ReportBuilder::with_capacity(Self::SIZE);
        b.write_u8(HID_REPORT_ID_EFFECT_OPERATION)
            .write_u8(self.effect_block_index)
            .write_u8(self.operation as u8)
            .write_u8(self.loop_count);
        b.into_inner()
    }

    /// Decodes an encoded report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer, wrong report id, or unknown operation.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        let mut p = check_header(data, HID_REPORT_ID_EFFECT_OPERATION, Self::SIZE)?;
        let effect_block_index = p.read_u8()?;
        let operation = match p.read_u8()? {
            1 => EffectOp::Start,
            2 => EffectOp::StartSolo,
            3 => EffectOp::Stop,
            4 => EffectOp::StartOverride,
            other => return Err(RhinoProtocolError::UnknownOperation(other)),
        };
        Ok(Self {
            effect_block_index,
            operation,
            loop_count: p.read_u8()?,
        })
    }
}

/// Release one effect slot (id 111).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFreeReport {
    pub effect_block_index: u8,
}

impl BlockFreeReport {
    pub const SIZE: usize = 2;

    pub fn encode(&self) -> Vec<u8> {
        vec![HID_REPORT_ID_BLOCK_FREE, self.effect_block_index]
    }

    /// Decodes an encoded report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer or wrong report id.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        let mut p = check_header(data, HID_REPORT_ID_BLOCK_FREE, Self::SIZE)?;
        Ok(Self {
            effect_block_index: p.read_u8()?,
        })
    }
}

/// Device-level control subcommand (id 112).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceControlReport {
    pub command: DeviceControlCommand,
}

impl DeviceControlReport {
    pub const SIZE: usize = 2;

    pub fn encode(&self) -> Vec<u8> {
        vec![HID_REPORT_ID_DEVICE_CONTROL, self.command as u8]
    }
}

/// Global device gain (id 113), 0..4096.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGainReport {
    pub gain: u16,
}

impl DeviceGainReport {
    pub const SIZE: usize = 3;

    pub fn encode(&self) -> Vec<u8> {
        let mut b = ReportBuilder::with_capacity(Self::SIZE);
        b.write_u8(HID_REPORT_ID_DEVICE_GAIN)
            .write_u16_le(clamp_unsigned(self.gain));
        b.into_inner()
    }
}

/// Effect allocation request (feature report, id 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEffectReport {
    pub effect_type: EffectType,
}

impl CreateEffectReport {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        vec![HID_REPORT_ID_CREATE_EFFECT, self.effect_type as u8, 0, 0]
    }
}

/// Allocation result (feature report, id 6, decode-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLoadReport {
    pub effect_block_index: u8,
    pub load_status: LoadStatus,
}

impl BlockLoadReport {
    pub const SIZE: usize = 3;

    /// Decodes the block-load feature response.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer, wrong report id, or unknown status byte.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        let mut p = check_header(data, HID_REPORT_ID_PID_BLOCK_LOAD, Self::SIZE)?;
        Ok(Self {
            effect_block_index: p.read_u8()?,
            load_status: LoadStatus::try_from(p.read_u8()?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_effect_roundtrip() {
        let report = SetEffectReport {
            duration: 80,
            axes_enable: AXIS_ENABLE_DIR,
            direction_x: 64,
            ..SetEffectReport::new(3, EffectType::Sine)
        };
        let encoded = report.encode();
        assert_eq!(encoded.len(), SetEffectReport::SIZE);
        assert_eq!(encoded[0], HID_REPORT_ID_SET_EFFECT);
        assert_eq!(SetEffectReport::decode(&encoded).expect("decode"), report);
    }

    #[test]
    fn test_set_effect_defaults() {
        let report = SetEffectReport::new(1, EffectType::Spring);
        assert_eq!(report.gain, 4096);
        assert_eq!(report.axes_enable, AXIS_ENABLE_X | AXIS_ENABLE_Y);
    }

    #[test]
    fn test_set_periodic_roundtrip_boundaries() {
        for (magnitude, offset) in [(0u16, -4096i16), (2048, 0), (4096, 4096)] {
            let report = SetPeriodicReport {
                effect_block_index: 2,
                magnitude,
                offset,
                phase: 255,
                period: 100,
            };
            assert_eq!(
                SetPeriodicReport::decode(&report.encode()).expect("decode"),
                report
            );
        }
    }

    #[test]
    fn test_set_periodic_clamps_magnitude() {
        let report = SetPeriodicReport {
            magnitude: 9000,
            offset: 8000,
            ..SetPeriodicReport::default()
        };
        let decoded = SetPeriodicReport::decode(&report.encode()).expect("decode");
        assert_eq!(decoded.magnitude, 4096);
        assert_eq!(decoded.offset, 4096);
    }

    #[test]
    fn test_constant_force_negative_encoding() {
        let report = SetConstantForceReport {
            effect_block_index: 1,
            magnitude: -4096,
        };
        let encoded = report.encode();
        // Two's-complement little-endian: -4096 = 0xF000
        assert_eq!(&encoded[2..4], &[0x00, 0xF0]);
        assert_eq!(
            SetConstantForceReport::decode(&encoded).expect("decode"),
            report
        );
    }

    #[test]
    fn test_condition_clamps_all_fields() {
        let report = SetConditionReport {
            effect_block_index: 1,
            parameter_block_offset: 0,
            cp_offset: -30000,
            positive_coefficient: 8000,
            negative_coefficient: -8000,
            positive_saturation: 65535,
            negative_saturation: 5000,
            dead_band: 4097,
        };
        let decoded = SetConditionReport::decode(&report.encode()).expect("decode");
        assert_eq!(decoded.cp_offset, -4096);
        assert_eq!(decoded.positive_coefficient, 4096);
        assert_eq!(decoded.negative_coefficient, -4096);
        assert_eq!(decoded.positive_saturation, 4096);
        assert_eq!(decoded.negative_saturation, 4096);
        assert_eq!(decoded.dead_band, 4096);
    }

    #[test]
    fn test_condition_symmetric() {
        let cond = SetConditionReport::symmetric(1, 1200);
        assert_eq!(cond.parameter_block_offset, 1);
        assert_eq!(cond.positive_coefficient, 1200);
        assert_eq!(cond.negative_coefficient, 1200);
    }

    #[test]
    fn test_effect_operation_roundtrip() {
        let report = EffectOperationReport {
            effect_block_index: 5,
            operation: EffectOp::StartOverride,
            loop_count: 1,
        };
        assert_eq!(
            EffectOperationReport::decode(&report.encode()).expect("decode"),
            report
        );
    }

    #[test]
    fn test_block_free_layout() {
        let report = BlockFreeReport {
            effect_block_index: 7,
        };
        assert_eq!(report.encode(), vec![HID_REPORT_ID_BLOCK_FREE, 7]);
        assert_eq!(BlockFreeReport::decode(&report.encode()).expect("decode"), report);
    }

    #[test]
    fn test_device_control_layout() {
        let report = DeviceControlReport {
            command: DeviceControlCommand::Reset,
        };
        assert_eq!(report.encode(), vec![HID_REPORT_ID_DEVICE_CONTROL, 4]);
    }

    #[test]
    fn test_create_effect_layout() {
        let report = CreateEffectReport {
            effect_type: EffectType::Sine,
        };
        assert_eq!(report.encode(), vec![HID_REPORT_ID_CREATE_EFFECT, 4, 0, 0]);
    }

    #[test]
    fn test_block_load_decode() {
        let decoded = BlockLoadReport::decode(&[6, 3, 1, 0, 0]).expect("decode");
        assert_eq!(decoded.effect_block_index, 3);
        assert_eq!(decoded.load_status, LoadStatus::Success);

        let full = BlockLoadReport::decode(&[6, 0, 2]).expect("decode");
        assert_eq!(full.load_status, LoadStatus::Full);

        assert!(BlockLoadReport::decode(&[5, 3, 1]).is_err());
        assert!(BlockLoadReport::decode(&[6, 3]).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_id() {
        let report = SetPeriodicReport::default();
        let mut encoded = report.encode();
        encoded[0] = HID_REPORT_ID_SET_CONSTANT_FORCE;
        assert!(matches!(
            SetPeriodicReport::decode(&encoded),
            Err(RhinoProtocolError::UnexpectedReportId { .. })
        ));
    }
}
