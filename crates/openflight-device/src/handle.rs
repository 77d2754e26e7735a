//! Exclusive ownership of one hardware effect slot.

use crate::transport::RhinoDevice;
use crate::DeviceResult;
use hid_rhino_protocol::{
    direction_to_wire, magnitude_to_fixed, AXIS_ENABLE_DIR, BlockFreeReport, EffectOp,
    EffectOperationReport, EffectType, SetConditionReport, SetConstantForceReport,
    SetEffectReport, SetPeriodicReport,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle state of an allocated effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Slot reserved, never started.
    Allocated,
    /// Playing on the device.
    Started,
    /// Stopped but still holding its slot.
    Stopped,
    /// Slot released back to the device pool.
    Destroyed,
}

/// Which cached report a suppressed write belongs to.
///
/// Condition reports are deliberately absent: the encoder clamps their
/// coefficients, so two different caller values can produce identical bytes,
/// and suppressing the second write would hide a real parameter change from
/// callers that read back device state. Conditions always go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    Effect,
    Periodic,
    ConstantForce,
}

/// Owner of one on-device effect slot.
///
/// The handle tracks the effect's lifecycle state so that `start` and `stop`
/// are idempotent, and keeps a byte-compare cache of the last written
/// parameter reports so a telemetry loop can call the setters every frame
/// without flooding the wire. The cache lives on the handle, not the device;
/// destroying and re-allocating a slot starts from a clean cache, so the
/// fresh effect always receives its first parameter writes.
///
/// Dropping the handle frees the slot. The pool is small and finite, so
/// reclamation is tied to ownership rather than left to an explicit call the
/// caller might forget.
pub struct EffectHandle {
    device: Arc<RhinoDevice>,
    effect_id: u8,
    effect_type: EffectType,
    state: EffectState,
    cache: HashMap<CacheKey, Vec<u8>>,
}

impl EffectHandle {
    /// Allocates one effect slot from the device pool.
    ///
    /// Returns `Ok(None)` when the pool is exhausted; the slot may become
    /// available later as other handles drop.
    ///
    /// # Errors
    ///
    /// Fails only on transport-level I/O problems.
    pub fn create(
        device: &Arc<RhinoDevice>,
        effect_type: EffectType,
    ) -> DeviceResult<Option<Self>> {
        let Some(effect_id) = device.allocate_block(effect_type)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            device: Arc::clone(device),
            effect_id,
            effect_type,
            state: EffectState::Allocated,
            cache: HashMap::new(),
        }))
    }

    pub fn id(&self) -> u8 {
        self.effect_id
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn started(&self) -> bool {
        self.state == EffectState::Started
    }

    fn write_if_changed(&mut self, key: CacheKey, data: Vec<u8>) -> DeviceResult<()> {
        if self.cache.get(&key).is_some_and(|prev| *prev == data) {
            return Ok(());
        }
        self.device.write(&data)?;
        self.cache.insert(key, data);
        Ok(())
    }

    fn guard_destroyed(&self, op: &str) -> bool {
        if self.state == EffectState::Destroyed {
            warn!(
                effect_id = self.effect_id,
                "Ignoring {op} on destroyed effect"
            );
            return true;
        }
        false
    }

    /// Starts the effect. Already-started effects are left alone.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn start(&mut self) -> DeviceResult<()> {
        self.start_opts(1, false, false)
    }

    /// Re-sends the start operation even if the effect is already playing.
    ///
    /// A device reset silently stops everything without the host knowing;
    /// callers recovering from that use this to push the effect back on.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn start_force(&mut self) -> DeviceResult<()> {
        self.start_opts(1, false, true)
    }

    /// Starts with full control over loop count, override semantics and
    /// idempotency.
    ///
    /// `override_other` uses the start-override operation, which displaces
    /// any mutually-exclusive effect such as the device's built-in spring.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn start_opts(
        &mut self,
        loop_count: u8,
        override_other: bool,
        force: bool,
    ) -> DeviceResult<()> {
        if self.guard_destroyed("start") {
            return Ok(());
        }
        if self.state == EffectState::Started && !force {
            return Ok(());
        }
        let operation = if override_other {
            EffectOp::StartOverride
        } else {
            EffectOp::Start
        };
        self.device.write(
            &EffectOperationReport {
                effect_block_index: self.effect_id,
                operation,
                loop_count,
            }
            .encode(),
        )?;
        info!(
            effect_id = self.effect_id,
            effect_type = self.effect_type.name(),
            "Start effect"
        );
        self.state = EffectState::Started;
        Ok(())
    }

    /// Stops the effect. Anything not currently playing is left alone.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn stop(&mut self) -> DeviceResult<()> {
        if self.state != EffectState::Started {
            return Ok(());
        }
        self.device.write(
            &EffectOperationReport {
                effect_block_index: self.effect_id,
                operation: EffectOp::Stop,
                loop_count: 0,
            }
            .encode(),
        )?;
        info!(
            effect_id = self.effect_id,
            effect_type = self.effect_type.name(),
            "Stop effect"
        );
        self.state = EffectState::Stopped;
        Ok(())
    }

    /// Releases the slot back to the device pool. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails when the block-free report cannot be written; the handle is
    /// marked destroyed regardless, since retrying against a wedged device
    /// would leak the slot forever either way.
    pub fn destroy(&mut self) -> DeviceResult<()> {
        if self.state == EffectState::Destroyed {
            return Ok(());
        }
        info!(
            effect_id = self.effect_id,
            effect_type = self.effect_type.name(),
            "Destroy effect"
        );
        self.state = EffectState::Destroyed;
        self.cache.clear();
        self.device.write(
            &BlockFreeReport {
                effect_block_index: self.effect_id,
            }
            .encode(),
        )
    }

    /// Updates the effect definition report, suppressing unchanged bytes.
    ///
    /// # Errors
    ///
    /// Fails when the report cannot be written.
    pub fn set_effect(&mut self, mut report: SetEffectReport) -> DeviceResult<()> {
        if self.guard_destroyed("set_effect") {
            return Ok(());
        }
        report.effect_block_index = self.effect_id;
        report.effect_type = self.effect_type;
        self.write_if_changed(CacheKey::Effect, report.encode())
    }

    /// Sets a constant force from a normalized magnitude in [-1, 1] and a
    /// direction in degrees.
    ///
    /// # Panics
    ///
    /// A magnitude outside [-1, 1] is a caller bug and panics in every build
    /// profile rather than being silently clamped.
    ///
    /// # Errors
    ///
    /// Fails when a report cannot be written.
    pub fn set_constant_force(&mut self, magnitude: f32, direction_deg: f32) -> DeviceResult<()> {
        assert!(
            (-1.0..=1.0).contains(&magnitude),
            "constant force magnitude out of range: {magnitude}"
        );
        if self.guard_destroyed("set_constant_force") {
            return Ok(());
        }
        let effect = SetEffectReport {
            axes_enable: AXIS_ENABLE_DIR,
            direction_x: direction_to_wire(direction_deg),
            ..SetEffectReport::new(self.effect_id, self.effect_type)
        };
        self.write_if_changed(CacheKey::Effect, effect.encode())?;
        let force = SetConstantForceReport {
            effect_block_index: self.effect_id,
            magnitude: magnitude_to_fixed(magnitude),
        };
        self.write_if_changed(CacheKey::ConstantForce, force.encode())
    }

    /// Sets periodic waveform parameters. `magnitude` and `offset` are
    /// normalized ([0, 1] and [-1, 1]); `frequency_hz` of zero means a flat
    /// waveform.
    ///
    /// # Panics
    ///
    /// A magnitude outside [0, 1] is a caller bug and panics in every build
    /// profile rather than being silently clamped.
    ///
    /// # Errors
    ///
    /// Fails when a report cannot be written.
    #[allow(clippy::too_many_arguments, reason = "mirrors the wire report fields")]
    pub fn set_periodic(
        &mut self,
        frequency_hz: f32,
        magnitude: f32,
        direction_deg: f32,
        duration_ms: u16,
        phase: u8,
        offset: f32,
    ) -> DeviceResult<()> {
        assert!(
            (0.0..=1.0).contains(&magnitude),
            "periodic magnitude out of range: {magnitude}"
        );
        debug_assert!(
            self.effect_type.is_periodic(),
            "set_periodic on non-periodic effect type {:?}",
            self.effect_type
        );
        if self.guard_destroyed("set_periodic") {
            return Ok(());
        }
        let effect = SetEffectReport {
            duration: duration_ms,
            axes_enable: AXIS_ENABLE_DIR,
            direction_x: direction_to_wire(direction_deg),
            ..SetEffectReport::new(self.effect_id, self.effect_type)
        };
        self.write_if_changed(CacheKey::Effect, effect.encode())?;
        let periodic = SetPeriodicReport {
            effect_block_index: self.effect_id,
            magnitude: magnitude_to_fixed(magnitude).unsigned_abs(),
            offset: magnitude_to_fixed(offset),
            phase,
            period: hid_rhino_protocol::frequency_to_period_ms(frequency_hz),
        };
        self.write_if_changed(CacheKey::Periodic, periodic.encode())
    }

    /// Sends one per-axis condition block. Always written, never suppressed.
    ///
    /// # Errors
    ///
    /// Fails when the report cannot be written.
    pub fn set_condition(&mut self, mut condition: SetConditionReport) -> DeviceResult<()> {
        if self.guard_destroyed("set_condition") {
            return Ok(());
        }
        condition.effect_block_index = self.effect_id;
        self.device.write(&condition.encode())
    }
}

impl Drop for EffectHandle {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            warn!(
                effect_id = self.effect_id,
                "Failed to free effect slot on drop: {e}"
            );
        } else {
            debug!(effect_id = self.effect_id, "Effect slot freed");
        }
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("effect_id", &self.effect_id)
            .field("effect_type", &self.effect_type)
            .field("state", &self.state)
            .finish()
    }
}
