//! Semantic haptic effects layered over raw effect handles.
//!
//! A [`HapticEffect`] is what telemetry handlers hold on to: it allocates a
//! hardware slot lazily on first use, keeps working (as a silent no-op) when
//! the device pool is exhausted, and re-tries allocation on later updates
//! once slots have been freed. Parameter methods return `&mut Self` so call
//! sites read as one chain:
//!
//! ```ignore
//! effects.get("rpm", || HapticEffect::named(device.clone(), "rpm"))
//!     .lock()
//!     .periodic(Periodic::new(25.0, 0.2, 90.0))?
//!     .start()?;
//! ```

use crate::handle::EffectHandle;
use crate::transport::RhinoDevice;
use crate::DeviceResult;
use hid_rhino_protocol::{EffectType, SetConditionReport, SetEffectReport, FORCE_SCALE};
use openflight_dispenser::Destroyable;
use openflight_filters::{Direction, RandomDirectionModulator};
use std::sync::Arc;
use tracing::{debug, warn};

/// Parameters of one periodic waveform update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periodic {
    pub frequency_hz: f32,
    /// Normalized amplitude in [0, 1].
    pub magnitude: f32,
    pub direction: Direction,
    pub waveform: EffectType,
    /// Total duration in ms; 0 means until stopped.
    pub duration_ms: u16,
    pub phase: u8,
    /// Normalized DC offset in [-1, 1].
    pub offset: f32,
}

impl Periodic {
    /// A sine waveform with the given frequency, amplitude and direction.
    pub fn new(frequency_hz: f32, magnitude: f32, direction: impl Into<Direction>) -> Self {
        Self {
            frequency_hz,
            magnitude,
            direction: direction.into(),
            waveform: EffectType::Sine,
            duration_ms: 0,
            phase: 0,
            offset: 0.0,
        }
    }

    pub fn with_waveform(mut self, waveform: EffectType) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u16) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_phase(mut self, phase: u8) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }
}

/// One named, lazily-allocated haptic effect.
pub struct HapticEffect {
    device: Arc<RhinoDevice>,
    name: Option<String>,
    handle: Option<EffectHandle>,
    modulator: Option<RandomDirectionModulator>,
}

impl HapticEffect {
    pub fn new(device: Arc<RhinoDevice>) -> Self {
        Self {
            device,
            name: None,
            handle: None,
            modulator: None,
        }
    }

    /// An effect carrying a name used in lifecycle log messages, typically
    /// the dispenser key it is registered under.
    pub fn named(device: Arc<RhinoDevice>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(device)
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True when the underlying hardware effect is currently playing.
    pub fn started(&self) -> bool {
        self.handle.as_ref().is_some_and(EffectHandle::started)
    }

    /// The hardware slot, allocating it on first use.
    ///
    /// Allocation failure due to a full pool leaves the effect empty and
    /// returns `None`; the next update tries again, so the effect comes
    /// alive as soon as another caller frees a slot.
    fn ensure_handle(&mut self, effect_type: EffectType) -> DeviceResult<Option<&mut EffectHandle>> {
        if self.handle.is_none() {
            match EffectHandle::create(&self.device, effect_type)? {
                Some(handle) => {
                    debug!(
                        effect_id = handle.id(),
                        effect_type = effect_type.name(),
                        name = self.name.as_deref().unwrap_or("-"),
                        "Allocated haptic effect"
                    );
                    self.handle = Some(handle);
                }
                None => return Ok(None),
            }
        }
        Ok(self.handle.as_mut())
    }

    /// An angle in degrees, drawn from the modulator for hopping directions.
    fn resolve_direction(&mut self, direction: Direction) -> f32 {
        match direction {
            Direction::Fixed(degrees) => degrees,
            Direction::RandomHop { period } => self
                .modulator
                .get_or_insert_with(|| RandomDirectionModulator::new(period))
                .update(),
        }
    }

    /// Updates the waveform parameters, allocating on first call.
    ///
    /// # Errors
    ///
    /// Fails on transport-level I/O errors. Pool exhaustion is not an error.
    pub fn periodic(&mut self, params: Periodic) -> DeviceResult<&mut Self> {
        let direction_deg = self.resolve_direction(params.direction);
        if let Some(handle) = self.ensure_handle(params.waveform)? {
            handle.set_periodic(
                params.frequency_hz,
                params.magnitude,
                direction_deg,
                params.duration_ms,
                params.phase,
                params.offset,
            )?;
        }
        Ok(self)
    }

    /// Updates a constant force from a normalized magnitude in [-1, 1] and
    /// a direction.
    ///
    /// # Errors
    ///
    /// Fails on transport-level I/O errors. Pool exhaustion is not an error.
    pub fn constant(
        &mut self,
        magnitude: f32,
        direction: impl Into<Direction>,
    ) -> DeviceResult<&mut Self> {
        let direction_deg = self.resolve_direction(direction.into());
        if let Some(handle) = self.ensure_handle(EffectType::Constant)? {
            handle.set_constant_force(magnitude, direction_deg)?;
        }
        Ok(self)
    }

    /// Updates spring coefficients, in device fixed-point units (±4096).
    ///
    /// # Errors
    ///
    /// Fails on transport-level I/O errors. Pool exhaustion is not an error.
    pub fn spring(&mut self, coef_x: Option<f32>, coef_y: Option<f32>) -> DeviceResult<&mut Self> {
        self.conditional(EffectType::Spring, coef_x, coef_y)
    }

    /// Updates damper coefficients, in device fixed-point units (±4096).
    ///
    /// # Errors
    ///
    /// Fails on transport-level I/O errors. Pool exhaustion is not an error.
    pub fn damper(&mut self, coef_x: Option<f32>, coef_y: Option<f32>) -> DeviceResult<&mut Self> {
        self.conditional(EffectType::Damper, coef_x, coef_y)
    }

    /// Updates friction coefficients, in device fixed-point units (±4096).
    ///
    /// # Errors
    ///
    /// Fails on transport-level I/O errors. Pool exhaustion is not an error.
    pub fn friction(
        &mut self,
        coef_x: Option<f32>,
        coef_y: Option<f32>,
    ) -> DeviceResult<&mut Self> {
        self.conditional(EffectType::Friction, coef_x, coef_y)
    }

    /// Updates inertia coefficients, in device fixed-point units (±4096).
    ///
    /// # Errors
    ///
    /// Fails on transport-level I/O errors. Pool exhaustion is not an error.
    pub fn inertia(&mut self, coef_x: Option<f32>, coef_y: Option<f32>) -> DeviceResult<&mut Self> {
        self.conditional(EffectType::Inertia, coef_x, coef_y)
    }

    fn conditional(
        &mut self,
        effect_type: EffectType,
        coef_x: Option<f32>,
        coef_y: Option<f32>,
    ) -> DeviceResult<&mut Self> {
        if let Some(handle) = self.ensure_handle(effect_type)? {
            // Condition effects need a definition report too (gain, axes
            // enable, duration); repeats are suppressed by the write cache.
            handle.set_effect(SetEffectReport::new(handle.id(), effect_type))?;
            for (axis, coef) in [(0u8, coef_x), (1, coef_y)] {
                if let Some(coef) = coef {
                    let fixed = coef
                        .round()
                        .clamp(-f32::from(FORCE_SCALE), f32::from(FORCE_SCALE))
                        as i16;
                    handle.set_condition(SetConditionReport::symmetric(axis, fixed))?;
                }
            }
        }
        Ok(self)
    }

    /// Starts playback; a no-op while the pool denies a slot.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn start(&mut self) -> DeviceResult<&mut Self> {
        if let Some(handle) = self.handle.as_mut() {
            handle.start()?;
        }
        Ok(self)
    }

    /// Re-sends the start operation even when already playing, used after a
    /// device reset has silently stopped everything.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn start_force(&mut self) -> DeviceResult<&mut Self> {
        if let Some(handle) = self.handle.as_mut() {
            handle.start_force()?;
        }
        Ok(self)
    }

    /// Starts with explicit loop count, override and idempotency control,
    /// mirroring [`EffectHandle::start_opts`]. Override starts displace
    /// mutually-exclusive effects such as the device's built-in spring.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn start_opts(
        &mut self,
        loop_count: u8,
        override_other: bool,
        force: bool,
    ) -> DeviceResult<&mut Self> {
        if let Some(handle) = self.handle.as_mut() {
            handle.start_opts(loop_count, override_other, force)?;
        }
        Ok(self)
    }

    /// Stops playback; a no-op when not playing.
    ///
    /// # Errors
    ///
    /// Fails when the operation report cannot be written.
    pub fn stop(&mut self) -> DeviceResult<&mut Self> {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop()?;
        }
        Ok(self)
    }

    /// Frees the hardware slot. The effect stays usable; the next parameter
    /// update allocates a fresh slot.
    ///
    /// # Errors
    ///
    /// Fails when the block-free report cannot be written; the slot is
    /// considered released either way.
    pub fn destroy(&mut self) -> DeviceResult<()> {
        if let Some(mut handle) = self.handle.take() {
            handle.destroy()?;
        }
        Ok(())
    }
}

impl Destroyable for HapticEffect {
    fn destroy(&mut self) {
        if let Err(e) = HapticEffect::destroy(self) {
            warn!(
                name = self.name.as_deref().unwrap_or("-"),
                "Failed to destroy haptic effect: {e}"
            );
        }
    }
}

impl std::fmt::Debug for HapticEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapticEffect")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hid_rhino_protocol::{
        AXIS_ENABLE_X, AXIS_ENABLE_Y, HID_REPORT_ID_BLOCK_FREE, HID_REPORT_ID_EFFECT_OPERATION,
        HID_REPORT_ID_PID_BLOCK_LOAD, HID_REPORT_ID_SET_CONDITION, HID_REPORT_ID_SET_EFFECT,
        HID_REPORT_ID_SET_PERIODIC, PRODUCT_ID, VENDOR_ID,
    };
    use openflight_hid_common::mock::MockBackend;

    fn device_with_mock() -> (Arc<RhinoDevice>, MockBackend) {
        let mock = MockBackend::new(VENDOR_ID, PRODUCT_ID);
        let device = RhinoDevice::from_backend(Box::new(mock.clone()));
        (device, mock)
    }

    fn queue_allocation(mock: &MockBackend, id: u8) {
        mock.queue_feature(vec![HID_REPORT_ID_PID_BLOCK_LOAD, id, 1, 0, 0]);
    }

    fn queue_pool_full(mock: &MockBackend) {
        mock.queue_feature(vec![HID_REPORT_ID_PID_BLOCK_LOAD, 0, 2, 0, 0]);
    }

    #[test]
    fn test_periodic_chain_allocates_and_starts() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 1);

        let mut effect = HapticEffect::named(device, "rumble");
        effect
            .periodic(Periodic::new(10.0, 0.5, 90.0))
            .expect("update")
            .start()
            .expect("start");

        assert!(effect.started());
        let periodics = mock.writes_with_id(HID_REPORT_ID_SET_PERIODIC);
        assert_eq!(periodics.len(), 1);
        assert_eq!(&periodics[0][2..4], &2048u16.to_le_bytes());
        assert_eq!(&periodics[0][7..9], &100u16.to_le_bytes());
    }

    #[test]
    fn test_pool_full_effect_is_silent_noop() {
        let (device, mock) = device_with_mock();
        queue_pool_full(&mock);

        let mut effect = HapticEffect::new(device);
        effect
            .periodic(Periodic::new(10.0, 0.5, 0.0))
            .expect("update")
            .start()
            .expect("start");

        assert!(!effect.started());
        assert!(mock.write_history().is_empty());
    }

    #[test]
    fn test_retries_allocation_after_pool_frees_up() {
        let (device, mock) = device_with_mock();
        queue_pool_full(&mock);

        let mut effect = HapticEffect::new(device);
        effect.constant(0.5, 0.0).expect("update");
        assert!(mock.write_history().is_empty());

        queue_allocation(&mock, 2);
        effect.constant(0.5, 0.0).expect("update");
        effect.start().expect("start");
        assert!(effect.started());
    }

    #[test]
    fn test_spring_clamps_and_resends_identical_bytes() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 3);

        let mut effect = HapticEffect::new(device);
        effect.spring(Some(4096.0), None).expect("update");
        effect.spring(Some(8000.0), None).expect("update");

        let conds = mock.writes_with_id(HID_REPORT_ID_SET_CONDITION);
        assert_eq!(conds.len(), 2);
        // both clamp to full scale and still both reach the wire
        assert_eq!(conds[0], conds[1]);
        assert_eq!(&conds[0][5..7], &4096i16.to_le_bytes());
    }

    #[test]
    fn test_conditional_sends_effect_definition_once() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 3);

        let mut effect = HapticEffect::new(device);
        effect.spring(Some(2000.0), Some(2000.0)).expect("update");
        effect.spring(Some(2000.0), Some(2000.0)).expect("update");
        effect.start().expect("start");

        // the device learns gain/axes/duration before the effect starts
        let definitions = mock.writes_with_id(HID_REPORT_ID_SET_EFFECT);
        assert_eq!(definitions.len(), 1);
        assert_eq!(&definitions[0][9..11], &4096u16.to_le_bytes());
        assert_eq!(definitions[0][12], AXIS_ENABLE_X | AXIS_ENABLE_Y);
        assert_eq!(mock.writes_with_id(HID_REPORT_ID_SET_CONDITION).len(), 4);
    }

    #[test]
    fn test_start_opts_passes_override_through() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 8);

        let mut effect = HapticEffect::new(device);
        effect
            .spring(Some(1000.0), None)
            .expect("update")
            .start_opts(1, true, false)
            .expect("start");

        let ops = mock.writes_with_id(HID_REPORT_ID_EFFECT_OPERATION);
        assert_eq!(ops, vec![vec![HID_REPORT_ID_EFFECT_OPERATION, 8, 4, 1]]);
    }

    #[test]
    fn test_conditional_skips_absent_axes() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 4);

        let mut effect = HapticEffect::new(device);
        effect.damper(None, Some(1200.0)).expect("update");

        let conds = mock.writes_with_id(HID_REPORT_ID_SET_CONDITION);
        assert_eq!(conds.len(), 1);
        // axis byte: 1 = Y
        assert_eq!(conds[0][2], 1);
    }

    #[test]
    fn test_destroy_frees_slot_and_allows_reuse() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 5);

        let mut effect = HapticEffect::new(device);
        effect.constant(0.5, 0.0).expect("update");
        effect.destroy().expect("destroy");
        assert_eq!(mock.writes_with_id(HID_REPORT_ID_BLOCK_FREE).len(), 1);
        assert!(!effect.started());

        queue_allocation(&mock, 5);
        effect.constant(0.25, 0.0).expect("update");
        effect.start().expect("start");
        assert!(effect.started());
    }

    #[test]
    fn test_destroyable_trait_releases_slot() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 6);

        let mut effect = HapticEffect::new(device);
        effect.constant(1.0, 180.0).expect("update");
        Destroyable::destroy(&mut effect);
        assert_eq!(mock.writes_with_id(HID_REPORT_ID_BLOCK_FREE).len(), 1);
    }

    #[test]
    fn test_random_direction_stays_in_wire_range() {
        let (device, mock) = device_with_mock();
        queue_allocation(&mock, 7);

        let mut effect = HapticEffect::new(device);
        let direction = Direction::RandomHop {
            period: std::time::Duration::from_millis(0),
        };
        for _ in 0..10 {
            effect
                .periodic(Periodic::new(10.0, 0.5, direction))
                .expect("update");
        }
        let effects = mock.writes_with_id(hid_rhino_protocol::HID_REPORT_ID_SET_EFFECT);
        assert!(!effects.is_empty());
        // direction is polar on X for modulated effects
        assert_eq!(effects[0][12], hid_rhino_protocol::AXIS_ENABLE_DIR);
    }
}
