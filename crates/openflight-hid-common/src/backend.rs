//! Backend trait the device transport is generic over.
//!
//! Production code talks to real hardware through hidapi/rusb; tests swap in
//! [`mock::MockBackend`], which records every write and replays queued
//! feature/input responses.

use crate::{HidDeviceInfo, HidCommonResult};

/// Raw I/O operations against one HID force-feedback device.
///
/// Output reports carry effect parameters and operations; feature reports
/// carry the effect-allocation handshake; input reads are non-blocking and
/// drain the OS buffer. The vendor control read serves the firmware version
/// query, which bypasses the HID layer entirely.
pub trait HidBackend: Send {
    /// Writes one output report (first byte = report id).
    ///
    /// # Errors
    ///
    /// Fails when the device rejects the write or has disconnected.
    fn write_output(&mut self, data: &[u8]) -> HidCommonResult<usize>;

    /// Sends one feature report (first byte = report id).
    ///
    /// # Errors
    ///
    /// Fails when the device rejects the report or has disconnected.
    fn send_feature(&mut self, data: &[u8]) -> HidCommonResult<()>;

    /// Reads a feature report of `len` bytes for the given report id.
    ///
    /// # Errors
    ///
    /// Fails when the device returns no data or has disconnected.
    fn get_feature(&mut self, report_id: u8, len: usize) -> HidCommonResult<Vec<u8>>;

    /// Non-blocking input read; `Ok(None)` when the OS buffer is empty.
    ///
    /// # Errors
    ///
    /// Fails on a transport-level read error, not on an empty buffer.
    fn read_input(&mut self) -> HidCommonResult<Option<Vec<u8>>>;

    /// Device-to-host vendor control transfer of `len` bytes.
    ///
    /// # Errors
    ///
    /// Fails when the control endpoint is unreachable.
    fn control_read_vendor(&mut self, request: u8, len: usize) -> HidCommonResult<Vec<u8>>;

    fn info(&self) -> &HidDeviceInfo;
}

pub mod mock {
    //! In-memory [`HidBackend`] for exercising the effect lifecycle in tests.

    use super::*;
    use crate::HidCommonError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Default)]
    struct MockState {
        write_history: Vec<Vec<u8>>,
        feature_history: Vec<Vec<u8>>,
        feature_queue: VecDeque<Vec<u8>>,
        input_queue: VecDeque<Vec<u8>>,
        vendor_response: Vec<u8>,
        connected: bool,
    }

    /// Shared-state mock device: clones observe the same traffic, so a test
    /// can keep one clone while the transport owns the other.
    #[derive(Clone)]
    pub struct MockBackend {
        info: HidDeviceInfo,
        state: Arc<Mutex<MockState>>,
    }

    impl MockBackend {
        pub fn new(vendor_id: u16, product_id: u16) -> Self {
            Self {
                info: HidDeviceInfo::new(vendor_id, product_id),
                state: Arc::new(Mutex::new(MockState {
                    connected: true,
                    ..MockState::default()
                })),
            }
        }

        /// Queues the response for the next `get_feature` call.
        pub fn queue_feature(&self, data: Vec<u8>) {
            self.state.lock().feature_queue.push_back(data);
        }

        /// Queues one input report for `read_input`.
        pub fn queue_input(&self, data: Vec<u8>) {
            self.state.lock().input_queue.push_back(data);
        }

        pub fn set_vendor_response(&self, data: Vec<u8>) {
            self.state.lock().vendor_response = data;
        }

        /// All output reports written so far, oldest first.
        pub fn write_history(&self) -> Vec<Vec<u8>> {
            self.state.lock().write_history.clone()
        }

        /// All feature reports sent so far, oldest first.
        pub fn feature_history(&self) -> Vec<Vec<u8>> {
            self.state.lock().feature_history.clone()
        }

        /// Output reports whose first byte matches `report_id`.
        pub fn writes_with_id(&self, report_id: u8) -> Vec<Vec<u8>> {
            self.state
                .lock()
                .write_history
                .iter()
                .filter(|w| w.first() == Some(&report_id))
                .cloned()
                .collect()
        }

        pub fn disconnect(&self) {
            self.state.lock().connected = false;
        }
    }

    impl HidBackend for MockBackend {
        fn write_output(&mut self, data: &[u8]) -> HidCommonResult<usize> {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(HidCommonError::Disconnected);
            }
            state.write_history.push(data.to_vec());
            Ok(data.len())
        }

        fn send_feature(&mut self, data: &[u8]) -> HidCommonResult<()> {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(HidCommonError::Disconnected);
            }
            state.feature_history.push(data.to_vec());
            Ok(())
        }

        fn get_feature(&mut self, report_id: u8, _len: usize) -> HidCommonResult<Vec<u8>> {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(HidCommonError::Disconnected);
            }
            state.feature_queue.pop_front().ok_or_else(|| {
                HidCommonError::FeatureError(format!("no queued response for report {report_id}"))
            })
        }

        fn read_input(&mut self) -> HidCommonResult<Option<Vec<u8>>> {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(HidCommonError::Disconnected);
            }
            Ok(state.input_queue.pop_front())
        }

        fn control_read_vendor(&mut self, _request: u8, len: usize) -> HidCommonResult<Vec<u8>> {
            let state = self.state.lock();
            if !state.connected {
                return Err(HidCommonError::Disconnected);
            }
            let mut response = state.vendor_response.clone();
            response.truncate(len);
            Ok(response)
        }

        fn info(&self) -> &HidDeviceInfo {
            &self.info
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_records_writes() {
            let mock = MockBackend::new(0xFFFF, 0x2055);
            let mut backend = mock.clone();

            backend.write_output(&[0x6E, 1, 1, 1]).expect("write");
            assert_eq!(mock.write_history(), vec![vec![0x6E, 1, 1, 1]]);
            assert_eq!(mock.writes_with_id(0x6E).len(), 1);
            assert!(mock.writes_with_id(0x65).is_empty());
        }

        #[test]
        fn test_mock_feature_queue() {
            let mock = MockBackend::new(0xFFFF, 0x2055);
            let mut backend = mock.clone();

            mock.queue_feature(vec![6, 1, 1]);
            assert_eq!(backend.get_feature(6, 5).expect("feature"), vec![6, 1, 1]);
            assert!(backend.get_feature(6, 5).is_err());
        }

        #[test]
        fn test_mock_disconnect() {
            let mock = MockBackend::new(0xFFFF, 0x2055);
            let mut backend = mock.clone();

            mock.disconnect();
            assert!(matches!(
                backend.write_output(&[0x65]),
                Err(HidCommonError::Disconnected)
            ));
        }

        #[test]
        fn test_mock_input_queue_empty_is_none() {
            let mock = MockBackend::new(0xFFFF, 0x2055);
            let mut backend = mock.clone();

            assert!(backend.read_input().expect("read").is_none());
            mock.queue_input(vec![1, 0, 0]);
            assert_eq!(backend.read_input().expect("read"), Some(vec![1, 0, 0]));
        }
    }
}
