//! The session coordinator: the composition root the status window talks to.
//!
//! The coordinator owns the single live [`Session`] and the single live
//! heading filter, and relays decoded protocol events to the filter, the
//! [`MotionController`], and the external status display. All events arrive
//! over one channel from the accept thread, so per-session ordering is
//! preserved without any locking here.

use std::sync::Arc;

use airmouse_core::filter::create_filter;
use airmouse_core::{Heading, HeadingFilter, SensorType, Session, SessionEvent, SessionState};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::motion::MotionController;

/// Capability implemented by the external status display.
///
/// Purely for presentation: the coordinator never reads anything back.
#[cfg_attr(test, mockall::automock)]
pub trait StatusListener: Send + Sync {
    /// A device completed its handshake.
    fn client_connected(&self, session: &Session);
    /// The session reached its terminal state.
    fn client_disconnected(&self);
    /// The transport failed (including rejected handshakes).
    fn connection_error(&self, cause: &str);
    /// A fresh heading was handed to the motion controller.
    fn heading_changed(&self, heading: Heading);
}

/// Wires protocol events to the active filter and the motion controller.
pub struct SessionCoordinator {
    motion: MotionController,
    status: Arc<dyn StatusListener>,
    filter: Option<Box<dyn HeadingFilter>>,
    session: Option<Session>,
}

impl SessionCoordinator {
    pub fn new(motion: MotionController, status: Arc<dyn StatusListener>) -> Self {
        Self {
            motion,
            status,
            filter: None,
            session: None,
        }
    }

    /// The currently connected session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The motion controller (exposed for lifecycle control and tests).
    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    /// Pumps the event channel until every sender is gone, then stops the
    /// motion loop.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        self.motion.stop();
    }

    /// Dispatches one decoded protocol event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ClientConnected {
                peer,
                device_name,
                sensor_type_id,
            } => {
                let session = Session::new(peer, device_name, SensorType::try_from(sensor_type_id).ok());
                info!(
                    "session {}: {} connected from {}",
                    session.id, session.device_name, session.peer
                );
                self.install_filter(sensor_type_id);
                self.status.client_connected(&session);
                self.session = Some(session);
            }

            SessionEvent::SensorSampleReceived { values } => {
                let Some(filter) = self.filter.as_mut() else {
                    debug!("dropping sample: no active filter");
                    return;
                };
                match filter.process_sample(&values) {
                    Ok(Some(heading)) => {
                        self.motion.set_heading(heading.x, heading.y);
                        self.status.heading_changed(heading);
                    }
                    Ok(None) => {} // calibration sample, nothing to drive yet
                    Err(e) => warn!("dropping sample: {e}"),
                }
            }

            SessionEvent::SensorTypeChanged { sensor_type_id } => {
                self.install_filter(sensor_type_id);
                if let Some(session) = self.session.as_mut() {
                    session.sensor_type = SensorType::try_from(sensor_type_id).ok();
                }
            }

            SessionEvent::RecalibrationRequested => {
                if let Some(filter) = self.filter.as_mut() {
                    filter.recalibrate();
                    info!("{} recalibrated", filter.display_name());
                }
            }

            SessionEvent::ClickRequested { is_release } => {
                if self.session.is_none() {
                    debug!("dropping click: no live session");
                    return;
                }
                let result = if is_release {
                    self.motion.release()
                } else {
                    self.motion.press()
                };
                if let Err(e) = result {
                    warn!("click failed: {e}");
                }
            }

            SessionEvent::ConnectionError { cause } => {
                self.status.connection_error(&cause);
                self.teardown();
            }

            SessionEvent::ClientDisconnected => {
                self.status.client_disconnected();
                self.teardown();
            }
        }
    }

    /// Swaps in the filter for a sensor type id; an unknown id leaves the
    /// filter unset and the session running.
    fn install_filter(&mut self, sensor_type_id: i32) {
        match create_filter(sensor_type_id) {
            Ok(filter) => {
                info!("active filter: {}", filter.display_name());
                self.filter = Some(filter);
            }
            Err(e) => {
                warn!("{e}; sensor input is ignored until a known type is selected");
                self.filter = None;
            }
        }
    }

    /// Drops the session and its filter, and parks the pointer.
    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.state = SessionState::Closed;
            info!("session {} closed", session.id);
        }
        self.filter = None;
        // Zero the heading so no residual motion outlives the session, but
        // never start the loop just to animate a zero.
        if self.motion.is_running() {
            self.motion.set_heading(0.0, 0.0);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;
    use crate::application::motion::PointerActuator;
    use crate::infrastructure::actuator::mock::MockPointerActuator;

    fn peer() -> SocketAddr {
        "192.168.1.42:51000".parse().unwrap()
    }

    fn connected_event(sensor_type_id: i32) -> SessionEvent {
        SessionEvent::ClientConnected {
            peer: peer(),
            device_name: "devA".to_string(),
            sensor_type_id,
        }
    }

    fn sample(values: &[f64]) -> SessionEvent {
        SessionEvent::SensorSampleReceived {
            values: values.to_vec(),
        }
    }

    fn coordinator_with(
        status: MockStatusListener,
    ) -> (SessionCoordinator, Arc<MockPointerActuator>) {
        let actuator = Arc::new(MockPointerActuator::new((1920, 1080)));
        let motion = MotionController::new(Arc::clone(&actuator) as Arc<dyn PointerActuator>);
        (
            SessionCoordinator::new(motion, Arc::new(status)),
            actuator,
        )
    }

    #[test]
    fn test_connect_installs_filter_and_notifies_status() {
        let mut status = MockStatusListener::new();
        status
            .expect_client_connected()
            .withf(|s: &Session| {
                s.device_name == "devA" && s.sensor_type == Some(SensorType::Accelerometer)
            })
            .times(1)
            .return_const(());
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(1));

        assert!(coordinator.session().is_some());
    }

    #[test]
    fn test_calibration_sample_emits_no_heading() {
        let mut status = MockStatusListener::new();
        status.expect_client_connected().return_const(());
        status.expect_heading_changed().times(0);
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(1));
        coordinator.handle_event(sample(&[5.0, 5.0]));

        coordinator.motion().stop();
    }

    #[test]
    fn test_second_sample_drives_the_motion_controller() {
        let mut status = MockStatusListener::new();
        status.expect_client_connected().return_const(());
        status
            .expect_heading_changed()
            .withf(|h: &Heading| *h == Heading::new(-3.0, 2.0))
            .times(1)
            .return_const(());
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(1));
        coordinator.handle_event(sample(&[0.0, 0.0])); // origin
        coordinator.handle_event(sample(&[3.0, 2.0]));

        assert!(coordinator.motion().is_running());
        coordinator.motion().stop();
    }

    #[test]
    fn test_unknown_sensor_type_keeps_session_but_drops_samples() {
        let mut status = MockStatusListener::new();
        status
            .expect_client_connected()
            .withf(|s: &Session| s.sensor_type.is_none())
            .times(1)
            .return_const(());
        status.expect_heading_changed().times(0);
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(99));
        coordinator.handle_event(sample(&[0.0, 0.0]));
        coordinator.handle_event(sample(&[5.0, 5.0]));

        assert!(coordinator.session().is_some());
        assert!(!coordinator.motion().is_running());
    }

    #[test]
    fn test_type_change_swaps_filter_and_recalibrates_from_scratch() {
        let mut status = MockStatusListener::new();
        status.expect_client_connected().return_const(());
        // Only the post-switch gyroscope delta may produce a heading, and
        // the gyroscope gain must be visible in it.
        status
            .expect_heading_changed()
            .withf(|h: &Heading| *h == Heading::new(-5.0, 0.0))
            .times(1)
            .return_const(());
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(1));
        coordinator.handle_event(sample(&[0.0, 0.0])); // accelerometer origin
        coordinator.handle_event(SessionEvent::SensorTypeChanged { sensor_type_id: 2 });
        coordinator.handle_event(sample(&[1.0, 1.0])); // fresh gyroscope origin
        coordinator.handle_event(sample(&[1.5, 1.0]));

        assert_eq!(
            coordinator.session().unwrap().sensor_type,
            Some(SensorType::Gyroscope)
        );
        coordinator.motion().stop();
    }

    #[test]
    fn test_recalibration_makes_next_sample_the_origin() {
        let mut status = MockStatusListener::new();
        status.expect_client_connected().return_const(());
        status.expect_heading_changed().times(1).return_const(());
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(1));
        coordinator.handle_event(sample(&[0.0, 0.0])); // origin
        coordinator.handle_event(sample(&[4.0, 0.0])); // heading #1
        coordinator.handle_event(SessionEvent::RecalibrationRequested);
        coordinator.handle_event(sample(&[100.0, 100.0])); // new origin, no heading

        coordinator.motion().stop();
    }

    #[test]
    fn test_clicks_reach_the_actuator_even_without_a_filter() {
        let mut status = MockStatusListener::new();
        status.expect_client_connected().return_const(());
        let (mut coordinator, actuator) = coordinator_with(status);

        // Unknown sensor type: no filter, but the session is live.
        coordinator.handle_event(connected_event(99));
        coordinator.handle_event(SessionEvent::ClickRequested { is_release: false });
        coordinator.handle_event(SessionEvent::ClickRequested { is_release: true });

        assert_eq!(*actuator.buttons.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_click_without_session_is_dropped() {
        let status = MockStatusListener::new();
        let (mut coordinator, actuator) = coordinator_with(status);

        coordinator.handle_event(SessionEvent::ClickRequested { is_release: false });

        assert!(actuator.buttons.lock().unwrap().is_empty());
    }

    #[test]
    fn test_disconnect_tears_down_session_and_filter() {
        let mut status = MockStatusListener::new();
        status.expect_client_connected().return_const(());
        status.expect_client_disconnected().times(1).return_const(());
        status.expect_heading_changed().times(0);
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(1));
        coordinator.handle_event(SessionEvent::ClientDisconnected);

        assert!(coordinator.session().is_none());
        // The filter is gone: further samples are dropped silently.
        coordinator.handle_event(sample(&[0.0, 0.0]));
        coordinator.handle_event(sample(&[9.0, 9.0]));
    }

    #[test]
    fn test_connection_error_notifies_status_and_tears_down() {
        let mut status = MockStatusListener::new();
        status.expect_client_connected().return_const(());
        status
            .expect_connection_error()
            .withf(|cause: &str| cause.contains("reset"))
            .times(1)
            .return_const(());
        let (mut coordinator, _actuator) = coordinator_with(status);

        coordinator.handle_event(connected_event(2));
        coordinator.handle_event(SessionEvent::ConnectionError {
            cause: "connection reset by peer".to_string(),
        });

        assert!(coordinator.session().is_none());
    }
}
