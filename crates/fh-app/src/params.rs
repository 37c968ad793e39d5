//! Settable parameter dispatch.
//!
//! Payloads arrive as raw strings from the device framework. Unknown names,
//! malformed payloads and out-of-range values are dropped; the previous value
//! stays in effect.

use fh_core::{ParamId, ParamValue};
use tracing::{debug, warn};

use crate::controller::HeatingController;

impl HeatingController {
    /// Apply a raw `payload` to the parameter called `name`.
    pub fn on_set(&mut self, name: &str, payload: &str) -> bool {
        let id = match name.parse::<ParamId>() {
            Ok(id) => id,
            Err(err) => {
                debug!(%err, "ignored parameter");
                return false;
            }
        };
        match id.parse_payload(payload) {
            Ok(value) => self.set_param(id, value),
            Err(err) => {
                warn!(%err, "ignored parameter");
                false
            }
        }
    }

    /// Apply an already parsed parameter value.
    pub fn set_param(&mut self, id: ParamId, value: ParamValue) -> bool {
        let accepted = match id {
            ParamId::Kp => self.orchestrator.regulator_mut().set_kp(value.as_f64()),
            ParamId::Tn => self.orchestrator.regulator_mut().set_tn(value.as_f64()),
            ParamId::Slope => self.orchestrator.setpoint_mut().set_slope(value.as_f64()),
            ParamId::Origin => self.orchestrator.setpoint_mut().set_origin(value.as_f64()),
            ParamId::MaxFlowTemp => self.orchestrator.setpoint_mut().set_ceiling(value.as_f64()),
            ParamId::LowpassFilterK2 => self.sensors.set_lowpass_k2(value.as_f64()),
            ParamId::NumberOfOpenValves => value
                .as_i64()
                .is_some_and(|count| self.orchestrator.set_number_of_open_valves(count)),
            ParamId::ValveTarget => value
                .as_i64()
                .and_then(|target| u8::try_from(target).ok())
                .is_some_and(|target| self.valve_handle.set_target(target)),
        };
        debug!(param = %id, ?value, accepted, "parameter update");
        accepted
    }
}
