//! Three-channel temperature acquisition.
//!
//! Sampling (≈100 ms) and reading are decoupled: [`SensorConditioner::sample`]
//! runs on the sampling cadence and updates every channel, the getters hand
//! out the latest derived temperature and publish it.

use std::sync::Arc;
use std::time::Duration;

use fh_core::units::{Resistance, Temperature, Voltage, as_degc, as_mv, as_ohm, degc};
use fh_core::{AnalogChannel, AnalogInput, PropertyId, PropertySink, PropertyValue, Tickable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SensorError, SensorResult};
use crate::filter::LowpassFilter;
use crate::thermistor::ThermistorModel;

/// Which measurement point a channel observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Outside,
    Flow,
    Return,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [
        ChannelKind::Outside,
        ChannelKind::Flow,
        ChannelKind::Return,
    ];

    pub fn property(self) -> PropertyId {
        match self {
            ChannelKind::Outside => PropertyId::OutsideTemperature,
            ChannelKind::Flow => PropertyId::FlowTemperature,
            ChannelKind::Return => PropertyId::ReturnTemperature,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ChannelKind::Outside => "outside",
            ChannelKind::Flow => "flow",
            ChannelKind::Return => "return",
        }
    }
}

/// Sensor front-end configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub outside_channel: u8,
    pub flow_channel: u8,
    pub return_channel: u8,
    /// Right shift from the 16-bit sample to the working resolution.
    pub adc_shift: u32,
    /// Slow filter coefficient shared by the three channels.
    pub lowpass_k2: f64,
    /// Fast filter coefficient for the unsmoothed flow reading.
    pub raw_flow_k2: f64,
    pub thermistor: ThermistorModel,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            outside_channel: 28,
            flow_channel: 27,
            return_channel: 26,
            adc_shift: 4,
            lowpass_k2: 0.0005,
            raw_flow_k2: 0.01,
            thermistor: ThermistorModel::default(),
        }
    }
}

impl SensorConfig {
    pub fn validate(&self) -> SensorResult<()> {
        if self.adc_shift > 15 {
            return Err(SensorError::InvalidArg {
                what: "adc_shift must be at most 15",
            });
        }
        if LowpassFilter::new(self.lowpass_k2).is_none() {
            return Err(SensorError::InvalidArg {
                what: "lowpass_k2 must be within [0, 1]",
            });
        }
        if LowpassFilter::new(self.raw_flow_k2).is_none() {
            return Err(SensorError::InvalidArg {
                what: "raw_flow_k2 must be within [0, 1]",
            });
        }
        let (o, f, r) = (self.outside_channel, self.flow_channel, self.return_channel);
        if o == f || o == r || f == r {
            return Err(SensorError::InvalidArg {
                what: "sensor channels must be distinct",
            });
        }
        self.thermistor.validate()
    }

    /// Working full scale after the shift (4096 for a 12-bit result).
    pub fn full_scale(&self) -> f64 {
        ((u32::from(u16::MAX) + 1) >> self.adc_shift) as f64
    }

    /// Raw 16-bit sample the front end would read at `celsius`.
    pub fn sample_for(&self, celsius: f64) -> u16 {
        let v = as_mv(self.thermistor.voltage_for(degc(celsius)));
        let counts = (v / self.thermistor.ref_voltage_mv * self.full_scale()).round();
        let max = self.full_scale() - 1.0;
        (counts.clamp(0.0, max) as u32 as u16) << self.adc_shift
    }

    fn channel(&self, kind: ChannelKind) -> AnalogChannel {
        AnalogChannel(match kind {
            ChannelKind::Outside => self.outside_channel,
            ChannelKind::Flow => self.flow_channel,
            ChannelKind::Return => self.return_channel,
        })
    }
}

/// One measurement point and everything derived from it.
#[derive(Debug, Clone)]
pub struct TemperatureChannel {
    pub kind: ChannelKind,
    pub input: AnalogChannel,
    /// Last shifted sample.
    pub raw: u16,
    filter: LowpassFilter,
    pub voltage: Voltage,
    pub resistance: Resistance,
    pub temperature: Temperature,
}

impl TemperatureChannel {
    fn new(
        kind: ChannelKind,
        input: AnalogChannel,
        filter: LowpassFilter,
        model: &ThermistorModel,
        full_scale: f64,
    ) -> Self {
        let mut channel = Self {
            kind,
            input,
            raw: 0,
            filter,
            voltage: Voltage::default(),
            resistance: Resistance::default(),
            temperature: Temperature::default(),
        };
        channel.derive(0.0, model, full_scale);
        channel
    }

    fn derive(&mut self, filtered: f64, model: &ThermistorModel, full_scale: f64) {
        self.voltage = model.voltage(filtered, full_scale);
        self.resistance = model.resistance(self.voltage);
        self.temperature = model.temperature(self.resistance);
    }

    fn push(&mut self, raw: u16, model: &ThermistorModel, full_scale: f64) {
        self.raw = raw;
        let filtered = self.filter.update(f64::from(raw));
        self.derive(filtered, model, full_scale);
    }

    /// Filtered value in working counts, `None` before the first sample.
    pub fn filtered(&self) -> Option<f64> {
        self.filter.value()
    }

    pub fn celsius(&self) -> f64 {
        as_degc(self.temperature)
    }
}

/// Owns the three temperature channels and the analog input they read from.
pub struct SensorConditioner {
    config: SensorConfig,
    full_scale: f64,
    input: Box<dyn AnalogInput>,
    sink: Arc<dyn PropertySink>,
    outside: TemperatureChannel,
    flow: TemperatureChannel,
    ret: TemperatureChannel,
    raw_flow: TemperatureChannel,
}

impl SensorConditioner {
    pub fn new(
        config: SensorConfig,
        input: Box<dyn AnalogInput>,
        sink: Arc<dyn PropertySink>,
    ) -> SensorResult<Self> {
        config.validate()?;
        let full_scale = config.full_scale();
        let slow = LowpassFilter::new(config.lowpass_k2).ok_or(SensorError::InvalidArg {
            what: "lowpass_k2 must be within [0, 1]",
        })?;
        let fast = LowpassFilter::new(config.raw_flow_k2).ok_or(SensorError::InvalidArg {
            what: "raw_flow_k2 must be within [0, 1]",
        })?;
        let model = &config.thermistor;
        let make = |kind, filter| {
            TemperatureChannel::new(kind, config.channel(kind), filter, model, full_scale)
        };
        let outside = make(ChannelKind::Outside, slow.clone());
        let flow = make(ChannelKind::Flow, slow.clone());
        let ret = make(ChannelKind::Return, slow);
        let raw_flow = make(ChannelKind::Flow, fast);
        Ok(Self {
            full_scale,
            input,
            sink,
            outside,
            flow,
            ret,
            raw_flow,
            config,
        })
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Read every channel once and push the samples through the filters.
    pub fn sample(&mut self) {
        let shift = self.config.adc_shift;
        let model = &self.config.thermistor;

        let outside = self.input.read(self.outside.input) >> shift;
        self.outside.push(outside, model, self.full_scale);

        let ret = self.input.read(self.ret.input) >> shift;
        self.ret.push(ret, model, self.full_scale);

        // the flow sample feeds both the slow and the fast filter
        let flow = self.input.read(self.flow.input) >> shift;
        self.flow.push(flow, model, self.full_scale);
        self.raw_flow.push(flow, model, self.full_scale);
    }

    pub fn channel(&self, kind: ChannelKind) -> &TemperatureChannel {
        match kind {
            ChannelKind::Outside => &self.outside,
            ChannelKind::Flow => &self.flow,
            ChannelKind::Return => &self.ret,
        }
    }

    /// Latest temperature without publishing it.
    pub fn peek(&self, kind: ChannelKind) -> f64 {
        self.channel(kind).celsius()
    }

    fn report(&self, kind: ChannelKind) -> f64 {
        let ch = self.channel(kind);
        let t = ch.celsius();
        debug!(
            channel = kind.label(),
            voltage_mv = as_mv(ch.voltage),
            resistance_ohm = as_ohm(ch.resistance),
            temperature_c = t,
            "temperature reading"
        );
        self.sink.publish(kind.property(), PropertyValue::Float(t));
        t
    }

    pub fn outside_temperature(&self) -> f64 {
        self.report(ChannelKind::Outside)
    }

    /// Flow temperature; also publishes the fast-filtered flow reading.
    pub fn flow_temperature(&self) -> f64 {
        let t = self.report(ChannelKind::Flow);
        self.sink.publish(
            PropertyId::RawFlowTemperature,
            PropertyValue::Float(self.raw_flow.celsius()),
        );
        t
    }

    pub fn return_temperature(&self) -> f64 {
        self.report(ChannelKind::Return)
    }

    /// Fast-filtered flow temperature, without publishing.
    pub fn raw_flow_temperature(&self) -> f64 {
        self.raw_flow.celsius()
    }

    pub fn lowpass_k2(&self) -> f64 {
        self.config.lowpass_k2
    }

    /// Retune the slow filter of all three channels.
    ///
    /// Values outside [0, 1] are ignored and `false` is returned.
    pub fn set_lowpass_k2(&mut self, k2: f64) -> bool {
        let mut probe = self.outside.filter.clone();
        if !probe.set_k2(k2) {
            warn!(k2, "rejected lowpass coefficient");
            return false;
        }
        for ch in [&mut self.outside, &mut self.flow, &mut self.ret] {
            ch.filter.set_k2(k2);
        }
        self.config.lowpass_k2 = k2;
        self.sink
            .publish(PropertyId::LowpassFilterK2, PropertyValue::Float(k2));
        true
    }
}

impl Tickable for SensorConditioner {
    fn tick(&mut self, _now: Duration) {
        self.sample();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedInput(HashMap<u8, u16>);

    impl AnalogInput for FixedInput {
        fn read(&mut self, channel: AnalogChannel) -> u16 {
            self.0.get(&channel.0).copied().unwrap_or(0)
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(PropertyId, PropertyValue)>>);

    impl PropertySink for Recorder {
        fn publish(&self, id: PropertyId, value: PropertyValue) {
            self.0.lock().unwrap().push((id, value));
        }
    }

    fn conditioner(readings: &[(u8, u16)], sink: Arc<Recorder>) -> SensorConditioner {
        let input = FixedInput(readings.iter().copied().collect());
        SensorConditioner::new(SensorConfig::default(), Box::new(input), sink).unwrap()
    }

    #[test]
    fn full_scale_for_default_shift() {
        assert_eq!(SensorConfig::default().full_scale(), 4096.0);
    }

    #[test]
    fn synthesised_samples_read_back() {
        let sink = Arc::new(Recorder::default());
        let config = SensorConfig::default();
        let readings = [
            (28, config.sample_for(-10.0)),
            (27, config.sample_for(38.0)),
            (26, config.sample_for(30.0)),
        ];
        let mut c = conditioner(&readings, sink);
        c.sample();
        assert!((c.peek(ChannelKind::Outside) + 10.0).abs() < 0.5);
        assert!((c.peek(ChannelKind::Flow) - 38.0).abs() < 0.5);
        assert!((c.peek(ChannelKind::Return) - 30.0).abs() < 0.5);
    }

    #[test]
    fn rejects_duplicate_channels() {
        let config = SensorConfig {
            flow_channel: 28,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn first_sample_is_not_smoothed() {
        let sink = Arc::new(Recorder::default());
        let mut c = conditioner(&[(28, 0x8000), (27, 0x4000), (26, 0x2000)], sink);
        c.sample();
        assert_eq!(c.channel(ChannelKind::Outside).filtered(), Some(2048.0));
        assert_eq!(c.channel(ChannelKind::Flow).filtered(), Some(1024.0));
        assert_eq!(c.channel(ChannelKind::Return).filtered(), Some(512.0));
        assert!((as_mv(c.channel(ChannelKind::Outside).voltage) - 1650.0).abs() < 1e-9);
    }

    #[test]
    fn reading_publishes_temperature() {
        let sink = Arc::new(Recorder::default());
        let mut c = conditioner(&[(28, 0x8000), (27, 0x4000), (26, 0x2000)], sink.clone());
        c.sample();
        let outside = c.outside_temperature();
        let flow = c.flow_temperature();
        c.return_temperature();

        let published = sink.0.lock().unwrap();
        let ids: Vec<_> = published.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![
                PropertyId::OutsideTemperature,
                PropertyId::FlowTemperature,
                PropertyId::RawFlowTemperature,
                PropertyId::ReturnTemperature,
            ]
        );
        assert_eq!(published[0].1, PropertyValue::Float(outside));
        assert_eq!(published[1].1, PropertyValue::Float(flow));
    }

    #[test]
    fn raw_flow_tracks_faster_than_flow() {
        let sink = Arc::new(Recorder::default());
        let mut c = conditioner(&[(27, 0x2000)], sink);
        c.sample();
        c.input = Box::new(FixedInput([(27u8, 0x3000u16)].into_iter().collect()));
        for _ in 0..50 {
            c.sample();
        }
        let slow = c.channel(ChannelKind::Flow).filtered().unwrap();
        assert!(c.raw_flow_temperature() > c.peek(ChannelKind::Flow));
        assert!(slow > 512.0 && slow < 768.0);
    }

    #[test]
    fn lowpass_update_is_validated() {
        let sink = Arc::new(Recorder::default());
        let mut c = conditioner(&[], sink.clone());
        assert!(!c.set_lowpass_k2(1.5));
        assert_eq!(c.lowpass_k2(), 0.0005);
        assert!(sink.0.lock().unwrap().is_empty());

        assert!(c.set_lowpass_k2(0.001));
        assert_eq!(c.lowpass_k2(), 0.001);
        assert_eq!(c.channel(ChannelKind::Return).filter.k2(), 0.001);
        assert_eq!(
            sink.0.lock().unwrap().last().copied(),
            Some((PropertyId::LowpassFilterK2, PropertyValue::Float(0.001)))
        );
    }

    #[test]
    fn unsampled_channel_reports_zero_reading() {
        let sink = Arc::new(Recorder::default());
        let c = conditioner(&[], sink);
        assert_eq!(c.channel(ChannelKind::Flow).filtered(), None);
        assert!(c.peek(ChannelKind::Flow).is_finite());
    }
}
