//! Property sink that keeps the latest value of every property.

use std::collections::BTreeMap;
use std::sync::Mutex;

use fh_core::{PropertyId, PropertySink, PropertyValue};
use serde::Serialize;

use crate::hardware::lock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Published {
    pub value: PropertyValue,
    pub count: u64,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    latest: Mutex<BTreeMap<PropertyId, Published>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, id: PropertyId) -> Option<PropertyValue> {
        lock(&self.latest).get(&id).map(|p| p.value)
    }

    /// How often `id` has been published.
    pub fn count(&self, id: PropertyId) -> u64 {
        lock(&self.latest).get(&id).map_or(0, |p| p.count)
    }

    /// Latest values keyed by property name.
    pub fn snapshot(&self) -> BTreeMap<&'static str, Published> {
        lock(&self.latest)
            .iter()
            .map(|(id, published)| (id.as_str(), *published))
            .collect()
    }
}

impl PropertySink for RecordingSink {
    fn publish(&self, id: PropertyId, value: PropertyValue) {
        let mut latest = lock(&self.latest);
        let entry = latest.entry(id).or_insert(Published { value, count: 0 });
        entry.value = value;
        entry.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_and_counts() {
        let sink = RecordingSink::new();
        sink.publish(PropertyId::ValveCurrent, PropertyValue::Integer(1));
        sink.publish(PropertyId::ValveCurrent, PropertyValue::Integer(2));
        sink.publish(PropertyId::HeatPump, PropertyValue::Enum("on"));
        assert_eq!(
            sink.latest(PropertyId::ValveCurrent),
            Some(PropertyValue::Integer(2))
        );
        assert_eq!(sink.count(PropertyId::ValveCurrent), 2);
        assert_eq!(sink.count(PropertyId::Kp), 0);

        let snapshot = sink.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["heatPump"].value, PropertyValue::Enum("on"));
    }
}
