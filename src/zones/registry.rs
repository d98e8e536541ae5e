use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::geometry::{Point2D, Polygon};

/// Device id used when a layout or batch carries no device.
pub const DEFAULT_DEVICE: &str = "default";

/// Reserved bucket for detections that fall in no zone.
pub const UNMATCHED_ZONE: &str = "unmatched";

/// Named polygonal region of a device frame.
#[derive(Clone, Debug)]
pub struct Zone {
    name: String,
    polygon: Polygon,
    /// Display color (RGB). Presentation only.
    color: Option<[u8; 3]>,
}

impl Zone {
    pub fn new(name: impl Into<String>, polygon: Polygon) -> Self {
        Self {
            name: name.into(),
            polygon,
            color: None,
        }
    }

    /// Attach an RGB display color.
    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = Some(color);
        self
    }

    /// Zone name as reported in counts.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boundary in image coordinates.
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Display color, if configured.
    pub fn color(&self) -> Option<[u8; 3]> {
        self.color
    }

    /// Whether `point` lies inside the zone boundary.
    pub fn contains(&self, point: Point2D) -> bool {
        self.polygon.contains(point)
    }
}

#[derive(Clone, Debug)]
struct DeviceZones {
    device_id: String,
    zones: Vec<Zone>,
}

/// Accumulates device layouts and validates them before freezing.
#[derive(Debug, Default)]
pub struct ZoneRegistryBuilder {
    devices: Vec<DeviceZones>,
    index: HashMap<String, usize>,
}

impl ZoneRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a device. Devices without zones are legal; every detection
    /// for them is unmatched.
    pub fn register_device(&mut self, device_id: &str) -> Result<()> {
        if device_id.trim().is_empty() {
            return Err(anyhow!("device id must not be empty"));
        }
        if self.index.contains_key(device_id) {
            return Err(anyhow!("device '{}' registered twice", device_id));
        }
        self.index.insert(device_id.to_string(), self.devices.len());
        self.devices.push(DeviceZones {
            device_id: device_id.to_string(),
            zones: Vec::new(),
        });
        Ok(())
    }

    /// Append a zone to a device, declaring the device on first use.
    ///
    /// Registration order is classification precedence.
    pub fn register_zone(&mut self, device_id: &str, zone: Zone) -> Result<()> {
        let name = zone.name();
        if name.trim().is_empty() {
            return Err(anyhow!("device '{}': zone name must not be empty", device_id));
        }
        if name.trim() != name {
            return Err(anyhow!(
                "device '{}': zone name '{}' has surrounding whitespace",
                device_id,
                name
            ));
        }
        if name == UNMATCHED_ZONE {
            return Err(anyhow!(
                "device '{}': zone name '{}' is reserved",
                device_id,
                UNMATCHED_ZONE
            ));
        }
        if !self.index.contains_key(device_id) {
            self.register_device(device_id)?;
        }
        let slot = self.index[device_id];
        let device = &mut self.devices[slot];
        if device.zones.iter().any(|z| z.name() == name) {
            return Err(anyhow!(
                "device '{}': duplicate zone name '{}'",
                device_id,
                zone.name()
            ));
        }
        device.zones.push(zone);
        Ok(())
    }

    /// Freeze the accumulated layouts.
    pub fn build(self) -> ZoneRegistry {
        ZoneRegistry {
            devices: self.devices,
            index: self.index,
        }
    }
}

/// Frozen per-device zone layouts.
///
/// There is no way to mutate a built registry; reconfiguring means building a
/// new one. Share it behind an `Arc` across workers.
#[derive(Clone, Debug, Default)]
pub struct ZoneRegistry {
    devices: Vec<DeviceZones>,
    index: HashMap<String, usize>,
}

impl ZoneRegistry {
    /// Start an empty builder.
    pub fn builder() -> ZoneRegistryBuilder {
        ZoneRegistryBuilder::new()
    }

    /// Zones for a device in precedence order. Unknown devices have none.
    pub fn zones_for(&self, device_id: &str) -> &[Zone] {
        match self.index.get(device_id) {
            Some(&slot) => &self.devices[slot].zones,
            None => &[],
        }
    }

    /// Whether the device was declared, with or without zones.
    pub fn contains_device(&self, device_id: &str) -> bool {
        self.index.contains_key(device_id)
    }

    /// Configured devices in registration order.
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|d| d.device_id.as_str())
    }

    /// Zone names for a device in precedence order.
    pub fn zone_names(&self, device_id: &str) -> Vec<&str> {
        self.zones_for(device_id).iter().map(Zone::name).collect()
    }

    /// Number of configured devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(offset: f64) -> Polygon {
        Polygon::from_pairs(&[(offset, 0.0), (offset + 10.0, 0.0), (offset, 10.0)]).unwrap()
    }

    #[test]
    fn keeps_registration_order() -> Result<()> {
        let mut builder = ZoneRegistry::builder();
        builder.register_zone("cam-b", Zone::new("Area C", tri(0.0)))?;
        builder.register_zone("cam-b", Zone::new("Area A", tri(20.0)))?;
        builder.register_zone("cam-a", Zone::new("Area B", tri(40.0)))?;
        let registry = builder.build();

        assert_eq!(registry.zone_names("cam-b"), vec!["Area C", "Area A"]);
        assert_eq!(registry.devices().collect::<Vec<_>>(), vec!["cam-b", "cam-a"]);
        assert_eq!(registry.len(), 2);
        Ok(())
    }

    #[test]
    fn unknown_device_has_no_zones() {
        let registry = ZoneRegistry::default();
        assert!(registry.zones_for("nope").is_empty());
        assert!(!registry.contains_device("nope"));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_bad_zone_names() -> Result<()> {
        let mut builder = ZoneRegistry::builder();
        builder.register_zone(DEFAULT_DEVICE, Zone::new("A", tri(0.0)))?;
        assert!(builder
            .register_zone(DEFAULT_DEVICE, Zone::new("A", tri(5.0)))
            .is_err());
        assert!(builder
            .register_zone(DEFAULT_DEVICE, Zone::new(UNMATCHED_ZONE, tri(5.0)))
            .is_err());
        assert!(builder
            .register_zone(DEFAULT_DEVICE, Zone::new("  ", tri(5.0)))
            .is_err());
        // Same name on another device is fine.
        builder.register_zone("other", Zone::new("A", tri(0.0)))?;
        Ok(())
    }

    #[test]
    fn padded_zone_names_are_rejected() -> Result<()> {
        let mut builder = ZoneRegistry::builder();
        builder.register_zone("cam", Zone::new("A", tri(0.0)))?;
        assert!(builder.register_zone("cam", Zone::new("A ", tri(5.0))).is_err());
        assert!(builder
            .register_zone("cam", Zone::new(" unmatched", tri(5.0)))
            .is_err());
        assert_eq!(builder.build().zone_names("cam"), vec!["A"]);
        Ok(())
    }

    #[test]
    fn rejects_duplicate_or_empty_devices() -> Result<()> {
        let mut builder = ZoneRegistry::builder();
        builder.register_device("cam")?;
        assert!(builder.register_device("cam").is_err());
        assert!(builder.register_device("").is_err());
        let registry = builder.build();
        assert!(registry.contains_device("cam"));
        assert!(registry.zones_for("cam").is_empty());
        Ok(())
    }

    #[test]
    fn color_is_carried_but_optional() {
        let zone = Zone::new("A", tri(0.0)).with_color([255, 102, 102]);
        assert_eq!(zone.color(), Some([255, 102, 102]));
        assert_eq!(Zone::new("B", tri(0.0)).color(), None);
    }
}
