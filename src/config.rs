use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::aggregate::{Aggregator, BatchRunner};
use crate::detect::{CoordinateScaler, Resolution};
use crate::geometry::{Point2D, Polygon};
use crate::zones::{Zone, ZoneRegistry, DEFAULT_DEVICE};

const DEFAULT_WIDTH: u32 = 1024;
const DEFAULT_HEIGHT: u32 = 576;
const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Deserialize, Default)]
struct ZoneCounterConfigFile {
    resolution: Option<ResolutionConfigFile>,
    workers: Option<usize>,
    devices: Option<Vec<DeviceConfigFile>>,
}

#[derive(Debug, Deserialize, Default)]
struct ResolutionConfigFile {
    detection: Option<Resolution>,
    image: Option<Resolution>,
}

#[derive(Debug, Deserialize)]
struct DeviceConfigFile {
    id: Option<String>,
    reference: Option<Resolution>,
    #[serde(default)]
    zones: Vec<ZoneConfigFile>,
}

#[derive(Debug, Deserialize)]
struct ZoneConfigFile {
    name: String,
    polygon: Vec<[f64; 2]>,
    color: Option<[u8; 3]>,
}

/// Loaded engine configuration: resolutions, worker count and zone layouts.
#[derive(Debug, Clone)]
pub struct ZoneCounterConfig {
    pub detection_resolution: Resolution,
    pub image_resolution: Resolution,
    pub workers: usize,
    pub devices: Vec<DeviceLayout>,
}

/// Zone layout of one device, in the coordinates of `reference`.
/// Without a reference the polygons are already in image space.
#[derive(Debug, Clone)]
pub struct DeviceLayout {
    pub device_id: String,
    pub reference: Option<Resolution>,
    pub zones: Vec<ZoneSpec>,
}

#[derive(Debug, Clone)]
pub struct ZoneSpec {
    pub name: String,
    pub polygon: Vec<Point2D>,
    pub color: Option<[u8; 3]>,
}

impl ZoneCounterConfig {
    /// Load from `ZONE_COUNTER_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ZONE_COUNTER_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load from an explicit path (or defaults), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse configuration text, TOML or JSON. Environment overrides are
    /// not applied.
    pub fn parse(raw: &str, is_toml: bool) -> Result<Self> {
        let file = parse_config(raw, is_toml)?;
        let cfg = Self::from_file(file)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ZoneCounterConfigFile) -> Result<Self> {
        let default_res = Resolution {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        };
        let image_resolution = file
            .resolution
            .as_ref()
            .and_then(|res| res.image)
            .unwrap_or(default_res);
        let detection_resolution = file
            .resolution
            .as_ref()
            .and_then(|res| res.detection)
            .unwrap_or(image_resolution);
        let workers = file.workers.unwrap_or(DEFAULT_WORKERS);

        let devices = file
            .devices
            .unwrap_or_default()
            .into_iter()
            .map(|device| DeviceLayout {
                device_id: device.id.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                reference: device.reference,
                zones: device
                    .zones
                    .into_iter()
                    .map(|zone| ZoneSpec {
                        name: zone.name,
                        polygon: zone
                            .polygon
                            .into_iter()
                            .map(|[x, y]| Point2D::new(x, y))
                            .collect(),
                        color: zone.color,
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            detection_resolution,
            image_resolution,
            workers,
            devices,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(res) = std::env::var("ZONE_COUNTER_DETECTION_RES") {
            if !res.trim().is_empty() {
                self.detection_resolution = Resolution::parse(&res)
                    .map_err(|e| anyhow!("ZONE_COUNTER_DETECTION_RES: {}", e))?;
            }
        }
        if let Ok(res) = std::env::var("ZONE_COUNTER_IMAGE_RES") {
            if !res.trim().is_empty() {
                self.image_resolution = Resolution::parse(&res)
                    .map_err(|e| anyhow!("ZONE_COUNTER_IMAGE_RES: {}", e))?;
            }
        }
        if let Ok(workers) = std::env::var("ZONE_COUNTER_WORKERS") {
            self.workers = workers
                .trim()
                .parse()
                .map_err(|_| anyhow!("ZONE_COUNTER_WORKERS must be a positive integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.detection_resolution
            .validate()
            .map_err(|e| anyhow!("detection resolution: {}", e))?;
        self.image_resolution
            .validate()
            .map_err(|e| anyhow!("image resolution: {}", e))?;
        if self.workers == 0 {
            return Err(anyhow!("workers must be greater than zero"));
        }
        for device in &self.devices {
            if let Some(reference) = device.reference {
                reference
                    .validate()
                    .map_err(|e| anyhow!("device '{}' reference: {}", device.device_id, e))?;
            }
        }
        Ok(())
    }

    pub fn scaler(&self) -> Result<CoordinateScaler> {
        CoordinateScaler::new(self.detection_resolution, self.image_resolution)
    }

    /// Build the frozen registry, moving each layout from its reference
    /// resolution into image space. Any bad polygon or name fails the build.
    pub fn build_registry(&self) -> Result<ZoneRegistry> {
        let mut builder = ZoneRegistry::builder();
        for device in &self.devices {
            builder.register_device(&device.device_id)?;
            let reference = device.reference_or(self.image_resolution);
            let to_image = CoordinateScaler::new(reference, self.image_resolution)?;
            for spec in &device.zones {
                let polygon = Polygon::new(spec.polygon.clone())
                    .and_then(|p| to_image.scale_polygon(&p))
                    .map_err(|e| {
                        anyhow!(
                            "device '{}' zone '{}': {}",
                            device.device_id,
                            spec.name,
                            e
                        )
                    })?;
                let mut zone = Zone::new(spec.name.clone(), polygon);
                if let Some(color) = spec.color {
                    zone = zone.with_color(color);
                }
                builder.register_zone(&device.device_id, zone)?;
            }
            log::debug!(
                "device '{}': {} zones (reference {})",
                device.device_id,
                device.zones.len(),
                reference
            );
        }
        let registry = builder.build();
        log::info!(
            "zone registry ready: {} devices, detection {} -> image {}",
            registry.len(),
            self.detection_resolution,
            self.image_resolution
        );
        Ok(registry)
    }

    pub fn build_aggregator(&self) -> Result<Aggregator> {
        let registry = Arc::new(self.build_registry()?);
        Ok(Aggregator::new(registry).with_scaler(self.scaler()?))
    }

    pub fn build_runner(&self) -> Result<BatchRunner> {
        Ok(BatchRunner::new(self.build_aggregator()?, self.workers))
    }
}

impl DeviceLayout {
    /// Resolution the polygons were drawn at, given the effective image
    /// resolution.
    pub fn reference_or(&self, image: Resolution) -> Resolution {
        self.reference.unwrap_or(image)
    }
}

fn read_config_file(path: &Path) -> Result<ZoneCounterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    parse_config(&raw, is_toml)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))
}

fn parse_config(raw: &str, is_toml: bool) -> Result<ZoneCounterConfigFile> {
    if is_toml {
        Ok(toml::from_str(raw)?)
    } else {
        Ok(serde_json::from_str(raw)?)
    }
}
