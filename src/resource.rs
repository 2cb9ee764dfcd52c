//! Boss data-model resources.
//!
//! A resource names one object in the Boss hierarchy
//! (collection → experiment → channel, plus coordinate frames) and knows
//! how to render the route that addresses it and its JSON body.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Storage type of a channel's voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datatype {
    #[serde(rename = "uint8")]
    Uint8,
    #[serde(rename = "uint16")]
    Uint16,
    #[serde(rename = "uint64")]
    Uint64,
}

impl Datatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Uint8 => "uint8",
            Datatype::Uint16 => "uint16",
            Datatype::Uint64 => "uint64",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uint8" => Ok(Datatype::Uint8),
            "uint16" => Ok(Datatype::Uint16),
            "uint64" => Ok(Datatype::Uint64),
            other => Err(Error::InvalidArgument(format!("unknown datatype {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Image,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyMethod {
    Anisotropic,
    Isotropic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoxelUnit {
    Nanometers,
    Micrometers,
    Millimeters,
    Centimeters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionResource {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CollectionResource {
    pub fn new(name: &str) -> Self {
        CollectionResource {
            name: name.to_string(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResource {
    pub name: String,
    #[serde(rename = "collection")]
    pub collection_name: String,
    #[serde(default)]
    pub coord_frame: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "one")]
    pub num_hierarchy_levels: u32,
    #[serde(default = "anisotropic")]
    pub hierarchy_method: HierarchyMethod,
    #[serde(default = "one")]
    pub num_time_samples: u32,
}

fn one() -> u32 {
    1
}

fn anisotropic() -> HierarchyMethod {
    HierarchyMethod::Anisotropic
}

impl ExperimentResource {
    pub fn new(name: &str, collection_name: &str, coord_frame: &str) -> Self {
        ExperimentResource {
            name: name.to_string(),
            collection_name: collection_name.to_string(),
            coord_frame: coord_frame.to_string(),
            description: String::new(),
            num_hierarchy_levels: 1,
            hierarchy_method: HierarchyMethod::Anisotropic,
            num_time_samples: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateFrameResource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub x_start: u64,
    pub x_stop: u64,
    pub y_start: u64,
    pub y_stop: u64,
    pub z_start: u64,
    pub z_stop: u64,
    pub x_voxel_size: f64,
    pub y_voxel_size: f64,
    pub z_voxel_size: f64,
    pub voxel_unit: VoxelUnit,
}

impl CoordinateFrameResource {
    /// A frame of the given extents with 1nm isotropic voxels.
    pub fn new(name: &str, x: (u64, u64), y: (u64, u64), z: (u64, u64)) -> Self {
        CoordinateFrameResource {
            name: name.to_string(),
            description: String::new(),
            x_start: x.0,
            x_stop: x.1,
            y_start: y.0,
            y_stop: y.1,
            z_start: z.0,
            z_stop: z.1,
            x_voxel_size: 1.0,
            y_voxel_size: 1.0,
            z_voxel_size: 1.0,
            voxel_unit: VoxelUnit::Nanometers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelResource {
    pub name: String,
    #[serde(skip)]
    pub collection_name: String,
    #[serde(rename = "experiment")]
    pub experiment_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub default_time_sample: u32,
    #[serde(default)]
    pub base_resolution: u32,
    pub datatype: Datatype,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub related: Vec<String>,
}

impl ChannelResource {
    pub fn new(
        name: &str,
        collection_name: &str,
        experiment_name: &str,
        channel_type: ChannelType,
        datatype: Datatype,
    ) -> Self {
        ChannelResource {
            name: name.to_string(),
            collection_name: collection_name.to_string(),
            experiment_name: experiment_name.to_string(),
            description: String::new(),
            channel_type,
            default_time_sample: 0,
            base_resolution: 0,
            datatype,
            sources: Vec::new(),
            related: Vec::new(),
        }
    }

    /// An image channel, the common case.
    pub fn image(name: &str, collection_name: &str, experiment_name: &str, datatype: Datatype) -> Self {
        ChannelResource::new(name, collection_name, experiment_name, ChannelType::Image, datatype)
    }
}

/// Any object in the Boss data model.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Collection(CollectionResource),
    Experiment(ExperimentResource),
    CoordinateFrame(CoordinateFrameResource),
    Channel(ChannelResource),
}

impl Resource {
    pub fn name(&self) -> &str {
        match self {
            Resource::Collection(r) => &r.name,
            Resource::Experiment(r) => &r.name,
            Resource::CoordinateFrame(r) => &r.name,
            Resource::Channel(r) => &r.name,
        }
    }

    /// Only channels hold voxel data.
    pub fn valid_volume(&self) -> bool {
        matches!(self, Resource::Channel(_))
    }

    pub fn as_channel(&self) -> Option<&ChannelResource> {
        match self {
            Resource::Channel(c) => Some(c),
            _ => None,
        }
    }

    /// Route to this object, with a trailing slash.
    pub fn route(&self) -> String {
        self.route_named(self.name())
    }

    /// Route to this object if it were called `name`.  Used to address an
    /// object that is being renamed.
    pub fn route_named(&self, name: &str) -> String {
        format!("{}{}/", self.list_route(), name)
    }

    /// Route listing this object and its siblings.
    pub fn list_route(&self) -> String {
        match self {
            Resource::Collection(_) => String::new(),
            Resource::Experiment(r) => format!("{}/", r.collection_name),
            Resource::CoordinateFrame(_) => "coordinateframes/".to_string(),
            Resource::Channel(r) => format!("{}/{}/", r.collection_name, r.experiment_name),
        }
    }

    /// Key holding the names in a list response.
    pub fn list_key(&self) -> &'static str {
        match self {
            Resource::Collection(_) => "collections",
            Resource::Experiment(_) => "experiments",
            Resource::CoordinateFrame(_) => "coords",
            Resource::Channel(_) => "channels",
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        let value = match self {
            Resource::Collection(r) => serde_json::to_value(r)?,
            Resource::Experiment(r) => serde_json::to_value(r)?,
            Resource::CoordinateFrame(r) => serde_json::to_value(r)?,
            Resource::Channel(r) => {
                let mut v = serde_json::to_value(r)?;
                v["collection"] = json!(r.collection_name);
                v
            }
        };
        Ok(value)
    }

    /// Parse a server response into a resource of the same kind as `self`.
    /// Parent names the response omits are taken from `self`.
    pub fn from_json(&self, value: Value) -> Result<Resource> {
        if !value.is_object() {
            return Err(Error::InvalidResponse(format!(
                "expected a JSON object for {}, got {}",
                self.name(),
                value
            )));
        }
        let parsed = match self {
            Resource::Collection(_) => Resource::Collection(serde_json::from_value(value)?),
            Resource::Experiment(req) => {
                let mut value = value;
                if value.get("collection").is_none() {
                    value["collection"] = json!(req.collection_name);
                }
                Resource::Experiment(serde_json::from_value(value)?)
            }
            Resource::CoordinateFrame(_) => Resource::CoordinateFrame(serde_json::from_value(value)?),
            Resource::Channel(req) => {
                let collection_name = value
                    .get("collection")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| req.collection_name.clone());
                let mut value = value;
                if value.get("experiment").is_none() {
                    value["experiment"] = json!(req.experiment_name);
                }
                let mut channel: ChannelResource = serde_json::from_value(value)?;
                channel.collection_name = collection_name;
                Resource::Channel(channel)
            }
        };
        Ok(parsed)
    }
}

impl From<CollectionResource> for Resource {
    fn from(r: CollectionResource) -> Self {
        Resource::Collection(r)
    }
}

impl From<ExperimentResource> for Resource {
    fn from(r: ExperimentResource) -> Self {
        Resource::Experiment(r)
    }
}

impl From<CoordinateFrameResource> for Resource {
    fn from(r: CoordinateFrameResource) -> Self {
        Resource::CoordinateFrame(r)
    }
}

impl From<ChannelResource> for Resource {
    fn from(r: ChannelResource) -> Self {
        Resource::Channel(r)
    }
}
