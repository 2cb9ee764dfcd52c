//! Volume service: reading and writing cutouts of channel data.
//!
//! Cutouts travel as blosc-compressed, C-ordered voxel arrays.  Ranges are
//! half-open, so `x: 10..20` covers `x >= 10 && x < 20`.

use super::{unsupported, v0_7, BossSession};
use crate::error::{Error, Result};
use crate::resource::{ChannelResource, Datatype};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use std::mem;
use std::ops::Range;

/// Fixed header at the front of every blosc buffer.
const BLOSC_HEADER_LEN: usize = 16;

/// Voxel types a channel can store.
pub trait Voxel: Copy + Send + Sync + 'static {
    const DATATYPE: Datatype;
}

impl Voxel for u8 {
    const DATATYPE: Datatype = Datatype::Uint8;
}

impl Voxel for u16 {
    const DATATYPE: Datatype = Datatype::Uint16;
}

impl Voxel for u64 {
    const DATATYPE: Datatype = Datatype::Uint64;
}

/// The region of a cutout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoutRanges {
    pub x: Range<u64>,
    pub y: Range<u64>,
    pub z: Range<u64>,
    pub t: Option<Range<u64>>,
}

impl CutoutRanges {
    pub fn new(x: Range<u64>, y: Range<u64>, z: Range<u64>, t: Option<Range<u64>>) -> CutoutRanges {
        CutoutRanges { x, y, z, t }
    }

    /// Every range must be non-empty.
    pub fn validate(&self) -> Result<()> {
        let named = [("x", Some(&self.x)), ("y", Some(&self.y)), ("z", Some(&self.z)), ("t", self.t.as_ref())];
        for (axis, range) in named.iter() {
            if let Some(r) = range {
                if r.start >= r.end {
                    return Err(Error::InvalidArgument(format!(
                        "{} range {}:{} is empty; start must be less than stop",
                        axis, r.start, r.end
                    )));
                }
            }
        }
        Ok(())
    }

    /// Array shape in C order: `[z, y, x]`, or `[t, z, y, x]` with time.
    pub fn shape(&self) -> Vec<usize> {
        let len = |r: &Range<u64>| (r.end - r.start) as usize;
        let mut shape = Vec::with_capacity(4);
        if let Some(t) = &self.t {
            shape.push(len(t));
        }
        shape.push(len(&self.z));
        shape.push(len(&self.y));
        shape.push(len(&self.x));
        shape
    }

    /// Path segments `x0:x1/y0:y1/z0:z1/[t0:t1/]`.
    pub fn to_path(&self) -> String {
        let mut path = format!(
            "{}:{}/{}:{}/{}:{}/",
            self.x.start, self.x.end, self.y.start, self.y.end, self.z.start, self.z.end
        );
        if let Some(t) = &self.t {
            path.push_str(&format!("{}:{}/", t.start, t.end));
        }
        path
    }
}

/// One API version's implementation of the volume service.  Bodies are
/// passed through still compressed.
pub trait VolumeApi: Send + Sync {
    fn get_cutout(
        &self,
        session: &BossSession,
        channel: &ChannelResource,
        resolution: u32,
        ranges: &CutoutRanges,
    ) -> Result<Vec<u8>>;

    fn create_cutout(
        &self,
        session: &BossSession,
        channel: &ChannelResource,
        resolution: u32,
        ranges: &CutoutRanges,
        compressed: Vec<u8>,
    ) -> Result<()>;
}

fn volume_api(version: &str) -> Option<Box<dyn VolumeApi>> {
    match version {
        v0_7::VERSION => Some(Box::new(v0_7::VolumeServiceV0_7)),
        _ => None,
    }
}

pub fn compress<T: Voxel>(data: &ArrayViewD<'_, T>) -> Vec<u8> {
    // Logical iteration order is C order regardless of memory layout.
    let flat: Vec<T> = data.iter().copied().collect();
    let ctx = blosc::Context::new();
    let compressed: blosc::Buffer<T> = ctx.compress(&flat[..]);
    compressed.into()
}

pub fn decompress<T: Voxel>(bytes: &[u8], shape: &[usize]) -> Result<ArrayD<T>> {
    let too_large = || Error::InvalidArgument(format!("cutout shape {:?} is too large", shape));
    let voxels = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(too_large)?;
    let expected = voxels.checked_mul(mem::size_of::<T>()).ok_or_else(too_large)?;
    if bytes.len() < BLOSC_HEADER_LEN {
        return Err(Error::Codec(format!(
            "cutout body is {} bytes, shorter than a blosc header",
            bytes.len()
        )));
    }
    let nbytes = blosc::validate(bytes).map_err(|e| Error::Codec(format!("invalid blosc buffer: {:?}", e)))?;
    if nbytes != expected {
        return Err(Error::InvalidResponse(format!(
            "cutout holds {} bytes, expected {} for shape {:?}",
            nbytes, expected, shape
        )));
    }
    // SAFETY: `bytes` passed blosc's buffer validation and decompresses to
    // exactly `voxels` values of `T`; any bit pattern is a valid unsigned
    // integer.
    let values: Vec<T> = unsafe { blosc::decompress_bytes(bytes) }.map_err(|e| Error::Codec(format!("{:?}", e)))?;
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|e| Error::InvalidResponse(e.to_string()))
}

fn check_datatype<T: Voxel>(channel: &ChannelResource) -> Result<()> {
    if channel.datatype != T::DATATYPE {
        return Err(Error::InvalidArgument(format!(
            "channel {} stores {}, not {}",
            channel.name,
            channel.datatype,
            T::DATATYPE
        )));
    }
    Ok(())
}

/// Routes cutout calls to the implementation for one API version.
pub struct VolumeService {
    session: BossSession,
    version: String,
    service: Box<dyn VolumeApi>,
}

impl VolumeService {
    pub fn new(session: BossSession, version: &str) -> Result<VolumeService> {
        let service = volume_api(version).ok_or_else(|| unsupported(version))?;
        Ok(VolumeService {
            session,
            version: version.to_string(),
            service,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn session(&self) -> &BossSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BossSession {
        &mut self.session
    }

    pub fn get_cutout<T: Voxel>(
        &self,
        channel: &ChannelResource,
        resolution: u32,
        ranges: &CutoutRanges,
    ) -> Result<ArrayD<T>> {
        ranges.validate()?;
        check_datatype::<T>(channel)?;
        let body = self.service.get_cutout(&self.session, channel, resolution, ranges)?;
        decompress(&body, &ranges.shape())
    }

    pub fn create_cutout<T: Voxel>(
        &self,
        channel: &ChannelResource,
        resolution: u32,
        ranges: &CutoutRanges,
        data: ArrayViewD<'_, T>,
    ) -> Result<()> {
        ranges.validate()?;
        check_datatype::<T>(channel)?;
        let expected = ranges.shape();
        if data.shape() != expected.as_slice() {
            return Err(Error::InvalidArgument(format!(
                "data shape {:?} does not match cutout shape {:?}",
                data.shape(),
                expected
            )));
        }
        let compressed = compress(&data);
        self.service
            .create_cutout(&self.session, channel, resolution, ranges, compressed)
    }
}
