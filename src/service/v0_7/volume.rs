use super::VERSION;
use crate::error::Result;
use crate::http::Method;
use crate::resource::ChannelResource;
use crate::service::volume::{CutoutRanges, VolumeApi};
use crate::service::BossSession;

const BLOSC_MIME: &str = "application/blosc";

pub struct VolumeServiceV0_7;

impl VolumeServiceV0_7 {
    fn cutout_url(session: &BossSession, channel: &ChannelResource, resolution: u32, ranges: &CutoutRanges) -> String {
        session.url(
            VERSION,
            &format!(
                "cutout/{}/{}/{}/{}/{}",
                channel.collection_name,
                channel.experiment_name,
                channel.name,
                resolution,
                ranges.to_path()
            ),
        )
    }
}

impl VolumeApi for VolumeServiceV0_7 {
    fn get_cutout(
        &self,
        session: &BossSession,
        channel: &ChannelResource,
        resolution: u32,
        ranges: &CutoutRanges,
    ) -> Result<Vec<u8>> {
        let url = Self::cutout_url(session, channel, resolution, ranges);
        let req = session.request(Method::GET, &url).header("Accept", BLOSC_MIME);
        let resp = session.send_expecting(req, 200, "get cutout")?;
        Ok(resp.body)
    }

    fn create_cutout(
        &self,
        session: &BossSession,
        channel: &ChannelResource,
        resolution: u32,
        ranges: &CutoutRanges,
        compressed: Vec<u8>,
    ) -> Result<()> {
        let url = Self::cutout_url(session, channel, resolution, ranges);
        tracing::debug!(bytes = compressed.len(), "uploading cutout to {}", url);
        let req = session
            .request(Method::POST, &url)
            .header("Content-Type", BLOSC_MIME)
            .body(compressed);
        session.send_expecting(req, 201, "create cutout")?;
        Ok(())
    }
}
