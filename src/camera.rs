// Opens a webcam and converts its frames into opaque 0xFFRRGGBB FrameBuffers.
// Frames come out unmirrored; the display and the coordinate mapper apply the flip.

use crate::error::Error;
use crate::types::{FrameBuffer, OPAQUE};

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

/// Anything that yields camera frames at the device's own pace.
pub trait FrameGrabber {
    /// Blocks until the next frame is ready.
    fn grab(&mut self) -> Result<FrameBuffer, Error>;
}

pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` near the requested resolution; the device may pick another.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("create camera {index}: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream: {e}")))?;

        let actual = cam.resolution();
        log::info!("camera {index} streaming at {}x{}", actual.width(), actual.height());

        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameGrabber for CameraCapture {
    fn grab(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;

        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;

        let (w, h) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| OPAQUE | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();

        Ok(FrameBuffer { width: w as usize, height: h as usize, pixels })
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            log::warn!("stopping camera stream: {e}");
        }
    }
}
