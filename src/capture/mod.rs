pub mod camera;
pub mod frame;
pub mod media;
pub mod still_image;

pub use camera::CameraSession;
pub use frame::{Frame, FrameSource, StillFrameSource};
pub use media::{
    FrameSize, MediaDevices, NoMediaDevices, VideoConstraints, VideoInputDevice, VideoStream,
    VideoTrack,
};
