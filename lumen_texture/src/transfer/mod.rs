/// Pixel transfer: synchronous cached access and asynchronous GPU readback

pub mod pixel_transfer;
pub mod readback;

pub use pixel_transfer::{copy_surface, get_gpu_pixels, get_pixels, set_pixel_colors, set_pixels};
pub use readback::{PendingReadback, ReadbackState};
pub(crate) use readback::ReadbackSender;
