#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use mvexport_image as image;

#[doc(inline)]
pub use mvexport_imgproc as imgproc;

#[doc(inline)]
pub use mvexport_io as io;

#[doc(inline)]
pub use mvexport_sfm as sfm;
