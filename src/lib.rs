#![cfg_attr(all(test, feature = "unstable"), feature(test))]
#![warn(missing_docs)]

//! Turns live camera frames into an edge overlay. A single-channel intensity
//! frame goes through the Canny edge detector and the resulting edge map is
//! written into a four-channel display frame as opaque white-on-black pixels.
//!
//! # Processing a frame
//!
//! ```
//! extern crate edge_overlay;
//!
//! use edge_overlay::{process_frame, CannyParams, GrayFrame, RgbaFrameMut};
//!
//! let gray = vec![0u8; 640 * 480];
//! let mut rgba = vec![0u8; 640 * 480 * 4];
//!
//! let input = GrayFrame::new(&gray, 640, 480)?;
//! let mut output = RgbaFrameMut::new(&mut rgba, 640, 480)?;
//! process_frame(&input, &mut output, &CannyParams::default())?;
//! # Ok::<(), edge_overlay::FrameError>(())
//! ```
//!
//! Frames are borrowed for the duration of the call only. See [`CannyParams`]
//! for what each detector setting means.

extern crate image;
extern crate log;
#[cfg(feature = "parallel")]
extern crate rayon;
extern crate thiserror;

mod convert;
mod edge;
mod error;
mod frame;
mod params;
mod pipeline;

pub use crate::convert::{edges_to_rgba, gray_to_rgba};
pub use crate::edge::{canny, detect_edges, EdgeMap, EDGE};
pub use crate::error::{FrameError, Result};
pub use crate::frame::{GrayFrame, RgbaFrameMut, OPAQUE, RGBA_CHANNELS};
pub use crate::params::{CannyParams, SUPPORTED_APERTURES};
pub use crate::pipeline::process_frame;
