//! Binary trajectory frames.
//!
//! A frame is laid out as (native endian):
//!
//! ```text
//! byte[3]   magic = 'A','M','M'
//! int32     particle count
//! int32     dimension D
//! repeat particle count times:
//!     float[D]   position
//!     float[D]   heading (unit vector, cartesian)
//! byte      footer = 0x00
//! ```
//!
//! Frames are concatenated without a length prefix. Count and dimension are
//! constant across a run, so every frame has the size given by [`frame_len`].

use anyhow::{Context, Result};
use zerocopy::{FromBytes, IntoBytes};

pub const MAGIC: [u8; 3] = *b"AMM";
pub const FOOTER: u8 = 0;

const HEADER_LEN: usize = MAGIC.len() + 2 * std::mem::size_of::<i32>();

/// Size in bytes of one frame holding `particle_count` particles of dimension `dimension`.
pub fn frame_len(particle_count: usize, dimension: usize) -> usize {
    HEADER_LEN + particle_count * 2 * dimension * std::mem::size_of::<f32>() + 1
}

/// Appends a single frame to a byte buffer.
pub struct FrameWriter<'a> {
    out: &'a mut Vec<u8>,
    dimension: usize,
    remaining: usize,
}

impl<'a> FrameWriter<'a> {
    /// Writes the frame header and reserves room for the particle records.
    pub fn begin(out: &'a mut Vec<u8>, particle_count: usize, dimension: usize) -> Self {
        out.reserve(frame_len(particle_count, dimension));
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice((particle_count as i32).as_bytes());
        out.extend_from_slice((dimension as i32).as_bytes());
        FrameWriter {
            out,
            dimension,
            remaining: particle_count,
        }
    }

    /// Writes one particle record. Records must arrive in index order.
    pub fn particle(&mut self, position: &[f32], heading: &[f32]) {
        debug_assert_eq!(position.len(), self.dimension);
        debug_assert_eq!(heading.len(), self.dimension);
        debug_assert!(self.remaining > 0, "more particles written than announced");
        self.out.extend_from_slice(position.as_bytes());
        self.out.extend_from_slice(heading.as_bytes());
        self.remaining -= 1;
    }

    /// Terminates the frame with the footer byte.
    pub fn finish(self) {
        debug_assert_eq!(self.remaining, 0, "frame closed before all particles were written");
        self.out.push(FOOTER);
    }
}

/// One decoded frame. Positions and headings are stored flat, `dimension` floats per particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub dimension: usize,
    pub positions: Vec<f32>,
    pub headings: Vec<f32>,
}

impl Frame {
    pub fn particle_count(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.positions.len() / self.dimension
        }
    }

    pub fn position(&self, i: usize) -> &[f32] {
        &self.positions[i * self.dimension..(i + 1) * self.dimension]
    }

    pub fn heading(&self, i: usize) -> &[f32] {
        &self.headings[i * self.dimension..(i + 1) * self.dimension]
    }

    /// Mean squared distance from the origin.
    pub fn msd(&self) -> f32 {
        let n = self.particle_count();
        if n == 0 {
            return 0.0;
        }
        self.positions.iter().map(|c| c * c).sum::<f32>() / n as f32
    }

    /// Length of the mean heading; 1 for a fully aligned population.
    pub fn polarization(&self) -> f32 {
        let n = self.particle_count();
        if n == 0 {
            return 0.0;
        }
        let mut sum = vec![0.0f32; self.dimension];
        for i in 0..n {
            for (s, h) in sum.iter_mut().zip(self.heading(i)) {
                *s += h;
            }
        }
        sum.iter().map(|c| c * c).sum::<f32>().sqrt() / n as f32
    }
}

fn read_i32(bytes: &[u8], what: &str) -> Result<i32> {
    i32::read_from_bytes(bytes).map_err(|_| anyhow::anyhow!("Truncated frame: missing {}.", what))
}

fn read_floats(bytes: &[u8], count: usize) -> Vec<f32> {
    let mut values = vec![0.0f32; count];
    values.as_mut_bytes().copy_from_slice(&bytes[..count * std::mem::size_of::<f32>()]);
    values
}

/// Decodes the frame at the start of `bytes`, returning it and the unread remainder.
pub fn read_frame(bytes: &[u8]) -> Result<(Frame, &[u8])> {
    if bytes.len() < HEADER_LEN {
        anyhow::bail!("Truncated frame: {} bytes is shorter than the header.", bytes.len());
    }
    if bytes[..3] != MAGIC {
        anyhow::bail!("Bad frame magic {:?}.", &bytes[..3]);
    }
    let count = read_i32(&bytes[3..7], "particle count")?;
    let dimension = read_i32(&bytes[7..11], "dimension")?;
    if count < 0 {
        anyhow::bail!("Negative particle count {}.", count);
    }
    if dimension != 2 && dimension != 3 {
        anyhow::bail!("Unsupported dimension {} in frame header.", dimension);
    }
    let (count, dimension) = (count as usize, dimension as usize);

    let len = frame_len(count, dimension);
    if bytes.len() < len {
        anyhow::bail!(
            "Truncated frame: expected {} bytes for {} particles, found {}.",
            len,
            count,
            bytes.len()
        );
    }
    if bytes[len - 1] != FOOTER {
        anyhow::bail!("Frame footer is {:#04x}, expected 0x00.", bytes[len - 1]);
    }

    let mut positions = Vec::with_capacity(count * dimension);
    let mut headings = Vec::with_capacity(count * dimension);
    let record_len = 2 * dimension * std::mem::size_of::<f32>();
    for record in bytes[HEADER_LEN..len - 1].chunks_exact(record_len) {
        let floats = read_floats(record, 2 * dimension);
        positions.extend_from_slice(&floats[..dimension]);
        headings.extend_from_slice(&floats[dimension..]);
    }

    Ok((
        Frame {
            dimension,
            positions,
            headings,
        },
        &bytes[len..],
    ))
}

/// Iterates over the frames of a concatenated trajectory stream.
///
/// Every frame must repeat the particle count and dimension of the first one.
pub struct FrameReader<'a> {
    rest: &'a [u8],
    shape: Option<(usize, usize)>,
    index: usize,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        FrameReader {
            rest: bytes,
            shape: None,
            index: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() || self.failed {
            return None;
        }
        let index = self.index;
        let result = read_frame(self.rest)
            .with_context(|| format!("Failed to decode frame {}", index))
            .and_then(|(frame, rest)| {
                let shape = (frame.particle_count(), frame.dimension);
                match self.shape {
                    Some(expected) if expected != shape => anyhow::bail!(
                        "Frame {} holds {} particles in {}D, but the stream started with {} particles in {}D.",
                        index,
                        shape.0,
                        shape.1,
                        expected.0,
                        expected.1
                    ),
                    _ => {
                        self.shape = Some(shape);
                        self.rest = rest;
                        Ok(frame)
                    }
                }
            });
        self.index += 1;
        self.failed = result.is_err();
        Some(result)
    }
}

/// Decodes every frame of a trajectory stream.
pub fn read_frames(bytes: &[u8]) -> Result<Vec<Frame>> {
    FrameReader::new(bytes).collect()
}
