//! Dense 2D label masks.

use std::fmt;

/// A dense `width × height` grid of labels stored row-major.
///
/// `0` is background; any other value identifies the object or class
/// occupying that pixel. The mask itself does not know which labels are
/// valid, that is up to the collection that owns it.
#[derive(Clone, PartialEq, Eq)]
pub struct LabelMask {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl LabelMask {
    /// Creates an all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Wraps an existing row-major buffer.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<u32>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a mask from rows of labels. All rows must have the same length.
    pub fn from_rows(rows: &[&[u32]]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_vec(width as u32, height as u32, data)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if both masks have the same width and height.
    #[inline]
    pub fn same_shape(&self, other: &LabelMask) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Label at `(x, y)`, or `None` outside the mask.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    /// Sets the label at `(x, y)`. Out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: i64, y: i64, value: u32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.data[y as usize * self.width as usize + x as usize] = value;
    }

    /// True if `(x, y)` is inside the mask and not background.
    #[inline]
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        self.get(x, y).is_some_and(|v| v != 0)
    }

    /// Row-major view of the labels.
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    /// Mutable row-major view of the labels.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Consumes the mask and returns the row-major buffer.
    pub fn into_vec(self) -> Vec<u32> {
        self.data
    }

    /// One row of labels.
    pub fn row(&self, y: u32) -> &[u32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Number of non-background pixels.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Returns true if every pixel is background.
    pub fn is_background(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Collapses every non-zero label to `1`.
    pub fn to_binary(&self) -> LabelMask {
        LabelMask {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| u32::from(v != 0)).collect(),
        }
    }

    /// Relabels every pixel through `f`.
    ///
    /// Stops at the first label for which `f` returns `None` and hands that
    /// label back as the error.
    pub fn try_map<F>(&self, mut f: F) -> Result<LabelMask, u32>
    where
        F: FnMut(u32) -> Option<u32>,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for &v in &self.data {
            data.push(f(v).ok_or(v)?);
        }
        Ok(LabelMask {
            width: self.width,
            height: self.height,
            data,
        })
    }
}

impl fmt::Debug for LabelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LabelMask {}x{} [", self.width, self.height)?;
        for y in 0..self.height {
            let row: Vec<String> = self.row(y).iter().map(|v| v.to_string()).collect();
            writeln!(f, "  {}", row.join(" "))?;
        }
        write!(f, "]")
    }
}
