use crate::video::{Frame, FrameGeometry};

/// Input buffers allocated at init for the decoder to write into
#[derive(Debug, Default)]
pub struct DirectBuffers {
    free: Vec<Frame>,
    geometry: Option<FrameGeometry>,
    outstanding: usize,
}

impl DirectBuffers {
    pub fn allocate(geometry: &FrameGeometry, count: usize) -> Self {
        Self {
            free: (0..count).map(|_| Frame::new(geometry)).collect(),
            geometry: Some(*geometry),
            outstanding: 0,
        }
    }

    /// Buffers ready to be checked out
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn checkout(&mut self) -> Option<Frame> {
        let frame = self.free.pop()?;
        self.outstanding += 1;
        Some(frame)
    }

    /// Frames of another geometry, or not checked out from here, are dropped
    pub fn checkin(&mut self, frame: Frame) {
        let fits = self.geometry.is_some_and(|g| g.matches(&frame));
        if fits && self.outstanding > 0 {
            self.outstanding -= 1;
            self.free.push(frame);
        }
    }

    /// Free every buffer; returns how many were held
    pub fn release_all(&mut self) -> usize {
        let held = self.free.len();
        self.free.clear();
        self.geometry = None;
        self.outstanding = 0;
        held
    }
}
