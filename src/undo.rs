// Undo log: immutable whole-canvas snapshots, push/pop only.

use crate::types::FrameBuffer;

/// A frozen copy of the ink layer. Never mutated after capture.
#[derive(Clone, Debug)]
pub struct Snapshot {
    raster: FrameBuffer,
}

impl Snapshot {
    pub fn capture(raster: &FrameBuffer) -> Self {
        Self { raster: raster.clone() }
    }

    pub fn raster(&self) -> &FrameBuffer {
        &self.raster
    }

    pub fn into_raster(self) -> FrameBuffer {
        self.raster
    }
}

/// Unbounded for the session; emptied only by an explicit clear.
#[derive(Default)]
pub struct UndoStack {
    snapshots: Vec<Snapshot>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_reverse_order() {
        let mut stack = UndoStack::new();
        for color in [1, 2, 3] {
            stack.push(Snapshot::capture(&FrameBuffer::filled(1, 1, color)));
        }
        let order: Vec<u32> =
            std::iter::from_fn(|| stack.pop()).map(|s| s.raster().pixels[0]).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn snapshot_is_detached_from_source() {
        let mut live = FrameBuffer::new(2, 1);
        let snap = Snapshot::capture(&live);
        live.put(0, 0, 0xFFFF_FFFF);
        assert_eq!(snap.raster().pixels, vec![0, 0]);
    }
}
