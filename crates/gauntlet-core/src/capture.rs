//! Buffered record of one stream's output.

/// Size of one capture atom.
///
/// Matches the pipe read chunk used by the capture worker so a full read
/// lands in at most two atoms.
pub const ATOM_SIZE: usize = 4096;

#[derive(Debug)]
struct Atom {
    bytes: Box<[u8; ATOM_SIZE]>,
    used: usize,
}

impl Atom {
    fn new() -> Self {
        Atom {
            bytes: Box::new([0; ATOM_SIZE]),
            used: 0,
        }
    }

    fn free(&self) -> usize {
        ATOM_SIZE - self.used
    }
}

/// Append-only list of fixed-size atoms holding the raw bytes one stream
/// produced while a run executed. Never shrinks; read-only once the
/// redirection that fed it has ended.
#[derive(Debug, Default)]
pub struct CaptureBlock {
    atoms: Vec<Atom>,
    total: usize,
}

impl CaptureBlock {
    #[must_use]
    pub const fn new() -> Self {
        CaptureBlock {
            atoms: Vec::new(),
            total: 0,
        }
    }

    /// Total bytes captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Append raw bytes, growing by whole atoms as needed.
    pub fn append(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            if self.atoms.last().is_none_or(|a| a.free() == 0) {
                self.atoms.push(Atom::new());
            }
            if let Some(atom) = self.atoms.last_mut() {
                let take = data.len().min(atom.free());
                atom.bytes[atom.used..atom.used + take].copy_from_slice(&data[..take]);
                atom.used += take;
                self.total += take;
                data = &data[take..];
            }
        }
    }

    /// Flatten into one contiguous buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total);
        for atom in &self.atoms {
            out.extend_from_slice(&atom.bytes[..atom.used]);
        }
        out
    }

    /// Lossy UTF-8 view for renderers.
    #[must_use]
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block() {
        let block = CaptureBlock::new();
        assert!(block.is_empty());
        assert_eq!(block.to_bytes(), Vec::<u8>::new());
    }

    #[test]
    fn append_spans_atom_boundaries() {
        let mut block = CaptureBlock::new();
        let chunk = vec![0xabu8; ATOM_SIZE + 17];
        block.append(&chunk);
        block.append(b"tail");
        assert_eq!(block.len(), ATOM_SIZE + 17 + 4);
        let bytes = block.to_bytes();
        assert_eq!(&bytes[..ATOM_SIZE + 17], chunk.as_slice());
        assert_eq!(&bytes[ATOM_SIZE + 17..], b"tail");
    }

    #[test]
    fn many_small_appends_accumulate_in_order() {
        let mut block = CaptureBlock::new();
        for i in 0..100u8 {
            block.append(&[i]);
        }
        let bytes = block.to_bytes();
        assert_eq!(bytes.len(), 100);
        assert!(bytes.iter().enumerate().all(|(i, b)| *b == i as u8));
    }

    #[test]
    fn text_view_is_lossy() {
        let mut block = CaptureBlock::new();
        block.append(b"ok \xff");
        assert!(block.to_text().starts_with("ok "));
    }
}
