//! # Pileup Data Model
//!
//! Per-position base observations as produced by the upstream pileup
//! pre-processing, plus the in-flight read representation used by the
//! sliding-window driver.
//!
//! Positions within one chromosome stream are strictly increasing; only
//! variant-informative loci are retained, so a read's recorded positions
//! may have gaps.

/// Zero-cost newtype for read identifiers, stable across positions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ReadId(pub u32);

impl ReadId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for ReadId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Encode a nucleotide character as 0..3 (A/C/G/T, case-insensitive).
///
/// Returns `None` for anything else; ambiguous bases never survive the
/// upstream filtering, so callers treat them as parse errors.
pub fn encode_base(c: u8) -> Option<u8> {
    match c {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Decode a 0..3 base back to its character
pub fn decode_base(b: u8) -> char {
    match b {
        0 => 'A',
        1 => 'C',
        2 => 'G',
        _ => 'T',
    }
}

/// One base observation at one position: which read saw it, from which cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadObs {
    /// Identifier of the sequenced read
    pub read_id: ReadId,
    /// Cell the read originates from
    pub cell_id: u16,
    /// Observed base, encoded 0..3
    pub base: u8,
}

/// All base observations piled up at one genomic position
#[derive(Clone, Debug, Default)]
pub struct PosData {
    /// Genomic position, monotonically increasing within a chromosome stream
    pub position: u32,
    /// Observations from every read that covered this position
    pub observations: Vec<ReadObs>,
}

impl PosData {
    pub fn new(position: u32, observations: Vec<ReadObs>) -> Self {
        Self {
            position,
            observations,
        }
    }

    /// Number of reads covering this position
    pub fn coverage(&self) -> usize {
        self.observations.len()
    }
}

/// A read while it is inside the sliding window.
///
/// `start` is the position at which the read was first opened and never
/// changes, even when the paired-end coalescing rule later removes the
/// first recorded base. `positions` and `bases` stay parallel.
#[derive(Clone, Debug)]
pub struct ActiveRead {
    /// Cell the read originates from
    pub cell_id: u16,
    /// Position at which this read was first opened
    pub start: u32,
    /// Positions contributing observations, strictly increasing
    pub positions: Vec<u32>,
    /// Observed bases, one per entry of `positions`
    pub bases: Vec<u8>,
}

impl ActiveRead {
    /// Open a new read with its first observation
    pub fn open(cell_id: u16, position: u32, base: u8) -> Self {
        Self {
            cell_id,
            start: position,
            positions: vec![position],
            bases: vec![base],
        }
    }

    /// First recorded position, if any base survives
    pub fn first_pos(&self) -> Option<u32> {
        self.positions.first().copied()
    }

    /// Last recorded position, if any base survives
    pub fn last_pos(&self) -> Option<u32> {
        self.positions.last().copied()
    }

    /// Whether all recorded bases have been erased by overlap coalescing
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Record one observation.
    ///
    /// A second observation at the last recorded position means the two
    /// reads of a sequenced pair overlap at this locus. On disagreement the
    /// last base is erased (the overlap is ambiguous, not arbitrated); on
    /// agreement nothing changes. With `keep_first_on_conflict` the first
    /// observation wins unconditionally, matching the numeric output of
    /// earlier pipeline versions.
    pub fn observe(&mut self, position: u32, base: u8, keep_first_on_conflict: bool) {
        if let Some(&last) = self.positions.last() {
            if last == position {
                if !keep_first_on_conflict && *self.bases.last().expect("parallel arrays") != base {
                    self.positions.pop();
                    self.bases.pop();
                }
                return;
            }
            debug_assert!(last < position, "positions must arrive in order");
        }
        self.positions.push(position);
        self.bases.push(base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_encoding() {
        assert_eq!(encode_base(b'A'), Some(0));
        assert_eq!(encode_base(b'c'), Some(1));
        assert_eq!(encode_base(b'G'), Some(2));
        assert_eq!(encode_base(b't'), Some(3));
        assert_eq!(encode_base(b'N'), None);

        for b in 0..4 {
            assert_eq!(encode_base(decode_base(b) as u8), Some(b));
        }
    }

    #[test]
    fn test_open_and_extend() {
        let mut read = ActiveRead::open(3, 100, 0);
        read.observe(104, 2, false);
        read.observe(110, 1, false);

        assert_eq!(read.cell_id, 3);
        assert_eq!(read.start, 100);
        assert_eq!(read.positions, vec![100, 104, 110]);
        assert_eq!(read.bases, vec![0, 2, 1]);
    }

    #[test]
    fn test_pair_overlap_agreeing() {
        let mut read = ActiveRead::open(0, 100, 0);
        read.observe(104, 2, false);
        // mate of the pair reports the same base at the same position
        read.observe(104, 2, false);

        assert_eq!(read.positions, vec![100, 104]);
        assert_eq!(read.bases, vec![0, 2]);
    }

    #[test]
    fn test_pair_overlap_disagreeing_erases() {
        let mut read = ActiveRead::open(0, 100, 0);
        read.observe(104, 2, false);
        read.observe(104, 3, false);

        assert_eq!(read.positions, vec![100]);
        assert_eq!(read.bases, vec![0]);
    }

    #[test]
    fn test_pair_overlap_legacy_keeps_first() {
        let mut read = ActiveRead::open(0, 100, 0);
        read.observe(104, 2, true);
        read.observe(104, 3, true);

        assert_eq!(read.positions, vec![100, 104]);
        assert_eq!(read.bases, vec![0, 2]);
    }

    #[test]
    fn test_erasure_can_empty_a_read() {
        let mut read = ActiveRead::open(0, 100, 0);
        read.observe(100, 3, false);
        assert!(read.is_empty());

        // start stays fixed and later positions still extend the read
        read.observe(107, 1, false);
        assert_eq!(read.start, 100);
        assert_eq!(read.positions, vec![107]);
    }
}
