use std::fmt;

/// Number of symbol slots tracked per position: A, C, G, T, N and gap.
pub const NUM_SLOTS: usize = 6;

/// Symbol slot used to index per-position counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseSlot {
    /// Adenine.
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Thymine.
    T = 3,
    /// Unknown base.
    N = 4,
    /// Gap (deleted reference base).
    Gap = 5,
}

impl BaseSlot {
    /// All slots in counter order.
    pub const ALL: [BaseSlot; NUM_SLOTS] = [
        BaseSlot::A,
        BaseSlot::C,
        BaseSlot::G,
        BaseSlot::T,
        BaseSlot::N,
        BaseSlot::Gap,
    ];

    /// Map an ASCII symbol to its slot. Unrecognised symbols map to `N`.
    pub fn from_base(base: u8) -> Self {
        match base {
            b'A' | b'a' => BaseSlot::A,
            b'C' | b'c' => BaseSlot::C,
            b'G' | b'g' => BaseSlot::G,
            b'T' | b't' | b'U' | b'u' => BaseSlot::T,
            b'-' | b'_' => BaseSlot::Gap,
            _ => BaseSlot::N,
        }
    }

    /// Map an ASCII symbol observed on the given strand to its forward-strand slot.
    pub fn from_stranded_base(base: u8, strand: Strand) -> Self {
        let slot = Self::from_base(base);
        match strand {
            Strand::Forward => slot,
            Strand::Reverse => slot.complement(),
        }
    }

    /// Slot of the complementary symbol. `N` and gap are self-complementary.
    pub fn complement(self) -> Self {
        match self {
            BaseSlot::A => BaseSlot::T,
            BaseSlot::C => BaseSlot::G,
            BaseSlot::G => BaseSlot::C,
            BaseSlot::T => BaseSlot::A,
            other => other,
        }
    }

    /// Upper-case ASCII symbol of this slot.
    pub fn symbol(self) -> u8 {
        match self {
            BaseSlot::A => b'A',
            BaseSlot::C => b'C',
            BaseSlot::G => b'G',
            BaseSlot::T => b'T',
            BaseSlot::N => b'N',
            BaseSlot::Gap => b'-',
        }
    }

    /// Position of this slot in counter arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Strand of a read, feature or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// Forward (+) strand.
    Forward,
    /// Reverse (-) strand.
    Reverse,
}

impl Strand {
    /// Whether this is the forward strand.
    pub fn is_forward(self) -> bool {
        matches!(self, Strand::Forward)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// Mapping classification of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReadClass {
    /// Perfect match and the only mapping of the read.
    SinglePerfectMatch = 0,
    /// Perfect match with further mappings elsewhere.
    PerfectMatch = 1,
    /// Best match and the only mapping of the read.
    SingleBestMatch = 2,
    /// Best (but not perfect) match with further mappings.
    BestMatch = 3,
    /// Any other mapping.
    CommonMatch = 4,
}

impl ReadClass {
    /// Number of read classes.
    pub const COUNT: usize = 5;

    /// All read classes in ascending order.
    pub const ALL: [ReadClass; Self::COUNT] = [
        ReadClass::SinglePerfectMatch,
        ReadClass::PerfectMatch,
        ReadClass::SingleBestMatch,
        ReadClass::BestMatch,
        ReadClass::CommonMatch,
    ];

    /// Whether the mapping matches the reference without mismatches.
    pub fn is_perfect(self) -> bool {
        matches!(self, ReadClass::SinglePerfectMatch | ReadClass::PerfectMatch)
    }

    /// Whether the mapping is a perfect or best match.
    pub fn is_best_match(self) -> bool {
        !matches!(self, ReadClass::CommonMatch)
    }

    /// Whether the read maps to a single location.
    pub fn is_unique(self) -> bool {
        matches!(self, ReadClass::SinglePerfectMatch | ReadClass::SingleBestMatch)
    }

    /// Parse the short textual tag used in record files.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "SPM" | "single_perfect" => Some(ReadClass::SinglePerfectMatch),
            "PM" | "perfect" => Some(ReadClass::PerfectMatch),
            "SBM" | "single_best" => Some(ReadClass::SingleBestMatch),
            "BM" | "best" => Some(ReadClass::BestMatch),
            "CM" | "common" => Some(ReadClass::CommonMatch),
            _ => None,
        }
    }
}

/// Set of read classes included in an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadClassFilter {
    included: [bool; ReadClass::COUNT],
}

impl ReadClassFilter {
    /// Filter including every class.
    pub fn all() -> Self {
        Self {
            included: [true; ReadClass::COUNT],
        }
    }

    /// Filter including only the given classes.
    pub fn only(classes: &[ReadClass]) -> Self {
        let mut included = [false; ReadClass::COUNT];
        for class in classes {
            included[*class as usize] = true;
        }
        Self { included }
    }

    /// Return a copy with `class` excluded.
    pub fn excluding(mut self, class: ReadClass) -> Self {
        self.included[class as usize] = false;
        self
    }

    /// Whether `class` is included.
    #[inline]
    pub fn includes(&self, class: ReadClass) -> bool {
        self.included[class as usize]
    }

    /// Whether no class is included.
    pub fn is_empty(&self) -> bool {
        !self.included.iter().any(|&flag| flag)
    }
}

impl Default for ReadClassFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Substitution or deletion observed against the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    /// 1-based reference position.
    pub position: u32,
    /// Observed base (`-` for a deletion), as reported on `strand`.
    pub base: u8,
    /// Strand of the reads carrying this difference.
    pub strand: Strand,
    /// Phred base quality, `None` when unknown.
    pub base_quality: Option<u8>,
    /// Mapping quality, `None` when unknown.
    pub mapping_quality: Option<u8>,
    /// Number of reads carrying this difference.
    pub count: u32,
    /// Classification of the reads carrying this difference.
    pub class: ReadClass,
}

impl Difference {
    /// Construct a forward-strand difference without qualities.
    pub fn new(position: u32, base: u8, count: u32) -> Self {
        Self {
            position,
            base,
            strand: Strand::Forward,
            base_quality: None,
            mapping_quality: None,
            count,
            class: ReadClass::SinglePerfectMatch,
        }
    }

    /// Set the strand.
    pub fn on_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    /// Set base and mapping quality.
    pub fn with_qualities(mut self, base_quality: u8, mapping_quality: u8) -> Self {
        self.base_quality = Some(base_quality);
        self.mapping_quality = Some(mapping_quality);
        self
    }

    /// Set the read class.
    pub fn with_class(mut self, class: ReadClass) -> Self {
        self.class = class;
        self
    }

    /// Whether this difference is a deletion of the reference base.
    pub fn is_deletion(&self) -> bool {
        BaseSlot::from_base(self.base) == BaseSlot::Gap
    }
}

/// Insertion observed after a reference position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceGap {
    /// 1-based reference position the insertion follows.
    pub position: u32,
    /// Inserted base, as reported on `strand`.
    pub base: u8,
    /// 0-based index of the inserted base among the bases inserted here.
    pub order: u32,
    /// Strand of the reads carrying this insertion.
    pub strand: Strand,
    /// Phred base quality, `None` when unknown.
    pub base_quality: Option<u8>,
    /// Mapping quality, `None` when unknown.
    pub mapping_quality: Option<u8>,
    /// Number of reads carrying this insertion.
    pub count: u32,
    /// Classification of the reads carrying this insertion.
    pub class: ReadClass,
}

impl ReferenceGap {
    /// Construct a forward-strand insertion without qualities.
    pub fn new(position: u32, base: u8, order: u32, count: u32) -> Self {
        Self {
            position,
            base,
            order,
            strand: Strand::Forward,
            base_quality: None,
            mapping_quality: None,
            count,
            class: ReadClass::SinglePerfectMatch,
        }
    }

    /// Set the strand.
    pub fn on_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    /// Set base and mapping quality.
    pub fn with_qualities(mut self, base_quality: u8, mapping_quality: u8) -> Self {
        self.base_quality = Some(base_quality);
        self.mapping_quality = Some(mapping_quality);
        self
    }

    /// Set the read class.
    pub fn with_class(mut self, class: ReadClass) -> Self {
        self.class = class;
        self
    }
}

/// Per-class stranded coverage over an inclusive window `[left, right]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageManager {
    left: u32,
    right: u32,
    forward: [Vec<u32>; ReadClass::COUNT],
    reverse: [Vec<u32>; ReadClass::COUNT],
}

impl CoverageManager {
    /// Zero coverage for the window `[left, right]` (1-based, inclusive).
    pub fn new(left: u32, right: u32) -> Self {
        let len = right.saturating_sub(left) as usize + 1;
        Self {
            left,
            right,
            forward: std::array::from_fn(|_| vec![0; len]),
            reverse: std::array::from_fn(|_| vec![0; len]),
        }
    }

    /// Left window bound (inclusive).
    pub fn left_bound(&self) -> u32 {
        self.left
    }

    /// Right window bound (inclusive).
    pub fn right_bound(&self) -> u32 {
        self.right
    }

    /// Number of positions in the window.
    pub fn len(&self) -> usize {
        self.forward[0].len()
    }

    /// Whether the window holds no positions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn offset(&self, position: u32) -> Option<usize> {
        if position < self.left || position > self.right {
            return None;
        }
        Some((position - self.left) as usize)
    }

    /// Add `depth` reads of `class` on `strand` at `position`. Out-of-window positions are ignored.
    pub fn add(&mut self, position: u32, class: ReadClass, strand: Strand, depth: u32) {
        if let Some(offset) = self.offset(position) {
            let lane = match strand {
                Strand::Forward => &mut self.forward[class as usize],
                Strand::Reverse => &mut self.reverse[class as usize],
            };
            lane[offset] += depth;
        }
    }

    /// Add `depth` reads of `class` on `strand` to every position of `[from, to]`.
    pub fn add_range(&mut self, from: u32, to: u32, class: ReadClass, strand: Strand, depth: u32) {
        let from = from.max(self.left);
        let to = to.min(self.right);
        for position in from..=to {
            self.add(position, class, strand, depth);
        }
    }

    /// Coverage of one class and strand at `position`, 0 outside the window.
    pub fn coverage(&self, position: u32, class: ReadClass, strand: Strand) -> u32 {
        self.offset(position)
            .map(|offset| match strand {
                Strand::Forward => self.forward[class as usize][offset],
                Strand::Reverse => self.reverse[class as usize][offset],
            })
            .unwrap_or(0)
    }

    /// Forward-strand coverage summed over the included classes.
    pub fn forward_coverage(&self, position: u32, filter: &ReadClassFilter) -> u32 {
        ReadClass::ALL
            .iter()
            .filter(|class| filter.includes(**class))
            .map(|class| self.coverage(position, *class, Strand::Forward))
            .sum()
    }

    /// Forward plus reverse coverage summed over the included classes.
    pub fn total_coverage(&self, position: u32, filter: &ReadClassFilter) -> u32 {
        ReadClass::ALL
            .iter()
            .filter(|class| filter.includes(**class))
            .map(|class| {
                self.coverage(position, *class, Strand::Forward)
                    + self.coverage(position, *class, Strand::Reverse)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_strand_bases_are_complemented() {
        assert_eq!(BaseSlot::from_stranded_base(b'a', Strand::Reverse), BaseSlot::T);
        assert_eq!(BaseSlot::from_stranded_base(b'G', Strand::Reverse), BaseSlot::C);
        assert_eq!(BaseSlot::from_stranded_base(b'-', Strand::Reverse), BaseSlot::Gap);
        assert_eq!(BaseSlot::from_stranded_base(b'x', Strand::Forward), BaseSlot::N);
    }

    #[test]
    fn coverage_respects_class_filter() {
        let mut coverage = CoverageManager::new(10, 20);
        coverage.add(12, ReadClass::PerfectMatch, Strand::Forward, 3);
        coverage.add(12, ReadClass::CommonMatch, Strand::Reverse, 2);
        coverage.add(25, ReadClass::CommonMatch, Strand::Reverse, 9);

        assert_eq!(coverage.total_coverage(12, &ReadClassFilter::all()), 5);
        let filter = ReadClassFilter::all().excluding(ReadClass::CommonMatch);
        assert_eq!(coverage.total_coverage(12, &filter), 3);
        assert_eq!(coverage.total_coverage(25, &ReadClassFilter::all()), 0);
        assert_eq!(coverage.len(), 11);
    }
}


