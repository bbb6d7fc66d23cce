use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::genomics::Strand;

/// Kind of an annotated feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    /// Gene.
    Gene,
    /// Messenger RNA.
    Mrna,
    /// Ribosomal RNA.
    Rrna,
    /// Transfer RNA.
    Trna,
    /// Coding sequence segment.
    Cds,
    /// Exon.
    Exon,
    /// Any other annotation.
    Misc,
}

impl FeatureType {
    /// Whether the feature groups coding segments (gene, mRNA, rRNA, tRNA).
    pub fn is_container(self) -> bool {
        matches!(
            self,
            FeatureType::Gene | FeatureType::Mrna | FeatureType::Rrna | FeatureType::Trna
        )
    }

    /// Whether the feature is a transcribed segment (CDS or exon).
    pub fn is_segment(self) -> bool {
        matches!(self, FeatureType::Cds | FeatureType::Exon)
    }

    /// Whether codons may be translated within features of this type.
    pub fn is_translatable(self) -> bool {
        self.is_container() || self.is_segment()
    }

    /// Parse a GFF-style type column.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "gene" => FeatureType::Gene,
            "mrna" => FeatureType::Mrna,
            "rrna" => FeatureType::Rrna,
            "trna" => FeatureType::Trna,
            "cds" => FeatureType::Cds,
            "exon" => FeatureType::Exon,
            _ => FeatureType::Misc,
        }
    }
}

/// Feature as delivered by the reference store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    /// Store identifier.
    pub id: u64,
    /// Store identifier of the parent feature.
    pub parent_id: Option<u64>,
    /// Chromosome holding the feature.
    pub chrom_id: u32,
    /// 1-based start (inclusive).
    pub start: u32,
    /// 1-based stop (inclusive).
    pub stop: u32,
    /// Coding strand.
    pub strand: Strand,
    /// Feature kind.
    pub feature_type: FeatureType,
    /// Locus tag or name.
    pub locus: String,
}

impl FeatureRecord {
    /// Number of bases spanned.
    pub fn len(&self) -> u32 {
        if self.is_empty() {
            return 0;
        }
        self.stop - self.start + 1
    }

    /// Whether the feature spans no bases.
    pub fn is_empty(&self) -> bool {
        self.stop < self.start
    }

    /// Whether `position` lies within `[start, stop]`.
    #[inline]
    pub fn contains(&self, position: u32) -> bool {
        self.start <= position && position <= self.stop
    }
}

/// Index of a feature inside a [`FeatureTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(usize);

/// Errors raised by [`FeatureCursor`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    /// Query position lies before the previous one.
    #[error("cursor query at {position} precedes previous query at {previous}")]
    OutOfOrder {
        /// Requested position.
        position: u32,
        /// Position of the previous query.
        previous: u32,
    },
}

/// Arena of features with parent/child links.
///
/// Features are stored sorted by `(start, stop)`; top-level features (those
/// without a known parent) are kept in a separate sorted index.
#[derive(Debug, Clone, Default)]
pub struct FeatureTree {
    features: Vec<FeatureRecord>,
    parents: Vec<Option<FeatureId>>,
    children: Vec<Vec<FeatureId>>,
    roots: Vec<FeatureId>,
}

impl FeatureTree {
    /// Build the arena, resolving parent links by store identifier.
    ///
    /// Records with `stop < start` are dropped; their children become
    /// top-level features.
    pub fn new(mut records: Vec<FeatureRecord>) -> Self {
        records.retain(|record| {
            if record.is_empty() {
                warn!(
                    feature = record.id,
                    start = record.start,
                    stop = record.stop,
                    "feature ends before it starts, dropped"
                );
                return false;
            }
            true
        });
        records.sort_by(|a, b| (a.start, a.stop, a.id).cmp(&(b.start, b.stop, b.id)));

        let by_store_id: HashMap<u64, FeatureId> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.id, FeatureId(idx)))
            .collect();

        let mut parents = vec![None; records.len()];
        let mut children = vec![Vec::new(); records.len()];
        let mut roots = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            let parent = record
                .parent_id
                .and_then(|parent_id| match by_store_id.get(&parent_id) {
                    Some(parent) if parent.0 != idx => Some(*parent),
                    _ => {
                        warn!(
                            feature = record.id,
                            parent = parent_id,
                            "parent feature missing, treating as top-level"
                        );
                        None
                    }
                });
            match parent {
                Some(parent) => {
                    parents[idx] = Some(parent);
                    children[parent.0].push(FeatureId(idx));
                }
                None => roots.push(FeatureId(idx)),
            }
        }

        Self {
            features: records,
            parents,
            children,
            roots,
        }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the tree holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature record for `id`.
    pub fn get(&self, id: FeatureId) -> &FeatureRecord {
        &self.features[id.0]
    }

    /// Parent of `id`, if any.
    pub fn parent(&self, id: FeatureId) -> Option<FeatureId> {
        self.parents[id.0]
    }

    /// Children of `id`, sorted by start.
    pub fn children(&self, id: FeatureId) -> &[FeatureId] {
        &self.children[id.0]
    }

    /// Top-level features, sorted by start.
    pub fn roots(&self) -> &[FeatureId] {
        &self.roots
    }

    /// Top-level features covering `position`, for arbitrary query order.
    pub fn covering(&self, position: u32) -> Vec<FeatureId> {
        let end = self
            .roots
            .partition_point(|id| self.get(*id).start <= position);
        self.roots[..end]
            .iter()
            .copied()
            .filter(|id| self.get(*id).stop >= position)
            .collect()
    }

    /// Transcripts reachable from `id`, each as its segments sorted by start.
    ///
    /// A container contributes its CDS children if it has any, its exon
    /// children otherwise; nested containers contribute their own transcripts.
    /// A segment, or a container without children, is its own transcript.
    pub fn transcripts(&self, id: FeatureId) -> Vec<Vec<FeatureId>> {
        let mut transcripts = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let record = self.get(current);
            if record.feature_type.is_segment() && current == id {
                transcripts.push(vec![current]);
                continue;
            }
            if !record.feature_type.is_container() {
                continue;
            }

            let children = self.children(current);
            if children.is_empty() {
                transcripts.push(vec![current]);
                continue;
            }

            let segments_of = |kind: FeatureType| -> Vec<FeatureId> {
                children
                    .iter()
                    .copied()
                    .filter(|child| self.get(*child).feature_type == kind)
                    .collect()
            };
            let cds = segments_of(FeatureType::Cds);
            let segments = if cds.is_empty() {
                segments_of(FeatureType::Exon)
            } else {
                cds
            };
            if !segments.is_empty() {
                transcripts.push(segments);
            }

            // reversed so nested containers are visited in start order
            stack.extend(
                children
                    .iter()
                    .rev()
                    .copied()
                    .filter(|child| self.get(*child).feature_type.is_container()),
            );
        }

        transcripts
    }
}

/// Forward-only scan over a tree's top-level features.
///
/// Successive queries must use non-decreasing positions; the cursor never
/// moves backwards. Use [`FeatureTree::covering`] for arbitrary order.
#[derive(Debug, Clone, Default)]
pub struct FeatureCursor {
    next: usize,
    previous: Option<u32>,
}

impl FeatureCursor {
    /// Cursor positioned before the first feature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level features covering `position`.
    pub fn covering(
        &mut self,
        tree: &FeatureTree,
        position: u32,
    ) -> Result<Vec<FeatureId>, CursorError> {
        if let Some(previous) = self.previous {
            if position < previous {
                return Err(CursorError::OutOfOrder { position, previous });
            }
        }
        self.previous = Some(position);

        let roots = tree.roots();
        while self.next < roots.len() && tree.get(roots[self.next]).stop < position {
            self.next += 1;
        }

        Ok(roots[self.next..]
            .iter()
            .copied()
            .take_while(|id| tree.get(*id).start <= position)
            .filter(|id| tree.get(*id).stop >= position)
            .collect())
    }
}
