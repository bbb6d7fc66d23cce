use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::genomics::codon::{complement, translate_codon, AminoAcidProperty};
use crate::genomics::{
    FeatureCursor, FeatureId, FeatureRecord, FeatureTree, SequenceComparison, SnpRecord, Strand,
};

/// Codon effect of a call within one coding feature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodonSnp {
    /// Reference codon in transcript orientation.
    pub reference_triplet: String,
    /// Codon carrying the called base, in transcript orientation.
    pub variant_triplet: String,
    /// Amino acid of the reference codon.
    pub reference_amino_acid: char,
    /// Amino acid of the variant codon (`-` when not translated).
    pub variant_amino_acid: char,
    /// Effect classification.
    pub effect: SequenceComparison,
    /// Store identifier of the owning feature.
    pub feature_id: u64,
    /// Locus tag of the owning feature.
    pub locus: String,
}

/// Reasons a codon annotation could not be produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslationError {
    /// Codon contains ambiguous bases.
    #[error("codon {0} cannot be translated")]
    UnknownCodon(String),

    /// A codon base lies beyond the chromosome ends.
    #[error("codon base at {position} lies outside the chromosome (length {length})")]
    TripletOutOfBounds {
        /// 1-based genomic position that was requested.
        position: i64,
        /// Chromosome length.
        length: usize,
    },

    /// Feature has no segment containing the position.
    #[error("position {position} lies in no coding segment of feature {feature}")]
    PositionOutsideFeature {
        /// Queried position.
        position: u32,
        /// Store identifier of the feature.
        feature: u64,
    },

    /// Transcript without segments.
    #[error("feature {0} has no coding segment")]
    NoCodingSegment(u64),
}

/// Reference codon located around a call.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocatedCodon {
    /// Codon bases in transcript orientation.
    triplet: [u8; 3],
    /// Index of the called position within the triplet.
    frame: usize,
    strand: Strand,
}

/// Annotates calls with codon effects of the coding features they hit.
///
/// Holds one chromosome's sequence and feature tree. Calls must be annotated
/// in non-decreasing position order; out-of-order calls fall back to a full
/// scan of the tree.
#[derive(Debug)]
pub struct CodonTranslator {
    features: Arc<FeatureTree>,
    sequence: Arc<[u8]>,
    cursor: FeatureCursor,
}

impl CodonTranslator {
    /// Create a translator for one chromosome. `sequence[0]` is position 1.
    pub fn new(features: Arc<FeatureTree>, sequence: Arc<[u8]>) -> Self {
        Self {
            features,
            sequence,
            cursor: FeatureCursor::new(),
        }
    }

    /// Chromosome length in bases.
    pub fn chrom_length(&self) -> usize {
        self.sequence.len()
    }

    /// Attach codon annotations to every call in `snps`.
    pub fn annotate_all(&mut self, snps: &mut [SnpRecord]) {
        for snp in snps.iter_mut() {
            snp.codons = self.annotate(snp);
        }
    }

    /// Codon annotations for one call.
    ///
    /// Failing features are logged and skipped; the remaining features are
    /// still evaluated.
    pub fn annotate(&mut self, snp: &SnpRecord) -> Vec<CodonSnp> {
        let roots = match self.cursor.covering(&self.features, snp.position) {
            Ok(roots) => roots,
            Err(err) => {
                warn!(%err, "feature cursor queried out of order, scanning all features");
                self.features.covering(snp.position)
            }
        };

        let mut codons = Vec::new();
        for root in roots {
            if !self.features.get(root).feature_type.is_translatable() {
                continue;
            }
            for segments in self.features.transcripts(root) {
                let hit = segments
                    .iter()
                    .any(|id| self.features.get(*id).contains(snp.position));
                if !hit {
                    continue;
                }
                let owner = self.owner(&segments);
                match self.codon_for(&segments, snp) {
                    Ok(codon) => codons.push(CodonSnp {
                        feature_id: owner.id,
                        locus: owner.locus.clone(),
                        ..codon
                    }),
                    Err(err) => debug!(
                        feature = owner.id,
                        position = snp.position,
                        %err,
                        "codon annotation skipped"
                    ),
                }
            }
        }
        codons
    }

    fn owner(&self, segments: &[FeatureId]) -> &FeatureRecord {
        let first = segments[0];
        let owner = if self.features.get(first).feature_type.is_segment() {
            self.features.parent(first).unwrap_or(first)
        } else {
            first
        };
        self.features.get(owner)
    }

    /// Codon effect of `snp` within the transcript formed by `segments`.
    fn codon_for(
        &self,
        segments: &[FeatureId],
        snp: &SnpRecord,
    ) -> Result<CodonSnp, TranslationError> {
        let records: Vec<&FeatureRecord> =
            segments.iter().map(|id| self.features.get(*id)).collect();
        let codon = self.locate_codon(&records, snp.position)?;

        let reference_triplet = codon.triplet;
        let base = snp.base.to_ascii_uppercase();
        let called = if codon.strand.is_forward() {
            base
        } else {
            complement(base)
        };

        let (variant_triplet, reference_amino_acid, variant_amino_acid, effect) =
            match snp.comparison {
                SequenceComparison::Substitution => {
                    let mut variant = reference_triplet;
                    variant[codon.frame] = called;
                    let reference_aa = translate(&reference_triplet)?;
                    let variant_aa = translate(&variant)?;
                    let effect = classify(reference_aa, variant_aa);
                    (variant.to_vec(), reference_aa, variant_aa, effect)
                }
                SequenceComparison::Deletion => {
                    let mut variant = reference_triplet;
                    variant[codon.frame] = b'-';
                    let reference_aa = translate_codon(&reference_triplet).unwrap_or('X');
                    (
                        variant.to_vec(),
                        reference_aa,
                        '-',
                        SequenceComparison::Deletion,
                    )
                }
                SequenceComparison::Insertion => {
                    let mut variant = reference_triplet.to_vec();
                    variant.insert(codon.frame + 1, called.to_ascii_lowercase());
                    let reference_aa = translate_codon(&reference_triplet).unwrap_or('X');
                    (variant, reference_aa, '-', SequenceComparison::Insertion)
                }
                other => {
                    let reference_aa = translate_codon(&reference_triplet).unwrap_or('X');
                    (reference_triplet.to_vec(), reference_aa, reference_aa, other)
                }
            };

        Ok(CodonSnp {
            reference_triplet: String::from_utf8_lossy(&reference_triplet).into_owned(),
            variant_triplet: String::from_utf8_lossy(&variant_triplet).into_owned(),
            reference_amino_acid,
            variant_amino_acid,
            effect,
            feature_id: 0,
            locus: String::new(),
        })
    }

    /// Locate the reference codon containing `position`.
    ///
    /// `segments` must be sorted by start. Codon neighbours beyond a segment
    /// end come from the adjacent segment; beyond the transcript ends they
    /// come from the linear genomic neighbours.
    fn locate_codon(
        &self,
        segments: &[&FeatureRecord],
        position: u32,
    ) -> Result<LocatedCodon, TranslationError> {
        let first = segments.first().ok_or(TranslationError::NoCodingSegment(0))?;
        let strand = first.strand;

        let transcript_offset = transcript_offset(segments, strand, position).ok_or(
            TranslationError::PositionOutsideFeature {
                position,
                feature: first.id,
            },
        )?;

        let frame = (transcript_offset % 3) as usize;
        let codon_start = transcript_offset - frame as i64;

        let mut triplet = [b'N'; 3];
        for (idx, slot) in triplet.iter_mut().enumerate() {
            let genomic = genomic_position(segments, strand, codon_start + idx as i64);
            let base = self.base_at(genomic)?;
            *slot = match strand {
                Strand::Forward => base,
                Strand::Reverse => complement(base),
            };
        }

        Ok(LocatedCodon {
            triplet,
            frame,
            strand,
        })
    }

    fn base_at(&self, position: i64) -> Result<u8, TranslationError> {
        if position < 1 || position as usize > self.sequence.len() {
            return Err(TranslationError::TripletOutOfBounds {
                position,
                length: self.sequence.len(),
            });
        }
        Ok(self.sequence[position as usize - 1].to_ascii_uppercase())
    }
}

/// 0-based offset of `position` in the spliced transcript, in transcript direction.
fn transcript_offset(segments: &[&FeatureRecord], strand: Strand, position: u32) -> Option<i64> {
    let mut offset = 0i64;
    match strand {
        Strand::Forward => {
            for segment in segments {
                if segment.contains(position) {
                    return Some(offset + (position - segment.start) as i64);
                }
                offset += segment.len() as i64;
            }
        }
        Strand::Reverse => {
            for segment in segments.iter().rev() {
                if segment.contains(position) {
                    return Some(offset + (segment.stop - position) as i64);
                }
                offset += segment.len() as i64;
            }
        }
    }
    None
}

/// Genomic position of a transcript offset; offsets beyond either transcript
/// end continue linearly past the outermost segment.
fn genomic_position(segments: &[&FeatureRecord], strand: Strand, offset: i64) -> i64 {
    let (Some(lowest), Some(highest)) = (segments.first(), segments.last()) else {
        return 0;
    };
    match strand {
        Strand::Forward => {
            if offset < 0 {
                return lowest.start as i64 + offset;
            }
            let mut remaining = offset;
            for segment in segments {
                let len = segment.len() as i64;
                if remaining < len {
                    return segment.start as i64 + remaining;
                }
                remaining -= len;
            }
            highest.stop as i64 + remaining + 1
        }
        Strand::Reverse => {
            if offset < 0 {
                return highest.stop as i64 - offset;
            }
            let mut remaining = offset;
            for segment in segments.iter().rev() {
                let len = segment.len() as i64;
                if remaining < len {
                    return segment.stop as i64 - remaining;
                }
                remaining -= len;
            }
            lowest.start as i64 - remaining - 1
        }
    }
}

fn translate(triplet: &[u8]) -> Result<char, TranslationError> {
    translate_codon(triplet)
        .ok_or_else(|| TranslationError::UnknownCodon(String::from_utf8_lossy(triplet).into_owned()))
}

fn classify(reference: char, variant: char) -> SequenceComparison {
    if reference == variant {
        SequenceComparison::Match
    } else if AminoAcidProperty::of(reference) == AminoAcidProperty::of(variant) {
        SequenceComparison::Neutral
    } else {
        SequenceComparison::Missense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{BaseCounts, FeatureType};

    fn record(
        id: u64,
        parent_id: Option<u64>,
        start: u32,
        stop: u32,
        strand: Strand,
        feature_type: FeatureType,
    ) -> FeatureRecord {
        FeatureRecord {
            id,
            parent_id,
            chrom_id: 1,
            start,
            stop,
            strand,
            feature_type,
            locus: format!("locus{id}"),
        }
    }

    fn snp(position: u32, base: u8, comparison: SequenceComparison) -> SnpRecord {
        SnpRecord {
            position,
            gap_order: 0,
            track_id: 1,
            chrom_id: 1,
            base,
            reference_base: b'N',
            counts: BaseCounts::default(),
            coverage: 10,
            frequency: 80.0,
            comparison,
            average_base_quality: None,
            average_mapping_quality: None,
            codons: Vec::new(),
        }
    }

    fn translator(sequence: &[u8], features: Vec<FeatureRecord>) -> CodonTranslator {
        CodonTranslator::new(
            Arc::new(FeatureTree::new(features)),
            Arc::from(sequence.to_vec().into_boxed_slice()),
        )
    }

    #[test]
    fn forward_cds_middle_base() {
        let mut translator = translator(
            b"CCATGAAATTT",
            vec![record(1, None, 3, 11, Strand::Forward, FeatureType::Cds)],
        );
        let codons = translator.annotate(&snp(4, b'C', SequenceComparison::Substitution));
        assert_eq!(codons.len(), 1);
        assert_eq!(codons[0].reference_triplet, "ATG");
        assert_eq!(codons[0].variant_triplet, "ACG");
        assert_eq!(codons[0].reference_amino_acid, 'M');
        assert_eq!(codons[0].variant_amino_acid, 'T');
        assert_eq!(codons[0].effect, SequenceComparison::Missense);
        assert_eq!(codons[0].locus, "locus1");
    }

    #[test]
    fn reverse_strand_codon_is_reverse_complemented() {
        // genomic CAT on the reverse strand reads ATG
        let mut translator = translator(
            b"GGCATGG",
            vec![record(1, None, 3, 5, Strand::Reverse, FeatureType::Cds)],
        );
        let codons = translator.annotate(&snp(3, b'G', SequenceComparison::Substitution));
        assert_eq!(codons.len(), 1);
        assert_eq!(codons[0].reference_triplet, "ATG");
        assert_eq!(codons[0].variant_triplet, "ATC");
        assert_eq!(codons[0].variant_amino_acid, 'I');
        assert_eq!(codons[0].effect, SequenceComparison::Neutral);
    }

    #[test]
    fn spliced_boundary_uses_next_exon() {
        // exon 1: 1..4 "ATGA", intron 5..8 "CCCC", exon 2: 9..12 "AAGG"
        let sequence = b"ATGACCCCAAGG";
        let mut translator = translator(
            sequence,
            vec![
                record(1, None, 1, 12, Strand::Forward, FeatureType::Gene),
                record(2, Some(1), 1, 4, Strand::Forward, FeatureType::Cds),
                record(3, Some(1), 9, 12, Strand::Forward, FeatureType::Cds),
            ],
        );
        let codons = translator.annotate(&snp(4, b'G', SequenceComparison::Substitution));
        assert_eq!(codons.len(), 1);
        assert_eq!(codons[0].reference_triplet, "AAA");
        assert_eq!(codons[0].variant_triplet, "GAA");
        assert_eq!(codons[0].feature_id, 1);

        assert!(translator
            .annotate(&snp(6, b'G', SequenceComparison::Substitution))
            .is_empty());
    }

    #[test]
    fn chromosome_end_skips_translation() {
        let mut translator = translator(
            b"AAATG",
            vec![record(1, None, 4, 5, Strand::Forward, FeatureType::Cds)],
        );
        assert!(translator
            .annotate(&snp(5, b'C', SequenceComparison::Substitution))
            .is_empty());
    }

    #[test]
    fn failing_feature_does_not_hide_others() {
        let mut translator = translator(
            b"ATGNNATGA",
            vec![
                record(1, None, 1, 9, Strand::Forward, FeatureType::Cds),
                record(2, None, 3, 9, Strand::Forward, FeatureType::Cds),
            ],
        );
        // feature 1 codon at 4..6 is "NNA"; feature 2 codon at 6..8 is "ATG"
        let codons = translator.annotate(&snp(6, b'C', SequenceComparison::Substitution));
        assert_eq!(codons.len(), 1);
        assert_eq!(codons[0].feature_id, 2);
        assert_eq!(codons[0].variant_triplet, "CTG");
    }

    #[test]
    fn deletion_and_insertion_keep_tags() {
        let mut translator = translator(
            b"ATGAAA",
            vec![record(1, None, 1, 6, Strand::Forward, FeatureType::Cds)],
        );
        let deletion = translator.annotate(&snp(2, b'-', SequenceComparison::Deletion));
        assert_eq!(deletion[0].variant_triplet, "A-G");
        assert_eq!(deletion[0].effect, SequenceComparison::Deletion);

        let insertion = translator.annotate(&snp(5, b'T', SequenceComparison::Insertion));
        assert_eq!(insertion[0].reference_triplet, "AAA");
        assert_eq!(insertion[0].variant_triplet, "AAtA");
        assert_eq!(insertion[0].effect, SequenceComparison::Insertion);
    }

    #[test]
    fn inverted_segment_loses_only_itself() {
        let mut translator = translator(
            b"ATGACCCCAAGG",
            vec![
                record(1, None, 3, 12, Strand::Forward, FeatureType::Gene),
                record(2, Some(1), 5, 3, Strand::Forward, FeatureType::Cds),
                record(3, Some(1), 8, 12, Strand::Forward, FeatureType::Cds),
            ],
        );
        let codons = translator.annotate(&snp(9, b'G', SequenceComparison::Substitution));
        assert_eq!(codons.len(), 1);
        assert_eq!(codons[0].reference_triplet, "CAA");
        assert_eq!(codons[0].variant_triplet, "CGA");
        assert_eq!(codons[0].feature_id, 1);
    }

    #[test]
    fn reverse_splice_boundary_uses_next_exon() {
        // exons 1..=4 and 9..=12 on the reverse strand; transcript starts at 12
        let mut translator = translator(
            b"TTCAGGGGGCAT",
            vec![
                record(1, None, 1, 12, Strand::Reverse, FeatureType::Gene),
                record(2, Some(1), 1, 4, Strand::Reverse, FeatureType::Exon),
                record(3, Some(1), 9, 12, Strand::Reverse, FeatureType::Exon),
            ],
        );
        let codons = translator.annotate(&snp(9, b'T', SequenceComparison::Substitution));
        assert_eq!(codons.len(), 1);
        assert_eq!(codons[0].reference_triplet, "CTG");
        assert_eq!(codons[0].variant_triplet, "ATG");
    }
}
