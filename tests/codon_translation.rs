use std::sync::Arc;

use test_case::test_case;
use vartrack::genomics::codon::translate_codon;
use vartrack::genomics::{
    BaseCounts, CodonTranslator, FeatureRecord, FeatureTree, FeatureType, SequenceComparison,
    SnpRecord, Strand,
};

fn feature(
    id: u64,
    parent_id: Option<u64>,
    span: (u32, u32),
    strand: Strand,
    kind: FeatureType,
) -> FeatureRecord {
    FeatureRecord {
        id,
        parent_id,
        chrom_id: 1,
        start: span.0,
        stop: span.1,
        strand,
        feature_type: kind,
        locus: format!("gene{id}"),
    }
}

fn substitution(position: u32, base: u8) -> SnpRecord {
    SnpRecord {
        position,
        gap_order: 0,
        track_id: 1,
        chrom_id: 1,
        base,
        reference_base: b'N',
        counts: BaseCounts::default(),
        coverage: 10,
        frequency: 100.0,
        comparison: SequenceComparison::Substitution,
        average_base_quality: None,
        average_mapping_quality: None,
        codons: Vec::new(),
    }
}

fn translator(sequence: &[u8], features: Vec<FeatureRecord>) -> CodonTranslator {
    CodonTranslator::new(Arc::new(FeatureTree::new(features)), Arc::from(sequence))
}

#[test_case(1, b'C', "ATG", "CTG", SequenceComparison::Neutral ; "start codon to leucine")]
#[test_case(3, b'A', "ATG", "ATA", SequenceComparison::Neutral ; "start codon to isoleucine")]
#[test_case(4, b'G', "AAA", "GAA", SequenceComparison::Missense ; "lysine to glutamate")]
#[test_case(6, b'G', "AAA", "AAG", SequenceComparison::Match ; "synonymous lysine")]
#[test_case(4, b'T', "AAA", "TAA", SequenceComparison::Missense ; "nonsense")]
#[test_case(11, b'A', "GGG", "GAG", SequenceComparison::Missense ; "glycine to glutamate")]
#[test_case(13, b'C', "TAA", "CAA", SequenceComparison::Missense ; "stop lost")]
fn forward_gene_effects(
    position: u32,
    base: u8,
    reference: &str,
    variant: &str,
    effect: SequenceComparison,
) {
    let mut translator = translator(
        b"ATGAAATTTGGGTAA",
        vec![
            feature(1, None, (1, 15), Strand::Forward, FeatureType::Gene),
            feature(2, Some(1), (1, 15), Strand::Forward, FeatureType::Cds),
        ],
    );
    let codons = translator.annotate(&substitution(position, base));
    assert_eq!(codons.len(), 1);
    assert_eq!(codons[0].reference_triplet, reference);
    assert_eq!(codons[0].variant_triplet, variant);
    assert_eq!(codons[0].effect, effect);
    assert_eq!(codons[0].locus, "gene1");
    assert_eq!(
        Some(codons[0].variant_amino_acid),
        translate_codon(variant.as_bytes())
    );
}

// genomic TTACAT reads ATG TAA on the reverse strand
#[test_case(4, b'T', "ATG", "ATA", SequenceComparison::Neutral ; "reverse start codon")]
#[test_case(2, b'G', "TAA", "TCA", SequenceComparison::Missense ; "reverse stop codon")]
fn reverse_gene_effects(
    position: u32,
    base: u8,
    reference: &str,
    variant: &str,
    effect: SequenceComparison,
) {
    let mut translator = translator(
        b"TTACAT",
        vec![feature(1, None, (1, 6), Strand::Reverse, FeatureType::Cds)],
    );
    let codons = translator.annotate(&substitution(position, base));
    assert_eq!(codons.len(), 1);
    assert_eq!(codons[0].reference_triplet, reference);
    assert_eq!(codons[0].variant_triplet, variant);
    assert_eq!(codons[0].effect, effect);
}

#[test]
fn overlapping_genes_each_get_a_codon() {
    let mut translator = translator(
        b"ATGAAATTTGGG",
        vec![
            feature(1, None, (1, 12), Strand::Forward, FeatureType::Cds),
            feature(2, None, (2, 10), Strand::Forward, FeatureType::Cds),
        ],
    );
    // position 5 is the middle of AAA (4..=6) for gene1 and starts AAT (5..=7) for gene2
    let codons = translator.annotate(&substitution(5, b'C'));
    let triplets: Vec<(&str, &str)> = codons
        .iter()
        .map(|codon| (codon.reference_triplet.as_str(), codon.variant_triplet.as_str()))
        .collect();
    assert_eq!(triplets, vec![("AAA", "ACA"), ("AAT", "CAT")]);
}

#[test]
fn calls_outside_features_are_not_annotated() {
    let mut translator = translator(
        b"ATGAAATTTGGG",
        vec![feature(1, None, (1, 6), Strand::Forward, FeatureType::Cds)],
    );
    let mut calls = vec![substitution(2, b'C'), substitution(9, b'A')];
    translator.annotate_all(&mut calls);
    assert_eq!(calls[0].codons.len(), 1);
    assert!(calls[1].codons.is_empty());
}

#[test]
fn out_of_order_queries_still_annotate() {
    let mut translator = translator(
        b"ATGAAATTTGGG",
        vec![feature(1, None, (1, 12), Strand::Forward, FeatureType::Cds)],
    );
    assert_eq!(translator.annotate(&substitution(10, b'A')).len(), 1);
    let codons = translator.annotate(&substitution(2, b'C'));
    assert_eq!(codons.len(), 1);
    assert_eq!(codons[0].variant_triplet, "ACG");
}
