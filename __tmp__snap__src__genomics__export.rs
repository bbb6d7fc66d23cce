use anyhow::{anyhow, Result};
use std::io::Write;

use super::{BaseSlot, SnpRecord};

/// Column names of the exported variant table, in output order.
pub const COLUMNS: [&str; 23] = [
    "Position",
    "Gap index",
    "Track",
    "Chromosome",
    "Base",
    "Reference",
    "A",
    "C",
    "G",
    "T",
    "N",
    "_",
    "Coverage",
    "Frequency",
    "Type",
    "AA Ref",
    "AA Snp",
    "Codon Ref",
    "Codon Snp",
    "Effect",
    "Avg base quality",
    "Avg mapping quality",
    "Features",
];

const MISSING: &str = "-";

/// Write calls as a tab-separated table with a header row.
pub fn write_table<W: Write>(writer: &mut W, snps: &[SnpRecord]) -> Result<()> {
    writeln!(writer, "{}", COLUMNS.join("\t"))?;

    for snp in snps {
        let counts = BaseSlot::ALL.map(|slot| snp.counts.get(slot).to_string());
        let codon_column = |field: fn(&super::CodonSnp) -> String| -> String {
            if snp.codons.is_empty() {
                MISSING.to_string()
            } else {
                snp.codons.iter().map(field).collect::<Vec<_>>().join(";")
            }
        };

        let row = [
            snp.position.to_string(),
            snp.gap_order.to_string(),
            snp.track_id.to_string(),
            snp.chrom_id.to_string(),
            (snp.base as char).to_string(),
            (snp.reference_base as char).to_string(),
            counts[0].clone(),
            counts[1].clone(),
            counts[2].clone(),
            counts[3].clone(),
            counts[4].clone(),
            counts[5].clone(),
            snp.coverage.to_string(),
            format!("{:.2}", snp.frequency),
            snp.comparison.label().to_string(),
            codon_column(|codon| codon.reference_amino_acid.to_string()),
            codon_column(|codon| codon.variant_amino_acid.to_string()),
            codon_column(|codon| codon.reference_triplet.clone()),
            codon_column(|codon| codon.variant_triplet.clone()),
            codon_column(|codon| codon.effect.label().to_string()),
            optional(snp.average_base_quality),
            optional(snp.average_mapping_quality),
            codon_column(|codon| codon.locus.clone()),
        ];
        writeln!(writer, "{}", row.join("\t"))?;
    }

    writer.flush()?;
    Ok(())
}

/// Render calls into a table string (useful for tests and snapshots).
pub fn render_table(snps: &[SnpRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_table(&mut buffer, snps)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered table is not valid UTF-8"))
}

fn optional(value: Option<u32>) -> String {
    value.map_or_else(|| MISSING.to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{BaseCounts, CodonSnp, SequenceComparison};

    #[test]
    fn table_has_fixed_columns() {
        let snp = SnpRecord {
            position: 42,
            gap_order: 0,
            track_id: 3,
            chrom_id: 1,
            base: b'C',
            reference_base: b'A',
            counts: BaseCounts::new([0, 8, 0, 0, 0, 0]),
            coverage: 10,
            frequency: 80.0,
            comparison: SequenceComparison::Substitution,
            average_base_quality: Some(30),
            average_mapping_quality: None,
            codons: vec![CodonSnp {
                reference_triplet: "ATG".into(),
                variant_triplet: "ACG".into(),
                reference_amino_acid: 'M',
                variant_amino_acid: 'T',
                effect: SequenceComparison::Missense,
                feature_id: 7,
                locus: "geneA".into(),
            }],
        };

        let table = render_table(&[snp]).unwrap();
        let mut lines = table.lines();
        assert_eq!(lines.next().unwrap().split('\t').count(), COLUMNS.len());
        assert_eq!(
            lines.next().unwrap(),
            "42\t0\t3\t1\tC\tA\t0\t8\t0\t0\t0\t0\t10\t80.00\tsubstitution\tM\tT\tATG\tACG\tmissense\t30\t-\tgeneA"
        );
    }
}


