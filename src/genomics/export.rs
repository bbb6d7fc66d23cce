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
