//! Standard genetic code and amino-acid property classes.

/// Translate a codon with the standard genetic code.
///
/// Returns `None` for codons of the wrong length or with ambiguous bases.
/// Stop codons translate to `*`.
pub fn translate_codon(codon: &[u8]) -> Option<char> {
    if codon.len() != 3 {
        return None;
    }
    let upper = [
        codon[0].to_ascii_uppercase(),
        codon[1].to_ascii_uppercase(),
        codon[2].to_ascii_uppercase(),
    ];

    let amino_acid = match &upper {
        b"TTT" | b"TTC" => 'F',
        b"TTA" | b"TTG" | b"CTT" | b"CTC" | b"CTA" | b"CTG" => 'L',
        b"ATT" | b"ATC" | b"ATA" => 'I',
        b"ATG" => 'M',
        b"GTT" | b"GTC" | b"GTA" | b"GTG" => 'V',
        b"TCT" | b"TCC" | b"TCA" | b"TCG" | b"AGT" | b"AGC" => 'S',
        b"CCT" | b"CCC" | b"CCA" | b"CCG" => 'P',
        b"ACT" | b"ACC" | b"ACA" | b"ACG" => 'T',
        b"GCT" | b"GCC" | b"GCA" | b"GCG" => 'A',
        b"TAT" | b"TAC" => 'Y',
        b"TAA" | b"TAG" | b"TGA" => '*',
        b"CAT" | b"CAC" => 'H',
        b"CAA" | b"CAG" => 'Q',
        b"AAT" | b"AAC" => 'N',
        b"AAA" | b"AAG" => 'K',
        b"GAT" | b"GAC" => 'D',
        b"GAA" | b"GAG" => 'E',
        b"TGT" | b"TGC" => 'C',
        b"TGG" => 'W',
        b"CGT" | b"CGC" | b"CGA" | b"CGG" | b"AGA" | b"AGG" => 'R',
        b"GGT" | b"GGC" | b"GGA" | b"GGG" => 'G',
        _ => return None,
    };
    Some(amino_acid)
}

/// Chemical property class of an amino acid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AminoAcidProperty {
    /// Hydrophobic side chain (A, V, L, I, M, F, W, P, G).
    Hydrophobic,
    /// Polar uncharged side chain (S, T, C, Y, N, Q).
    Polar,
    /// Negatively charged side chain (D, E).
    Acidic,
    /// Positively charged side chain (K, R, H).
    Basic,
    /// Stop codon.
    Stop,
}

impl AminoAcidProperty {
    /// Property class of a one-letter amino-acid code.
    pub fn of(amino_acid: char) -> Option<Self> {
        match amino_acid.to_ascii_uppercase() {
            'A' | 'V' | 'L' | 'I' | 'M' | 'F' | 'W' | 'P' | 'G' => Some(Self::Hydrophobic),
            'S' | 'T' | 'C' | 'Y' | 'N' | 'Q' => Some(Self::Polar),
            'D' | 'E' => Some(Self::Acidic),
            'K' | 'R' | 'H' => Some(Self::Basic),
            '*' => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Complement of a single base; ambiguous bases map to `N`.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'a' => b't',
        b't' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        b'-' => b'-',
        _ => b'N',
    }
}

/// Reverse complement of a sequence.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&base| complement(base)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_standard_codons() {
        assert_eq!(translate_codon(b"ATG"), Some('M'));
        assert_eq!(translate_codon(b"acg"), Some('T'));
        assert_eq!(translate_codon(b"TGA"), Some('*'));
        assert_eq!(translate_codon(b"ANG"), None);
        assert_eq!(translate_codon(b"AT"), None);
    }

    #[test]
    fn property_classes() {
        assert_eq!(AminoAcidProperty::of('M'), Some(AminoAcidProperty::Hydrophobic));
        assert_eq!(AminoAcidProperty::of('T'), Some(AminoAcidProperty::Polar));
        assert_eq!(AminoAcidProperty::of('*'), Some(AminoAcidProperty::Stop));
        assert_eq!(AminoAcidProperty::of('X'), None);
    }

    #[test]
    fn reverse_complement_sequence() {
        assert_eq!(reverse_complement(b"ATCG"), b"CGAT".to_vec());
    }
}


