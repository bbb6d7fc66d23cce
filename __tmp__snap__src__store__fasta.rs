use std::path::Path;

use rust_htslib::faidx;
use tracing::info;

use crate::genomics::{FeatureRecord, FeatureType};
use crate::store::{check_range, overlapping, ReferenceStore, StoreError};

#[derive(Debug)]
struct FastaChromosome {
    name: String,
    sequence: Vec<u8>,
}

/// Reference backed by an indexed FASTA file.
///
/// Chromosome ids are assigned 1, 2, ... in index order. Sequences are read
/// once when the reference is opened; the htslib reader is not shared across
/// threads.
#[derive(Debug)]
pub struct FastaReference {
    chromosomes: Vec<FastaChromosome>,
    features: Vec<FeatureRecord>,
}

impl FastaReference {
    /// Open `path` (with its `.fai` index) and load every sequence.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let reader = faidx::Reader::from_path(path.as_ref())?;
        let mut chromosomes = Vec::new();
        for idx in 0..reader.n_seqs() {
            let name = reader.seq_name(idx as i32)?;
            let length = reader.fetch_seq_len(&name) as usize;
            let sequence = if length == 0 {
                Vec::new()
            } else {
                reader
                    .fetch_seq_string(&name, 0, length - 1)?
                    .into_bytes()
                    .to_ascii_uppercase()
            };
            chromosomes.push(FastaChromosome { name, sequence });
        }
        info!(
            path = %path.as_ref().display(),
            chromosomes = chromosomes.len(),
            "reference loaded"
        );
        Ok(Self {
            chromosomes,
            features: Vec::new(),
        })
    }

    /// Attach annotated features.
    pub fn with_features(mut self, features: Vec<FeatureRecord>) -> Self {
        self.features = features;
        self
    }

    /// Identifier of the chromosome called `name`.
    pub fn chrom_id(&self, name: &str) -> Option<u32> {
        self.chromosomes
            .iter()
            .position(|chrom| chrom.name == name)
            .map(|idx| idx as u32 + 1)
    }

    /// Chromosome names in id order.
    pub fn chrom_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.chromosomes.iter().map(|chrom| chrom.name.as_str())
    }

    fn chromosome(&self, chrom_id: u32) -> Result<&FastaChromosome, StoreError> {
        chrom_id
            .checked_sub(1)
            .and_then(|idx| self.chromosomes.get(idx as usize))
            .ok_or(StoreError::UnknownChromosome(chrom_id))
    }
}

impl ReferenceStore for FastaReference {
    fn chrom_length(&self, chrom_id: u32) -> Result<u32, StoreError> {
        Ok(self.chromosome(chrom_id)?.sequence.len() as u32)
    }

    fn chrom_sequence(&self, chrom_id: u32, from: u32, to: u32) -> Result<Vec<u8>, StoreError> {
        let chromosome = self.chromosome(chrom_id)?;
        check_range(chrom_id, from, to, chromosome.sequence.len() as u32)?;
        Ok(chromosome.sequence[from as usize - 1..to as usize].to_vec())
    }

    fn features_for_region(
        &self,
        from: u32,
        to: u32,
        types: &[FeatureType],
        chrom_id: u32,
    ) -> Result<Vec<FeatureRecord>, StoreError> {
        self.chromosome(chrom_id)?;
        let on_chrom: Vec<FeatureRecord> = self
            .features
            .iter()
            .filter(|feature| feature.chrom_id == chrom_id)
            .cloned()
            .collect();
        Ok(overlapping(&on_chrom, from, to, types))
    }
}
