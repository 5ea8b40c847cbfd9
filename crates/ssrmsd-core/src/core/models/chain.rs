use thiserror::Error;

/// Validation failures for a declared backbone chain.
///
/// `chain` is the zero-based position of the chain in declaration order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("No backbone chains were declared")]
    NoChains,

    #[error("Backbone chain {chain} contains no atoms")]
    Empty { chain: usize },

    #[error(
        "Backbone chain {chain} has {atoms} atoms, which is not a multiple of {residue_atoms} atoms per residue"
    )]
    NotResidueMultiple {
        chain: usize,
        atoms: usize,
        residue_atoms: usize,
    },

    #[error(
        "Backbone chain {chain} has {atoms} atoms but the reference template needs at least {required}"
    )]
    TooShort {
        chain: usize,
        atoms: usize,
        required: usize,
    },
}

/// One backbone chain: host atom indices plus where the chain starts in the
/// flattened atom list of all chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackboneChain {
    offset: usize,
    atoms: Vec<usize>,
}

impl BackboneChain {
    /// Position of this chain's first atom in the flattened atom list.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// The validated set of chains, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedBackbone {
    residue_atoms: usize,
    chains: Vec<BackboneChain>,
    flat: Vec<usize>,
}

impl SegmentedBackbone {
    pub fn chains(&self) -> &[BackboneChain] {
        &self.chains
    }

    pub fn residue_atoms(&self) -> usize {
        self.residue_atoms
    }

    /// Host atom indices of every chain, concatenated in declaration order.
    pub fn flat_atoms(&self) -> &[usize] {
        &self.flat
    }

    pub fn atom_count(&self) -> usize {
        self.flat.len()
    }

    pub fn max_atom_index(&self) -> Option<usize> {
        self.flat.iter().copied().max()
    }
}

/// Validates declared chains against the residue size and reference length.
#[derive(Debug, Clone, Copy)]
pub struct ChainSegmenter {
    residue_atoms: usize,
    reference_len: usize,
}

impl ChainSegmenter {
    pub fn new(residue_atoms: usize, reference_len: usize) -> Self {
        Self {
            residue_atoms,
            reference_len,
        }
    }

    pub fn segment(&self, chains: &[Vec<usize>]) -> Result<SegmentedBackbone, ChainError> {
        if chains.is_empty() {
            return Err(ChainError::NoChains);
        }

        let mut segmented = Vec::with_capacity(chains.len());
        let mut flat = Vec::with_capacity(chains.iter().map(Vec::len).sum());

        for (chain, atoms) in chains.iter().enumerate() {
            if atoms.is_empty() {
                return Err(ChainError::Empty { chain });
            }
            if atoms.len() % self.residue_atoms != 0 {
                return Err(ChainError::NotResidueMultiple {
                    chain,
                    atoms: atoms.len(),
                    residue_atoms: self.residue_atoms,
                });
            }
            if atoms.len() < self.reference_len {
                return Err(ChainError::TooShort {
                    chain,
                    atoms: atoms.len(),
                    required: self.reference_len,
                });
            }

            segmented.push(BackboneChain {
                offset: flat.len(),
                atoms: atoms.clone(),
            });
            flat.extend_from_slice(atoms);
        }

        Ok(SegmentedBackbone {
            residue_atoms: self.residue_atoms,
            chains: segmented,
            flat,
        })
    }
}
