use super::chain::SegmentedBackbone;
use super::template::ReferenceTemplate;
use std::ops::Range;

/// A residue-aligned run of `len` consecutive backbone atoms.
///
/// Windows are index views into the flattened atom list of a
/// [`SegmentedBackbone`]; they never own coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// Declaration index of the chain the window belongs to.
    pub chain: usize,
    /// Index of the window's first residue within its chain.
    pub residue_offset: usize,
    /// Position of the window's first atom in the flattened atom list.
    pub start: usize,
    pub len: usize,
}

impl Window {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Host atom indices covered by this window.
    pub fn atoms<'a>(&self, backbone: &'a SegmentedBackbone) -> &'a [usize] {
        &backbone.flat_atoms()[self.range()]
    }
}

/// Number of windows a chain of `chain_residues` residues yields for a
/// reference spanning `reference_residues` residues.
pub fn windows_per_chain(chain_residues: usize, reference_residues: usize) -> usize {
    (chain_residues + 1).saturating_sub(reference_residues)
}

/// Enumerates all windows: chains in declaration order, then increasing residue offset.
pub fn generate(backbone: &SegmentedBackbone, template: &ReferenceTemplate) -> Vec<Window> {
    let residue_atoms = backbone.residue_atoms();
    let window_len = template.len();

    backbone
        .chains()
        .iter()
        .enumerate()
        .flat_map(|(chain_index, chain)| {
            let count = windows_per_chain(chain.len() / residue_atoms, template.residue_count());
            let base = chain.offset();
            (0..count).map(move |residue_offset| Window {
                chain: chain_index,
                residue_offset,
                start: base + residue_offset * residue_atoms,
                len: window_len,
            })
        })
        .collect()
}
