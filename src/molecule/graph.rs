//! In-memory molecular graph with SMILES parsing.
//!
//! The graph stores an ordered atom list; serialization traverses atoms in
//! index order, so renumbering the atoms changes the emitted string without
//! changing the molecule.

use std::collections::HashMap;

use super::error::SmilesError;

/// Index of an atom within a [`MolGraph`]
pub type AtomId = usize;

/// Bond order between two atoms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    /// Directional single bond written `/`
    Up,
    /// Directional single bond written `\`
    Down,
}

impl BondOrder {
    /// Comparison weight used by canonical ranking
    pub(crate) fn weight(self) -> u32 {
        match self {
            BondOrder::Single | BondOrder::Up | BondOrder::Down => 2,
            BondOrder::Aromatic => 3,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Quadruple => 8,
        }
    }
}

/// One atom of the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Element symbol as written (lowercase for aromatic atoms, `*` for wildcards)
    pub symbol: String,
    /// Whether the atom was written in aromatic (lowercase) form
    pub aromatic: bool,
    /// Raw bracket body for bracket atoms, without the enclosing `[]`
    pub bracket: Option<String>,
}

/// A bond between two atoms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub a: AtomId,
    pub b: AtomId,
    pub order: BondOrder,
}

/// Molecular graph with an ordered atom list
#[derive(Debug, Clone, Default)]
pub struct MolGraph {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(AtomId, usize)>>,
}

/// Two-letter element symbols recognized inside bracket atoms
const TWO_LETTER_ELEMENTS: &[&str] = &[
    "Ac", "Ag", "Al", "Am", "Ar", "As", "At", "Au", "Ba", "Be", "Bh", "Bi", "Bk", "Br", "Ca",
    "Cd", "Ce", "Cf", "Cl", "Cm", "Cn", "Co", "Cr", "Cs", "Cu", "Db", "Ds", "Dy", "Er", "Es",
    "Eu", "Fe", "Fl", "Fm", "Fr", "Ga", "Gd", "Ge", "He", "Hf", "Hg", "Ho", "Hs", "In", "Ir",
    "Kr", "La", "Li", "Lr", "Lu", "Lv", "Md", "Mg", "Mn", "Mo", "Mt", "Na", "Nb", "Nd", "Ne",
    "Ni", "No", "Np", "Og", "Os", "Pa", "Pb", "Pd", "Pm", "Po", "Pr", "Pt", "Pu", "Ra", "Rb",
    "Re", "Rf", "Rg", "Rh", "Rn", "Ru", "Sb", "Sc", "Se", "Sg", "Si", "Sm", "Sn", "Sr", "Ta",
    "Tb", "Tc", "Te", "Th", "Ti", "Tl", "Tm", "Ts", "Xe", "Yb", "Zn", "Zr",
];

/// Aromatic element symbols that span two lowercase letters
const TWO_LETTER_AROMATICS: &[&str] = &["as", "se", "te"];

struct RingOpen {
    atom: AtomId,
    bond: Option<BondOrder>,
}

impl MolGraph {
    /// Number of atoms
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Atom list in index order
    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Bond list in insertion order
    #[must_use]
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Neighbors of `atom` as `(neighbor, bond index)` pairs
    #[must_use]
    pub fn neighbors(&self, atom: AtomId) -> &[(AtomId, usize)] {
        &self.adjacency[atom]
    }

    fn add_atom(&mut self, atom: Atom) -> AtomId {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    fn add_bond(&mut self, a: AtomId, b: AtomId, order: BondOrder) {
        let idx = self.bonds.len();
        self.bonds.push(Bond { a, b, order });
        self.adjacency[a].push((b, idx));
        self.adjacency[b].push((a, idx));
    }

    fn default_bond(&self, a: AtomId, b: AtomId) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    /// Parse a SMILES string into a molecular graph
    ///
    /// # Errors
    /// Returns `SmilesError` for any string that is not a structurally valid
    /// molecule: unbalanced parentheses or brackets, unclosed ring bonds,
    /// dangling bond symbols, or characters with no SMILES meaning.
    pub fn parse(smiles: &str) -> Result<Self, SmilesError> {
        let chars: Vec<char> = smiles.chars().collect();
        if chars.is_empty() {
            return Err(SmilesError::Empty);
        }

        let mut graph = MolGraph::default();
        let mut prev: Option<AtomId> = None;
        let mut branch_stack: Vec<(Option<AtomId>, usize)> = Vec::new();
        let mut pending_bond: Option<(BondOrder, usize)> = None;
        let mut ring_bonds: HashMap<u32, RingOpen> = HashMap::new();

        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            match ch {
                '[' => {
                    let start = i;
                    let mut j = i + 1;
                    while j < chars.len() && chars[j] != ']' {
                        j += 1;
                    }
                    if j >= chars.len() {
                        return Err(SmilesError::UnclosedBracket(start));
                    }
                    let body: String = chars[i + 1..j].iter().collect();
                    let atom = parse_bracket_atom(&body, start)?;
                    let id = graph.add_atom(atom);
                    graph.connect(prev, id, &mut pending_bond)?;
                    prev = Some(id);
                    i = j + 1;
                }
                'C' | 'B' if i + 1 < chars.len() && matches!((ch, chars[i + 1]), ('C', 'l') | ('B', 'r')) => {
                    let symbol: String = chars[i..i + 2].iter().collect();
                    let id = graph.add_atom(Atom { symbol, aromatic: false, bracket: None });
                    graph.connect(prev, id, &mut pending_bond)?;
                    prev = Some(id);
                    i += 2;
                }
                'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I' | '*' => {
                    let id = graph.add_atom(Atom {
                        symbol: ch.to_string(),
                        aromatic: false,
                        bracket: None,
                    });
                    graph.connect(prev, id, &mut pending_bond)?;
                    prev = Some(id);
                    i += 1;
                }
                'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                    let id = graph.add_atom(Atom {
                        symbol: ch.to_string(),
                        aromatic: true,
                        bracket: None,
                    });
                    graph.connect(prev, id, &mut pending_bond)?;
                    prev = Some(id);
                    i += 1;
                }
                '-' | '=' | '#' | '$' | ':' | '/' | '\\' => {
                    if pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(i));
                    }
                    let order = match ch {
                        '-' => BondOrder::Single,
                        '=' => BondOrder::Double,
                        '#' => BondOrder::Triple,
                        '$' => BondOrder::Quadruple,
                        ':' => BondOrder::Aromatic,
                        '/' => BondOrder::Up,
                        _ => BondOrder::Down,
                    };
                    pending_bond = Some((order, i));
                    i += 1;
                }
                '0'..='9' | '%' => {
                    let (number, consumed) = if ch == '%' {
                        if i + 2 >= chars.len()
                            || !chars[i + 1].is_ascii_digit()
                            || !chars[i + 2].is_ascii_digit()
                        {
                            return Err(SmilesError::UnexpectedChar { ch, pos: i });
                        }
                        let n = chars[i + 1].to_digit(10).unwrap_or(0) * 10
                            + chars[i + 2].to_digit(10).unwrap_or(0);
                        (n, 3)
                    } else {
                        (ch.to_digit(10).unwrap_or(0), 1)
                    };
                    let Some(current) = prev else {
                        return Err(SmilesError::UnexpectedChar { ch, pos: i });
                    };
                    match ring_bonds.remove(&number) {
                        Some(open) => {
                            if open.atom == current {
                                return Err(SmilesError::SelfRingBond(number));
                            }
                            let order = pending_bond
                                .take()
                                .map(|(o, _)| o)
                                .or(open.bond)
                                .unwrap_or_else(|| graph.default_bond(open.atom, current));
                            graph.add_bond(open.atom, current, order);
                        }
                        None => {
                            let bond = pending_bond.take().map(|(o, _)| o);
                            ring_bonds.insert(number, RingOpen { atom: current, bond });
                        }
                    }
                    i += consumed;
                }
                '(' => {
                    if prev.is_none() {
                        return Err(SmilesError::DanglingBranch(i));
                    }
                    branch_stack.push((prev, i));
                    i += 1;
                }
                ')' => {
                    let Some((restored, _)) = branch_stack.pop() else {
                        return Err(SmilesError::UnbalancedParen(i));
                    };
                    prev = restored;
                    i += 1;
                }
                '.' => {
                    if let Some((_, pos)) = pending_bond {
                        return Err(SmilesError::DanglingBond(pos));
                    }
                    prev = None;
                    i += 1;
                }
                _ => return Err(SmilesError::UnexpectedChar { ch, pos: i }),
            }
        }

        if let Some((_, pos)) = branch_stack.pop() {
            return Err(SmilesError::UnbalancedParen(pos));
        }
        if let Some((_, pos)) = pending_bond {
            return Err(SmilesError::DanglingBond(pos));
        }
        if let Some(number) = ring_bonds.keys().min().copied() {
            return Err(SmilesError::OpenRingBond(number));
        }
        if graph.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }
        Ok(graph)
    }

    fn connect(
        &mut self,
        prev: Option<AtomId>,
        id: AtomId,
        pending: &mut Option<(BondOrder, usize)>,
    ) -> Result<(), SmilesError> {
        match (prev, pending.take()) {
            (Some(p), Some((order, _))) => self.add_bond(p, id, order),
            (Some(p), None) => {
                let order = self.default_bond(p, id);
                self.add_bond(p, id, order);
            }
            (None, Some((_, pos))) => return Err(SmilesError::DanglingBond(pos)),
            (None, None) => {}
        }
        Ok(())
    }

    /// Relabel atoms so position `i` of the new graph holds old atom `order[i]`
    ///
    /// Bonds are remapped and kept in insertion order. The molecule is
    /// unchanged; only the serialization traversal differs.
    ///
    /// # Errors
    /// Returns `SmilesError::BadPermutation` when `order` is not a
    /// permutation of `0..atom_count()`.
    pub fn renumber(&self, order: &[usize]) -> Result<Self, SmilesError> {
        let n = self.atoms.len();
        if order.len() != n {
            return Err(SmilesError::BadPermutation(order.to_vec(), n));
        }
        let mut inverse = vec![usize::MAX; n];
        for (new_id, &old_id) in order.iter().enumerate() {
            if old_id >= n || inverse[old_id] != usize::MAX {
                return Err(SmilesError::BadPermutation(order.to_vec(), n));
            }
            inverse[old_id] = new_id;
        }

        let mut graph = MolGraph::default();
        for &old_id in order {
            graph.add_atom(self.atoms[old_id].clone());
        }
        for bond in &self.bonds {
            graph.add_bond(inverse[bond.a], inverse[bond.b], bond.order);
        }
        Ok(graph)
    }
}

fn parse_bracket_atom(body: &str, pos: usize) -> Result<Atom, SmilesError> {
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1; // isotope prefix
    }
    let Some(&first) = chars.get(i) else {
        return Err(SmilesError::EmptyBracket(pos));
    };

    let (symbol, aromatic) = if first.is_ascii_uppercase() {
        let pair: String = chars[i..].iter().take(2).collect();
        if pair.len() == 2 && TWO_LETTER_ELEMENTS.contains(&pair.as_str()) {
            (pair, false)
        } else {
            (first.to_string(), false)
        }
    } else if first.is_ascii_lowercase() {
        let pair: String = chars[i..].iter().take(2).collect();
        if pair.len() == 2 && TWO_LETTER_AROMATICS.contains(&pair.as_str()) {
            (pair, true)
        } else {
            (first.to_string(), true)
        }
    } else if first == '*' {
        ("*".to_string(), false)
    } else {
        return Err(SmilesError::EmptyBracket(pos));
    };

    Ok(Atom { symbol, aromatic, bracket: Some(body.to_string()) })
}
