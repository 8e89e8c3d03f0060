//! SMILES serialization: ordered DFS writer and canonical ranking.

use std::collections::BTreeMap;

use super::error::SmilesError;
use super::graph::{AtomId, BondOrder, MolGraph};

impl MolGraph {
    /// Serialize the graph to a SMILES string
    ///
    /// Non-canonical mode traverses atoms in their current index order, so
    /// the output follows whatever renumbering the graph carries. Canonical
    /// mode first relabels atoms by canonical rank, producing a unique string
    /// for a molecule regardless of input atom order.
    ///
    /// # Errors
    /// Returns `SmilesError` for an empty graph or a graph that needs more
    /// ring-closure labels than SMILES can express.
    pub fn write(&self, canonical: bool) -> Result<String, SmilesError> {
        if canonical {
            let ranks = self.canonical_ranks();
            let mut order: Vec<AtomId> = (0..self.atom_count()).collect();
            order.sort_by_key(|&i| ranks[i]);
            let relabeled = self.renumber(&order)?;
            relabeled.write_ordered()
        } else {
            self.write_ordered()
        }
    }

    /// Canonical rank per atom, computed by iterative refinement
    ///
    /// Starts from order-invariant atom properties (degree, element,
    /// aromaticity, bracket text, bond-order weight sum) and repeatedly
    /// splits rank classes by the sorted ranks of each atom's neighbors
    /// until the partition is stable. Atoms left tied are symmetric under
    /// the invariants and may share a rank.
    #[must_use]
    pub fn canonical_ranks(&self) -> Vec<usize> {
        let n = self.atom_count();
        if n == 0 {
            return Vec::new();
        }

        let initial: Vec<(usize, &str, bool, &str, u32)> = (0..n)
            .map(|i| {
                let atom = &self.atoms()[i];
                let weight: u32 = self
                    .neighbors(i)
                    .iter()
                    .map(|&(_, bond)| self.bonds()[bond].order.weight())
                    .sum();
                (
                    self.neighbors(i).len(),
                    atom.symbol.as_str(),
                    atom.aromatic,
                    atom.bracket.as_deref().unwrap_or(""),
                    weight,
                )
            })
            .collect();
        let mut ranks = dense_ranks(&initial);

        for _ in 0..n {
            let keys: Vec<(usize, Vec<usize>)> = (0..n)
                .map(|i| {
                    let mut neighbor_ranks: Vec<usize> =
                        self.neighbors(i).iter().map(|&(j, _)| ranks[j]).collect();
                    neighbor_ranks.sort_unstable();
                    (ranks[i], neighbor_ranks)
                })
                .collect();
            let refined = dense_ranks(&keys);
            let before = count_distinct(&ranks);
            let after = count_distinct(&refined);
            ranks = refined;
            if after == before {
                break;
            }
        }
        ranks
    }

    /// DFS serialization in current atom-index order
    fn write_ordered(&self) -> Result<String, SmilesError> {
        let n = self.atom_count();
        if n == 0 {
            return Err(SmilesError::Empty);
        }

        let mut tree = SpanningTree::new(n, self.bonds().len());
        for root in 0..n {
            if !tree.visited[root] {
                tree.roots.push(root);
                tree.explore(self, root, None)?;
            }
        }

        let mut out = String::new();
        for (k, &root) in tree.roots.iter().enumerate() {
            if k > 0 {
                out.push('.');
            }
            self.emit(root, &tree, &mut out);
        }
        Ok(out)
    }

    fn emit(&self, atom: AtomId, tree: &SpanningTree, out: &mut String) {
        out.push_str(&self.atom_token(atom));
        for &(number, order, other) in &tree.closures[atom] {
            out.push_str(self.bond_token(order, atom, other));
            if number < 10 {
                out.push(char::from_digit(number, 10).unwrap_or('0'));
            } else {
                out.push('%');
                out.push_str(&number.to_string());
            }
        }
        let children = &tree.children[atom];
        for (i, &(child, order)) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            if !last {
                out.push('(');
            }
            out.push_str(self.bond_token(order, atom, child));
            self.emit(child, tree, out);
            if !last {
                out.push(')');
            }
        }
    }

    fn atom_token(&self, atom: AtomId) -> String {
        let a = &self.atoms()[atom];
        match &a.bracket {
            Some(body) => format!("[{body}]"),
            None => a.symbol.clone(),
        }
    }

    fn bond_token(&self, order: BondOrder, a: AtomId, b: AtomId) -> &'static str {
        let both_aromatic = self.atoms()[a].aromatic && self.atoms()[b].aromatic;
        match order {
            BondOrder::Single => {
                if both_aromatic {
                    "-"
                } else {
                    ""
                }
            }
            BondOrder::Aromatic => {
                if both_aromatic {
                    ""
                } else {
                    ":"
                }
            }
            BondOrder::Double => "=",
            BondOrder::Triple => "#",
            BondOrder::Quadruple => "$",
            BondOrder::Up => "/",
            BondOrder::Down => "\\",
        }
    }
}

/// Spanning tree plus ring closures discovered by the pre-emission DFS
struct SpanningTree {
    visited: Vec<bool>,
    bond_used: Vec<bool>,
    children: Vec<Vec<(AtomId, BondOrder)>>,
    closures: Vec<Vec<(u32, BondOrder, AtomId)>>,
    roots: Vec<AtomId>,
    next_ring: u32,
}

impl SpanningTree {
    fn new(atoms: usize, bonds: usize) -> Self {
        Self {
            visited: vec![false; atoms],
            bond_used: vec![false; bonds],
            children: vec![Vec::new(); atoms],
            closures: vec![Vec::new(); atoms],
            roots: Vec::new(),
            next_ring: 1,
        }
    }

    fn explore(
        &mut self,
        graph: &MolGraph,
        atom: AtomId,
        parent_bond: Option<usize>,
    ) -> Result<(), SmilesError> {
        self.visited[atom] = true;

        let mut neighbors: Vec<(AtomId, usize)> = graph.neighbors(atom).to_vec();
        neighbors.sort_unstable_by_key(|&(other, _)| other);

        for (other, bond) in neighbors {
            if Some(bond) == parent_bond || self.bond_used[bond] {
                continue;
            }
            let order = graph.bonds()[bond].order;
            if self.visited[other] {
                // back edge: a ring bond closing onto an already-emitted atom
                self.bond_used[bond] = true;
                let number = self.next_ring;
                if number > 99 {
                    return Err(SmilesError::Write(
                        "more than 99 open ring closures".to_string(),
                    ));
                }
                self.next_ring += 1;
                self.closures[other].push((number, order, atom));
                self.closures[atom].push((number, order, other));
            } else {
                self.bond_used[bond] = true;
                self.children[atom].push((other, order));
                self.explore(graph, other, Some(bond))?;
            }
        }
        Ok(())
    }
}

/// Dense ranks of `keys`: equal keys share a rank, ranks start at 0
fn dense_ranks<K: Ord + Clone>(keys: &[K]) -> Vec<usize> {
    let mut sorted: Vec<K> = keys.to_vec();
    sorted.sort();
    sorted.dedup();
    let index: BTreeMap<K, usize> =
        sorted.into_iter().enumerate().map(|(rank, key)| (key, rank)).collect();
    keys.iter().map(|k| index[k]).collect()
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut seen: Vec<usize> = ranks.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
