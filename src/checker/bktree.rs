use std::collections::BTreeMap;

/// Case-insensitive Damerau-Levenshtein distance (optimal string alignment).
///
/// Insertions, deletions, substitutions and adjacent transpositions all cost 1.
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    distance(&a, &b)
}

/// Distance over already-lowercased character slices.
fn distance(a: &[char], b: &[char]) -> usize {
    if a == b {
        return 0;
    }
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let width = b.len() + 1;
    let mut matrix = vec![0usize; (a.len() + 1) * width];

    for i in 0..=a.len() {
        matrix[i * width] = i;
    }
    for (j, cell) in matrix.iter_mut().enumerate().take(width) {
        *cell = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };

            let mut best = std::cmp::min(
                std::cmp::min(
                    matrix[(i - 1) * width + j] + 1, // deletion
                    matrix[i * width + j - 1] + 1,   // insertion
                ),
                matrix[(i - 1) * width + j - 1] + cost, // substitution
            );

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(matrix[(i - 2) * width + j - 2] + 1); // transposition
            }

            matrix[i * width + j] = best;
        }
    }

    matrix[a.len() * width + b.len()]
}

#[derive(Debug)]
struct Node {
    term: String,
    chars: Vec<char>,
    // distance to parent term -> node index
    children: BTreeMap<usize, usize>,
}

/// Metric tree over edit distance. Nodes live in an arena and reference
/// their children by index.
#[derive(Debug, Default)]
pub struct BkTree {
    nodes: Vec<Node>,
}

impl BkTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a term. Returns `false` if an equal term (ignoring case) is
    /// already present.
    pub fn insert(&mut self, term: &str) -> bool {
        let term = term.to_lowercase();
        let chars: Vec<char> = term.chars().collect();

        if self.nodes.is_empty() {
            self.nodes.push(Node {
                term,
                chars,
                children: BTreeMap::new(),
            });
            return true;
        }

        let mut current = 0;
        loop {
            let dist = distance(&chars, &self.nodes[current].chars);
            if dist == 0 {
                return false;
            }
            match self.nodes[current].children.get(&dist) {
                Some(&child) => current = child,
                None => {
                    let idx = self.nodes.len();
                    self.nodes.push(Node {
                        term,
                        chars,
                        children: BTreeMap::new(),
                    });
                    self.nodes[current].children.insert(dist, idx);
                    return true;
                }
            }
        }
    }

    /// All terms within `max_distance` of `query`, paired with their distance.
    ///
    /// Only child edges inside `[dist - max_distance, dist + max_distance]`
    /// are followed.
    pub fn search(&self, query: &str, max_distance: usize) -> Vec<(&str, usize)> {
        let mut results = Vec::new();
        if self.nodes.is_empty() {
            return results;
        }

        let query: Vec<char> = query.to_lowercase().chars().collect();
        let mut stack = vec![0];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            let dist = distance(&query, &node.chars);
            if dist <= max_distance {
                results.push((node.term.as_str(), dist));
            }

            let low = dist.saturating_sub(max_distance);
            let high = dist + max_distance;
            stack.extend(node.children.range(low..=high).map(|(_, &child)| child));
        }

        results
    }
}

impl<S: AsRef<str>> FromIterator<S> for BkTree {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tree = BkTree::new();
        for term in iter {
            tree.insert(term.as_ref());
        }
        tree
    }
}
