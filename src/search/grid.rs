//! Candidate grids enumerated in deterministic lexicographic order.

use crate::models::{PlainOrder, SarimaOrder, SeasonalOrder};

/// Candidate values for each component of a non-seasonal order.
///
/// `orders` enumerates the Cartesian product with `p` as the outermost
/// axis and `q` the innermost, so earlier candidates win score ties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainGrid {
    pub p: Vec<usize>,
    pub d: Vec<usize>,
    pub q: Vec<usize>,
}

impl PlainGrid {
    pub fn new(p: Vec<usize>, d: Vec<usize>, q: Vec<usize>) -> Self {
        Self { p, d, q }
    }

    /// Number of candidate orders.
    pub fn len(&self) -> usize {
        self.p.len() * self.d.len() * self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All candidate orders in enumeration order.
    pub fn orders(&self) -> Vec<PlainOrder> {
        let mut out = Vec::with_capacity(self.len());
        for &p in &self.p {
            for &d in &self.d {
                for &q in &self.q {
                    out.push(PlainOrder::new(p, d, q));
                }
            }
        }
        out
    }
}

/// Candidate values for each component of a seasonal order.
///
/// The non-seasonal axes come before the seasonal axes in enumeration
/// order, mirroring [`PlainGrid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonalGrid {
    pub p: Vec<usize>,
    pub d: Vec<usize>,
    pub q: Vec<usize>,
    pub cap_p: Vec<usize>,
    pub cap_d: Vec<usize>,
    pub cap_q: Vec<usize>,
}

impl SeasonalGrid {
    pub fn new(
        p: Vec<usize>,
        d: Vec<usize>,
        q: Vec<usize>,
        cap_p: Vec<usize>,
        cap_d: Vec<usize>,
        cap_q: Vec<usize>,
    ) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
        }
    }

    /// A grid with every axis drawn from the same candidate set.
    pub fn uniform(candidates: Vec<usize>) -> Self {
        Self::new(
            candidates.clone(),
            candidates.clone(),
            candidates.clone(),
            candidates.clone(),
            candidates.clone(),
            candidates,
        )
    }

    /// Number of candidate orders.
    pub fn len(&self) -> usize {
        self.p.len()
            * self.d.len()
            * self.q.len()
            * self.cap_p.len()
            * self.cap_d.len()
            * self.cap_q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All candidate orders at seasonal period `m`, in enumeration order.
    pub fn orders(&self, m: usize) -> Vec<SarimaOrder> {
        let mut out = Vec::with_capacity(self.len());
        for &p in &self.p {
            for &d in &self.d {
                for &q in &self.q {
                    for &cap_p in &self.cap_p {
                        for &cap_d in &self.cap_d {
                            for &cap_q in &self.cap_q {
                                out.push(SarimaOrder::new(
                                    PlainOrder::new(p, d, q),
                                    SeasonalOrder::new(cap_p, cap_d, cap_q, m),
                                ));
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_grid_is_lexicographic() {
        let grid = PlainGrid::new(vec![0, 1], vec![0], vec![0, 1]);
        let orders = grid.orders();
        assert_eq!(orders.len(), grid.len());
        assert_eq!(orders[0], PlainOrder::new(0, 0, 0));
        assert_eq!(orders[1], PlainOrder::new(0, 0, 1));
        assert_eq!(orders[2], PlainOrder::new(1, 0, 0));
        assert_eq!(orders[3], PlainOrder::new(1, 0, 1));
    }

    #[test]
    fn seasonal_grid_counts_product() {
        let grid = SeasonalGrid::uniform(vec![0, 1]);
        assert_eq!(grid.len(), 64);
        let orders = grid.orders(7);
        assert_eq!(orders.len(), 64);
        assert!(orders.iter().all(|o| o.seasonal.m == 7));
        // First candidate is the all-zero order, last the all-one order.
        assert_eq!(orders[0].plain, PlainOrder::new(0, 0, 0));
        assert!(orders[0].seasonal.is_trivial());
        assert_eq!(orders[63].plain, PlainOrder::new(1, 1, 1));
        assert_eq!(orders[63].seasonal, SeasonalOrder::new(1, 1, 1, 7));
    }

    #[test]
    fn empty_axis_empties_grid() {
        let grid = PlainGrid::new(vec![], vec![0, 1], vec![0, 1]);
        assert!(grid.is_empty());
        assert!(grid.orders().is_empty());
    }
}
