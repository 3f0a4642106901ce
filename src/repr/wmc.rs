use crate::{
    repr::{Literal, VarLabel},
    util::semirings::Semiring,
};
use core::fmt::Debug;

/// Weighted model counting parameters. It primarily is a storage for
/// the weight on each variable.
#[derive(Clone)]
pub struct WmcParams<T: Semiring> {
    pub zero: T,
    pub one: T,
    /// a vector which maps variable labels to `(low, high)`
    /// valuations.
    var_to_val: Vec<Option<(T, T)>>,
}

impl<T: Semiring> WmcParams<T> {
    /// get the weight of an asignment; unweighted variables count as `one`
    /// ```
    /// use whatif::repr::{Literal, VarLabel, WmcParams};
    /// use whatif::util::semirings::RealSemiring;
    ///
    /// let mut params = WmcParams::default();
    /// params.set_weight(VarLabel::new(0), RealSemiring(0.0), RealSemiring(1.0));
    /// params.set_weight(VarLabel::new(1), RealSemiring(0.3), RealSemiring(0.7));
    ///
    /// let all_true = [
    ///     Literal::new(VarLabel::new(0), true),
    ///     Literal::new(VarLabel::new(1), true),
    /// ];
    ///
    /// assert_eq!(params.assignment_weight(&all_true).0, 0.7)
    /// ```
    pub fn assignment_weight(&self, assgn: &[Literal]) -> T {
        let mut prod = self.one;
        for lit in assgn.iter() {
            let (low, high) = self.var_weight(lit.label());
            prod = prod * if lit.polarity() { high } else { low };
        }
        prod
    }

    /// ```
    /// use whatif::repr::{VarLabel, WmcParams};
    /// use whatif::util::semirings::RealSemiring;
    ///
    /// let mut params = WmcParams::<RealSemiring>::default();
    /// params.set_weight(VarLabel::new(3), RealSemiring(0.5), RealSemiring(0.5));
    /// assert_eq!(params.var_weight(VarLabel::new(3)), (RealSemiring(0.5), RealSemiring(0.5)));
    /// assert_eq!(params.var_weight(VarLabel::new(1)), (RealSemiring(1.0), RealSemiring(1.0)));
    /// ```
    pub fn set_weight(&mut self, lbl: VarLabel, low: T, high: T) {
        let n = lbl.value_usize();
        if n >= self.var_to_val.len() {
            self.var_to_val.resize(n + 1, None);
        }
        self.var_to_val[n] = Some((low, high));
    }

    /// Overwrite only the weight of the given literal, keeping the weight of
    /// its complement
    pub fn set_literal_weight(&mut self, lit: Literal, weight: T) {
        let (low, high) = self.var_weight(lit.label());
        if lit.polarity() {
            self.set_weight(lit.label(), low, weight)
        } else {
            self.set_weight(lit.label(), weight, high)
        }
    }

    /// gives you the weight of `(low, high)` literals for a given VarLabel;
    /// variables without an explicit weight are weighted `(one, one)`
    pub fn var_weight(&self, label: VarLabel) -> (T, T) {
        match self.var_to_val.get(label.value_usize()) {
            Some(Some(w)) => *w,
            _ => (self.one, self.one),
        }
    }

    /// the total weight of a variable that does not occur in a circuit,
    /// i.e. `low + high`
    pub fn smoothing_weight(&self, label: VarLabel) -> T {
        let (low, high) = self.var_weight(label);
        low + high
    }
}

impl<T: Semiring> Debug for WmcParams<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WmcParams")
            .field("zero", &self.zero)
            .field("one", &self.one)
            .field(
                "var_to_val",
                &self
                    .var_to_val
                    .iter()
                    .enumerate()
                    .map(|(index, val)| {
                        if let Some((low, high)) = val {
                            format!("{}: l: {:?}, h: {:?}", index, low, high)
                        } else {
                            format!("{}: None", index)
                        }
                    })
                    .collect::<Vec<String>>(),
            )
            .finish()
    }
}

impl<T: Semiring> Default for WmcParams<T> {
    /// Parametrize a weighted model count (over a semiring) with no weights
    fn default() -> Self {
        WmcParams {
            zero: T::zero(),
            one: T::one(),
            var_to_val: Vec::new(),
        }
    }
}
