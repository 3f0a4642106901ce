//! Stores the variable order for decision diagrams and top-down compilation.
//! Variables that occur first in the order occur first in the diagram, starting
//! from the root. Lower numbers occur first in the order (i.e., closer to the root)

use crate::repr::VarLabel;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarOrder {
    /// an associative array, each index corresponds to a variable. I.e., the
    /// position of variable i in the order is given by the value of the array at
    /// index i
    var_to_pos: Vec<usize>,
    /// The inverse of `var_to_pos`, each index `i` corresponds to a label
    pos_to_var: Vec<usize>,
}

impl VarOrder {
    /// Creates a new variable order (elements that occur first in the vector
    /// occur first in the order). `order` must be a permutation of `0..order.len()`
    pub fn new(order: &[VarLabel]) -> VarOrder {
        let mut var_to_pos = vec![0; order.len()];
        let mut pos_to_var = Vec::with_capacity(order.len());
        for (pos, lbl) in order.iter().enumerate() {
            var_to_pos[lbl.value_usize()] = pos;
            pos_to_var.push(lbl.value_usize());
        }
        VarOrder {
            var_to_pos,
            pos_to_var,
        }
    }

    /// Generate a linear variable ordering of size `num_vars`
    /// ```
    /// # use whatif::repr::VarOrder;
    /// let o = VarOrder::linear_order(10);
    /// assert_eq!(o.num_vars(), 10);
    /// ```
    pub fn linear_order(num_vars: usize) -> VarOrder {
        let v: Vec<VarLabel> = (0..num_vars).map(VarLabel::new_usize).collect();
        VarOrder::new(&v)
    }

    /// Gives the number of variables in the order
    pub fn num_vars(&self) -> usize {
        self.var_to_pos.len()
    }

    /// Get the position of `var` in the order
    pub fn get(&self, var: VarLabel) -> usize {
        self.var_to_pos[var.value_usize()]
    }

    /// Fetches the variable that it as the specified position in the order
    /// ```
    /// # use whatif::repr::{VarLabel, VarOrder};
    /// let o = VarOrder::new(&[VarLabel::new(2), VarLabel::new(0), VarLabel::new(1)]);
    /// assert_eq!(o.var_at_level(0), VarLabel::new(2));
    /// assert_eq!(o.get(VarLabel::new(1)), 2);
    /// ```
    pub fn var_at_level(&self, pos: usize) -> VarLabel {
        VarLabel::new_usize(self.pos_to_var[pos])
    }

    /// True if `a` is before `b` in this ordering
    pub fn lt(&self, a: VarLabel, b: VarLabel) -> bool {
        self.get(a) < self.get(b)
    }

    /// Iterate the variables from the root of the order downwards
    pub fn in_order_iter(&self) -> impl Iterator<Item = VarLabel> + '_ {
        self.pos_to_var.iter().map(|&v| VarLabel::new_usize(v))
    }
}

impl Display for VarOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.in_order_iter().map(|l| l.to_string()).collect();
        write!(f, "[{}]", labels.join(", "))
    }
}
