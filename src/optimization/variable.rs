//! Symbolic scalars recorded on an expression tape
//!
//! A [`Variable`] is either a folded constant or a handle to a node on a
//! shared tape. Nodes are appended in creation order, so every node's operands
//! have smaller indices than the node itself and a single backward sweep over
//! the tape is a valid reverse-mode differentiation.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use std::rc::Rc;

use log::warn;

/// A single operation on the tape. Operands are node indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Node {
    Constant(f64),
    Decision(usize),
    Add(usize, usize),
    Sub(usize, usize),
    Mul(usize, usize),
    Div(usize, usize),
    Neg(usize),
    Sin(usize),
    Cos(usize),
    Sqrt(usize),
    Abs(usize),
    Atan2(usize, usize),
}

/// Immutable view of the recorded operations.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExpressionGraph {
    nodes: Vec<Node>,
}

impl ExpressionGraph {
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Forward pass over the first `len` nodes for decision values `x`.
    fn evaluate_prefix(&self, x: &[f64], len: usize, out: &mut Vec<f64>) {
        out.clear();
        out.reserve(len);
        for node in &self.nodes[..len] {
            let value = match *node {
                Node::Constant(c) => c,
                Node::Decision(k) => x[k],
                Node::Add(a, b) => out[a] + out[b],
                Node::Sub(a, b) => out[a] - out[b],
                Node::Mul(a, b) => out[a] * out[b],
                Node::Div(a, b) => out[a] / out[b],
                Node::Neg(a) => -out[a],
                Node::Sin(a) => out[a].sin(),
                Node::Cos(a) => out[a].cos(),
                Node::Sqrt(a) => out[a].sqrt(),
                Node::Abs(a) => out[a].abs(),
                Node::Atan2(y, x) => out[y].atan2(out[x]),
            };
            out.push(value);
        }
    }

    /// Evaluates every node for decision values `x`.
    pub(crate) fn evaluate(&self, x: &[f64], out: &mut Vec<f64>) {
        self.evaluate_prefix(x, self.nodes.len(), out);
    }

    /// Pushes the adjoint `g` of node `i` onto its operands.
    ///
    /// Returns the decision index and adjoint when `i` is a decision variable.
    #[inline]
    fn propagate(&self, i: usize, g: f64, values: &[f64], adjoints: &mut [f64]) -> Option<(usize, f64)> {
        match self.nodes[i] {
            Node::Constant(_) => {}
            Node::Decision(k) => return Some((k, g)),
            Node::Add(a, b) => {
                adjoints[a] += g;
                adjoints[b] += g;
            }
            Node::Sub(a, b) => {
                adjoints[a] += g;
                adjoints[b] -= g;
            }
            Node::Mul(a, b) => {
                adjoints[a] += g * values[b];
                adjoints[b] += g * values[a];
            }
            Node::Div(a, b) => {
                adjoints[a] += g / values[b];
                adjoints[b] -= g * values[i] / values[b];
            }
            Node::Neg(a) => adjoints[a] -= g,
            Node::Sin(a) => adjoints[a] += g * values[a].cos(),
            Node::Cos(a) => adjoints[a] -= g * values[a].sin(),
            Node::Sqrt(a) => {
                // The derivative is unbounded at zero; treat it as flat there.
                if values[i] > 0.0 {
                    adjoints[a] += g / (2.0 * values[i]);
                }
            }
            Node::Abs(a) => {
                if values[a] > 0.0 {
                    adjoints[a] += g;
                } else if values[a] < 0.0 {
                    adjoints[a] -= g;
                }
            }
            Node::Atan2(y, x) => {
                let r2 = values[y] * values[y] + values[x] * values[x];
                if r2 > 0.0 {
                    adjoints[y] += g * values[x] / r2;
                    adjoints[x] -= g * values[y] / r2;
                }
            }
        }
        None
    }

    /// Full backward sweep. `adjoints` holds the seeds on entry and is left
    /// zeroed; decision adjoints are accumulated into `gradient`.
    pub(crate) fn backpropagate(&self, values: &[f64], adjoints: &mut [f64], gradient: &mut [f64]) {
        for i in (0..adjoints.len()).rev() {
            let g = adjoints[i];
            if g == 0.0 {
                continue;
            }
            adjoints[i] = 0.0;
            if let Some((k, g)) = self.propagate(i, g, values, adjoints) {
                gradient[k] += g;
            }
        }
    }

    /// Node indices reachable from each root, each list sorted descending.
    pub(crate) fn supports(&self, roots: &[usize]) -> Vec<Vec<usize>> {
        let mut stamp = vec![0usize; self.nodes.len()];
        let mut stack = Vec::new();
        roots
            .iter()
            .enumerate()
            .map(|(ordinal, &root)| {
                let mark = ordinal + 1;
                let mut reached = Vec::new();
                stack.push(root);
                stamp[root] = mark;
                while let Some(i) = stack.pop() {
                    reached.push(i);
                    let mut visit = |j: usize| {
                        if stamp[j] != mark {
                            stamp[j] = mark;
                            stack.push(j);
                        }
                    };
                    match self.nodes[i] {
                        Node::Constant(_) | Node::Decision(_) => {}
                        Node::Neg(a) | Node::Sin(a) | Node::Cos(a) | Node::Sqrt(a) | Node::Abs(a) => visit(a),
                        Node::Add(a, b)
                        | Node::Sub(a, b)
                        | Node::Mul(a, b)
                        | Node::Div(a, b)
                        | Node::Atan2(a, b) => {
                            visit(a);
                            visit(b);
                        }
                    }
                }
                reached.sort_unstable_by(|a, b| b.cmp(a));
                reached
            })
            .collect()
    }

    /// Gradient of a single root restricted to its support.
    ///
    /// `adjoints` must be zero on entry and is zero again on return.
    pub(crate) fn sparse_gradient(
        &self,
        support: &[usize],
        values: &[f64],
        adjoints: &mut [f64],
        out: &mut Vec<(usize, f64)>,
    ) {
        out.clear();
        let Some(&root) = support.first() else {
            return;
        };
        adjoints[root] = 1.0;
        for &i in support {
            let g = adjoints[i];
            adjoints[i] = 0.0;
            if g == 0.0 {
                continue;
            }
            if let Some(entry) = self.propagate(i, g, values, adjoints) {
                out.push(entry);
            }
        }
    }

    /// Splits `root` into the terms of its outermost sum, `root = Σ w·term`.
    pub(crate) fn summands(&self, root: usize) -> Vec<(usize, f64)> {
        let mut terms: BTreeMap<usize, f64> = BTreeMap::new();
        let mut stack = vec![(root, 1.0)];
        while let Some((i, weight)) = stack.pop() {
            match self.nodes[i] {
                Node::Add(a, b) => {
                    stack.push((a, weight));
                    stack.push((b, weight));
                }
                Node::Sub(a, b) => {
                    stack.push((a, weight));
                    stack.push((b, -weight));
                }
                Node::Neg(a) => stack.push((a, -weight)),
                Node::Constant(_) => {}
                _ => *terms.entry(i).or_insert(0.0) += weight,
            }
        }
        terms.into_iter().filter(|&(_, weight)| weight != 0.0).collect()
    }

    /// Decision variable indices reachable from a support, ascending.
    pub(crate) fn decisions(&self, support: &[usize]) -> Vec<usize> {
        let mut decisions: Vec<usize> = support
            .iter()
            .filter_map(|&i| match self.nodes[i] {
                Node::Decision(k) => Some(k),
                _ => None,
            })
            .collect();
        decisions.sort_unstable();
        decisions
    }

    /// True when the root of `support` is affine in the decision variables.
    pub(crate) fn is_affine(&self, support: &[usize]) -> bool {
        #[derive(Clone, Copy, PartialEq, PartialOrd)]
        enum Degree {
            Constant,
            Affine,
            Nonlinear,
        }
        let Some(&root) = support.first() else {
            return true;
        };
        let mut degrees: HashMap<usize, Degree> = HashMap::with_capacity(support.len());
        for &i in support.iter().rev() {
            let of = |j: usize| degrees.get(&j).copied().unwrap_or(Degree::Constant);
            let smooth = |d: Degree| if d == Degree::Constant { d } else { Degree::Nonlinear };
            let degree = match self.nodes[i] {
                Node::Constant(_) => Degree::Constant,
                Node::Decision(_) => Degree::Affine,
                Node::Add(a, b) | Node::Sub(a, b) => {
                    let (a, b) = (of(a), of(b));
                    if a > b { a } else { b }
                }
                Node::Neg(a) => of(a),
                Node::Mul(a, b) => match (of(a), of(b)) {
                    (Degree::Constant, d) | (d, Degree::Constant) => d,
                    _ => Degree::Nonlinear,
                },
                Node::Div(a, b) => match of(b) {
                    Degree::Constant => of(a),
                    _ => Degree::Nonlinear,
                },
                Node::Sin(a) | Node::Cos(a) | Node::Sqrt(a) | Node::Abs(a) => smooth(of(a)),
                Node::Atan2(a, b) => {
                    let (a, b) = (of(a), of(b));
                    smooth(if a > b { a } else { b })
                }
            };
            degrees.insert(i, degree);
        }
        degrees.get(&root).is_some_and(|&d| d != Degree::Nonlinear)
    }

    /// Column `direction` of the root's Hessian, restricted to its support.
    ///
    /// Forward-mode tangents along decision variable `direction` followed by a
    /// reverse sweep that carries first- and second-order adjoints. Entries
    /// are `(k, ∂²r/∂x_k∂x_direction)`. All three scratch slices must be zero
    /// on entry and are zero again on return.
    pub(crate) fn hessian_column(
        &self,
        support: &[usize],
        values: &[f64],
        direction: usize,
        scratch: &mut HessianScratch,
        out: &mut Vec<(usize, f64)>,
    ) {
        out.clear();
        let Some(&root) = support.first() else {
            return;
        };
        let HessianScratch {
            tangents: t,
            adjoints,
            second,
        } = scratch;
        let v = values;

        for &i in support.iter().rev() {
            t[i] = match self.nodes[i] {
                Node::Constant(_) => 0.0,
                Node::Decision(k) => {
                    if k == direction {
                        1.0
                    } else {
                        0.0
                    }
                }
                Node::Add(a, b) => t[a] + t[b],
                Node::Sub(a, b) => t[a] - t[b],
                Node::Mul(a, b) => t[a] * v[b] + v[a] * t[b],
                Node::Div(a, b) => (t[a] - v[i] * t[b]) / v[b],
                Node::Neg(a) => -t[a],
                Node::Sin(a) => v[a].cos() * t[a],
                Node::Cos(a) => -v[a].sin() * t[a],
                Node::Sqrt(a) => {
                    if v[i] > 0.0 {
                        t[a] / (2.0 * v[i])
                    } else {
                        0.0
                    }
                }
                Node::Abs(a) => sign(v[a]) * t[a],
                Node::Atan2(y, x) => {
                    let r2 = v[y] * v[y] + v[x] * v[x];
                    if r2 > 0.0 {
                        (v[x] * t[y] - v[y] * t[x]) / r2
                    } else {
                        0.0
                    }
                }
            };
        }

        adjoints[root] = 1.0;
        for &i in support {
            let g = adjoints[i];
            let h = second[i];
            adjoints[i] = 0.0;
            second[i] = 0.0;
            if g == 0.0 && h == 0.0 {
                continue;
            }
            match self.nodes[i] {
                Node::Constant(_) => {}
                Node::Decision(k) => {
                    if h != 0.0 {
                        out.push((k, h));
                    }
                }
                Node::Add(a, b) => {
                    adjoints[a] += g;
                    adjoints[b] += g;
                    second[a] += h;
                    second[b] += h;
                }
                Node::Sub(a, b) => {
                    adjoints[a] += g;
                    adjoints[b] -= g;
                    second[a] += h;
                    second[b] -= h;
                }
                Node::Mul(a, b) => {
                    adjoints[a] += g * v[b];
                    adjoints[b] += g * v[a];
                    second[a] += h * v[b] + g * t[b];
                    second[b] += h * v[a] + g * t[a];
                }
                Node::Div(a, b) => {
                    let inv = 1.0 / v[b];
                    adjoints[a] += g * inv;
                    second[a] += h * inv - g * t[b] * inv * inv;
                    adjoints[b] -= g * v[i] * inv;
                    second[b] -= h * v[i] * inv + g * (t[i] * v[b] - v[i] * t[b]) * inv * inv;
                }
                Node::Neg(a) => {
                    adjoints[a] -= g;
                    second[a] -= h;
                }
                Node::Sin(a) => {
                    adjoints[a] += g * v[a].cos();
                    second[a] += h * v[a].cos() - g * v[a].sin() * t[a];
                }
                Node::Cos(a) => {
                    adjoints[a] -= g * v[a].sin();
                    second[a] -= h * v[a].sin() + g * v[a].cos() * t[a];
                }
                Node::Sqrt(a) => {
                    if v[i] > 0.0 {
                        let d = 1.0 / (2.0 * v[i]);
                        adjoints[a] += g * d;
                        second[a] += h * d - g * t[i] / (2.0 * v[i] * v[i]);
                    }
                }
                Node::Abs(a) => {
                    let s = sign(v[a]);
                    adjoints[a] += g * s;
                    second[a] += h * s;
                }
                Node::Atan2(y, x) => {
                    let r2 = v[y] * v[y] + v[x] * v[x];
                    if r2 > 0.0 {
                        let dr2 = 2.0 * (v[y] * t[y] + v[x] * t[x]);
                        adjoints[y] += g * v[x] / r2;
                        second[y] += h * v[x] / r2 + g * (t[x] / r2 - v[x] * dr2 / (r2 * r2));
                        adjoints[x] -= g * v[y] / r2;
                        second[x] += -h * v[y] / r2 + g * (-t[y] / r2 + v[y] * dr2 / (r2 * r2));
                    }
                }
            }
        }

        for &i in support {
            t[i] = 0.0;
        }
    }
}

/// Per-node work arrays for [`ExpressionGraph::hessian_column`]
pub(crate) struct HessianScratch {
    tangents: Vec<f64>,
    adjoints: Vec<f64>,
    second: Vec<f64>,
}

impl HessianScratch {
    pub(crate) fn new(len: usize) -> Self {
        HessianScratch {
            tangents: vec![0.0; len],
            adjoints: vec![0.0; len],
            second: vec![0.0; len],
        }
    }
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Operation log shared by every variable of one problem.
#[derive(Debug, Default)]
pub(crate) struct Tape {
    graph: ExpressionGraph,
    values: Vec<f64>,
    constants: HashMap<u64, usize>,
}

pub(crate) type SharedTape = Rc<RefCell<Tape>>;

impl Tape {
    pub(crate) fn graph(&self) -> &ExpressionGraph {
        &self.graph
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn num_decisions(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn set_values(&mut self, x: &[f64]) {
        self.values.copy_from_slice(x);
    }

    fn push(&mut self, node: Node) -> usize {
        self.graph.nodes.push(node);
        self.graph.nodes.len() - 1
    }

    fn push_constant(&mut self, value: f64) -> usize {
        let key = value.to_bits();
        if let Some(&index) = self.constants.get(&key) {
            return index;
        }
        let index = self.push(Node::Constant(value));
        self.constants.insert(key, index);
        index
    }

    pub(crate) fn push_decision(&mut self, value: f64) -> usize {
        let k = self.values.len();
        self.values.push(value);
        self.push(Node::Decision(k))
    }

    fn evaluate_node(&self, index: usize) -> f64 {
        let mut out = Vec::new();
        self.graph.evaluate_prefix(&self.values, index + 1, &mut out);
        out[index]
    }
}

#[derive(Clone)]
enum Expr {
    Constant(f64),
    Node { tape: SharedTape, index: usize },
}

/// A scalar expression over decision variables.
///
/// Cloning is cheap: clones share the underlying tape node.
#[derive(Clone)]
pub struct Variable {
    expr: Expr,
}

impl Variable {
    /// A constant expression.
    pub fn constant(value: f64) -> Self {
        Variable {
            expr: Expr::Constant(value),
        }
    }

    pub(crate) fn decision(tape: &SharedTape, value: f64) -> Self {
        let index = tape.borrow_mut().push_decision(value);
        Variable {
            expr: Expr::Node {
                tape: Rc::clone(tape),
                index,
            },
        }
    }

    /// True when the expression does not depend on any decision variable.
    pub fn is_constant(&self) -> bool {
        matches!(self.expr, Expr::Constant(_))
    }

    /// True when this is a decision variable itself rather than an expression.
    pub fn is_decision(&self) -> bool {
        match &self.expr {
            Expr::Constant(_) => false,
            Expr::Node { tape, index } => matches!(tape.borrow().graph.nodes[*index], Node::Decision(_)),
        }
    }

    /// Evaluates the expression at the current decision values.
    pub fn value(&self) -> f64 {
        match &self.expr {
            Expr::Constant(c) => *c,
            Expr::Node { tape, index } => {
                let tape = tape.borrow();
                match tape.graph.nodes[*index] {
                    Node::Decision(k) => tape.values[k],
                    _ => tape.evaluate_node(*index),
                }
            }
        }
    }

    /// Sets the current value of a decision variable.
    ///
    /// Only decision variables carry a value; calls on other expressions are
    /// ignored.
    pub fn set_value(&self, value: f64) {
        match &self.expr {
            Expr::Node { tape, index } => {
                let mut tape = tape.borrow_mut();
                if let Node::Decision(k) = tape.graph.nodes[*index] {
                    tape.values[k] = value;
                    return;
                }
                warn!("set_value ignored on non-decision expression #{}", index);
            }
            Expr::Constant(_) => warn!("set_value ignored on constant expression"),
        }
    }

    pub fn sin(&self) -> Variable {
        self.unary(Node::Sin, f64::sin)
    }

    pub fn cos(&self) -> Variable {
        self.unary(Node::Cos, f64::cos)
    }

    pub fn sqrt(&self) -> Variable {
        self.unary(Node::Sqrt, f64::sqrt)
    }

    pub fn abs(&self) -> Variable {
        self.unary(Node::Abs, f64::abs)
    }

    /// Four-quadrant arctangent of `self / x`.
    pub fn atan2(&self, x: &Variable) -> Variable {
        binary(self, x, Node::Atan2, f64::atan2)
    }

    /// Index of this expression on `tape`, recording constants as needed.
    pub(crate) fn node_on(&self, tape: &SharedTape) -> usize {
        match &self.expr {
            Expr::Constant(c) => tape.borrow_mut().push_constant(*c),
            Expr::Node { tape: own, index } => {
                debug_assert!(Rc::ptr_eq(own, tape), "variable belongs to another problem");
                *index
            }
        }
    }

    fn tape(&self) -> Option<&SharedTape> {
        match &self.expr {
            Expr::Constant(_) => None,
            Expr::Node { tape, .. } => Some(tape),
        }
    }

    fn as_constant(&self) -> Option<f64> {
        match self.expr {
            Expr::Constant(c) => Some(c),
            Expr::Node { .. } => None,
        }
    }

    fn unary(&self, node: fn(usize) -> Node, f: fn(f64) -> f64) -> Variable {
        match &self.expr {
            Expr::Constant(c) => Variable::constant(f(*c)),
            Expr::Node { tape, index } => {
                let index = tape.borrow_mut().push(node(*index));
                Variable {
                    expr: Expr::Node {
                        tape: Rc::clone(tape),
                        index,
                    },
                }
            }
        }
    }
}

fn binary(lhs: &Variable, rhs: &Variable, node: fn(usize, usize) -> Node, f: fn(f64, f64) -> f64) -> Variable {
    let Some(tape) = lhs.tape().or_else(|| rhs.tape()).cloned() else {
        return Variable::constant(f(lhs.value(), rhs.value()));
    };
    let a = lhs.node_on(&tape);
    let b = rhs.node_on(&tape);
    let index = tape.borrow_mut().push(node(a, b));
    Variable {
        expr: Expr::Node { tape, index },
    }
}

fn add(lhs: &Variable, rhs: &Variable) -> Variable {
    match (lhs.as_constant(), rhs.as_constant()) {
        (Some(c), _) if c == 0.0 => rhs.clone(),
        (_, Some(c)) if c == 0.0 => lhs.clone(),
        _ => binary(lhs, rhs, Node::Add, |a, b| a + b),
    }
}

fn sub(lhs: &Variable, rhs: &Variable) -> Variable {
    match (lhs.as_constant(), rhs.as_constant()) {
        (_, Some(c)) if c == 0.0 => lhs.clone(),
        (Some(c), None) if c == 0.0 => -rhs,
        _ => binary(lhs, rhs, Node::Sub, |a, b| a - b),
    }
}

fn mul(lhs: &Variable, rhs: &Variable) -> Variable {
    match (lhs.as_constant(), rhs.as_constant()) {
        (Some(c), _) | (_, Some(c)) if c == 0.0 => Variable::constant(0.0),
        (Some(c), _) if c == 1.0 => rhs.clone(),
        (_, Some(c)) if c == 1.0 => lhs.clone(),
        _ => binary(lhs, rhs, Node::Mul, |a, b| a * b),
    }
}

fn div(lhs: &Variable, rhs: &Variable) -> Variable {
    match (lhs.as_constant(), rhs.as_constant()) {
        (_, Some(c)) if c == 1.0 => lhs.clone(),
        _ => binary(lhs, rhs, Node::Div, |a, b| a / b),
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $func:ident) => {
        impl $trait<&Variable> for &Variable {
            type Output = Variable;
            fn $method(self, rhs: &Variable) -> Variable {
                $func(self, rhs)
            }
        }

        impl $trait<Variable> for Variable {
            type Output = Variable;
            fn $method(self, rhs: Variable) -> Variable {
                $func(&self, &rhs)
            }
        }

        impl $trait<&Variable> for Variable {
            type Output = Variable;
            fn $method(self, rhs: &Variable) -> Variable {
                $func(&self, rhs)
            }
        }

        impl $trait<Variable> for &Variable {
            type Output = Variable;
            fn $method(self, rhs: Variable) -> Variable {
                $func(self, &rhs)
            }
        }

        impl $trait<f64> for Variable {
            type Output = Variable;
            fn $method(self, rhs: f64) -> Variable {
                $func(&self, &Variable::constant(rhs))
            }
        }

        impl $trait<f64> for &Variable {
            type Output = Variable;
            fn $method(self, rhs: f64) -> Variable {
                $func(self, &Variable::constant(rhs))
            }
        }

        impl $trait<Variable> for f64 {
            type Output = Variable;
            fn $method(self, rhs: Variable) -> Variable {
                $func(&Variable::constant(self), &rhs)
            }
        }

        impl $trait<&Variable> for f64 {
            type Output = Variable;
            fn $method(self, rhs: &Variable) -> Variable {
                $func(&Variable::constant(self), rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, add);
impl_binary_op!(Sub, sub, sub);
impl_binary_op!(Mul, mul, mul);
impl_binary_op!(Div, div, div);

impl Neg for &Variable {
    type Output = Variable;
    fn neg(self) -> Variable {
        self.unary(Node::Neg, |a| -a)
    }
}

impl Neg for Variable {
    type Output = Variable;
    fn neg(self) -> Variable {
        -&self
    }
}

impl AddAssign<Variable> for Variable {
    fn add_assign(&mut self, rhs: Variable) {
        *self = add(self, &rhs);
    }
}

impl AddAssign<&Variable> for Variable {
    fn add_assign(&mut self, rhs: &Variable) {
        *self = add(self, rhs);
    }
}

impl SubAssign<Variable> for Variable {
    fn sub_assign(&mut self, rhs: Variable) {
        *self = sub(self, &rhs);
    }
}

impl MulAssign<Variable> for Variable {
    fn mul_assign(&mut self, rhs: Variable) {
        *self = mul(self, &rhs);
    }
}

impl Sum for Variable {
    fn sum<I: Iterator<Item = Variable>>(iter: I) -> Variable {
        iter.fold(Variable::constant(0.0), |acc, v| acc + v)
    }
}

impl Default for Variable {
    fn default() -> Self {
        Variable::constant(0.0)
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Variable::constant(value)
    }
}

impl From<&Variable> for Variable {
    fn from(value: &Variable) -> Self {
        value.clone()
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr {
            Expr::Constant(c) => write!(f, "Variable(constant {})", c),
            Expr::Node { index, .. } => write!(f, "Variable(#{} = {})", index, self.value()),
        }
    }
}
