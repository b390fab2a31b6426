use super::node::{Node, NodeId, Role};
use super::rule::DetRule;
use crate::value::Value;
use meander_error::{Result, ensure};
use ndarray::Array1;

/// The model's node arena. Handles are indices into declaration order,
/// which is also the recompute and proposal order.
#[derive(Default)]
pub struct NodeTable {
    nodes: Vec<Node>,
}

impl NodeTable {
    pub(crate) fn new() -> Self {
        NodeTable { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn value(&self, id: NodeId) -> &Value {
        self.nodes[id.0].value()
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut Value {
        self.nodes[id.0].value_mut()
    }

    /// Shape-checked carrier write, the usual way for an update closure to
    /// publish a recomputed value.
    pub fn set(&mut self, id: NodeId, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let current = self.nodes[id.0].value();
        ensure!(
            current.same_shape(&value),
            Shape: "cannot assign {:?} into a {:?} carrier", value.kind(), current.kind()
        );
        *self.nodes[id.0].value_mut() = value;
        Ok(())
    }

    /// Scalar read for update closures; the carrier must be a real scalar.
    pub fn real(&self, id: NodeId) -> f64 {
        self.value(id).as_real().expect("carrier is a real scalar")
    }

    /// Vector read for update closures; the carrier must be a real vector.
    pub fn real_vec(&self, id: NodeId) -> &Array1<f64> {
        self.value(id)
            .as_real_vec()
            .expect("carrier is a real vector")
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Temporarily removes a deterministic node's rule so it can run
    /// against an immutable view of the table.
    pub(crate) fn take_rule(&mut self, id: NodeId) -> DetRule {
        match self.nodes[id.0].role_mut() {
            Role::Deterministic { rule } => std::mem::replace(rule, DetRule::Tracked),
            _ => DetRule::Tracked,
        }
    }

    pub(crate) fn put_rule(&mut self, id: NodeId, rule: DetRule) {
        if let Role::Deterministic { rule: slot } = self.nodes[id.0].role_mut() {
            *slot = rule;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Dist;

    #[test]
    fn test_push_assigns_sequential_ids() {
        let mut table = NodeTable::new();
        let a = table.push(Node::observed(Value::Real(1.0), Dist::normal(0.0, 1.0)));
        let b = table.push(Node::observed(Value::Real(2.0), Dist::normal(0.0, 1.0)));

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(table.len(), 2);
        assert!(table.contains(b));
    }

    #[test]
    fn test_set_rejects_shape_change() {
        let mut table = NodeTable::new();
        let id = table.push(Node::observed(
            Value::from(vec![1.0, 2.0]),
            Dist::normal(0.0, 1.0),
        ));

        assert!(table.set(id, vec![3.0, 4.0]).is_ok());
        assert!(table.set(id, 5.0).is_err());
        assert!(table.set(id, vec![1.0, 2.0, 3.0]).is_err());
    }
}
