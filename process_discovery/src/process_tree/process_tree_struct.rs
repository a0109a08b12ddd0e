use serde::{Deserialize, Serialize};
use uuid::Uuid;

///
/// Leaf label in a process tree
///
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub enum LeafLabel {
    /// Non-silent activity leaf
    Activity(String),
    /// Silent activity leaf
    Tau,
}

///
/// Node in a process tree
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Operator node of a process tree
    Operator(Operator),
    /// Leaf node of a process tree
    Leaf(Leaf),
}

impl Node {
    ///
    /// Returns the identifier of a node in a process tree
    ///
    pub fn get_uuid(&self) -> &Uuid {
        match self {
            Node::Operator(op) => &op.uuid,
            Node::Leaf(leaf) => &leaf.uuid,
        }
    }

    ///
    /// Creates a new [`Node::Operator`] with the given [`OperatorType`]
    ///
    pub fn new_operator(op_type: OperatorType) -> Self {
        Node::Operator(Operator::new(op_type))
    }

    ///
    /// Creates a new non-silent or silent leaf [`Node`]
    ///
    pub fn new_leaf(leaf_label: Option<String>) -> Self {
        Node::Leaf(Leaf::new(leaf_label))
    }

    ///
    /// Adds a node as child if the node is an operator node
    ///
    pub fn add_child(&mut self, child: Node) {
        match self {
            Node::Operator(op) => {
                op.children.push(child);
            }
            Node::Leaf(_) => {
                panic!("Cannot add child to a leaf")
            }
        }
    }

    ///
    /// Returns `true` if a loop operator has exactly two children (body and
    /// redo) and all other operators have at least two.
    ///
    pub fn check_children_valid(&self) -> bool {
        match self {
            Node::Operator(op) => match op.operator_type {
                OperatorType::Loop => op.children.len() == 2,
                _ => op.children.len() >= 2,
            },
            Node::Leaf(_) => true,
        }
    }
}

///
/// Operator type enum for [`Operator`]
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperatorType {
    /// Sequence operator
    Sequence,
    /// Exclusive choice operator
    ExclusiveChoice,
    /// Concurrency operator
    Concurrency,
    /// Loop operator with a body child and a redo child
    Loop,
}

///
/// Process tree struct that contains a [`Node`] as root
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTree {
    /// The root of the process tree
    pub root: Node,
}

impl ProcessTree {
    ///
    /// Initializes the process tree with the given node as root
    ///
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    ///
    /// Returns `true` if all operator nodes in the tree have the right number
    /// of children
    ///
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        let mut stack: Vec<&Node> = vec![&self.root];
        while let Some(node) = stack.pop() {
            valid &= node.check_children_valid();
            if let Node::Operator(op) = node {
                stack.extend(op.children.iter());
            }
        }
        valid
    }

    ///
    /// Returns all descendant [`Leaf`] nodes
    ///
    pub fn find_all_leaves(&self) -> Vec<&Leaf> {
        let mut result: Vec<&Leaf> = Vec::new();
        let mut stack: Vec<&Node> = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                Node::Operator(op) => stack.extend(op.children.iter()),
                Node::Leaf(leaf) => result.push(leaf),
            }
        }
        result
    }
}

///
/// An operator node in a process tree
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    /// The node ID
    pub uuid: Uuid,
    /// The [`OperatorType`] of the node
    pub operator_type: OperatorType,
    /// The children nodes of the operator node (order matters)
    pub children: Vec<Node>,
}

impl Operator {
    ///
    /// A constructor for the struct that initializes with the given
    /// [`OperatorType`] and otherwise a fresh [`Uuid`] and an empty list of
    /// children
    ///
    pub fn new(operator_type: OperatorType) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            operator_type,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
///
/// A leaf in a process tree
///
pub struct Leaf {
    /// The identifier of the leaf
    pub uuid: Uuid,
    /// The silent or non-silent activity label [`LeafLabel`]
    pub activity_label: LeafLabel,
}

impl Leaf {
    ///
    /// Creates a new [`Leaf`] either by using a given label or making it
    /// silent if a label is missing
    ///
    pub fn new(leaf_label: Option<String>) -> Self {
        if let Some(leaf_label) = leaf_label {
            Self {
                uuid: Uuid::new_v4(),
                activity_label: LeafLabel::Activity(leaf_label),
            }
        } else {
            Self {
                uuid: Uuid::new_v4(),
                activity_label: LeafLabel::Tau,
            }
        }
    }
}
