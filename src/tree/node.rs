use crate::storage::{EdgeMap, KeyBag, TreeStorage};

/// One tree node. The variant encodes which containers the node carries:
/// a leaf has keys and no children, a bare branch has children and no
/// keys, and a keyed branch has both. The root is a bare branch with an
/// empty edge and is the only node allowed one.
pub enum Node<K, S: TreeStorage<K>> {
    Leaf {
        edge: Box<[u8]>,
        keys: S::Bag,
    },
    NoKeysBranch {
        edge: Box<[u8]>,
        children: S::Children,
    },
    KeysBranch {
        edge: Box<[u8]>,
        keys: S::Bag,
        children: S::Children,
    },
}

impl<K, S: TreeStorage<K>> Node<K, S> {
    /// A fresh leaf holding a single key.
    pub fn leaf(edge: &[u8], key: K) -> Self {
        let keys = S::Bag::default();
        keys.add(key);
        Node::Leaf { edge: edge.into(), keys }
    }

    pub fn edge(&self) -> &[u8] {
        match self {
            Node::Leaf { edge, .. }
            | Node::NoKeysBranch { edge, .. }
            | Node::KeysBranch { edge, .. } => edge,
        }
    }

    pub fn set_edge(&mut self, new_edge: Box<[u8]>) {
        match self {
            Node::Leaf { edge, .. }
            | Node::NoKeysBranch { edge, .. }
            | Node::KeysBranch { edge, .. } => *edge = new_edge,
        }
    }

    pub fn keys(&self) -> Option<&S::Bag> {
        match self {
            Node::Leaf { keys, .. } | Node::KeysBranch { keys, .. } => Some(keys),
            Node::NoKeysBranch { .. } => None,
        }
    }

    pub fn children(&self) -> Option<&S::Children> {
        match self {
            Node::NoKeysBranch { children, .. } | Node::KeysBranch { children, .. } => {
                Some(children)
            }
            Node::Leaf { .. } => None,
        }
    }

    pub fn key_count(&self) -> usize {
        self.keys().map_or(0, KeyBag::len)
    }

    pub fn child_count(&self) -> usize {
        self.children().map_or(0, EdgeMap::len)
    }

    /// Adds a key to this node's bag, promoting a bare branch to a keyed
    /// one in place.
    pub fn add_key(&mut self, key: K) {
        match self {
            Node::Leaf { keys, .. } | Node::KeysBranch { keys, .. } => keys.add(key),
            Node::NoKeysBranch { edge, children } => {
                let edge = std::mem::take(edge);
                let children = std::mem::take(children);
                let keys = S::Bag::default();
                keys.add(key);
                *self = Node::KeysBranch { edge, keys, children };
            }
        }
    }

    /// Turns a leaf into a keyed branch with one child leaf carrying the
    /// token remainder. The leaf's own keys stay on the branch.
    pub(crate) fn grow_below(&mut self, rest: &[u8], key: K) {
        if let Node::Leaf { edge, keys } = self {
            let edge = std::mem::take(edge);
            let keys = std::mem::take(keys);
            let children = S::Children::default();
            children.insert(rest.into(), Node::leaf(rest, key));
            *self = Node::KeysBranch { edge, keys, children };
        }
    }
}
