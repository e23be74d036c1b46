//! Prefix-indexed listener registry.

use std::fmt;
use std::sync::Arc;

use crate::Violation;

/// Receives reported violations whose code falls under a registered prefix.
pub trait Listener: Send + Sync {
    fn notify(&self, code: &str, violation: &Violation);
}

impl<F> Listener for F
where
    F: Fn(&str, &Violation) + Send + Sync,
{
    fn notify(&self, code: &str, violation: &Violation) {
        self(code, violation)
    }
}

/// A node of the [`Trie`].
#[derive(Default)]
pub struct TrieNode {
    prefix: String,
    data: Vec<Arc<dyn Listener>>,
    children: Vec<TrieNode>,
}

impl TrieNode {
    fn new(prefix: String) -> Self {
        Self {
            prefix,
            data: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The full prefix this node stands for.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The listeners registered at exactly this prefix.
    pub fn data(&self) -> &[Arc<dyn Listener>] {
        &self.data
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[TrieNode] {
        &self.children
    }

    fn child_index(&self, key: char) -> Option<usize> {
        self.children
            .iter()
            .position(|child| child.prefix.ends_with(key))
    }
}

impl fmt::Debug for TrieNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieNode")
            .field("prefix", &self.prefix)
            .field("listeners", &self.data.len())
            .field("children", &self.children)
            .finish()
    }
}

/// A trie of code prefixes, one node per character.
#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` at `code`, creating nodes along the way.
    pub fn add(&mut self, code: &str, listener: Arc<dyn Listener>) {
        let mut node = &mut self.root;
        for key in code.chars() {
            let index = match node.child_index(key) {
                Some(index) => index,
                None => {
                    let mut prefix = node.prefix.clone();
                    prefix.push(key);
                    node.children.push(TrieNode::new(prefix));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
        node.data.push(listener);
    }

    /// Returns the node for exactly `code`, if one exists.
    pub fn find(&self, code: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for key in code.chars() {
            node = &node.children[node.child_index(key)?];
        }
        Some(node).filter(|node| !node.prefix.is_empty())
    }

    /// Iterates over every node depth-first, pre-order, siblings in
    /// insertion order. The root is not included.
    pub fn traverse(&self) -> impl Iterator<Item = &TrieNode> {
        let mut stack: Vec<&TrieNode> = self.root.children.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Dispatches violations to the listeners registered for their code.
#[derive(Debug, Default)]
pub struct Notifier {
    listeners: Trie,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for every code starting with `code_prefix`.
    pub fn register_listener(&mut self, code_prefix: &str, listener: Arc<dyn Listener>) {
        self.listeners.add(code_prefix, listener);
    }

    /// Returns the listeners for `code`: those registered at the code
    /// itself first, then those at each shorter prefix.
    pub fn listeners_for<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a Arc<dyn Listener>> {
        code.char_indices()
            .rev()
            .map(move |(index, c)| &code[..index + c.len_utf8()])
            .filter_map(move |prefix| self.listeners.find(prefix))
            .flat_map(|node| node.data().iter())
    }

    /// Notifies every listener for `code`.
    pub fn notify(&self, code: &str, violation: &Violation) {
        for listener in self.listeners_for(code) {
            listener.notify(code, violation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Listener for Recorder {
        fn notify(&self, code: &str, _violation: &Violation) {
            self.seen.lock().push(format!("{}:{}", self.name, code));
        }
    }

    fn recorder(name: &'static str, seen: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Listener> {
        Arc::new(Recorder {
            name,
            seen: Arc::clone(seen),
        })
    }

    #[test]
    fn test_find_exact_node() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut trie = Trie::new();
        trie.add("E103", recorder("x", &seen));

        let node = trie.find("E103").expect("node");
        assert_eq!(node.prefix(), "E103");
        assert_eq!(node.data().len(), 1);
        assert!(trie.find("E200").is_none());
        assert!(trie.find("E1034").is_none());
        assert!(trie.find("").is_none());
    }

    #[test]
    fn test_intermediate_nodes_have_no_data() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut trie = Trie::new();
        trie.add("E103", recorder("x", &seen));
        assert!(trie.find("E1").expect("node").data().is_empty());
    }

    #[test]
    fn test_traverse_pre_order_insertion_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut trie = Trie::new();
        trie.add("E2", recorder("a", &seen));
        trie.add("E1", recorder("b", &seen));
        trie.add("W", recorder("c", &seen));
        trie.add("E21", recorder("d", &seen));

        let prefixes: Vec<_> = trie.traverse().map(TrieNode::prefix).collect();
        assert_eq!(prefixes, vec!["E", "E2", "E21", "E1", "W"]);
    }

    #[test]
    fn test_notify_reaches_exact_and_ancestors_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = Notifier::new();
        notifier.register_listener("E111", recorder("exact", &seen));
        notifier.register_listener("E1", recorder("family", &seen));
        notifier.register_listener("E2", recorder("sibling", &seen));
        notifier.register_listener("E12", recorder("cousin", &seen));

        let violation = Violation::new("E111", "a.py", 1, 1, "indentation");
        notifier.notify("E111", &violation);

        assert_eq!(*seen.lock(), vec!["exact:E111", "family:E111"]);
    }

    #[test]
    fn test_closure_listener() {
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let mut notifier = Notifier::new();
        notifier.register_listener(
            "W",
            Arc::new(move |_: &str, _: &Violation| *counter.lock() += 1),
        );

        notifier.notify("W291", &Violation::new("W291", "a.py", 1, 1, "trailing"));
        notifier.notify("E501", &Violation::new("E501", "a.py", 1, 1, "long"));
        assert_eq!(*count.lock(), 1);
    }
}
